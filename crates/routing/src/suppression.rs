//! Author-based suppression of known noisy bots.
//!
//! Coverage and preview-deployment bots comment on every commit. Those comments
//! are discarded before any provider lookup is made.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::UserId;

/// GitHub account id of `codecov[bot]`.
pub const CODECOV_BOT_ID: UserId = UserId::new(22_429_695);

/// GitHub account id of `vercel[bot]`.
pub const VERCEL_BOT_ID: UserId = UserId::new(35_613_825);

/// Set of author identities whose events are discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionRule {
    discarded: BTreeSet<u64>,
}

impl SuppressionRule {
    /// A rule that discards nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds a rule from the well-known bot switches plus extra ids.
    pub fn new(
        discard_codecov: bool,
        discard_vercel: bool,
        extra: impl IntoIterator<Item = UserId>,
    ) -> Self {
        let mut rule = Self::none();
        if discard_codecov {
            rule = rule.discarding(CODECOV_BOT_ID);
        }
        if discard_vercel {
            rule = rule.discarding(VERCEL_BOT_ID);
        }
        extra.into_iter().fold(rule, Self::discarding)
    }

    /// Adds an author to the discarded set.
    #[must_use]
    pub fn discarding(mut self, author: UserId) -> Self {
        self.discarded.insert(author.as_u64());
        self
    }

    /// Returns `true` if events by `author` are discarded.
    pub fn suppresses(&self, author: UserId) -> bool {
        self.discarded.contains(&author.as_u64())
    }

    /// Number of discarded identities.
    pub fn len(&self) -> usize {
        self.discarded.len()
    }

    /// Returns `true` if the rule discards nothing.
    pub fn is_empty(&self) -> bool {
        self.discarded.is_empty()
    }
}
