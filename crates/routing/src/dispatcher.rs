//! Selects the resolver for an event category and runs it.
//!
//! The dispatcher translates nothing: payload decoding failures become
//! [`ClassifyError::Payload`], lookup failures pass through as
//! [`ClassifyError::Lookup`], and the caller decides what each means.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::resolvers::{
    CommitCommentResolver, IssueResolver, PullRequestResolver, PushResolver, ReleaseResolver,
};
use crate::{ChangeLookup, ClassifyError, EventCategory, PackageRegistry, SuppressionRule, Target};

/// Classifies webhook events into routing targets.
///
/// Holds only immutable state, so one instance is shared by every request.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<PackageRegistry>,
    suppression: Arc<SuppressionRule>,
    lookup: Arc<dyn ChangeLookup>,
}

impl Dispatcher {
    /// Creates a dispatcher.
    pub fn new(
        registry: PackageRegistry,
        suppression: SuppressionRule,
        lookup: Arc<dyn ChangeLookup>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            suppression: Arc::new(suppression),
            lookup,
        }
    }

    /// Classifies an event delivered under the raw `event_name`.
    ///
    /// Event names outside [`EventCategory`] route to [`Target::Monorepo`]
    /// without decoding the payload.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::classify`].
    pub async fn classify_named(
        &self,
        event_name: &str,
        payload: &[u8],
    ) -> Result<Target, ClassifyError> {
        match EventCategory::from_event_name(event_name) {
            Some(category) => self.classify(category, payload).await,
            None => {
                debug!(event = event_name, "Unchecked event, routing to monorepo");
                Ok(Target::Monorepo)
            }
        }
    }

    /// Classifies an event of a checked category.
    ///
    /// # Errors
    ///
    /// - [`ClassifyError::Payload`] if the payload does not decode.
    /// - [`ClassifyError::Lookup`] if a resolver's lookup failed.
    #[instrument(skip_all, fields(category = %category, routed_to = tracing::field::Empty))]
    pub async fn classify(
        &self,
        category: EventCategory,
        payload: &[u8],
    ) -> Result<Target, ClassifyError> {
        let registry = self.registry.as_ref();
        let lookup = self.lookup.as_ref();

        let target = match category {
            EventCategory::CommitComment => {
                let event = decode(category, payload)?;
                CommitCommentResolver::new(registry, &self.suppression, lookup)
                    .resolve(&event)
                    .await?
            }
            EventCategory::Issues | EventCategory::IssueComment => {
                IssueResolver::new(registry).resolve(&decode(category, payload)?)
            }
            EventCategory::PullRequest
            | EventCategory::PullRequestReview
            | EventCategory::PullRequestReviewComment
            | EventCategory::PullRequestReviewThread => {
                let event = decode(category, payload)?;
                PullRequestResolver::new(registry, lookup)
                    .resolve(&event)
                    .await?
            }
            EventCategory::Push => PushResolver::new(registry).resolve(&decode(category, payload)?),
            EventCategory::Release => {
                ReleaseResolver::new(registry).resolve(&decode(category, payload)?)
            }
        };

        tracing::Span::current().record("routed_to", tracing::field::display(&target));
        debug!(routed_to = %target, "Classified event");
        Ok(target)
    }
}

fn decode<T: DeserializeOwned>(category: EventCategory, payload: &[u8]) -> Result<T, ClassifyError> {
    serde_json::from_slice(payload).map_err(|source| ClassifyError::Payload {
        category: category.as_str(),
        source,
    })
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("packages", &self.registry.len())
            .field("suppression", &self.suppression)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
