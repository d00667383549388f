//! Shared test utilities for the routing crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{
    ChangeLookup, CommitRef, LookupError, PackageId, PackageRegistry, PullRequestNumber,
    RepositoryRef,
};

/// Registry of `pkg-a`, `pkg-b`, `pkg-c` with `pkg-a` as primary.
pub fn abc_registry() -> PackageRegistry {
    PackageRegistry::from_names(["pkg-a", "pkg-b", "pkg-c"], Some("pkg-a")).unwrap()
}

pub fn pkg(name: &str) -> PackageId {
    PackageId::new(name).unwrap()
}

/// A lookup returning canned answers and counting how often it is called.
#[derive(Debug, Default)]
pub struct StubLookup {
    commits: HashMap<String, Result<Vec<String>, LookupError>>,
    pulls: HashMap<u64, Result<Vec<String>, LookupError>>,
    commit_calls: AtomicUsize,
    pull_calls: AtomicUsize,
}

impl StubLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit(mut self, sha: &str, paths: &[&str]) -> Self {
        self.commits
            .insert(sha.to_owned(), Ok(paths.iter().map(|p| (*p).to_owned()).collect()));
        self
    }

    pub fn with_commit_error(mut self, sha: &str, error: LookupError) -> Self {
        self.commits.insert(sha.to_owned(), Err(error));
        self
    }

    pub fn with_pull(mut self, number: u64, paths: &[&str]) -> Self {
        self.pulls
            .insert(number, Ok(paths.iter().map(|p| (*p).to_owned()).collect()));
        self
    }

    pub fn with_pull_error(mut self, number: u64, error: LookupError) -> Self {
        self.pulls.insert(number, Err(error));
        self
    }

    pub fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    pub fn pull_calls(&self) -> usize {
        self.pull_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.commit_calls() + self.pull_calls()
    }
}

fn not_found(what: String) -> LookupError {
    LookupError::NotFound { message: what }
}

#[async_trait]
impl ChangeLookup for StubLookup {
    async fn commit_files(
        &self,
        _repo: &RepositoryRef,
        commit: &CommitRef,
    ) -> Result<Vec<String>, LookupError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        self.commits
            .get(commit.as_str())
            .cloned()
            .unwrap_or_else(|| Err(not_found(format!("commit {commit}"))))
    }

    async fn pull_request_files(
        &self,
        _repo: &RepositoryRef,
        number: PullRequestNumber,
    ) -> Result<Vec<String>, LookupError> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        self.pulls
            .get(&number.as_u64())
            .cloned()
            .unwrap_or_else(|| Err(not_found(format!("pull request #{number}"))))
    }
}
