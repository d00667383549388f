//! Minimal typed views of GitHub webhook payloads.
//!
//! Only the fields read by the resolvers are declared; serde ignores the rest,
//! so payload growth on GitHub's side never breaks decoding. Collections that
//! GitHub may omit default to empty.

use serde::Deserialize;

use crate::{PullRequestNumber, RepositoryRef, UserId};

/// Repository object present in every repository-scoped event.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// Repository name.
    pub name: String,
    /// Owning account.
    pub owner: Account,
}

impl Repository {
    /// Returns the `owner/name` address of this repository.
    pub fn to_ref(&self) -> RepositoryRef {
        RepositoryRef::new(&self.owner.login, &self.name)
    }
}

/// A user, bot, or organisation account.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// Login name.
    pub login: String,
}

/// A comment author.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Numeric account id.
    pub id: UserId,
    /// Login name.
    pub login: String,
}

/// An issue or pull request label.
#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    /// Label text.
    pub name: String,
}

// ---------------------------------------------------------------------------
// commit_comment
// ---------------------------------------------------------------------------

/// `commit_comment` event.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitCommentEvent {
    /// The comment.
    pub comment: CommitComment,
    /// Repository the commit belongs to.
    pub repository: Repository,
}

/// A comment on a commit.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitComment {
    /// SHA of the commented commit.
    pub commit_id: String,
    /// Comment author.
    pub user: User,
}

// ---------------------------------------------------------------------------
// release
// ---------------------------------------------------------------------------

/// `release` event.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseEvent {
    /// The release.
    pub release: Release,
}

/// A release.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Tag the release points at.
    pub tag_name: String,
}

// ---------------------------------------------------------------------------
// push
// ---------------------------------------------------------------------------

/// `push` event.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    /// Full ref that was pushed (`refs/heads/main`, `refs/tags/1.0.0`).
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Pushed commits, oldest first. GitHub caps this list at 20 entries.
    #[serde(default)]
    pub commits: Vec<PushCommit>,
    /// Most recent commit after the push, if any.
    #[serde(default)]
    pub head_commit: Option<PushCommit>,
}

impl PushEvent {
    /// Tag name when the push targets `refs/tags/*`.
    pub fn tag_name(&self) -> Option<&str> {
        self.git_ref.strip_prefix("refs/tags/")
    }

    /// Every file path touched by the pushed commits.
    pub fn changed_paths(&self) -> Vec<&str> {
        self.commits
            .iter()
            .chain(self.head_commit.as_ref())
            .flat_map(PushCommit::paths)
            .collect()
    }
}

/// A commit summary inside a push event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushCommit {
    /// Added files.
    #[serde(default)]
    pub added: Vec<String>,
    /// Removed files.
    #[serde(default)]
    pub removed: Vec<String>,
    /// Modified files.
    #[serde(default)]
    pub modified: Vec<String>,
}

impl PushCommit {
    fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.added
            .iter()
            .chain(&self.removed)
            .chain(&self.modified)
            .map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// issues / issue_comment
// ---------------------------------------------------------------------------

/// `issues` and `issue_comment` events.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueEvent {
    /// The issue (or pull request, for comments on a PR conversation).
    pub issue: Issue,
}

/// An issue.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    /// Labels currently applied.
    #[serde(default)]
    pub labels: Vec<Label>,
}

// ---------------------------------------------------------------------------
// pull_request and review variants
// ---------------------------------------------------------------------------

/// `pull_request`, `pull_request_review`, `pull_request_review_comment` and
/// `pull_request_review_thread` events.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    /// The pull request.
    pub pull_request: PullRequest,
    /// Repository the pull request targets.
    pub repository: Repository,
}

/// A pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: PullRequestNumber,
    /// Labels currently applied.
    #[serde(default)]
    pub labels: Vec<Label>,
}
