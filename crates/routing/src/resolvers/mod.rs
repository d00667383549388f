//! One resolver per event category.
//!
//! Every resolver that infers a package from loose text (paths, labels)
//! delegates the final decision to [`crate::disambiguation`]. Only the commit
//! comment and pull request resolvers may perform a lookup; they return the
//! lookup error untouched.

mod commit_comment;
pub(crate) mod issue;
mod pull_request;
mod push;
mod release;

pub use commit_comment::CommitCommentResolver;
pub use issue::IssueResolver;
pub use pull_request::PullRequestResolver;
pub use push::PushResolver;
pub use release::ReleaseResolver;
