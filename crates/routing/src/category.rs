//! The closed set of webhook event kinds that are classified.

/// A webhook event kind that the dispatcher classifies.
///
/// Any event name outside this set is not an error: it is forwarded to the
/// monorepo target without classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// A comment on a commit.
    CommitComment,
    /// Issue opened, labelled, closed, etc.
    Issues,
    /// A comment on an issue or on a pull request conversation.
    IssueComment,
    /// Pull request lifecycle.
    PullRequest,
    /// A pull request review was submitted, edited or dismissed.
    PullRequestReview,
    /// A comment on a pull request diff.
    PullRequestReviewComment,
    /// A pull request review thread was resolved or unresolved.
    PullRequestReviewThread,
    /// Commits or tags were pushed.
    Push,
    /// A release was published, edited, etc.
    Release,
}

impl EventCategory {
    /// Every checked category.
    pub const ALL: [EventCategory; 9] = [
        EventCategory::CommitComment,
        EventCategory::Issues,
        EventCategory::IssueComment,
        EventCategory::PullRequest,
        EventCategory::PullRequestReview,
        EventCategory::PullRequestReviewComment,
        EventCategory::PullRequestReviewThread,
        EventCategory::Push,
        EventCategory::Release,
    ];

    /// Parses the value of the `X-GitHub-Event` header.
    ///
    /// Returns `None` for event kinds that are not classified.
    pub fn from_event_name(name: &str) -> Option<Self> {
        let category = match name {
            "commit_comment" => EventCategory::CommitComment,
            "issues" => EventCategory::Issues,
            "issue_comment" => EventCategory::IssueComment,
            "pull_request" => EventCategory::PullRequest,
            "pull_request_review" => EventCategory::PullRequestReview,
            "pull_request_review_comment" => EventCategory::PullRequestReviewComment,
            "pull_request_review_thread" => EventCategory::PullRequestReviewThread,
            "push" => EventCategory::Push,
            "release" => EventCategory::Release,
            _ => return None,
        };
        Some(category)
    }

    /// The GitHub event name of this category.
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::CommitComment => "commit_comment",
            EventCategory::Issues => "issues",
            EventCategory::IssueComment => "issue_comment",
            EventCategory::PullRequest => "pull_request",
            EventCategory::PullRequestReview => "pull_request_review",
            EventCategory::PullRequestReviewComment => "pull_request_review_comment",
            EventCategory::PullRequestReviewThread => "pull_request_review_thread",
            EventCategory::Push => "push",
            EventCategory::Release => "release",
        }
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_round_trip() {
        for category in EventCategory::ALL {
            assert_eq!(EventCategory::from_event_name(category.as_str()), Some(category));
        }
    }

    #[test]
    fn unchecked_names_are_not_categories() {
        for name in ["star", "fork", "workflow_run", "ping", "", "Push"] {
            assert_eq!(EventCategory::from_event_name(name), None, "{name}");
        }
    }
}
