//! Issue and issue-comment events: attributed by package labels.

use crate::disambiguation::{scan, Scan};
use crate::payloads::{IssueEvent, Label};
use crate::{PackageRegistry, Target};

/// Resolves `issues` and `issue_comment` events from the issue's labels.
#[derive(Debug, Clone, Copy)]
pub struct IssueResolver<'a> {
    registry: &'a PackageRegistry,
}

impl<'a> IssueResolver<'a> {
    /// Creates a resolver over `registry`.
    pub fn new(registry: &'a PackageRegistry) -> Self {
        Self { registry }
    }

    /// Classifies an issue event.
    pub fn resolve(&self, event: &IssueEvent) -> Target {
        scan_labels(self.registry, &event.issue.labels).into_target()
    }
}

/// Scans `labels` for package labels. Shared with pull requests.
pub(crate) fn scan_labels<'r>(registry: &'r PackageRegistry, labels: &[Label]) -> Scan<'r> {
    scan(registry, |id| {
        let wanted = registry.label_for(id);
        labels.iter().any(|label| label.name == wanted)
    })
}
