use crate::domain::issue::{Issue, Severity};

/// Search and filter predicate applied before board grouping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    query: String,
    pub assignee: Option<String>,
    pub severity: Option<Severity>,
}

impl IssueFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text query matched against titles and tags.
    ///
    /// Stored trimmed and lowercased.
    pub fn with_query(mut self, query: &str) -> Self {
        self.set_query(query);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_lowercase();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// True when no criterion is set
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.assignee.is_none() && self.severity.is_none()
    }

    /// Checks an issue against every active criterion
    pub fn matches(&self, issue: &Issue) -> bool {
        self.matches_query(issue) && self.matches_assignee(issue) && self.matches_severity(issue)
    }

    fn matches_query(&self, issue: &Issue) -> bool {
        if self.query.is_empty() {
            return true;
        }

        issue.title.to_lowercase().contains(&self.query)
            || issue
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&self.query))
    }

    fn matches_assignee(&self, issue: &Issue) -> bool {
        match &self.assignee {
            Some(wanted) => issue.assignee.as_deref() == Some(wanted.as_str()),
            None => true,
        }
    }

    fn matches_severity(&self, issue: &Issue) -> bool {
        self.severity.map_or(true, |wanted| issue.severity == wanted)
    }
}
