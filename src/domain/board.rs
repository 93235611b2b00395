use crate::{
    domain::{
        filter::IssueFilter,
        issue::{Issue, IssueStatus},
        scoring::sort_by_priority,
    },
    error::{BoardError, Result},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Configuration for a board column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub status: IssueStatus,
}

impl Column {
    pub fn new(name: String, status: IssueStatus) -> Self {
        Self { name, status }
    }

    /// Column titled after its status
    pub fn for_status(status: IssueStatus) -> Self {
        Self::new(status.to_string(), status)
    }
}

/// Board configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    pub columns: Vec<Column>,
}

impl BoardConfig {
    /// Each status may back at most one column
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.status) {
                return Err(BoardError::ConfigError(format!(
                    "board '{}' has more than one column for status '{}'",
                    self.name, column.status
                )));
            }
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            name: "Issues".to_string(),
            columns: IssueStatus::ALL.into_iter().map(Column::for_status).collect(),
        }
    }
}

/// One rendered column: its configuration and the issues it shows, most
/// urgent first
#[derive(Debug, Clone)]
pub struct ColumnView {
    pub column: Column,
    pub issues: Vec<Issue>,
}

impl ColumnView {
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Kanban board layout
#[derive(Debug, Clone, Default)]
pub struct Board {
    config: BoardConfig,
}

impl Board {
    pub fn new(config: BoardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Gets the column configuration for a status
    pub fn get_column_for_status(&self, status: &IssueStatus) -> Option<&Column> {
        self.config.columns.iter().find(|col| &col.status == status)
    }

    /// Filters, groups and ranks issues into the configured columns.
    ///
    /// Every column is sorted against the same `now`. Issues whose status
    /// has no configured column are left out.
    pub fn arrange(&self, issues: &[Issue], filter: &IssueFilter, now: DateTime<Utc>) -> Vec<ColumnView> {
        let matching: Vec<Issue> = issues
            .iter()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect();
        let mut grouped = group_by_status(matching, now);

        self.config
            .columns
            .iter()
            .map(|column| ColumnView {
                column: column.clone(),
                issues: grouped.remove(&column.status).unwrap_or_default(),
            })
            .collect()
    }
}

/// Partitions issues by status and ranks each partition.
///
/// Every status is present in the result, possibly with an empty list.
/// Cross-partition order carries no meaning.
pub fn group_by_status<I>(issues: I, now: DateTime<Utc>) -> HashMap<IssueStatus, Vec<Issue>>
where
    I: IntoIterator<Item = Issue>,
{
    let mut grouped: HashMap<IssueStatus, Vec<Issue>> = IssueStatus::ALL
        .into_iter()
        .map(|status| (status, Vec::new()))
        .collect();

    for issue in issues {
        grouped.entry(issue.status).or_default().push(issue);
    }

    for column in grouped.values_mut() {
        sort_by_priority(column, now);
    }

    grouped
}
