use crate::error::BoardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Opaque, non-empty issue identifier.
///
/// Identifiers are unique within an issue set; the priority comparator
/// relies on that for its final tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct IssueId(String);

impl IssueId {
    /// Wraps an existing identifier, rejecting empty or blank strings
    pub fn new(id: impl Into<String>) -> Result<Self, BoardError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(BoardError::InvalidIssueId(id));
        }
        Ok(Self(id))
    }

    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IssueId {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for IssueId {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issue severity, 1 or greater. Larger is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32")]
pub struct Severity(u32);

impl Severity {
    pub fn new(value: u32) -> Result<Self, BoardError> {
        if value == 0 {
            return Err(BoardError::InvalidSeverity(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Severity {
    type Error = BoardError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Board column an issue lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueStatus {
    Backlog,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl IssueStatus {
    /// All statuses in board order
    pub const ALL: [IssueStatus; 3] = [Self::Backlog, Self::InProgress, Self::Done];

    const DROP_TARGET_PREFIX: &'static str = "column-";

    /// Resolves a column drop identifier such as `column-In Progress`.
    ///
    /// Anything that is not a column target (for example another card)
    /// yields `None`.
    pub fn from_drop_target(target: &str) -> Option<Self> {
        let name = target.strip_prefix(Self::DROP_TARGET_PREFIX)?;
        Self::ALL.into_iter().find(|status| status.as_str() == name)
    }

    /// Drop identifier of the column holding this status
    pub fn drop_target(&self) -> String {
        format!("{}{}", Self::DROP_TARGET_PREFIX, self.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "backlog" => Ok(Self::Backlog),
            "in progress" | "in-progress" | "in_progress" | "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(BoardError::InvalidStatus(s.to_string())),
        }
    }
}

/// Descriptive priority label. Not used by the ranking formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuePriority {
    Low,
    Medium,
    High,
}

impl fmt::Display for IssuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for IssuePriority {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(BoardError::InvalidPriority(s.to_string())),
        }
    }
}

/// A tracked unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_defined_rank: Option<i64>,
}

impl Issue {
    /// Creates a backlog issue of medium priority created now
    pub fn new(id: IssueId, title: String, severity: Severity) -> Self {
        Self {
            id,
            title,
            status: IssueStatus::Backlog,
            priority: IssuePriority::Medium,
            severity,
            created_at: Utc::now(),
            assignee: None,
            tags: Vec::new(),
            user_defined_rank: None,
        }
    }

    pub fn with_status(mut self, status: IssueStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: IssuePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rank(mut self, rank: i64) -> Self {
        self.user_defined_rank = Some(rank);
        self
    }

    /// Rank override contribution, 0 when unset
    pub fn rank_or_default(&self) -> i64 {
        self.user_defined_rank.unwrap_or(0)
    }
}

/// Partial update of an issue.
///
/// `id` and `created_at` are immutable and therefore absent. The doubly
/// optional fields distinguish "leave alone" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub severity: Option<Severity>,
    pub assignee: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub user_defined_rank: Option<Option<i64>>,
}

impl IssuePatch {
    pub fn status(status: IssueStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn rank(rank: i64) -> Self {
        Self {
            user_defined_rank: Some(Some(rank)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrites the fields present in the patch
    pub fn apply(&self, issue: &mut Issue) {
        if let Some(title) = &self.title {
            issue.title = title.clone();
        }
        if let Some(status) = self.status {
            issue.status = status;
        }
        if let Some(priority) = self.priority {
            issue.priority = priority;
        }
        if let Some(severity) = self.severity {
            issue.severity = severity;
        }
        if let Some(assignee) = &self.assignee {
            issue.assignee = assignee.clone();
        }
        if let Some(tags) = &self.tags {
            issue.tags = tags.clone();
        }
        if let Some(rank) = self.user_defined_rank {
            issue.user_defined_rank = rank;
        }
    }
}
