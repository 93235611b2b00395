//! # Issue Board Core
//!
//! Domain logic for a small issue-tracking board.
//!
//! Issues are fetched as a batch, filtered, grouped by status into board
//! columns and ranked inside each column by a deterministic priority score.
//! The crate has no UI: it exposes the operations a board front end calls
//! and the storage backends those operations persist through.

pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use config::Settings;
pub use domain::{
    board::{Board, BoardConfig, Column, ColumnView},
    filter::IssueFilter,
    issue::{Issue, IssueId, IssuePatch, IssuePriority, IssueStatus, Severity},
    permissions::{Permissions, Role},
    recent::{RecentlyViewed, RecentVisit},
    scoring::{compare_by_priority, priority_score, sort_by_priority},
};
pub use error::{BoardError, Result};
pub use service::{IssueService, IssuesState, PollingHandle};
pub use storage::Storage;
