pub mod board;
pub mod filter;
pub mod issue;
pub mod permissions;
pub mod recent;
pub mod scoring;

pub use board::{Board, BoardConfig, Column, ColumnView};
pub use filter::IssueFilter;
pub use issue::{Issue, IssueId, IssuePatch, IssuePriority, IssueStatus, Severity};
pub use permissions::{Permissions, Role};
pub use recent::{RecentVisit, RecentlyViewed};
pub use scoring::{compare_by_priority, priority_score, sort_by_priority};
