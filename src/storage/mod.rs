use crate::{
    domain::{Issue, IssueFilter, IssueId, IssuePatch, RecentlyViewed},
    error::{BoardError, Result},
};
use async_trait::async_trait;

pub mod file_storage;
pub mod memory_storage;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;

/// Storage trait for persisting issues and recently viewed state
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initializes the storage backend
    async fn initialize(&self) -> Result<()>;

    /// Loads every issue
    async fn load_issues(&self) -> Result<Vec<Issue>>;

    /// Replaces the stored issue set
    async fn save_issues(&self, issues: &[Issue]) -> Result<()>;

    /// Loads a single issue by ID
    async fn load_issue(&self, id: &IssueId) -> Result<Issue> {
        self.load_issues()
            .await?
            .into_iter()
            .find(|issue| &issue.id == id)
            .ok_or_else(|| BoardError::IssueNotFound(id.to_string()))
    }

    /// Applies a partial update and returns the updated issue
    async fn update_issue(&self, id: &IssueId, patch: &IssuePatch) -> Result<Issue>;

    /// Returns the issues matching the filter, in storage order
    async fn search_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        Ok(self
            .load_issues()
            .await?
            .into_iter()
            .filter(|issue| filter.matches(issue))
            .collect())
    }

    /// Loads the recently viewed list
    async fn load_recent(&self) -> Result<RecentlyViewed>;

    /// Saves the recently viewed list
    async fn save_recent(&self, recent: &RecentlyViewed) -> Result<()>;

    /// Checks if the storage has been initialized
    async fn is_initialized(&self) -> bool;
}

/// Applies `patch` to the issue with `id` inside `issues`
pub(crate) fn patch_in_place(issues: &mut [Issue], id: &IssueId, patch: &IssuePatch) -> Result<Issue> {
    let issue = issues
        .iter_mut()
        .find(|issue| &issue.id == id)
        .ok_or_else(|| BoardError::IssueNotFound(id.to_string()))?;
    patch.apply(issue);
    Ok(issue.clone())
}
