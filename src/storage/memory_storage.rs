use crate::{
    domain::{Issue, IssueId, IssuePatch, RecentlyViewed},
    error::{BoardError, Result},
    storage::{patch_in_place, Storage},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// In-memory storage, used as a stand-in for a remote issue service
#[derive(Default)]
pub struct MemoryStorage {
    issues: RwLock<Vec<Issue>>,
    recent: RwLock<RecentlyViewed>,
    initialized: AtomicBool,
    fail_loads: AtomicBool,
    fail_updates: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an initialized storage holding `issues`
    pub fn seeded(issues: Vec<Issue>) -> Self {
        Self {
            issues: RwLock::new(issues),
            initialized: AtomicBool::new(true),
            ..Self::default()
        }
    }

    /// Makes subsequent issue loads fail with a storage error
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent updates fail with a storage error
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn initialize(&self) -> Result<()> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn load_issues(&self) -> Result<Vec<Issue>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            warn!("rejecting issue load");
            return Err(BoardError::StorageError("issue service unavailable".to_string()));
        }
        Ok(self.issues.read().await.clone())
    }

    async fn save_issues(&self, issues: &[Issue]) -> Result<()> {
        *self.issues.write().await = issues.to_vec();
        Ok(())
    }

    async fn update_issue(&self, id: &IssueId, patch: &IssuePatch) -> Result<Issue> {
        if self.fail_updates.load(Ordering::SeqCst) {
            warn!(issue = %id, "rejecting update");
            return Err(BoardError::StorageError(format!(
                "update of issue {} rejected",
                id
            )));
        }

        let mut issues = self.issues.write().await;
        let updated = patch_in_place(issues.as_mut_slice(), id, patch)?;
        debug!(issue = %id, "issue updated");
        Ok(updated)
    }

    async fn load_recent(&self) -> Result<RecentlyViewed> {
        Ok(self.recent.read().await.clone())
    }

    async fn save_recent(&self, recent: &RecentlyViewed) -> Result<()> {
        *self.recent.write().await = recent.clone();
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}
