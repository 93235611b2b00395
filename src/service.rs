//! Observable issue store.
//!
//! [`IssueService`] keeps the last fetched issue set in a `watch` channel so
//! any number of views can subscribe to changes. Mutations are applied to
//! the local snapshot first and written through to storage afterwards; a
//! failed write triggers a refetch that restores the stored state.

use crate::{
    config::Settings,
    domain::{
        Board, ColumnView, Issue, IssueFilter, IssueId, IssuePatch, IssueStatus, Permissions,
        RecentlyViewed,
    },
    error::{BoardError, Result},
    storage::{FileStorage, Storage},
};
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, instrument, warn};

/// Title shown for recently viewed issues missing from the current snapshot
pub const UNKNOWN_ISSUE_TITLE: &str = "Unknown Issue";

/// Snapshot published to subscribers
#[derive(Debug, Clone, Default)]
pub struct IssuesState {
    pub issues: Vec<Issue>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

pub struct IssueService<S: Storage> {
    storage: Arc<S>,
    permissions: Permissions,
    board: Board,
    state: watch::Sender<IssuesState>,
    recent: Mutex<RecentlyViewed>,
}

impl IssueService<FileStorage> {
    /// Opens file-backed storage in the configured data directory and
    /// restores the recently viewed list
    pub async fn open(settings: &Settings) -> Result<Self> {
        let storage = FileStorage::with_data_dir(settings.data_dir.clone());
        storage.initialize().await?;

        let mut service = Self::new(Arc::new(storage), settings.permissions());
        service.recent.get_mut().set_limit(settings.recent_limit);
        service.restore_recent().await?;
        Ok(service)
    }
}

impl<S: Storage + 'static> IssueService<S> {
    pub fn new(storage: Arc<S>, permissions: Permissions) -> Self {
        let (state, _) = watch::channel(IssuesState::default());
        Self {
            storage,
            permissions,
            board: Board::default(),
            state,
            recent: Mutex::new(RecentlyViewed::default()),
        }
    }

    pub fn with_board(mut self, board: Board) -> Self {
        self.board = board;
        self
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Current snapshot
    pub fn state(&self) -> IssuesState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<IssuesState> {
        self.state.subscribe()
    }

    /// Looks an issue up in the current snapshot
    pub fn issue(&self, id: &IssueId) -> Option<Issue> {
        self.state.borrow().issues.iter().find(|issue| &issue.id == id).cloned()
    }

    /// Reloads every issue from storage
    #[instrument(skip(self))]
    pub async fn refetch(&self) -> Result<()> {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = self.storage.load_issues().await;

        match result {
            Ok(issues) => {
                debug!(count = issues.len(), "fetched issues");
                self.state.send_modify(|state| {
                    state.issues = issues;
                    state.loading = false;
                    state.last_sync_at = Some(Utc::now());
                });
                Ok(())
            }
            Err(err) => {
                warn!(%err, "failed to fetch issues");
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Applies `patch` optimistically, then writes it through.
    ///
    /// When the write fails the snapshot is rolled back by refetching and the
    /// write error is returned.
    #[instrument(skip(self, patch), fields(issue = %id))]
    pub async fn update_issue(&self, id: &IssueId, patch: IssuePatch) -> Result<()> {
        if !self.permissions.can_edit {
            return Err(permission_denied("edit issues"));
        }

        self.state.send_modify(|state| {
            if let Some(issue) = state.issues.iter_mut().find(|issue| &issue.id == id) {
                patch.apply(issue);
            }
        });

        match self.storage.update_issue(id, &patch).await {
            Ok(stored) => {
                self.state.send_modify(|state| {
                    if let Some(issue) = state.issues.iter_mut().find(|issue| &issue.id == id) {
                        *issue = stored;
                    }
                });
                Ok(())
            }
            Err(err) => {
                warn!(%err, "update failed, rolling back");
                if let Err(refetch_err) = self.refetch().await {
                    warn!(%refetch_err, "rollback refetch failed");
                }
                Err(err)
            }
        }
    }

    /// Moves an issue to another column
    pub async fn move_issue(&self, id: &IssueId, to: IssueStatus) -> Result<()> {
        if !self.permissions.can_move {
            return Err(permission_denied("move issues"));
        }
        info!(issue = %id, to = %to, "moving issue");
        self.update_issue(id, IssuePatch::status(to)).await
    }

    /// Handles a card dropped on `target`.
    ///
    /// Returns `Ok(false)` when the target is not a column, or when the user
    /// may not move issues, and leaves the issue alone.
    pub async fn drop_on(&self, id: &IssueId, target: &str) -> Result<bool> {
        let Some(to) = IssueStatus::from_drop_target(target) else {
            return Ok(false);
        };
        if !self.permissions.can_move {
            return Ok(false);
        }
        self.move_issue(id, to).await?;
        Ok(true)
    }

    /// Moves an issue to Done
    pub async fn mark_resolved(&self, id: &IssueId) -> Result<()> {
        if !self.permissions.can_mark_resolved {
            return Err(permission_denied("resolve issues"));
        }
        self.update_issue(id, IssuePatch::status(IssueStatus::Done)).await
    }

    /// Sets the manual rank override of an issue
    pub async fn set_rank(&self, id: &IssueId, rank: i64) -> Result<()> {
        if !self.permissions.can_update_priority {
            return Err(permission_denied("change issue ranks"));
        }
        self.update_issue(id, IssuePatch::rank(rank)).await
    }

    /// Arranges the current snapshot into ranked board columns
    pub fn board(&self, filter: &IssueFilter) -> Vec<ColumnView> {
        self.board_at(filter, Utc::now())
    }

    /// Arranges the current snapshot as seen at `now`
    pub fn board_at(&self, filter: &IssueFilter, now: DateTime<Utc>) -> Vec<ColumnView> {
        let state = self.state.borrow();
        self.board.arrange(&state.issues, filter, now)
    }

    /// Loads the persisted recently viewed list, keeping the current limit
    pub async fn restore_recent(&self) -> Result<()> {
        let mut stored = self.storage.load_recent().await?;
        let mut recent = self.recent.lock().await;
        stored.set_limit(recent.limit());
        *recent = stored;
        Ok(())
    }

    /// Records a visit to an issue's detail view and persists the list
    pub async fn visit(&self, id: &IssueId) -> Result<()> {
        let mut recent = self.recent.lock().await;
        recent.visit(id.clone(), Utc::now());
        self.storage.save_recent(&recent).await
    }

    pub async fn clear_recent(&self) -> Result<()> {
        let mut recent = self.recent.lock().await;
        recent.clear();
        self.storage.save_recent(&recent).await
    }

    pub async fn recent(&self) -> RecentlyViewed {
        self.recent.lock().await.clone()
    }

    /// Recently viewed ids paired with their current titles
    pub async fn recent_with_titles(&self) -> Vec<(IssueId, String)> {
        let recent = self.recent.lock().await;
        let state = self.state.borrow();

        recent
            .ids()
            .map(|id| {
                let title = state
                    .issues
                    .iter()
                    .find(|issue| &issue.id == id)
                    .map(|issue| issue.title.clone())
                    .unwrap_or_else(|| UNKNOWN_ISSUE_TITLE.to_string());
                (id.clone(), title)
            })
            .collect()
    }

    /// Refetches immediately and then every `interval` until the returned
    /// handle is aborted or dropped, or the service itself is dropped
    pub fn spawn_polling(self: &Arc<Self>, interval: Duration) -> PollingHandle {
        let service = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(service) = service.upgrade() else {
                    debug!("service dropped, polling stopped");
                    break;
                };
                // failures are already recorded in the published state
                let _ = service.refetch().await;
            }
        });

        PollingHandle { task }
    }
}

/// Background polling task, cancelled when dropped
#[derive(Debug)]
pub struct PollingHandle {
    task: JoinHandle<()>,
}

impl PollingHandle {
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn permission_denied(action: &str) -> BoardError {
    warn!(action, "permission denied");
    BoardError::PermissionDenied {
        action: action.to_string(),
    }
}
