use crate::domain::issue::IssueId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single visit to an issue's detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentVisit {
    pub id: IssueId,
    pub visited_at: DateTime<Utc>,
}

/// Most-recent-first list of visited issues, bounded by `limit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentlyViewed {
    entries: Vec<RecentVisit>,
    #[serde(skip, default = "RecentlyViewed::default_limit")]
    limit: usize,
}

impl RecentlyViewed {
    pub const DEFAULT_LIMIT: usize = 5;

    fn default_limit() -> usize {
        Self::DEFAULT_LIMIT
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Changes the bound, dropping the oldest entries that no longer fit
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.entries.truncate(limit);
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Moves `id` to the front, stamped with `at`
    pub fn visit(&mut self, id: IssueId, at: DateTime<Utc>) {
        self.entries.retain(|entry| entry.id != id);
        self.entries.insert(0, RecentVisit { id, visited_at: at });
        self.entries.truncate(self.limit);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[RecentVisit] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = &IssueId> {
        self.entries.iter().map(|entry| &entry.id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RecentlyViewed {
    fn default() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }
}
