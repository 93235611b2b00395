use crate::{
    domain::{Issue, IssueId, IssuePatch, RecentlyViewed},
    error::Result,
    storage::{patch_in_place, Storage},
};
use async_trait::async_trait;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, info, instrument, warn};

/// File-based storage implementation.
///
/// Files are replaced atomically: new contents go to a sibling temp file
/// that is then renamed over the target, so readers never see a truncated
/// file.
pub struct FileStorage {
    root_path: PathBuf,
    // held for every access to the issues file
    issues_lock: Mutex<()>,
    fallback: Option<Arc<dyn Storage>>,
}

impl FileStorage {
    pub const DATA_DIR: &'static str = ".issue-board";
    const ISSUES_FILE: &'static str = "issues.json";
    const RECENT_FILE: &'static str = "recent.json";

    /// Creates a new FileStorage instance for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self::with_data_dir(project_root.as_ref().join(Self::DATA_DIR))
    }

    /// Creates a FileStorage that keeps its files directly in `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_path: data_dir.into(),
            issues_lock: Mutex::new(()),
            fallback: None,
        }
    }

    /// Reseeds the issue cache from `fallback` whenever the cache file is
    /// missing or cannot be parsed
    pub fn with_fallback(mut self, fallback: Arc<dyn Storage>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.root_path
    }

    fn issues_file(&self) -> PathBuf {
        self.root_path.join(Self::ISSUES_FILE)
    }

    fn recent_file(&self) -> PathBuf {
        self.root_path.join(Self::RECENT_FILE)
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    async fn write_atomically(&self, path: &Path, contents: String) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).await?;
        fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    /// Reads the cache file; `None` when it does not exist.
    ///
    /// Callers hold `issues_lock`.
    async fn read_cached_issues(&self) -> Result<Option<Vec<Issue>>> {
        let issues_file = self.issues_file();

        if !issues_file.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&issues_file).await?;
        serde_json::from_str(&contents).map(Some).map_err(|err| {
            error!(path = %issues_file.display(), %err, "failed to parse issues file");
            err.into()
        })
    }

    /// Reads the cache, falling back to the reseed source when configured.
    ///
    /// Callers hold `issues_lock`.
    async fn read_issues(&self) -> Result<Vec<Issue>> {
        let cached = self.read_cached_issues().await;

        match (cached, &self.fallback) {
            (Ok(Some(issues)), _) => Ok(issues),
            (Ok(None), None) => {
                debug!("no issues file, starting empty");
                Ok(Vec::new())
            }
            (Ok(None), Some(fallback)) => self.reseed(fallback.as_ref()).await,
            (Err(err), Some(fallback)) => {
                warn!(%err, "issue cache unreadable, reseeding from fallback");
                self.reseed(fallback.as_ref()).await
            }
            (Err(err), None) => Err(err),
        }
    }

    /// Callers hold `issues_lock`.
    async fn reseed(&self, fallback: &dyn Storage) -> Result<Vec<Issue>> {
        let issues = fallback.load_issues().await?;
        self.write_issues(&issues).await?;
        info!(count = issues.len(), "reseeded issue cache");
        Ok(issues)
    }

    /// Callers hold `issues_lock`.
    async fn write_issues(&self, issues: &[Issue]) -> Result<()> {
        let json = serde_json::to_string_pretty(issues)?;
        self.write_atomically(&self.issues_file(), json).await
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        if !self.issues_file().exists() {
            let _guard = self.issues_lock.lock().await;
            match &self.fallback {
                Some(fallback) => {
                    self.reseed(fallback.as_ref()).await?;
                }
                None => self.write_issues(&[]).await?,
            }
        }

        info!(path = %self.root_path.display(), "initialized issue storage");
        Ok(())
    }

    async fn load_issues(&self) -> Result<Vec<Issue>> {
        let _guard = self.issues_lock.lock().await;
        let issues = self.read_issues().await?;
        debug!(count = issues.len(), "loaded issues");
        Ok(issues)
    }

    async fn save_issues(&self, issues: &[Issue]) -> Result<()> {
        let _guard = self.issues_lock.lock().await;
        self.write_issues(issues).await?;
        debug!(count = issues.len(), "saved issues");
        Ok(())
    }

    #[instrument(skip(self, patch), fields(issue = %id))]
    async fn update_issue(&self, id: &IssueId, patch: &IssuePatch) -> Result<Issue> {
        let _guard = self.issues_lock.lock().await;

        let mut issues = self.read_issues().await?;
        let updated = patch_in_place(&mut issues, id, patch)?;
        self.write_issues(&issues).await?;

        debug!("issue updated");
        Ok(updated)
    }

    async fn load_recent(&self) -> Result<RecentlyViewed> {
        let recent_file = self.recent_file();

        if !recent_file.exists() {
            return Ok(RecentlyViewed::default());
        }

        let contents = fs::read_to_string(&recent_file).await?;
        let recent: RecentlyViewed = serde_json::from_str(&contents)?;

        Ok(recent)
    }

    async fn save_recent(&self, recent: &RecentlyViewed) -> Result<()> {
        let json = serde_json::to_string_pretty(recent)?;
        self.write_atomically(&self.recent_file(), json).await
    }

    async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.issues_file().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{IssueFilter, IssueStatus, Severity},
        error::BoardError,
        storage::MemoryStorage,
    };
    use chrono::Utc;
    use tempfile::TempDir;

    fn issue(id: &str, title: &str) -> Issue {
        Issue::new(
            IssueId::new(id).unwrap(),
            title.to_string(),
            Severity::new(2).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_storage_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(!storage.is_initialized().await);

        storage.initialize().await.unwrap();

        assert!(storage.is_initialized().await);
        assert!(storage.issues_file().exists());
        assert!(storage.load_issues().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_keeps_existing_issues() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.save_issues(&[issue("1", "Keep me")]).await.unwrap();
        storage.initialize().await.unwrap();

        assert_eq!(storage.load_issues().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(storage.load_issues().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_issues_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let issues = vec![
            issue("1", "First").with_tags(["api"]).with_rank(3),
            issue("2", "Second").with_status(IssueStatus::Done),
        ];
        storage.save_issues(&issues).await.unwrap();

        let loaded = storage.load_issues().await.unwrap();
        assert_eq!(loaded, issues);

        let single = storage.load_issue(&IssueId::new("2").unwrap()).await.unwrap();
        assert_eq!(single.status, IssueStatus::Done);
    }

    #[tokio::test]
    async fn test_load_missing_issue() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let result = storage.load_issue(&IssueId::new("404").unwrap()).await;
        assert!(matches!(result, Err(BoardError::IssueNotFound(id)) if id == "404"));
    }

    #[tokio::test]
    async fn test_corrupt_issues_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        std::fs::write(storage.issues_file(), "{ not json").unwrap();

        let result = storage.load_issues().await;
        assert!(matches!(result, Err(BoardError::SerializationError(_))));
    }

    #[tokio::test]
    async fn test_update_issue_persists_patch() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage
            .save_issues(&[issue("1", "First"), issue("2", "Second")])
            .await
            .unwrap();

        let id = IssueId::new("2").unwrap();
        let updated = storage
            .update_issue(&id, &IssuePatch::status(IssueStatus::InProgress))
            .await
            .unwrap();
        assert_eq!(updated.status, IssueStatus::InProgress);

        let reloaded = storage.load_issue(&id).await.unwrap();
        assert_eq!(reloaded.status, IssueStatus::InProgress);
        assert_eq!(reloaded.created_at, updated.created_at);

        let untouched = storage.load_issue(&IssueId::new("1").unwrap()).await.unwrap();
        assert_eq!(untouched.status, IssueStatus::Backlog);
    }

    #[tokio::test]
    async fn test_update_missing_issue() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let result = storage
            .update_issue(&IssueId::new("9").unwrap(), &IssuePatch::rank(1))
            .await;
        assert!(matches!(result, Err(BoardError::IssueNotFound(_))));
    }

    #[tokio::test]
    async fn test_search_issues() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage
            .save_issues(&[
                issue("1", "Login fails").with_assignee("alice"),
                issue("2", "Logout slow").with_tags(["login"]),
                issue("3", "Dark mode"),
            ])
            .await
            .unwrap();

        let results = storage
            .search_issues(&IssueFilter::new().with_query("LOGIN"))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);

        let results = storage
            .search_issues(&IssueFilter::new().with_query("login").with_assignee("alice"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_str(), "1");

        let results = storage
            .search_issues(&IssueFilter::new().with_query("nonexistent"))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_recent_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(storage.load_recent().await.unwrap().is_empty());

        let mut recent = RecentlyViewed::default();
        recent.visit(IssueId::new("1").unwrap(), Utc::now());
        recent.visit(IssueId::new("2").unwrap(), Utc::now());
        storage.save_recent(&recent).await.unwrap();

        let loaded = storage.load_recent().await.unwrap();
        assert_eq!(loaded.entries(), recent.entries());
    }

    #[tokio::test]
    async fn test_custom_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_data_dir(temp_dir.path().join("board-data"));
        storage.initialize().await.unwrap();

        assert!(temp_dir.path().join("board-data").join("issues.json").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_and_loads_never_see_partial_files() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(FileStorage::new(temp_dir.path()));
        let issues: Vec<Issue> = (0..40)
            .map(|n| issue(&n.to_string(), &"long title ".repeat(20)).with_tags(["a", "b", "c"]))
            .collect();
        storage.save_issues(&issues).await.unwrap();

        let writer = {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move {
                for rank in 0..50 {
                    let id = IssueId::new((rank % 40).to_string()).unwrap();
                    storage.update_issue(&id, &IssuePatch::rank(rank)).await.unwrap();
                }
            })
        };
        let reader = {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move {
                for _ in 0..50 {
                    let loaded = storage.load_issues().await.unwrap();
                    assert_eq!(loaded.len(), 40);
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
        assert!(!temp_dir
            .path()
            .join(FileStorage::DATA_DIR)
            .join("issues.json.tmp")
            .exists());
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_reseeded_from_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let fallback = Arc::new(MemoryStorage::seeded(vec![
            issue("1", "Seeded"),
            issue("2", "Also seeded"),
        ]));
        let storage = FileStorage::new(temp_dir.path()).with_fallback(fallback);
        storage.initialize().await.unwrap();
        std::fs::write(storage.issues_file(), "{ not json").unwrap();

        let loaded = storage.load_issues().await.unwrap();
        assert_eq!(loaded.len(), 2);

        let contents = std::fs::read_to_string(storage.issues_file()).unwrap();
        let cached: Vec<Issue> = serde_json::from_str(&contents).unwrap();
        assert_eq!(cached, loaded);
    }

    #[tokio::test]
    async fn test_missing_cache_is_seeded_on_initialize() {
        let temp_dir = TempDir::new().unwrap();
        let fallback = Arc::new(MemoryStorage::seeded(vec![issue("7", "Seeded")]));
        let storage = FileStorage::new(temp_dir.path()).with_fallback(fallback.clone());

        storage.initialize().await.unwrap();

        let loaded = storage.load_issues().await.unwrap();
        assert_eq!(loaded[0].id.as_str(), "7");

        // the cache is authoritative once written
        fallback.save_issues(&[]).await.unwrap();
        assert_eq!(storage.load_issues().await.unwrap().len(), 1);
    }
}
