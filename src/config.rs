use crate::{
    domain::{Permissions, RecentlyViewed, Role},
    error::{BoardError, Result},
    storage::FileStorage,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::fs;
use tracing::debug;

/// Runtime settings, read from a TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the issue cache and recently viewed list
    pub data_dir: PathBuf,
    /// Seconds between background refetches
    pub poll_interval_secs: u64,
    /// Length of the recently viewed list
    pub recent_limit: usize,
    pub role: Role,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(FileStorage::DATA_DIR),
            poll_interval_secs: 10,
            recent_limit: RecentlyViewed::DEFAULT_LIMIT,
            role: Role::default(),
        }
    }
}

impl Settings {
    pub const FILE_NAME: &'static str = "config.toml";

    /// Reads settings from `path`, falling back to defaults when the file
    /// does not exist
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).await?;
        Self::from_toml(&contents)
    }

    /// Parses and validates settings from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(contents).map_err(|err| BoardError::ConfigError(err.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(BoardError::ConfigError(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn permissions(&self) -> Permissions {
        Permissions::for_role(self.role)
    }
}
