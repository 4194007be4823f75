//! Implementation of the `init` command and the repository configuration.
//!
//! This module handles initialization of a new dodel repository, creating
//! the `.dodel/` directory with a configuration file and an empty snapshot.

use crate::domain::snapshot::SnapshotDocument;
use crate::domain::{
    DEFAULT_FEED_LIMIT, DEFAULT_FEED_MAX_AGE_HOURS, DEFAULT_FEED_MIN_RANK, FeedQuery, VotePolicy,
};
use crate::error::{ConfigError, PersistenceError, Result};
use crate::storage::{DEFAULT_ID_PREFIX, StoreBackend, StoreOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Name of the dodel directory
pub const DODEL_DIR_NAME: &str = ".dodel";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the snapshot file
pub const SNAPSHOT_FILE_NAME: &str = "snapshot.json";

/// Maximum directory depth to traverse when searching for the dodel root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure for dodel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DodelConfig {
    /// Post ID prefix (e.g., "dodel" for "dodel-a3f8")
    #[serde(rename = "id-prefix", default = "default_prefix")]
    pub id_prefix: String,

    /// Snapshot file settings
    pub snapshot: SnapshotConfig,

    /// Voting settings
    #[serde(default)]
    pub voting: VotingConfig,

    /// Feed listing defaults
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Snapshot configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// Path to the snapshot file, relative to the repository root
    pub path: String,

    /// Start empty when the snapshot file is absent instead of failing
    #[serde(default)]
    pub allow_missing: bool,

    /// Seconds between periodic checkpoints for long-running hosts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_secs: Option<u64>,
}

/// Voting configuration section
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VotingConfig {
    /// How a repeat vote by the same user is handled
    #[serde(default)]
    pub policy: VotePolicy,
}

/// Feed configuration section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Maximum number of posts listed
    pub limit: usize,

    /// Posts older than this many hours are not listed
    pub max_age_hours: i64,

    /// Posts ranked below this are not listed
    pub min_rank: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FEED_LIMIT,
            max_age_hours: DEFAULT_FEED_MAX_AGE_HOURS,
            min_rank: DEFAULT_FEED_MIN_RANK,
        }
    }
}

/// Hours as a feed age bound, saturating instead of overflowing.
pub fn max_age_from_hours(hours: i64) -> chrono::Duration {
    chrono::Duration::try_hours(hours).unwrap_or(chrono::Duration::MAX)
}

fn default_prefix() -> String {
    DEFAULT_ID_PREFIX.to_string()
}

impl DodelConfig {
    /// Create a new configuration
    pub fn new(allow_missing: bool) -> Self {
        Self {
            id_prefix: default_prefix(),
            snapshot: SnapshotConfig {
                path: format!("{DODEL_DIR_NAME}/{SNAPSHOT_FILE_NAME}"),
                allow_missing,
                checkpoint_secs: None,
            },
            voting: VotingConfig::default(),
            feed: FeedConfig::default(),
        }
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or
    /// `ConfigError::Invalid` if it does not parse or fails validation.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Invalid(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.id_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("id-prefix cannot be empty".to_string()).into());
        }
        if self.snapshot.path.trim().is_empty() {
            return Err(ConfigError::Invalid("snapshot.path cannot be empty".to_string()).into());
        }
        if self.snapshot.checkpoint_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "snapshot.checkpoint_secs must be at least 1".to_string(),
            )
            .into());
        }
        if self.feed.max_age_hours < 0 {
            return Err(
                ConfigError::Invalid("feed.max_age_hours cannot be negative".to_string()).into(),
            );
        }
        if self.feed.min_rank.is_nan() {
            return Err(ConfigError::Invalid("feed.min_rank must be a number".to_string()).into());
        }
        Ok(())
    }

    /// The snapshot backend, with a relative path resolved against `root_dir`.
    pub fn to_backend(&self, root_dir: &Path) -> StoreBackend {
        let path = Path::new(&self.snapshot.path);
        if path.is_absolute() {
            StoreBackend::Snapshot(path.to_path_buf())
        } else {
            StoreBackend::Snapshot(root_dir.join(path))
        }
    }

    /// Store options derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            prefix: self.id_prefix.clone(),
            policy: self.voting.policy,
            allow_missing: self.snapshot.allow_missing,
        }
    }

    /// The default feed query.
    pub fn feed_query(&self) -> FeedQuery {
        FeedQuery {
            limit: self.feed.limit,
            max_age: max_age_from_hours(self.feed.max_age_hours),
            min_rank: self.feed.min_rank,
        }
    }

    /// Interval for periodic checkpoints, if configured.
    pub fn checkpoint_interval(&self) -> Option<Duration> {
        self.snapshot.checkpoint_secs.map(Duration::from_secs)
    }
}

impl Default for DodelConfig {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created dodel directory
    pub dodel_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created snapshot file
    pub snapshot_file: PathBuf,
}

/// Initialize a new dodel repository in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.dodel/` directory already exists
/// - File system operations fail
pub async fn init(base_dir: &Path, allow_missing: bool) -> Result<InitResult> {
    let dodel_dir = base_dir.join(DODEL_DIR_NAME);

    if is_initialized(base_dir) {
        return Err(ConfigError::AlreadyInitialized(dodel_dir).into());
    }

    fs::create_dir_all(&dodel_dir).await?;

    let config_file = dodel_dir.join(CONFIG_FILE_NAME);
    let config = DodelConfig::new(allow_missing);
    config.save(&config_file).await?;

    let snapshot_file = dodel_dir.join(SNAPSHOT_FILE_NAME);
    dodel_snapshot::write_json_atomic(&snapshot_file, &SnapshotDocument::default())
        .await
        .map_err(|e| PersistenceError::writing(&snapshot_file, e))?;

    tracing::info!(path = %dodel_dir.display(), "Initialized dodel repository");

    Ok(InitResult {
        dodel_dir,
        config_file,
        snapshot_file,
    })
}

/// Check if a directory has been initialized with dodel.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(DODEL_DIR_NAME).exists()
}

/// Find the dodel root directory by searching up the directory tree.
///
/// Returns the directory containing `.dodel/`, or `None` if no repository
/// is found within [`MAX_TRAVERSAL_DEPTH`] levels.
pub fn find_dodel_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(DODEL_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
