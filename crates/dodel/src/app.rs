//! Application context for CLI command execution.
//!
//! This module provides the `App` struct that owns the store and the
//! repository configuration for the duration of one CLI invocation.
//!
//! # Example
//!
//! ```no_run
//! use dodel::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let stats = app.store().stats().await?;
//!     println!("{} posts", stats.posts);
//!     Ok(())
//! }
//! ```

use crate::commands::init::{CONFIG_FILE_NAME, DODEL_DIR_NAME, DodelConfig, find_dodel_root};
use crate::error::{ConfigError, Result};
use crate::storage::{PostStore, create_store};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
///
/// The store is loaded from the snapshot named in the configuration when
/// the app is created.
pub struct App {
    /// The store (trait object for polymorphism)
    store: Box<dyn PostStore>,

    /// Path to the dodel directory (.dodel)
    dodel_dir: PathBuf,

    /// Snapshot file backing the store
    snapshot_path: PathBuf,

    /// Loaded configuration
    config: DodelConfig,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("dodel_dir", &self.dodel_dir)
            .field("snapshot_path", &self.snapshot_path)
            .field("config", &self.config)
            .field("store", &"<dyn PostStore>")
            .finish()
    }
}

impl App {
    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree to find a `.dodel/` directory,
    /// loads configuration, and loads the store.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No dodel repository is found in the directory tree
    /// - Configuration cannot be loaded
    /// - The snapshot cannot be loaded
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_dodel_root(working_dir).ok_or(ConfigError::NotInitialized)?;

        let dodel_dir = root_dir.join(DODEL_DIR_NAME);
        let config = DodelConfig::load(&dodel_dir.join(CONFIG_FILE_NAME)).await?;

        let backend = config.to_backend(&root_dir);
        let snapshot_path = backend
            .data_path()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let store = create_store(backend, config.store_options()).await?;

        Ok(Self {
            store,
            dodel_dir,
            snapshot_path,
            config,
        })
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &dyn PostStore {
        self.store.as_ref()
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &DodelConfig {
        &self.config
    }

    /// Get the path to the dodel directory.
    pub fn dodel_dir(&self) -> &Path {
        &self.dodel_dir
    }

    /// Get the path to the snapshot file.
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Save the store to its snapshot.
    ///
    /// This should be called after any mutating operations.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` if the snapshot cannot be written.
    pub async fn save(&self) -> Result<()> {
        self.store.save().await
    }
}
