//! Error types for dodel operations.

use crate::domain::PostId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for store and CLI operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Submitted data failed validation (blank author, text or voter).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The referenced post (or parent post) does not exist.
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    /// The user already has a vote on this post and the store runs the
    /// strict voting policy.
    #[error("User '{user}' has already voted on post {post_id}")]
    AlreadyVoted {
        /// The voting user
        user: String,
        /// The post voted on
        post_id: PostId,
    },

    /// Snapshot read, write, encode or decode failure.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal storage failure (e.g., ID generation exhausted).
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Snapshot persistence failures.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The snapshot file does not exist and missing snapshots are not allowed.
    #[error("Snapshot not found: {}", .0.display())]
    Missing(PathBuf),

    /// The snapshot file could not be read or written.
    #[error("Snapshot IO failed for {}: {source}", path.display())]
    Io {
        /// Snapshot path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The snapshot file is not a valid snapshot document.
    #[error("Snapshot {} could not be decoded: {source}", path.display())]
    Decode {
        /// Snapshot path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory state could not be encoded.
    #[error("Snapshot could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

impl PersistenceError {
    /// Map a snapshot-file error for `path` onto the load/decode taxonomy.
    pub(crate) fn reading(path: impl Into<PathBuf>, error: dodel_snapshot::Error) -> Self {
        let path = path.into();
        match error {
            dodel_snapshot::Error::Io(source) => Self::Io { path, source },
            dodel_snapshot::Error::Json(source) => Self::Decode { path, source },
        }
    }

    /// Map a snapshot-file error for `path` onto the save/encode taxonomy.
    pub(crate) fn writing(path: impl Into<PathBuf>, error: dodel_snapshot::Error) -> Self {
        match error {
            dodel_snapshot::Error::Io(source) => Self::Io {
                path: path.into(),
                source,
            },
            dodel_snapshot::Error::Json(source) => Self::Encode(source),
        }
    }
}

/// Configuration and repository-discovery errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.dodel/` directory was found.
    #[error("Not a dodel repository (or any parent directory). Run 'dodel init' first.")]
    NotInitialized,

    /// `init` found an existing `.dodel/` directory.
    #[error("Dodel is already initialized in this directory. Found existing '{}'", .0.display())]
    AlreadyInitialized(PathBuf),

    /// The configuration file could not be parsed or serialized.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A specialized Result type for dodel operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_errors_are_distinguishable() {
        let missing: Error = PersistenceError::Missing(PathBuf::from("db.json")).into();
        assert!(matches!(
            missing,
            Error::Persistence(PersistenceError::Missing(_))
        ));
        assert_eq!(missing.to_string(), "Snapshot not found: db.json");
    }

    #[test]
    fn reading_json_error_becomes_decode() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = PersistenceError::reading("db.json", dodel_snapshot::Error::Json(json_err));
        assert!(matches!(err, PersistenceError::Decode { .. }));
    }

    #[test]
    fn writing_json_error_becomes_encode() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = PersistenceError::writing("db.json", dodel_snapshot::Error::Json(json_err));
        assert!(matches!(err, PersistenceError::Encode(_)));
    }

    #[test]
    fn already_voted_message_names_user_and_post() {
        let err = Error::AlreadyVoted {
            user: "bob".to_string(),
            post_id: PostId::new("dodel-a3f8"),
        };
        assert_eq!(
            err.to_string(),
            "User 'bob' has already voted on post dodel-a3f8"
        );
    }
}
