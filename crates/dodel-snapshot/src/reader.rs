//! Snapshot reads.

use crate::Result;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Reads and decodes the JSON document at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read (including
/// when it does not exist) and [`Error::Json`](crate::Error::Json) if its
/// contents do not decode as `T`.
pub async fn read_json<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read snapshot");
    Ok(serde_json::from_slice(&bytes)?)
}

/// Like [`read_json`], but returns `Ok(None)` when the file does not exist.
///
/// Any other IO failure (permissions, a directory at `path`, ...) is still an
/// error.
///
/// # Errors
///
/// See [`read_json`].
pub async fn read_json_if_exists<T, P>(path: P) -> Result<Option<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!(path = %path.display(), bytes = bytes.len(), "Read snapshot");
            Ok(Some(serde_json::from_slice(&bytes)?))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Snapshot does not exist");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Doc {
        posts: Vec<String>,
    }

    #[tokio::test]
    async fn read_json_decodes_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        tokio::fs::write(&path, r#"{"posts":["a","b"]}"#)
            .await
            .unwrap();

        let doc: Doc = read_json(&path).await.unwrap();
        assert_eq!(doc.posts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn read_json_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result: Result<Doc> = read_json(dir.path().join("nope.json")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn read_json_if_exists_returns_none_for_missing_file() {
        let dir = TempDir::new().unwrap();
        let result: Option<Doc> = read_json_if_exists(dir.path().join("nope.json"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn read_json_if_exists_reports_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let result: Result<Option<Doc>> = read_json_if_exists(&path).await;
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
