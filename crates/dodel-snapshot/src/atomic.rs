//! Atomic snapshot writes.
//!
//! On POSIX systems a rename within one filesystem is atomic. Writes go to a
//! sibling file with a `.tmp` extension which is flushed, synced and then
//! renamed over the target path:
//!
//! 1. The value is serialized in memory (encode errors never touch disk)
//! 2. The bytes are written to `{path}.tmp` and synced
//! 3. `{path}.tmp` is renamed to `{path}`
//!
//! A crash during step 2 leaves the previous snapshot intact.
//!
//! # Examples
//!
//! ```no_run
//! use dodel_snapshot::write_json_atomic;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct State {
//!     posts: Vec<String>,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = State { posts: vec!["hello".to_string()] };
//! write_json_atomic("snapshot.json", &state).await?;
//! # Ok(())
//! # }
//! ```

use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

/// Atomically writes `value` as a single JSON document to `path`.
///
/// The document is written compactly and terminated by a newline.
///
/// # Errors
///
/// Returns an error if:
/// - `value` fails to serialize
/// - The temporary file cannot be created or written
/// - The rename fails (e.g., cross-filesystem move)
///
/// On failure the original file (if any) is left unchanged and the temporary
/// file is removed on a best-effort basis.
pub async fn write_json_atomic<T, P>(path: P, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');

    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, &bytes).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), bytes = bytes.len(), "Wrote snapshot");
    Ok(())
}

/// Creates a temporary file path for atomic write operations.
///
/// `snapshot.json` becomes `snapshot.json.tmp`; a path without an extension
/// gets `.tmp` appended.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file(temp_path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(temp_path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes).await?;
    writer.flush().await?;
    writer.get_ref().sync_all().await?;
    Ok(())
}
