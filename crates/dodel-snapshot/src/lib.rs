//! Crash-safe JSON snapshot files.
//!
//! A snapshot is a single JSON document written with the
//! temp-file-then-rename pattern, so readers never observe a half-written
//! file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;

pub use atomic::write_json_atomic;
pub use error::{Error, Result};
pub use reader::{read_json, read_json_if_exists};
