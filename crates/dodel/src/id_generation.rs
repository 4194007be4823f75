//! Hash-based post ID generation.
//!
//! Top-level posts get `{prefix}-{hash}` IDs where the hash is a base36
//! encoding of a SHA-256 digest over the post content, the current time and a
//! retry nonce. Comments get hierarchical IDs below their parent
//! (`dodel-a3f8.1`, `dodel-a3f8.2`, `dodel-a3f8.1.1`).
//!
//! The hash length adapts to the size of the store: 4 characters up to 500
//! posts, 5 up to 1,500 and 6 beyond that.
//!
//! # Example
//!
//! ```
//! use dodel::id_generation::{IdGenerator, IdGeneratorConfig};
//!
//! let mut generator = IdGenerator::new(IdGeneratorConfig {
//!     prefix: "dodel".to_string(),
//!     database_size: 0,
//! });
//!
//! let id = generator.generate("alice", "hello", None).unwrap();
//! assert!(id.starts_with("dodel-"));
//!
//! let reply = generator.generate("bob", "hi alice", Some(&id)).unwrap();
//! assert_eq!(reply, format!("{id}.1"));
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Unable to generate a unique ID after exhausting all nonces and length increases
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonces tried
        attempts: u32,
    },

    /// Invalid length parameter
    #[error("Length must be greater than 0")]
    InvalidLength,
}

/// Configuration for ID generation
#[derive(Debug, Clone)]
pub struct IdGeneratorConfig {
    /// Prefix for all IDs (e.g., "dodel")
    pub prefix: String,

    /// Current number of posts (affects adaptive length)
    pub database_size: usize,
}

/// Hash-based ID generator with collision detection.
///
/// Every generated or registered ID is remembered so later IDs never collide
/// with it, including IDs restored from a snapshot.
pub struct IdGenerator {
    config: IdGeneratorConfig,
    existing_ids: HashSet<String>,
    child_counters: HashMap<String, u32>,
}

impl IdGenerator {
    /// Create a new ID generator with the given configuration
    pub fn new(config: IdGeneratorConfig) -> Self {
        Self {
            config,
            existing_ids: HashSet::new(),
            child_counters: HashMap::new(),
        }
    }

    /// Register an existing ID to prevent collisions
    pub fn register_id(&mut self, id: String) {
        self.existing_ids.insert(id);
    }

    /// Number of posts the adaptive length is currently based on
    pub fn database_size(&self) -> usize {
        self.config.database_size
    }

    /// Generate a new unique ID.
    ///
    /// With `parent_id` set, the result is the next free child slot of that
    /// parent.
    ///
    /// # Errors
    ///
    /// Returns an error if every nonce collides at the maximum length.
    pub fn generate(
        &mut self,
        author: &str,
        text: &str,
        parent_id: Option<&str>,
    ) -> Result<String, IdGenerationError> {
        if let Some(parent) = parent_id {
            return Ok(self.generate_child_id(parent));
        }

        let id_length = self.adaptive_length();

        for nonce in 0..MAX_NONCE {
            let id = self.generate_hash_id(author, text, nonce, id_length)?;

            if !self.existing_ids.contains(&id) {
                if nonce > 0 {
                    debug!(nonce, id_length, "Generated unique ID after collision retries");
                }
                self.existing_ids.insert(id.clone());
                return Ok(id);
            }
        }

        if id_length < 6 {
            warn!(
                id_length,
                max_nonce = MAX_NONCE,
                "All nonces exhausted, increasing ID length"
            );
            let longer_id = self.generate_hash_id(author, text, 0, id_length + 1)?;
            if !self.existing_ids.contains(&longer_id) {
                self.existing_ids.insert(longer_id.clone());
                return Ok(longer_id);
            }
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }

    /// Next free `{parent}.{n}` slot.
    ///
    /// Counters are not persisted, so slots taken by restored IDs are
    /// skipped rather than reused.
    fn generate_child_id(&mut self, parent_id: &str) -> String {
        let counter = self
            .child_counters
            .entry(parent_id.to_string())
            .or_insert(0);

        loop {
            *counter += 1;
            let child_id = format!("{parent_id}.{counter}");
            if self.existing_ids.insert(child_id.clone()) {
                return child_id;
            }
        }
    }

    fn generate_hash_id(
        &self,
        author: &str,
        text: &str,
        nonce: u32,
        length: usize,
    ) -> Result<String, IdGenerationError> {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let content = format!("{author}|{text}|{timestamp}|{nonce}");

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash_bytes = hasher.finalize();

        let hash_str = encode_base36(&hash_bytes[..8], length)?;

        Ok(format!("{}-{}", self.config.prefix, hash_str))
    }

    /// - 0-500 posts: 4 chars
    /// - 501-1,500: 5 chars
    /// - 1,501+: 6 chars
    fn adaptive_length(&self) -> usize {
        match self.config.database_size {
            0..=500 => 4,
            501..=1500 => 5,
            _ => 6,
        }
    }
}

/// Encode the first (at most 8) bytes as a fixed-length base36 string.
fn encode_base36(bytes: &[u8], length: usize) -> Result<String, IdGenerationError> {
    if length == 0 {
        return Err(IdGenerationError::InvalidLength);
    }

    let mut n: u64 = 0;
    for &byte in bytes.iter().take(8) {
        n = n.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    let mut result = Vec::with_capacity(length);
    while result.len() < length {
        result.push(char::from(BASE36_CHARS[(n % 36) as usize]));
        n /= 36;
    }
    result.reverse();

    Ok(result.into_iter().collect())
}

/// Check that `id` looks like a generated ID for `prefix`.
///
/// Valid formats are `{prefix}-{hash}` and `{prefix}-{hash}.{n}[.{n}...]`.
pub fn validate_id(id: &str, prefix: &str) -> bool {
    let Some(after_prefix) = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    let mut parts = after_prefix.split('.');
    let hash = parts.next().unwrap_or_default();
    if !(4..=6).contains(&hash.len()) || !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    parts.all(|part| part.parse::<u32>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(size: usize) -> IdGenerator {
        IdGenerator::new(IdGeneratorConfig {
            prefix: "dodel".to_string(),
            database_size: size,
        })
    }

    #[test]
    fn test_base36_encoding() {
        let result = encode_base36(&[0x12, 0x34, 0x56, 0x78], 4).unwrap();
        assert_eq!(result.len(), 4);
        assert!(result.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(matches!(
            encode_base36(&[1], 0),
            Err(IdGenerationError::InvalidLength)
        ));
    }

    #[test]
    fn test_adaptive_length() {
        assert_eq!(generator(100).adaptive_length(), 4);
        assert_eq!(generator(800).adaptive_length(), 5);
        assert_eq!(generator(2000).adaptive_length(), 6);
    }

    #[test]
    fn test_id_generation() {
        let id = generator(0).generate("alice", "hello", None).unwrap();
        assert!(validate_id(&id, "dodel"), "unexpected id {id}");
    }

    #[test]
    fn test_same_content_yields_distinct_ids() {
        let mut generator = generator(0);
        let ids: HashSet<_> = (0..50)
            .map(|_| generator.generate("alice", "same", None).unwrap())
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_child_ids_count_up_per_parent() {
        let mut generator = generator(0);
        let parent = generator.generate("alice", "parent", None).unwrap();

        let first = generator.generate("bob", "c1", Some(&parent)).unwrap();
        let second = generator.generate("carol", "c2", Some(&parent)).unwrap();
        let nested = generator.generate("dave", "c3", Some(&first)).unwrap();

        assert_eq!(first, format!("{parent}.1"));
        assert_eq!(second, format!("{parent}.2"));
        assert_eq!(nested, format!("{parent}.1.1"));
        assert!(validate_id(&nested, "dodel"));
    }

    #[test]
    fn test_child_ids_skip_registered_slots() {
        let mut generator = generator(0);
        generator.register_id("dodel-abcd.1".to_string());
        generator.register_id("dodel-abcd.2".to_string());

        let next = generator.generate("bob", "c", Some("dodel-abcd")).unwrap();
        assert_eq!(next, "dodel-abcd.3");
    }

    #[test]
    fn test_id_validation() {
        assert!(validate_id("dodel-a3f8", "dodel"));
        assert!(validate_id("dodel-abc123", "dodel"));
        assert!(validate_id("dodel-a3f8.1.2", "dodel"));

        assert!(!validate_id("invalid", "dodel"));
        assert!(!validate_id("dodel-", "dodel"));
        assert!(!validate_id("dodel-ab", "dodel"));
        assert!(!validate_id("dodel-abcdefg", "dodel"));
        assert!(!validate_id("dodel-a3f8.x", "dodel"));
        assert!(!validate_id("other-a3f8", "dodel"));
    }
}
