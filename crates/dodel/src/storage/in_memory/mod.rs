//! In-memory store backend.
//!
//! All posts and votes are held in RAM and are **lost when the process
//! exits** unless saved. It is suitable for:
//!
//! - Tests
//! - Short-lived CLI sessions
//! - The live state of a long-running server, checkpointed to disk
//!
//! # Persistence
//!
//! [`load_from_snapshot`] and [`save_to_snapshot`] move the whole state to
//! and from a JSON snapshot file. The trait's `save()` is a no-op for a bare
//! in-memory store; the snapshot backend created by
//! [`create_store`](crate::storage::create_store) wires both together.
//!
//! # Architecture
//!
//! - `Vec<Post>` and `Vec<Vote>` in insertion order, the authoritative data
//! - `HashMap<PostId, usize>` for O(1) post lookups
//! - `HashMap<PostId, Vec<usize>>` from each post to its votes and from each
//!   parent to its comments, maintained on every insert
//! - Hash-based ID generation with adaptive length (4-6 chars)
//!
//! Rank is never stored. It is computed from `created_at`, the current net
//! vote count and a single `now` per listing (see [`compute_rank`]).
//!
//! # Thread Safety
//!
//! The store is wrapped in `Arc<RwLock<StoreInner>>`. Reads share the lock,
//! submissions and votes take it exclusively, so a listing sees a vote
//! either completely or not at all. No I/O happens while the lock is held.
//!
//! # Performance Characteristics
//!
//! - Submit: O(1) amortized, O(n) when crossing ID length thresholds (500, 1500 posts)
//! - Vote, vote state, net votes: O(v) where v is the number of votes on the post
//! - Karma: O(p + v) over the user's posts and their votes
//! - Feed: O(n log n) over top-level posts

mod inner;
mod ranking;
mod snapshot;
mod trait_impl;

use crate::storage::{PostStore, StoreOptions};
use inner::StoreInner;
use std::sync::Arc;
use tokio::sync::RwLock;

// Re-export public API
pub use ranking::compute_rank;
pub use snapshot::{LoadWarning, load_from_snapshot, save_to_snapshot};
pub(crate) use snapshot::{log_warnings, read_document};

/// Thread-safe in-memory store.
///
/// This type alias wraps the inner store in `Arc<RwLock<>>` for shared
/// async access. It implements [`PostStore`] via the trait implementation
/// in `trait_impl.rs`.
pub(crate) type InMemoryStore = Arc<RwLock<StoreInner>>;

/// Create a new in-memory store.
///
/// # Example
///
/// ```
/// use dodel::domain::NewPost;
/// use dodel::storage::{PostStore, StoreOptions, in_memory::new_in_memory_store};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = new_in_memory_store(&StoreOptions::default());
///     let id = store.submit_post(NewPost::new("alice", "hello")).await.unwrap();
///     assert_eq!(store.net_votes(&id).await.unwrap(), 0);
/// }
/// ```
pub fn new_in_memory_store(options: &StoreOptions) -> Box<dyn PostStore> {
    Box::new(Arc::new(RwLock::new(StoreInner::new(
        options.prefix.clone(),
        options.policy,
    ))))
}
