//! Store abstraction layer for dodel.
//!
//! This module provides the core store trait and factory for creating
//! store backends:
//!
//! - **In-memory**: Ephemeral store, the live state of every backend
//! - **Snapshot**: In-memory store loaded from and saved to a JSON snapshot
//!
//! # Architecture
//!
//! The store is an async trait object (`Box<dyn PostStore>` or
//! `Arc<dyn PostStore>`). Every method takes `&self`; implementations guard
//! their state with a reader/writer lock so one store can be shared by any
//! number of concurrent request handlers.
//!
//! # Test Utilities
//!
//! This module provides a [`MockStore`] implementation for testing code that
//! depends on the [`PostStore`] trait. To use it in your tests, enable the
//! `test-util` feature:
//!
//! ```toml
//! [dev-dependencies]
//! dodel = { version = "...", features = ["test-util"] }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use dodel::domain::{FeedQuery, NewPost};
//! use dodel::storage::{StoreBackend, StoreOptions, create_store};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let store = create_store(StoreBackend::InMemory, StoreOptions::default()).await?;
//!
//!     let id = store.submit_post(NewPost::new("alice", "hello")).await?;
//!     store.cast_vote("bob", &id, true).await?;
//!
//!     for post in store.list_feed(&FeedQuery::default()).await? {
//!         println!("{} {}", post.id, post.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

use crate::domain::snapshot::SnapshotDocument;
use crate::domain::{
    FeedQuery, NewPost, Post, PostId, PostSummary, StoreStats, Vote, VotePolicy, VoteState,
};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub mod checkpoint;
pub mod in_memory;

pub use checkpoint::Checkpointer;
pub use in_memory::LoadWarning;

/// Default prefix for generated post IDs.
pub const DEFAULT_ID_PREFIX: &str = "dodel";

/// Core store trait for posts and votes.
///
/// This trait defines the interface for all store backends. Implementations
/// must be `Send + Sync` to support concurrent access in async contexts.
///
/// # Method Categories
///
/// - **Mutations**: `submit_post`, `cast_vote`
/// - **Derived reads**: `vote_state`, `net_votes`, `comment_count`, `karma`
/// - **Views**: `get_post`, `list_feed`, `list_comments`, `votes`
/// - **Summaries**: `post_summary`, `summarize`, `stats`
/// - **Batch Operations**: `export_snapshot`, `import`
/// - **Persistence**: `save`, `reload`
///
/// # Error Handling
///
/// - `InvalidInput`: blank author, text or voter
/// - `PostNotFound`: the referenced post (or parent) does not exist
/// - `AlreadyVoted`: repeat vote under [`VotePolicy::Strict`]
/// - `Persistence`: snapshot read or write failure
///
/// Derived reads on an unknown post ID return neutral values (`0`,
/// [`VoteState::None`], an empty list) rather than an error.
#[async_trait]
pub trait PostStore: Send + Sync {
    // ========== Mutations ==========

    /// Submit a new post or comment.
    ///
    /// Fields are trimmed; the post gets a fresh ID and `created_at = now`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if the author or text is blank
    /// - `Error::PostNotFound` if the parent does not exist
    async fn submit_post(&self, post: NewPost) -> Result<PostId>;

    /// Cast a vote and return the post's new net vote count.
    ///
    /// Under [`VotePolicy::Overwrite`] a repeat vote supersedes the user's
    /// earlier one; both records are kept.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if the voter is blank
    /// - `Error::PostNotFound` if the post does not exist
    /// - `Error::AlreadyVoted` for a repeat vote under [`VotePolicy::Strict`]
    async fn cast_vote(&self, user: &str, post_id: &PostId, upvote: bool) -> Result<i64>;

    // ========== Derived Reads ==========

    /// The user's standing vote on a post.
    async fn vote_state(&self, post_id: &PostId, user: &str) -> Result<VoteState>;

    /// Standing up-voters minus standing down-voters.
    async fn net_votes(&self, post_id: &PostId) -> Result<i64>;

    /// Number of direct comments on a post.
    async fn comment_count(&self, post_id: &PostId) -> Result<usize>;

    /// Sum of net votes over every post the user authored.
    async fn karma(&self, user: &str) -> Result<i64>;

    // ========== Views ==========

    /// Get a post by ID.
    ///
    /// # Errors
    ///
    /// Returns `Error::PostNotFound` if the post does not exist.
    async fn get_post(&self, id: &PostId) -> Result<Post>;

    /// Ranked feed of top-level posts.
    ///
    /// Keeps posts no older than `max_age` with a rank of at least
    /// `min_rank`, sorted by ascending rank (ties in insertion order) and
    /// truncated to `limit`. Rank is computed with one `now` for the whole
    /// listing.
    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<Post>>;

    /// Direct comments on a post, oldest first. No age or rank filtering.
    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Post>>;

    /// Every vote cast on a post in insertion order, superseded ones included.
    async fn votes(&self, post_id: &PostId) -> Result<Vec<Vote>>;

    // ========== Summaries ==========

    /// A post with its net votes and comment count.
    ///
    /// # Errors
    ///
    /// Returns `Error::PostNotFound` if the post does not exist.
    async fn post_summary(&self, id: &PostId) -> Result<PostSummary>;

    /// Pair each post with its counters, taken under one lock.
    async fn summarize(&self, posts: &[Post]) -> Result<Vec<PostSummary>>;

    /// Aggregate counts over the whole store.
    async fn stats(&self) -> Result<StoreStats>;

    // ========== Batch Operations ==========

    /// Capture the whole state as a snapshot document.
    async fn export_snapshot(&self) -> Result<SnapshotDocument>;

    /// Replace the whole state with a snapshot document.
    ///
    /// Records that cannot be restored are skipped and returned as warnings.
    async fn import(&self, snapshot: SnapshotDocument) -> Result<Vec<LoadWarning>>;

    // ========== Persistence ==========

    /// Write the current state to persistent storage.
    ///
    /// For the snapshot backend this is an atomic file write performed after
    /// the store lock is released. For the bare in-memory store it is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` if the snapshot cannot be written.
    async fn save(&self) -> Result<()>;

    /// Discard in-memory state and re-read persistent storage.
    ///
    /// Used by long-running processes to get back to a consistent state
    /// after a failed `save()`. A no-op for the bare in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` if the snapshot cannot be read.
    async fn reload(&self) -> Result<()>;
}

/// Store backend configuration.
///
/// Determines which store implementation to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-memory store (ephemeral)
    InMemory,

    /// In-memory store backed by a JSON snapshot file
    Snapshot(PathBuf),
}

impl StoreBackend {
    /// Returns the snapshot path for file-backed stores.
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StoreBackend::Snapshot(path) => Some(path),
            StoreBackend::InMemory => None,
        }
    }
}

/// Options shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Prefix for generated post IDs
    pub prefix: String,

    /// Repeat-vote handling
    pub policy: VotePolicy,

    /// Start empty instead of failing when the snapshot file is absent
    pub allow_missing: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ID_PREFIX.to_string(),
            policy: VotePolicy::default(),
            allow_missing: false,
        }
    }
}

/// Wrapper that adds snapshot file persistence to an in-memory store.
struct SnapshotBackedStore {
    inner: Box<dyn PostStore>,
    path: PathBuf,
    allow_missing: bool,
    /// Serializes concurrent saves so they never share a temp file
    save_lock: Mutex<()>,
}

#[async_trait]
impl PostStore for SnapshotBackedStore {
    async fn submit_post(&self, post: NewPost) -> Result<PostId> {
        self.inner.submit_post(post).await
    }

    async fn cast_vote(&self, user: &str, post_id: &PostId, upvote: bool) -> Result<i64> {
        self.inner.cast_vote(user, post_id, upvote).await
    }

    async fn vote_state(&self, post_id: &PostId, user: &str) -> Result<VoteState> {
        self.inner.vote_state(post_id, user).await
    }

    async fn net_votes(&self, post_id: &PostId) -> Result<i64> {
        self.inner.net_votes(post_id).await
    }

    async fn comment_count(&self, post_id: &PostId) -> Result<usize> {
        self.inner.comment_count(post_id).await
    }

    async fn karma(&self, user: &str) -> Result<i64> {
        self.inner.karma(user).await
    }

    async fn get_post(&self, id: &PostId) -> Result<Post> {
        self.inner.get_post(id).await
    }

    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<Post>> {
        self.inner.list_feed(query).await
    }

    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Post>> {
        self.inner.list_comments(post_id).await
    }

    async fn votes(&self, post_id: &PostId) -> Result<Vec<Vote>> {
        self.inner.votes(post_id).await
    }

    async fn post_summary(&self, id: &PostId) -> Result<PostSummary> {
        self.inner.post_summary(id).await
    }

    async fn summarize(&self, posts: &[Post]) -> Result<Vec<PostSummary>> {
        self.inner.summarize(posts).await
    }

    async fn stats(&self) -> Result<StoreStats> {
        self.inner.stats().await
    }

    async fn export_snapshot(&self) -> Result<SnapshotDocument> {
        self.inner.export_snapshot().await
    }

    async fn import(&self, snapshot: SnapshotDocument) -> Result<Vec<LoadWarning>> {
        self.inner.import(snapshot).await
    }

    async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        in_memory::save_to_snapshot(self.inner.as_ref(), &self.path).await
    }

    async fn reload(&self) -> Result<()> {
        let document = in_memory::read_document(&self.path, self.allow_missing).await?;
        let warnings = self.inner.import(document).await?;
        in_memory::log_warnings(&warnings);
        Ok(())
    }
}

/// Create a store for the given backend.
///
/// # Example
///
/// ```no_run
/// use dodel::storage::{StoreBackend, StoreOptions, create_store};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> anyhow::Result<()> {
///     let options = StoreOptions {
///         allow_missing: true,
///         ..StoreOptions::default()
///     };
///     let store = create_store(StoreBackend::Snapshot("snapshot.json".into()), options).await?;
///     store.save().await?;
///     Ok(())
/// }
/// ```
///
/// # Errors
///
/// For the snapshot backend, returns `Error::Persistence` if the file is
/// missing (unless `allow_missing`), unreadable, or not a snapshot document.
/// A failed load is fatal: no partially loaded store is returned.
pub async fn create_store(
    backend: StoreBackend,
    options: StoreOptions,
) -> Result<Box<dyn PostStore>> {
    match backend {
        StoreBackend::InMemory => Ok(in_memory::new_in_memory_store(&options)),
        StoreBackend::Snapshot(path) => {
            let (inner, warnings) = in_memory::load_from_snapshot(&path, &options).await?;
            in_memory::log_warnings(&warnings);

            Ok(Box::new(SnapshotBackedStore {
                inner,
                path,
                allow_missing: options.allow_missing,
                save_lock: Mutex::new(()),
            }))
        }
    }
}

// ========== Test Utilities ==========

/// The hardcoded post ID returned by [`MockStore`].
#[cfg(any(test, feature = "test-util"))]
pub const MOCK_POST_ID: &str = "test-1";

/// Mock implementation of [`PostStore`] for testing.
///
/// A **stateless** mock: it always reports post "test-1" by "alice" and
/// never stores anything.
///
/// # Behavior
///
/// - `submit_post`: Always returns ID "test-1"
/// - `get_post`, `post_summary`: Succeed only for ID "test-1"
/// - `cast_vote`: Returns `1` for "test-1", `PostNotFound` otherwise
/// - Derived reads and views: neutral values and empty lists
/// - `save`, `reload`, `import`: No-ops
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct MockStore;

#[cfg(any(test, feature = "test-util"))]
impl MockStore {
    /// Create a new MockStore instance.
    pub fn new() -> Self {
        Self
    }

    /// The post the mock reports for [`MOCK_POST_ID`].
    pub fn create_test_post(id: PostId) -> Post {
        Post {
            id,
            author: "alice".to_string(),
            parent: None,
            text: "Test post".to_string(),
            color: String::new(),
            created_at: crate::domain::now_seconds(),
        }
    }

    fn lookup(id: &PostId) -> Result<Post> {
        if id.as_str() == MOCK_POST_ID {
            Ok(Self::create_test_post(id.clone()))
        } else {
            Err(crate::error::Error::PostNotFound(id.clone()))
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl PostStore for MockStore {
    async fn submit_post(&self, _post: NewPost) -> Result<PostId> {
        Ok(PostId::new(MOCK_POST_ID))
    }

    async fn cast_vote(&self, _user: &str, post_id: &PostId, _upvote: bool) -> Result<i64> {
        Self::lookup(post_id).map(|_| 1)
    }

    async fn vote_state(&self, _post_id: &PostId, _user: &str) -> Result<VoteState> {
        Ok(VoteState::None)
    }

    async fn net_votes(&self, _post_id: &PostId) -> Result<i64> {
        Ok(0)
    }

    async fn comment_count(&self, _post_id: &PostId) -> Result<usize> {
        Ok(0)
    }

    async fn karma(&self, _user: &str) -> Result<i64> {
        Ok(0)
    }

    async fn get_post(&self, id: &PostId) -> Result<Post> {
        Self::lookup(id)
    }

    async fn list_feed(&self, _query: &FeedQuery) -> Result<Vec<Post>> {
        Ok(vec![])
    }

    async fn list_comments(&self, _post_id: &PostId) -> Result<Vec<Post>> {
        Ok(vec![])
    }

    async fn votes(&self, _post_id: &PostId) -> Result<Vec<Vote>> {
        Ok(vec![])
    }

    async fn post_summary(&self, id: &PostId) -> Result<PostSummary> {
        Ok(PostSummary {
            post: Self::lookup(id)?,
            net_votes: 0,
            comment_count: 0,
        })
    }

    async fn summarize(&self, posts: &[Post]) -> Result<Vec<PostSummary>> {
        Ok(posts
            .iter()
            .cloned()
            .map(|post| PostSummary {
                post,
                net_votes: 0,
                comment_count: 0,
            })
            .collect())
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats::default())
    }

    async fn export_snapshot(&self) -> Result<SnapshotDocument> {
        Ok(SnapshotDocument::default())
    }

    async fn import(&self, _snapshot: SnapshotDocument) -> Result<Vec<LoadWarning>> {
        Ok(vec![])
    }

    async fn save(&self) -> Result<()> {
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        Ok(())
    }
}
