//! Domain types for the post/vote store.
//!
//! Posts and votes are the only two entity kinds. Everything else here
//! (vote state, feed queries, summaries) is a value derived from them.

pub mod snapshot;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of posts returned by a feed listing.
pub const DEFAULT_FEED_LIMIT: usize = 30;

/// Default maximum age of a feed post, in hours.
pub const DEFAULT_FEED_MAX_AGE_HOURS: i64 = 24;

/// Default minimum rank for a post to appear in the feed.
pub const DEFAULT_FEED_MIN_RANK: f64 = -5.0;

/// Current time at whole-second resolution.
///
/// Snapshots store unix seconds, so timestamps are truncated at creation.
/// This keeps orderings identical before and after a save/load cycle.
pub fn now_seconds() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Unique identifier for a post
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostId(pub String);

impl PostId {
    /// Create a new post ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PostId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A submission: either a top-level post or a comment on another post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: PostId,

    /// Submitting user
    pub author: String,

    /// Post this one comments on, `None` for top-level posts
    pub parent: Option<PostId>,

    /// Post body
    pub text: String,

    /// Display color chosen by the author
    pub color: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Whether this post is a comment on another post.
    pub fn is_comment(&self) -> bool {
        self.parent.is_some()
    }

    /// Time elapsed since creation, relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }
}

/// A single up or down vote. Votes are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Post being voted on
    pub post_id: PostId,

    /// Voting user
    pub author: String,

    /// `true` for an upvote, `false` for a downvote
    pub upvote: bool,

    /// When the vote was cast
    pub cast_at: DateTime<Utc>,
}

/// A user's standing vote on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
    /// The user has not voted on the post
    #[default]
    None,

    /// The user's most recent vote is an upvote
    Upvoted,

    /// The user's most recent vote is a downvote
    Downvoted,
}

impl VoteState {
    /// Vote state for a standing vote direction.
    pub fn from_upvote(upvote: bool) -> Self {
        if upvote { Self::Upvoted } else { Self::Downvoted }
    }
}

impl fmt::Display for VoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoteState::None => "none",
            VoteState::Upvoted => "upvoted",
            VoteState::Downvoted => "downvoted",
        };
        write!(f, "{s}")
    }
}

/// How a repeated vote by the same user on the same post is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotePolicy {
    /// A new vote supersedes the user's earlier one
    #[default]
    Overwrite,

    /// A second vote is rejected with `AlreadyVoted`
    Strict,
}

impl fmt::Display for VotePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VotePolicy::Overwrite => write!(f, "overwrite"),
            VotePolicy::Strict => write!(f, "strict"),
        }
    }
}

/// Data for submitting a new post
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    /// Submitting user
    pub author: String,

    /// Post body
    pub text: String,

    /// Display color
    pub color: String,

    /// Post to comment on, if any
    pub parent: Option<PostId>,
}

impl NewPost {
    /// Create a top-level post
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the display color
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Make this post a comment on `parent`
    #[must_use]
    pub fn reply_to(mut self, parent: PostId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Trim every field and check the required ones.
    ///
    /// A parent that is empty after trimming means "top-level".
    ///
    /// # Errors
    ///
    /// Returns a message when the author or text is empty after trimming.
    pub fn normalized(self) -> Result<Self, String> {
        let author = self.author.trim().to_string();
        let text = self.text.trim().to_string();

        if author.is_empty() {
            return Err("author cannot be empty".to_string());
        }
        if text.is_empty() {
            return Err("text cannot be empty".to_string());
        }

        let parent = self
            .parent
            .map(|p| p.as_str().trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PostId::from);

        Ok(Self {
            author,
            text,
            color: self.color.trim().to_string(),
            parent,
        })
    }
}

/// Parameters for a feed listing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedQuery {
    /// Maximum number of posts returned
    pub limit: usize,

    /// Posts older than this are excluded
    pub max_age: Duration,

    /// Posts ranked below this are excluded
    pub min_rank: f64,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FEED_LIMIT,
            max_age: Duration::hours(DEFAULT_FEED_MAX_AGE_HOURS),
            min_rank: DEFAULT_FEED_MIN_RANK,
        }
    }
}

/// A post together with its derived counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    /// The post itself
    #[serde(flatten)]
    pub post: Post,

    /// Net votes at the time the summary was taken
    pub net_votes: i64,

    /// Number of direct comments
    pub comment_count: usize,
}

/// Aggregate counts over the whole store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Total number of posts, comments included
    pub posts: usize,

    /// Posts without a parent
    pub top_level: usize,

    /// Posts with a parent
    pub comments: usize,

    /// Stored vote records, superseded ones included
    pub votes: usize,

    /// Distinct post authors
    pub authors: usize,
}
