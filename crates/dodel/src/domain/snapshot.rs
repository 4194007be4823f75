//! Snapshot wire format.
//!
//! A snapshot is one JSON document with two ordered arrays, `posts` and
//! `votes`. Field names match the documents older read-only clients already
//! consume (`topic`, `user`, `timestamp`, `time`), and timestamps are unix
//! seconds.
//!
//! `votes` and `comments` on a post are derived counters written for those
//! clients. They are recomputed on every save and ignored on load.

use super::{Post, PostId, Vote};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The whole persisted state of a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    /// Posts in insertion order
    #[serde(default)]
    pub posts: Vec<SnapshotPost>,

    /// Votes in insertion order
    #[serde(default)]
    pub votes: Vec<SnapshotVote>,
}

/// A post as written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPost {
    /// Post ID
    pub id: String,

    /// Parent post ID, empty for top-level posts
    #[serde(rename = "topic", default)]
    pub parent: String,

    /// Author
    #[serde(rename = "user")]
    pub author: String,

    /// Post body
    pub text: String,

    /// Display color
    #[serde(default)]
    pub color: String,

    /// Creation time, unix seconds
    #[serde(rename = "timestamp")]
    pub created_at: i64,

    /// Net votes at save time
    #[serde(rename = "votes", default)]
    pub net_votes: i64,

    /// Comment count at save time
    #[serde(rename = "comments", default)]
    pub comment_count: usize,
}

/// A vote as written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotVote {
    /// Voting user
    #[serde(rename = "user")]
    pub author: String,

    /// Target post ID
    #[serde(rename = "post")]
    pub post_id: String,

    /// Vote direction
    pub upvote: bool,

    /// Cast time, unix seconds
    #[serde(rename = "time")]
    pub cast_at: i64,
}

fn from_unix(seconds: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| format!("timestamp {seconds} out of range"))
}

impl SnapshotPost {
    /// Encode a post along with its derived counters.
    pub fn from_post(post: &Post, net_votes: i64, comment_count: usize) -> Self {
        Self {
            id: post.id.to_string(),
            parent: post
                .parent
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            author: post.author.clone(),
            text: post.text.clone(),
            color: post.color.clone(),
            created_at: post.created_at.timestamp(),
            net_votes,
            comment_count,
        }
    }

    /// Decode into a domain post.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the ID, author or text is
    /// blank, or the timestamp is out of range.
    pub fn to_post(&self) -> Result<Post, String> {
        if self.id.trim().is_empty() {
            return Err("post id is empty".to_string());
        }
        if self.author.trim().is_empty() {
            return Err("author is empty".to_string());
        }
        if self.text.trim().is_empty() {
            return Err("text is empty".to_string());
        }

        Ok(Post {
            id: PostId::new(self.id.clone()),
            author: self.author.clone(),
            parent: (!self.parent.is_empty()).then(|| PostId::new(self.parent.clone())),
            text: self.text.clone(),
            color: self.color.clone(),
            created_at: from_unix(self.created_at)?,
        })
    }
}

impl SnapshotVote {
    /// Encode a vote.
    pub fn from_vote(vote: &Vote) -> Self {
        Self {
            author: vote.author.clone(),
            post_id: vote.post_id.to_string(),
            upvote: vote.upvote,
            cast_at: vote.cast_at.timestamp(),
        }
    }

    /// Decode into a domain vote.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the voter is blank or the
    /// timestamp is out of range.
    pub fn to_vote(&self) -> Result<Vote, String> {
        if self.author.trim().is_empty() {
            return Err("voter is empty".to_string());
        }

        Ok(Vote {
            post_id: PostId::new(self.post_id.clone()),
            author: self.author.clone(),
            upvote: self.upvote,
            cast_at: from_unix(self.cast_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(parent: Option<&str>) -> Post {
        Post {
            id: PostId::new("dodel-a3f8"),
            author: "alice".to_string(),
            parent: parent.map(PostId::from),
            text: "hello".to_string(),
            color: "blue".to_string(),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn post_uses_legacy_field_names() {
        let encoded = SnapshotPost::from_post(&sample_post(None), 3, 2);
        let json = serde_json::to_value(&encoded).unwrap();

        assert_eq!(json["id"], "dodel-a3f8");
        assert_eq!(json["topic"], "");
        assert_eq!(json["user"], "alice");
        assert_eq!(json["timestamp"], 1_700_000_000);
        assert_eq!(json["votes"], 3);
        assert_eq!(json["comments"], 2);
    }

    #[test]
    fn comment_keeps_parent_through_decode() {
        let encoded = SnapshotPost::from_post(&sample_post(Some("dodel-0001")), 0, 0);
        let decoded = encoded.to_post().unwrap();
        assert_eq!(decoded.parent, Some(PostId::new("dodel-0001")));
        assert_eq!(decoded, sample_post(Some("dodel-0001")));
    }

    #[test]
    fn vote_uses_legacy_field_names() {
        let vote = Vote {
            post_id: PostId::new("dodel-a3f8"),
            author: "bob".to_string(),
            upvote: false,
            cast_at: DateTime::from_timestamp(1_700_000_060, 0).unwrap(),
        };
        let json = serde_json::to_value(SnapshotVote::from_vote(&vote)).unwrap();

        assert_eq!(json["user"], "bob");
        assert_eq!(json["post"], "dodel-a3f8");
        assert_eq!(json["upvote"], false);
        assert_eq!(json["time"], 1_700_000_060);
    }

    #[test]
    fn decode_rejects_blank_author() {
        let mut encoded = SnapshotPost::from_post(&sample_post(None), 0, 0);
        encoded.author = "  ".to_string();
        assert!(encoded.to_post().is_err());
    }

    #[test]
    fn decode_rejects_out_of_range_timestamp() {
        let vote = SnapshotVote {
            author: "bob".to_string(),
            post_id: "dodel-a3f8".to_string(),
            upvote: true,
            cast_at: i64::MAX,
        };
        assert!(vote.to_vote().is_err());
    }

    #[test]
    fn missing_counters_default_to_zero() {
        let json = r#"{"id":"p1","user":"alice","text":"hi","timestamp":1700000000}"#;
        let decoded: SnapshotPost = serde_json::from_str(json).unwrap();
        assert_eq!(decoded.net_votes, 0);
        assert_eq!(decoded.comment_count, 0);
        assert!(decoded.parent.is_empty());
    }
}
