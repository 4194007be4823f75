//! Core in-memory store data structures.
//!
//! This module contains the inner store structure that holds all data
//! and is wrapped in `Arc<RwLock<>>` for thread safety.

use super::ranking::{compute_rank, sort_by_rank};
use crate::domain::snapshot::{SnapshotDocument, SnapshotPost, SnapshotVote};
use crate::domain::{FeedQuery, NewPost, Post, PostId, PostSummary, StoreStats, Vote, VotePolicy};
use crate::error::{Error, Result};
use crate::id_generation::{IdGenerator, IdGeneratorConfig};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Inner store structure (not thread-safe).
///
/// Posts and votes are kept in insertion order. The index maps hold
/// positions into those vectors and are updated on every insert, so derived
/// reads never scan more than one post's votes or one parent's comments.
pub(crate) struct StoreInner {
    /// Posts in insertion order
    pub(super) posts: Vec<Post>,

    /// Position of each post in `posts`
    pub(super) post_index: HashMap<PostId, usize>,

    /// Votes in insertion order, superseded ones included
    pub(super) votes: Vec<Vote>,

    /// Positions in `votes` for each post, in insertion order
    pub(super) votes_by_post: HashMap<PostId, Vec<usize>>,

    /// Positions in `posts` of each parent's comments, in insertion order
    pub(super) comments_by_parent: HashMap<PostId, Vec<usize>>,

    /// ID generator for creating new post IDs
    pub(super) id_generator: IdGenerator,

    /// Repeat-vote handling
    pub(super) policy: VotePolicy,

    /// Prefix for post IDs (e.g., "dodel")
    prefix: String,
}

impl StoreInner {
    /// Create a new empty store
    pub(crate) fn new(prefix: String, policy: VotePolicy) -> Self {
        let config = IdGeneratorConfig {
            prefix: prefix.clone(),
            database_size: 0,
        };

        Self {
            posts: Vec::new(),
            post_index: HashMap::new(),
            votes: Vec::new(),
            votes_by_post: HashMap::new(),
            comments_by_parent: HashMap::new(),
            id_generator: IdGenerator::new(config),
            policy,
            prefix,
        }
    }

    /// An empty store with the same prefix and policy.
    pub(super) fn empty_like(&self) -> Self {
        Self::new(self.prefix.clone(), self.policy)
    }

    pub(super) fn post(&self, id: &PostId) -> Option<&Post> {
        self.post_index.get(id).map(|&i| &self.posts[i])
    }

    pub(super) fn contains(&self, id: &PostId) -> bool {
        self.post_index.contains_key(id)
    }

    /// Append a post and index it. The ID must not be present yet.
    pub(super) fn insert_post(&mut self, post: Post) {
        let position = self.posts.len();
        if let Some(parent) = &post.parent {
            self.comments_by_parent
                .entry(parent.clone())
                .or_default()
                .push(position);
        }
        self.id_generator.register_id(post.id.as_str().to_string());
        self.post_index.insert(post.id.clone(), position);
        self.posts.push(post);
    }

    /// Append a vote and index it. The target post must exist.
    pub(super) fn insert_vote(&mut self, vote: Vote) {
        let position = self.votes.len();
        self.votes_by_post
            .entry(vote.post_id.clone())
            .or_default()
            .push(position);
        self.votes.push(vote);
    }

    fn votes_on<'a>(&'a self, post_id: &PostId) -> impl DoubleEndedIterator<Item = &'a Vote> + 'a {
        self.votes_by_post
            .get(post_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.votes[i])
    }

    /// Every stored vote on a post, in insertion order.
    pub(super) fn vote_history(&self, post_id: &PostId) -> Vec<Vote> {
        self.votes_on(post_id).cloned().collect()
    }

    /// The direction of `user`'s most recent vote on a post.
    pub(super) fn standing_vote(&self, post_id: &PostId, user: &str) -> Option<bool> {
        self.votes_on(post_id)
            .rev()
            .find(|vote| vote.author == user)
            .map(|vote| vote.upvote)
    }

    /// Standing up-voters minus standing down-voters.
    pub(super) fn net_votes(&self, post_id: &PostId) -> i64 {
        let mut standing: HashMap<&str, bool> = HashMap::new();
        for vote in self.votes_on(post_id) {
            standing.insert(vote.author.as_str(), vote.upvote);
        }
        standing
            .values()
            .map(|&upvote| if upvote { 1 } else { -1 })
            .sum()
    }

    pub(super) fn comment_count(&self, post_id: &PostId) -> usize {
        self.comments_by_parent.get(post_id).map_or(0, Vec::len)
    }

    pub(super) fn karma(&self, user: &str) -> i64 {
        self.posts
            .iter()
            .filter(|post| post.author == user)
            .map(|post| self.net_votes(&post.id))
            .sum()
    }

    /// Top-level posts within the query's age and rank bounds, best first.
    pub(super) fn feed(&self, query: &FeedQuery, now: DateTime<Utc>) -> Vec<Post> {
        let mut ranked: Vec<(f64, &Post)> = self
            .posts
            .iter()
            .filter(|post| !post.is_comment() && post.age(now) <= query.max_age)
            .map(|post| (compute_rank(post.created_at, self.net_votes(&post.id), now), post))
            .filter(|(rank, _)| *rank >= query.min_rank)
            .collect();

        sort_by_rank(&mut ranked);

        ranked
            .into_iter()
            .take(query.limit)
            .map(|(_, post)| post.clone())
            .collect()
    }

    /// Direct comments on a post, oldest first.
    pub(super) fn comments(&self, post_id: &PostId) -> Vec<Post> {
        let mut comments: Vec<Post> = self
            .comments_by_parent
            .get(post_id)
            .into_iter()
            .flatten()
            .map(|&i| self.posts[i].clone())
            .collect();
        comments.sort_by_key(|post| post.created_at);
        comments
    }

    pub(super) fn summary(&self, post: Post) -> PostSummary {
        PostSummary {
            net_votes: self.net_votes(&post.id),
            comment_count: self.comment_count(&post.id),
            post,
        }
    }

    pub(super) fn stats(&self) -> StoreStats {
        let comments = self.posts.iter().filter(|post| post.is_comment()).count();
        let authors: HashSet<&str> = self.posts.iter().map(|post| post.author.as_str()).collect();

        StoreStats {
            posts: self.posts.len(),
            top_level: self.posts.len() - comments,
            comments,
            votes: self.votes.len(),
            authors: authors.len(),
        }
    }

    /// Capture the whole state with derived counters filled in.
    pub(super) fn export(&self) -> SnapshotDocument {
        SnapshotDocument {
            posts: self
                .posts
                .iter()
                .map(|post| {
                    SnapshotPost::from_post(
                        post,
                        self.net_votes(&post.id),
                        self.comment_count(&post.id),
                    )
                })
                .collect(),
            votes: self.votes.iter().map(SnapshotVote::from_vote).collect(),
        }
    }

    /// Update the ID generator's database size if we've crossed a threshold.
    ///
    /// ID length changes at 500 and 1500 posts, so the generator is only
    /// rebuilt when crossing one of those boundaries.
    pub(super) fn update_id_generator_if_needed(&mut self) {
        let current_size = self.posts.len();
        let old_size = self.id_generator.database_size();

        let needs_update = matches!(
            (old_size, current_size),
            (0..=500, 501..) | (0..=1500, 1501..)
        );

        if needs_update {
            self.id_generator = IdGenerator::new(IdGeneratorConfig {
                prefix: self.prefix.clone(),
                database_size: current_size,
            });

            for post in &self.posts {
                self.id_generator.register_id(post.id.as_str().to_string());
            }
        }
    }

    /// Generate a new unique ID for a post
    pub(super) fn generate_id(&mut self, new_post: &NewPost) -> Result<PostId> {
        self.update_id_generator_if_needed();

        let id_str = self
            .id_generator
            .generate(
                &new_post.author,
                &new_post.text,
                new_post.parent.as_ref().map(PostId::as_str),
            )
            .map_err(|e| Error::Storage(format!("ID generation failed: {e}")))?;

        Ok(PostId::new(id_str))
    }
}
