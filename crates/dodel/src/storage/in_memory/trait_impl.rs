//! PostStore trait implementation for in-memory stores.

use super::InMemoryStore;
use super::snapshot::{LoadWarning, restore};
use crate::domain::snapshot::SnapshotDocument;
use crate::domain::{
    FeedQuery, NewPost, Post, PostId, PostSummary, StoreStats, Vote, VotePolicy, VoteState,
    now_seconds,
};
use crate::error::{Error, Result};
use crate::storage::PostStore;
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

fn voter(user: &str) -> Result<&str> {
    let user = user.trim();
    if user.is_empty() {
        return Err(Error::InvalidInput("voter cannot be empty".to_string()));
    }
    Ok(user)
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn submit_post(&self, new_post: NewPost) -> Result<PostId> {
        let new_post = new_post.normalized().map_err(Error::InvalidInput)?;

        let mut inner = self.write().await;

        if let Some(parent) = &new_post.parent
            && !inner.contains(parent)
        {
            return Err(Error::PostNotFound(parent.clone()));
        }

        let id = inner.generate_id(&new_post)?;
        let post = Post {
            id: id.clone(),
            author: new_post.author,
            parent: new_post.parent,
            text: new_post.text,
            color: new_post.color,
            created_at: now_seconds(),
        };

        debug!(post_id = %id, author = %post.author, comment = post.is_comment(), "Submitted post");
        inner.insert_post(post);

        Ok(id)
    }

    async fn get_post(&self, id: &PostId) -> Result<Post> {
        let inner = self.read().await;
        inner
            .post(id)
            .cloned()
            .ok_or_else(|| Error::PostNotFound(id.clone()))
    }

    async fn cast_vote(&self, user: &str, post_id: &PostId, upvote: bool) -> Result<i64> {
        let user = voter(user)?;

        let mut inner = self.write().await;

        if !inner.contains(post_id) {
            return Err(Error::PostNotFound(post_id.clone()));
        }

        if inner.policy == VotePolicy::Strict && inner.standing_vote(post_id, user).is_some() {
            return Err(Error::AlreadyVoted {
                user: user.to_string(),
                post_id: post_id.clone(),
            });
        }

        inner.insert_vote(Vote {
            post_id: post_id.clone(),
            author: user.to_string(),
            upvote,
            cast_at: now_seconds(),
        });

        let net_votes = inner.net_votes(post_id);
        debug!(post_id = %post_id, user, upvote, net_votes, "Cast vote");
        Ok(net_votes)
    }

    async fn vote_state(&self, post_id: &PostId, user: &str) -> Result<VoteState> {
        let inner = self.read().await;
        Ok(inner
            .standing_vote(post_id, user.trim())
            .map(VoteState::from_upvote)
            .unwrap_or_default())
    }

    async fn net_votes(&self, post_id: &PostId) -> Result<i64> {
        let inner = self.read().await;
        Ok(inner.net_votes(post_id))
    }

    async fn comment_count(&self, post_id: &PostId) -> Result<usize> {
        let inner = self.read().await;
        Ok(inner.comment_count(post_id))
    }

    async fn karma(&self, user: &str) -> Result<i64> {
        let inner = self.read().await;
        Ok(inner.karma(user.trim()))
    }

    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<Post>> {
        let inner = self.read().await;
        let feed = inner.feed(query, Utc::now());
        debug!(count = feed.len(), limit = query.limit, "Listed feed");
        Ok(feed)
    }

    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Post>> {
        let inner = self.read().await;
        Ok(inner.comments(post_id))
    }

    async fn votes(&self, post_id: &PostId) -> Result<Vec<Vote>> {
        let inner = self.read().await;
        Ok(inner.vote_history(post_id))
    }

    async fn post_summary(&self, id: &PostId) -> Result<PostSummary> {
        let inner = self.read().await;
        let post = inner
            .post(id)
            .cloned()
            .ok_or_else(|| Error::PostNotFound(id.clone()))?;
        Ok(inner.summary(post))
    }

    async fn summarize(&self, posts: &[Post]) -> Result<Vec<PostSummary>> {
        let inner = self.read().await;
        Ok(posts
            .iter()
            .cloned()
            .map(|post| inner.summary(post))
            .collect())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let inner = self.read().await;
        Ok(inner.stats())
    }

    async fn export_snapshot(&self) -> Result<SnapshotDocument> {
        let inner = self.read().await;
        Ok(inner.export())
    }

    async fn import(&self, document: SnapshotDocument) -> Result<Vec<LoadWarning>> {
        let mut inner = self.write().await;

        let mut fresh = inner.empty_like();
        let warnings = restore(&mut fresh, document);
        *inner = fresh;

        debug!(
            posts = inner.posts.len(),
            votes = inner.votes.len(),
            skipped = warnings.len(),
            "Imported snapshot"
        );
        Ok(warnings)
    }

    async fn save(&self) -> Result<()> {
        // In-memory only, nothing to persist
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        // No persistent state to reload from
        Ok(())
    }
}
