//! Integration tests for the in-memory post/vote store.
//!
//! These tests drive the store through the public `PostStore` trait:
//! submission, voting policies, derived reads, feed ranking and comment
//! threads.

use chrono::Duration;
use dodel::domain::{FeedQuery, NewPost, PostId, VotePolicy, VoteState};
use dodel::error::Error;
use dodel::storage::in_memory::new_in_memory_store;
use dodel::storage::{PostStore, StoreOptions};
use proptest::prelude::*;
use rstest::rstest;

fn store() -> Box<dyn PostStore> {
    new_in_memory_store(&StoreOptions::default())
}

fn strict_store() -> Box<dyn PostStore> {
    new_in_memory_store(&StoreOptions {
        policy: VotePolicy::Strict,
        ..StoreOptions::default()
    })
}

/// Feed query that lets every fresh post through regardless of votes.
fn unfiltered_feed(limit: usize) -> FeedQuery {
    FeedQuery {
        limit,
        max_age: Duration::hours(24),
        min_rank: f64::NEG_INFINITY,
    }
}

// ========== Scenarios ==========

#[tokio::test]
async fn test_vote_sequence_scenario() {
    let store = store();
    let post = store
        .submit_post(NewPost::new("alice", "Hello, world"))
        .await
        .unwrap();

    assert_eq!(store.net_votes(&post).await.unwrap(), 0);
    assert_eq!(store.cast_vote("bob", &post, true).await.unwrap(), 1);
    assert_eq!(store.cast_vote("bob", &post, false).await.unwrap(), -1);
    assert_eq!(store.cast_vote("carol", &post, true).await.unwrap(), 0);

    assert_eq!(store.karma("alice").await.unwrap(), 0);
    assert_eq!(
        store.vote_state(&post, "bob").await.unwrap(),
        VoteState::Downvoted
    );
    assert_eq!(
        store.vote_state(&post, "carol").await.unwrap(),
        VoteState::Upvoted
    );
    assert_eq!(
        store.vote_state(&post, "alice").await.unwrap(),
        VoteState::None
    );
}

#[tokio::test]
async fn test_comment_thread_scenario() {
    let store = store();
    let topic = store
        .submit_post(NewPost::new("alice", "Topic"))
        .await
        .unwrap();
    let c1 = store
        .submit_post(NewPost::new("bob", "First").reply_to(topic.clone()))
        .await
        .unwrap();
    let c2 = store
        .submit_post(NewPost::new("carol", "Second").reply_to(topic.clone()))
        .await
        .unwrap();

    let comments = store.list_comments(&topic).await.unwrap();
    let ids: Vec<&PostId> = comments.iter().map(|p| &p.id).collect();
    assert_eq!(ids, vec![&c1, &c2]);
    assert_eq!(store.comment_count(&topic).await.unwrap(), 2);
}

// ========== Submission ==========

#[tokio::test]
async fn test_submitted_post_matches_inputs() {
    let store = store();
    let id = store
        .submit_post(NewPost::new("  alice ", " Some text ").with_color("green"))
        .await
        .unwrap();

    let post = store.get_post(&id).await.unwrap();
    assert_eq!(post.id, id);
    assert_eq!(post.author, "alice");
    assert_eq!(post.text, "Some text");
    assert_eq!(post.color, "green");
    assert!(post.parent.is_none());
    assert_eq!(store.net_votes(&id).await.unwrap(), 0);
    assert!(id.as_str().starts_with("dodel-"));
}

#[rstest]
#[case::blank_author("  ", "text")]
#[case::blank_text("alice", "\n\t")]
#[tokio::test]
async fn test_blank_fields_are_invalid(#[case] author: &str, #[case] text: &str) {
    let store = store();
    let err = store
        .submit_post(NewPost::new(author, text))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(store.stats().await.unwrap().posts, 0);
}

#[tokio::test]
async fn test_comment_on_unknown_parent_is_not_found() {
    let store = store();
    let err = store
        .submit_post(NewPost::new("alice", "reply").reply_to(PostId::new("dodel-nope")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PostNotFound(_)));
}

#[tokio::test]
async fn test_comment_on_comment_is_allowed() {
    let store = store();
    let topic = store.submit_post(NewPost::new("alice", "T")).await.unwrap();
    let comment = store
        .submit_post(NewPost::new("bob", "C").reply_to(topic.clone()))
        .await
        .unwrap();
    let nested = store
        .submit_post(NewPost::new("carol", "N").reply_to(comment.clone()))
        .await
        .unwrap();

    assert_eq!(store.comment_count(&topic).await.unwrap(), 1);
    assert_eq!(store.comment_count(&comment).await.unwrap(), 1);
    assert_eq!(
        store.get_post(&nested).await.unwrap().parent,
        Some(comment)
    );
}

#[tokio::test]
async fn test_post_ids_are_unique() {
    let store = store();
    let mut ids = std::collections::HashSet::new();
    for i in 0..200 {
        let id = store
            .submit_post(NewPost::new("alice", "same text"))
            .await
            .unwrap();
        assert!(ids.insert(id), "duplicate id at submission {i}");
    }
}

// ========== Voting ==========

#[tokio::test]
async fn test_repeat_vote_same_direction_is_idempotent() {
    let store = store();
    let post = store.submit_post(NewPost::new("alice", "p")).await.unwrap();

    store.cast_vote("bob", &post, true).await.unwrap();
    assert_eq!(store.cast_vote("bob", &post, true).await.unwrap(), 1);

    // Both records are kept
    assert_eq!(store.votes(&post).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reversing_vote_moves_tally_by_two() {
    let store = store();
    let post = store.submit_post(NewPost::new("alice", "p")).await.unwrap();
    store.cast_vote("carol", &post, true).await.unwrap();

    let before = store.cast_vote("bob", &post, true).await.unwrap();
    let after = store.cast_vote("bob", &post, false).await.unwrap();
    assert_eq!(before - after, 2);
}

#[tokio::test]
async fn test_voter_is_trimmed() {
    let store = store();
    let post = store.submit_post(NewPost::new("alice", "p")).await.unwrap();

    store.cast_vote(" bob ", &post, true).await.unwrap();
    assert_eq!(store.cast_vote("bob", &post, true).await.unwrap(), 1);
    assert_eq!(
        store.vote_state(&post, "bob").await.unwrap(),
        VoteState::Upvoted
    );
}

#[tokio::test]
async fn test_strict_policy_keeps_first_vote() {
    let store = strict_store();
    let post = store.submit_post(NewPost::new("alice", "p")).await.unwrap();

    store.cast_vote("bob", &post, true).await.unwrap();
    let err = store.cast_vote("bob", &post, false).await.unwrap_err();

    assert!(matches!(err, Error::AlreadyVoted { ref user, .. } if user == "bob"));
    assert_eq!(store.net_votes(&post).await.unwrap(), 1);
    assert_eq!(store.votes(&post).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_vote_history_is_in_insertion_order() {
    let store = store();
    let post = store.submit_post(NewPost::new("alice", "p")).await.unwrap();

    store.cast_vote("bob", &post, true).await.unwrap();
    store.cast_vote("carol", &post, false).await.unwrap();
    store.cast_vote("bob", &post, false).await.unwrap();

    let history: Vec<(String, bool)> = store
        .votes(&post)
        .await
        .unwrap()
        .into_iter()
        .map(|v| (v.author, v.upvote))
        .collect();
    assert_eq!(
        history,
        vec![
            ("bob".to_string(), true),
            ("carol".to_string(), false),
            ("bob".to_string(), false),
        ]
    );
}

// ========== Karma ==========

#[tokio::test]
async fn test_karma_sums_only_own_posts() {
    let store = store();
    let a1 = store.submit_post(NewPost::new("alice", "1")).await.unwrap();
    let a2 = store
        .submit_post(NewPost::new("alice", "2").reply_to(a1.clone()))
        .await
        .unwrap();
    let b1 = store.submit_post(NewPost::new("bob", "3")).await.unwrap();

    store.cast_vote("x", &a1, true).await.unwrap();
    store.cast_vote("y", &a1, true).await.unwrap();
    store.cast_vote("x", &a2, false).await.unwrap();
    store.cast_vote("x", &b1, true).await.unwrap();

    assert_eq!(store.karma("alice").await.unwrap(), 1);
    assert_eq!(store.karma("bob").await.unwrap(), 1);
    assert_eq!(store.karma("nobody").await.unwrap(), 0);
}

// ========== Feed ==========

#[tokio::test]
async fn test_feed_orders_by_votes_for_same_age() {
    let store = store();
    let low = store.submit_post(NewPost::new("alice", "low")).await.unwrap();
    let high = store.submit_post(NewPost::new("bob", "high")).await.unwrap();
    let mid = store.submit_post(NewPost::new("carol", "mid")).await.unwrap();

    store.cast_vote("u1", &high, true).await.unwrap();
    store.cast_vote("u2", &high, true).await.unwrap();
    store.cast_vote("u1", &mid, true).await.unwrap();
    store.cast_vote("u1", &low, false).await.unwrap();

    let feed = store.list_feed(&unfiltered_feed(10)).await.unwrap();
    let ids: Vec<&PostId> = feed.iter().map(|p| &p.id).collect();
    assert_eq!(ids, vec![&high, &mid, &low]);
}

#[tokio::test]
async fn test_default_min_rank_hides_strongly_upvoted_fresh_posts() {
    // rank = elapsed² − net³, so a fresh post with 2 net votes ranks near −8
    let store = store();
    let plain = store.submit_post(NewPost::new("alice", "a")).await.unwrap();
    let popular = store.submit_post(NewPost::new("bob", "b")).await.unwrap();
    store.cast_vote("u1", &popular, true).await.unwrap();
    store.cast_vote("u2", &popular, true).await.unwrap();

    let feed = store.list_feed(&FeedQuery::default()).await.unwrap();
    let ids: Vec<&PostId> = feed.iter().map(|p| &p.id).collect();
    assert_eq!(ids, vec![&plain]);
}

#[rstest]
#[case::zero(0, 0)]
#[case::fewer(3, 3)]
#[case::exact(5, 5)]
#[case::more(10, 5)]
#[tokio::test]
async fn test_feed_never_exceeds_limit(#[case] limit: usize, #[case] expected: usize) {
    let store = store();
    for i in 0..5 {
        store
            .submit_post(NewPost::new("alice", format!("post {i}")))
            .await
            .unwrap();
    }

    let feed = store.list_feed(&unfiltered_feed(limit)).await.unwrap();
    assert_eq!(feed.len(), expected);
}

#[tokio::test]
async fn test_feed_ties_keep_insertion_order() {
    let store = store();
    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(
            store
                .submit_post(NewPost::new("alice", format!("post {i}")))
                .await
                .unwrap(),
        );
    }

    let feed = store.list_feed(&unfiltered_feed(10)).await.unwrap();

    // Posts made within the same second share a rank. Any that are a
    // second older rank higher (worse) and sort after the newer ones, so
    // only compare posts with equal timestamps.
    for pair in feed.windows(2) {
        if pair[0].created_at == pair[1].created_at {
            let first = ids.iter().position(|id| *id == pair[0].id).unwrap();
            let second = ids.iter().position(|id| *id == pair[1].id).unwrap();
            assert!(first < second);
        }
    }
}

#[tokio::test]
async fn test_feed_excludes_comments_and_negative_max_age_hides_all() {
    let store = store();
    let topic = store.submit_post(NewPost::new("alice", "T")).await.unwrap();
    store
        .submit_post(NewPost::new("bob", "C").reply_to(topic.clone()))
        .await
        .unwrap();

    let feed = store.list_feed(&unfiltered_feed(10)).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert!(feed.iter().all(|p| p.parent.is_none()));

    let negative_age = FeedQuery {
        max_age: Duration::seconds(-1),
        ..unfiltered_feed(10)
    };
    assert!(store.list_feed(&negative_age).await.unwrap().is_empty());
}

// ========== Summaries & Stats ==========

#[tokio::test]
async fn test_post_summary_and_stats() {
    let store = store();
    let topic = store.submit_post(NewPost::new("alice", "T")).await.unwrap();
    store
        .submit_post(NewPost::new("bob", "C").reply_to(topic.clone()))
        .await
        .unwrap();
    store.cast_vote("carol", &topic, true).await.unwrap();
    store.cast_vote("carol", &topic, true).await.unwrap();

    let summary = store.post_summary(&topic).await.unwrap();
    assert_eq!(summary.net_votes, 1);
    assert_eq!(summary.comment_count, 1);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.posts, 2);
    assert_eq!(stats.top_level, 1);
    assert_eq!(stats.comments, 1);
    assert_eq!(stats.votes, 2);
    assert_eq!(stats.authors, 2);

    let err = store
        .post_summary(&PostId::new("dodel-none"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PostNotFound(_)));
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The tally equals standing up-voters minus standing down-voters,
    /// where a voter's standing vote is their last one.
    #[test]
    fn prop_net_votes_counts_standing_votes(
        votes in proptest::collection::vec((0usize..6, any::<bool>()), 0..40)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = store();
            let post = store.submit_post(NewPost::new("author", "p")).await.unwrap();

            let mut standing = std::collections::HashMap::new();
            for (voter, upvote) in &votes {
                let name = format!("user{voter}");
                store.cast_vote(&name, &post, *upvote).await.unwrap();
                standing.insert(name, *upvote);
            }

            let expected: i64 = standing
                .values()
                .map(|up| if *up { 1 } else { -1 })
                .sum();

            prop_assert_eq!(store.net_votes(&post).await.unwrap(), expected);
            prop_assert_eq!(store.karma("author").await.unwrap(), expected);
            prop_assert_eq!(store.votes(&post).await.unwrap().len(), votes.len());
            Ok(())
        })?;
    }
}
