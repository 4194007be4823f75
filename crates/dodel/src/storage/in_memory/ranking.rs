//! Feed rank computation.

use crate::domain::Post;
use chrono::{DateTime, Utc};

/// Rank of a post at `now`. Lower is better.
///
/// `rank = elapsed_minutes² − net_votes³`, with elapsed minutes as a
/// fractional value. Age pushes a post down the feed quadratically while the
/// vote lead pulls it up cubically.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use dodel::storage::in_memory::compute_rank;
///
/// let now = Utc::now();
/// let rank = compute_rank(now - Duration::minutes(3), 2, now);
/// assert!((rank - 1.0).abs() < 1e-9);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn compute_rank(created_at: DateTime<Utc>, net_votes: i64, now: DateTime<Utc>) -> f64 {
    let elapsed_minutes = (now - created_at).num_milliseconds() as f64 / 60_000.0;
    let votes = net_votes as f64;
    elapsed_minutes * elapsed_minutes - votes * votes * votes
}

/// Sort ascending by rank. Stable, so equal ranks keep insertion order.
pub(super) fn sort_by_rank(ranked: &mut [(f64, &Post)]) {
    ranked.sort_by(|(a, _), (b, _)| a.total_cmp(b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostId;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case::fresh_no_votes(0, 0, 0.0)]
    #[case::ten_minutes(10, 0, 100.0)]
    #[case::votes_offset_age(2, 2, -4.0)]
    #[case::downvotes_sink(0, -3, 27.0)]
    fn rank_formula(#[case] minutes: i64, #[case] votes: i64, #[case] expected: f64) {
        let now = Utc::now();
        let rank = compute_rank(now - Duration::minutes(minutes), votes, now);
        assert!((rank - expected).abs() < 1e-9, "rank {rank} != {expected}");
    }

    #[test]
    fn elapsed_minutes_are_fractional() {
        let now = Utc::now();
        let rank = compute_rank(now - Duration::seconds(30), 0, now);
        assert!((rank - 0.25).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_input_order() {
        let now = Utc::now();
        let posts: Vec<Post> = ["a", "b", "c"]
            .iter()
            .map(|id| Post {
                id: PostId::new(*id),
                author: "alice".to_string(),
                parent: None,
                text: "t".to_string(),
                color: String::new(),
                created_at: now,
            })
            .collect();

        let mut ranked = vec![(1.0, &posts[0]), (0.0, &posts[1]), (1.0, &posts[2])];
        sort_by_rank(&mut ranked);

        let order: Vec<&str> = ranked.iter().map(|(_, p)| p.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }
}
