// Unit tests for hot-score ranking: pure functions, no storage.

use chrono::{TimeZone, Utc};

use photoforum::db::models::Post;
use photoforum::ranking::{hot_score, rank_by_hot_score, HotWeights, Period, RankedPost};
use photoforum::stats::StatsRecord;

fn post(id: i64) -> Post {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    Post {
        id,
        author_id: 1,
        title: format!("post {id}"),
        content: String::new(),
        images: Vec::new(),
        visibility: 0,
        created_at: at,
        updated_at: at,
    }
}

fn ranked(id: i64, score: f64) -> RankedPost {
    RankedPost {
        post: post(id),
        stats: StatsRecord::empty(id),
        hot_score: score,
    }
}

fn ids(posts: &[RankedPost]) -> Vec<i64> {
    posts.iter().map(|p| p.post.id).collect()
}

// ============================================================
// hot_score
// ============================================================

#[test]
fn all_zero_stats_score_exactly_zero() {
    let score = hot_score(&StatsRecord::empty(9), &HotWeights::default());
    assert_eq!(score, 0.0);
}

#[test]
fn three_likes_two_comments_one_share_two_ratings() {
    let stats = StatsRecord {
        post_id: 1,
        likes_count: 3,
        comments_count: 2,
        shares_count: 1,
        collections_count: 4,
        rating_count: 2,
        average_rating: Some(7.0),
    };
    let score = hot_score(&stats, &HotWeights::default());
    assert!((score - 4.45).abs() < 1e-9, "Expected 4.45, got {score}");
}

#[test]
fn rating_term_only_counts_when_rated() {
    let mut stats = StatsRecord::empty(1);
    stats.comments_count = 4;
    // rating_count without an average never happens in composed records,
    // but the rating term must still be gated on the average alone
    stats.rating_count = 3;
    stats.average_rating = None;
    let score = hot_score(&stats, &HotWeights::default());
    assert!((score - 1.0).abs() < 1e-9);
}

#[test]
fn default_weights() {
    let w = HotWeights::default();
    assert_eq!((w.likes, w.comments, w.shares, w.rating), (0.30, 0.25, 0.25, 0.20));
}

// ============================================================
// rank_by_hot_score
// ============================================================

#[test]
fn ranks_highest_first() {
    let out = rank_by_hot_score(vec![ranked(1, 0.5), ranked(2, 4.45), ranked(3, 2.0)]);
    assert_eq!(ids(&out), vec![2, 3, 1]);
}

#[test]
fn equal_scores_keep_input_order() {
    let out = rank_by_hot_score(vec![
        ranked(5, 1.0),
        ranked(3, 2.0),
        ranked(8, 1.0),
        ranked(1, 2.0),
        ranked(2, 1.0),
    ]);
    assert_eq!(ids(&out), vec![3, 1, 5, 8, 2]);
}

#[test]
fn all_zero_scores_preserve_order() {
    let out = rank_by_hot_score(vec![ranked(4, 0.0), ranked(2, 0.0), ranked(7, 0.0)]);
    assert_eq!(ids(&out), vec![4, 2, 7]);
}

#[test]
fn empty_input_ranks_to_empty() {
    assert!(rank_by_hot_score(Vec::new()).is_empty());
}

// ============================================================
// Period
// ============================================================

#[test]
fn unknown_period_matches_week() {
    let now = Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap();
    let unknown = Period::parse("decade");
    assert_eq!(unknown, Period::Week);
    assert_eq!(unknown.window_start(now), Period::Week.window_start(now));
    assert_eq!(Period::parse("month").days(), 30);
}
