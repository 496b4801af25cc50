// Colored terminal output for leaderboards, feeds and profiles.
//
// main.rs decides what to fetch; everything about how it looks lives here.

use colored::Colorize;

use crate::db::models::User;
use crate::engagement::ProfileStats;
use crate::ranking::RankedPost;
use crate::stats::{PostWithStats, StatsRecord};

const TITLE_WIDTH: usize = 30;

/// Display a hot-score ranked list (leaderboard or search results).
pub fn display_ranked_posts(heading: &str, posts: &[RankedPost]) {
    if posts.is_empty() {
        println!("{}", "No posts found.".dimmed());
        return;
    }

    println!("\n{}", format!("=== {heading} ({} posts) ===", posts.len()).bold());
    println!();
    println!(
        "  {:>4}  {:>6}  {:<30}  {:>7}  {}",
        "Rank".dimmed(),
        "Id".dimmed(),
        "Title".dimmed(),
        "Hot".dimmed(),
        "Engagement".dimmed(),
    );
    println!("  {}", "-".repeat(90).dimmed());

    for (i, ranked) in posts.iter().enumerate() {
        println!(
            "  {:>4}. {:>6}  {:<30}  {:>7}  {}",
            i + 1,
            ranked.post.id,
            super::preview(&ranked.post.title, TITLE_WIDTH),
            colorize_score(ranked.hot_score),
            engagement_summary(&ranked.stats),
        );
    }
    println!();
}

/// Display a feed of posts in the order given.
pub fn display_feed(heading: &str, posts: &[PostWithStats]) {
    if posts.is_empty() {
        println!("{}", "No posts found.".dimmed());
        return;
    }

    println!("\n{}", format!("=== {heading} ===").bold());
    println!();
    for item in posts {
        println!(
            "  {:>6}  {:<30}  {}  {}",
            item.post.id,
            super::preview(&item.post.title, TITLE_WIDTH),
            item.post.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            engagement_summary(&item.stats),
        );
    }
    println!();
}

/// Display one post and its full stats.
pub fn display_post_stats(item: &PostWithStats) {
    let stats = &item.stats;
    println!("\n{}", format!("=== Post {}: {} ===", item.post.id, item.post.title).bold());
    println!("  Author: {}", item.post.author_id);
    println!("  Created: {}", item.post.created_at.format("%Y-%m-%d %H:%M UTC"));
    if !item.post.content.is_empty() {
        println!("  {}", super::preview(&item.post.content, 140).dimmed());
    }
    println!();
    println!("  Likes:       {}", stats.likes_count);
    println!("  Comments:    {}", stats.comments_count);
    println!("  Shares:      {}", stats.shares_count);
    println!("  Collections: {}", stats.collections_count);
    println!(
        "  Rating:      {} ({} ratings)",
        format_average(stats.average_rating),
        stats.rating_count
    );
}

/// Display a user's profile counters.
pub fn display_profile(user: &User, stats: &ProfileStats) {
    println!("\n{}", format!("=== @{} ===", user.username).bold());
    println!("  Joined: {}", user.created_at.format("%Y-%m-%d"));
    println!(
        "  Posts: {}  |  Followers: {}  |  Following: {}  |  Likes received: {}",
        stats.post_count, stats.followers, stats.following, stats.likes_received
    );
}

/// One-line summary of a post's engagement.
pub fn engagement_summary(stats: &StatsRecord) -> String {
    format!(
        "{} likes  {} comments  {} shares  {} saves  rating {}",
        stats.likes_count,
        stats.comments_count,
        stats.shares_count,
        stats.collections_count,
        format_average(stats.average_rating),
    )
}

/// "7.0" for a rated post, "-" for an unrated one.
pub fn format_average(average: Option<f64>) -> String {
    match average {
        Some(avg) => format!("{avg:.1}"),
        None => "-".to_string(),
    }
}

fn colorize_score(score: f64) -> colored::ColoredString {
    let text = format!("{score:.2}");
    if score >= 10.0 {
        text.red().bold()
    } else if score >= 5.0 {
        text.yellow()
    } else if score > 0.0 {
        text.normal()
    } else {
        text.dimmed()
    }
}
