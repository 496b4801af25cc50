use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use photoforum::config::Config;
use photoforum::db::models::NewPost;
use photoforum::db::Database;
use photoforum::engagement::{CollectionService, InteractionService, RatingService, SocialService};
use photoforum::output::{self, terminal};
use photoforum::ranking::{LeaderboardService, Period};
use photoforum::stats::StatsComposer;
use photoforum::ForumError;

/// photoforum: engagement stats and hot-post leaderboards for a photo forum.
#[derive(Parser)]
#[command(name = "photoforum", version, about)]
struct Cli {
    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Show system status (backend, tables, this week's activity)
    Status,

    /// Register a user
    AddUser {
        username: String,
    },

    /// Publish a post
    Post {
        /// Author's user id
        #[arg(long)]
        author: i64,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        content: String,

        /// Image URL (repeat for several)
        #[arg(long = "image")]
        images: Vec<String>,
    },

    /// Like a post
    Like { user: i64, post: i64 },

    /// Remove a like
    Unlike { user: i64, post: i64 },

    /// Share a post
    Share { user: i64, post: i64 },

    /// Remove a share
    Unshare { user: i64, post: i64 },

    /// Comment on a post
    Comment {
        user: i64,
        post: i64,
        content: String,
    },

    /// Save a post into your default collection
    Collect { user: i64, post: i64 },

    /// Rate a post from 0.0 to 10.0 (one decimal)
    Rate {
        user: i64,
        post: i64,
        score: f64,

        /// Change an existing rating instead of adding one
        #[arg(long)]
        update: bool,
    },

    /// Remove your rating from a post
    Unrate { user: i64, post: i64 },

    /// Follow (or with --remove, unfollow) a user
    Follow {
        follower: i64,
        following: i64,

        #[arg(long)]
        remove: bool,
    },

    /// Show engagement stats for a post
    Stats { post: i64 },

    /// Newest posts with their stats
    Feed {
        #[arg(long, default_value = "0")]
        offset: u32,

        /// Page size (default: FORUM_SEARCH_LIMIT)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// A user's posts with their stats
    UserPosts {
        user: i64,

        #[arg(long, default_value = "0")]
        offset: u32,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show a user's profile counters
    Profile { user: i64 },

    /// Hottest posts in a time window
    Leaderboard {
        /// week, month or year (anything else means week)
        #[arg(long, default_value = "week")]
        period: String,

        /// Number of posts, 1 to 100 (default: FORUM_LEADERBOARD_LIMIT)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search post titles (case-sensitive) and rank the page by hot score
    Search {
        query: String,

        #[arg(long, default_value = "0")]
        offset: u32,

        #[arg(long)]
        limit: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("photoforum=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let json = cli.json;

    match cli.command {
        Commands::Init => {
            info!("Initializing photoforum database...");
            let db = init_database(&config).await?;
            let table_count = db.table_count().await?;
            if config.uses_postgres() {
                println!("PostgreSQL database initialized");
            } else {
                println!("Database initialized at: {}", config.db_path);
            }
            println!("Tables: {table_count}");
            println!("\nNext step: photoforum add-user <username>");
        }

        Commands::Status => {
            if !config.uses_postgres() && !photoforum::status::sqlite_initialized(&config) {
                println!("Database: not initialized");
                println!("\nRun `photoforum init` to set up the database.");
                return Ok(());
            }
            let db = open_database(&config).await?;
            photoforum::status::show(&db, &config).await?;
        }

        Commands::AddUser { username } => {
            let username = username.trim();
            if username.is_empty() {
                return Err(ForumError::Validation("username is empty".into()).into());
            }
            let db = open_database(&config).await?;
            let user = db.create_user(username).await?;
            info!(user_id = user.id, username = %user.username, "user created");
            emit(json, &user, || {
                println!("{} created user @{} (id {})", "✓".green(), user.username, user.id)
            })?;
        }

        Commands::Post {
            author,
            title,
            content,
            images,
        } => {
            if title.trim().is_empty() {
                return Err(ForumError::Validation("post title is empty".into()).into());
            }
            let db = open_database(&config).await?;
            if db.get_user(author).await?.is_none() {
                return Err(ForumError::not_found("user", author).into());
            }
            let post = db
                .create_post(&NewPost::new(author, title.trim(), content).images(images))
                .await?;
            info!(post_id = post.id, author_id = author, "post created");
            emit(json, &post, || {
                println!("{} published post {} \"{}\"", "✓".green(), post.id, post.title)
            })?;
        }

        Commands::Like { user, post } => {
            let service = InteractionService::new(open_database(&config).await?);
            let liked = service.like(user, post).await?;
            emit(json, &liked, || {
                report_toggle(liked.created, "liked", "already liked", post)
            })?;
        }

        Commands::Unlike { user, post } => {
            let service = InteractionService::new(open_database(&config).await?);
            let removed = service.unlike(user, post).await?;
            emit(json, &removed, || {
                report_toggle(removed, "unliked", "was not liked", post)
            })?;
        }

        Commands::Share { user, post } => {
            let service = InteractionService::new(open_database(&config).await?);
            let shared = service.share(user, post).await?;
            emit(json, &shared, || {
                report_toggle(shared.created, "shared", "already shared", post)
            })?;
        }

        Commands::Unshare { user, post } => {
            let service = InteractionService::new(open_database(&config).await?);
            let removed = service.unshare(user, post).await?;
            emit(json, &removed, || {
                report_toggle(removed, "unshared", "was not shared", post)
            })?;
        }

        Commands::Comment {
            user,
            post,
            content,
        } => {
            let service = InteractionService::new(open_database(&config).await?);
            let comment = service.comment(user, post, &content).await?;
            emit(json, &comment, || {
                println!("{} commented on post {}", "✓".green(), post)
            })?;
        }

        Commands::Collect { user, post } => {
            let service = CollectionService::new(open_database(&config).await?);
            let item = service.collect_post(user, post).await?;
            emit(json, &item, || {
                report_toggle(
                    item.created,
                    &format!("saved to collection {}", item.record.collection_id),
                    "already saved",
                    post,
                )
            })?;
        }

        Commands::Rate {
            user,
            post,
            score,
            update,
        } => {
            let service = RatingService::new(open_database(&config).await?);
            let rating = if update {
                service.update(user, post, score).await?
            } else {
                service.submit(user, post, score).await?
            };
            emit(json, &rating, || {
                println!("{} rated post {} {:.1}", "✓".green(), post, rating.score)
            })?;
        }

        Commands::Unrate { user, post } => {
            let service = RatingService::new(open_database(&config).await?);
            service.remove(user, post).await?;
            emit(json, &true, || {
                println!("{} removed rating on post {}", "✓".green(), post)
            })?;
        }

        Commands::Follow {
            follower,
            following,
            remove,
        } => {
            let service = SocialService::new(open_database(&config).await?);
            if remove {
                let removed = service.unfollow(follower, following).await?;
                emit(json, &removed, || {
                    if removed {
                        println!("{} unfollowed user {}", "✓".green(), following)
                    } else {
                        println!("{}", format!("not following user {following}").dimmed())
                    }
                })?;
            } else {
                let created = service.follow(follower, following).await?;
                emit(json, &created, || {
                    if created {
                        println!("{} now following user {}", "✓".green(), following)
                    } else {
                        println!("{}", format!("already following user {following}").dimmed())
                    }
                })?;
            }
        }

        Commands::Stats { post } => {
            let composer = StatsComposer::new(open_database(&config).await?);
            let item = composer.post_with_stats(post).await?;
            emit(json, &item, || terminal::display_post_stats(&item))?;
        }

        Commands::Feed { offset, limit } => {
            let service = LeaderboardService::new(open_database(&config).await?);
            let limit = limit.unwrap_or(config.search_limit);
            let posts = service.recent_feed(offset, limit).await?;
            emit(json, &posts, || terminal::display_feed("Recent posts", &posts))?;
        }

        Commands::UserPosts {
            user,
            offset,
            limit,
        } => {
            let service = LeaderboardService::new(open_database(&config).await?);
            let limit = limit.unwrap_or(config.search_limit);
            let posts = service.author_posts(user, offset, limit).await?;
            emit(json, &posts, || {
                terminal::display_feed(&format!("Posts by user {user}"), &posts)
            })?;
        }

        Commands::Profile { user } => {
            let db = open_database(&config).await?;
            let service = SocialService::new(db.clone());
            let stats = service.profile_stats(user).await?;
            let account = db
                .get_user(user)
                .await?
                .ok_or_else(|| ForumError::not_found("user", user))?;
            emit(json, &stats, || terminal::display_profile(&account, &stats))?;
        }

        Commands::Leaderboard { period, limit } => {
            let limit = config.resolve_leaderboard_limit(limit)?;
            let service = LeaderboardService::new(open_database(&config).await?);
            let period = Period::parse(&period);
            let posts = service.hot_posts(period, limit, Utc::now()).await?;
            emit(json, &posts, || {
                terminal::display_ranked_posts(&format!("Hot posts this {period}"), &posts)
            })?;
        }

        Commands::Search {
            query,
            offset,
            limit,
        } => {
            let service = LeaderboardService::new(open_database(&config).await?);
            let limit = limit.unwrap_or(config.search_limit);
            let posts = service.search(&query, offset, limit).await?;
            emit(json, &posts, || {
                terminal::display_ranked_posts(&format!("Search: \"{query}\""), &posts)
            })?;
        }
    }

    Ok(())
}

/// Print `value` as JSON when --json was given, otherwise run `render`.
fn emit<T: Serialize + ?Sized>(json: bool, value: &T, render: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", output::to_json(value)?);
    } else {
        render();
    }
    Ok(())
}

fn report_toggle(changed: bool, done: &str, unchanged: &str, post: i64) {
    if changed {
        println!("{} {} post {}", "✓".green(), done, post);
    } else {
        println!("{}", format!("post {post}: {unchanged}").dimmed());
    }
}

/// Select the database backend based on configuration.
///
/// When DATABASE_URL is set and points to PostgreSQL, uses the Postgres backend
/// (requires the `postgres` feature). Otherwise, falls back to SQLite.
async fn open_database(config: &Config) -> Result<Arc<dyn Database>> {
    if config.uses_postgres() {
        return connect_postgres(config).await;
    }
    open_sqlite(config)
}

/// Initialize the database (create if needed).
async fn init_database(config: &Config) -> Result<Arc<dyn Database>> {
    if config.uses_postgres() {
        return connect_postgres(config).await;
    }
    initialize_sqlite(config)
}

#[cfg(feature = "postgres")]
async fn connect_postgres(config: &Config) -> Result<Arc<dyn Database>> {
    info!("Using PostgreSQL backend");
    let url = config.database_url.as_deref().unwrap_or_default();
    photoforum::db::connect_postgres(url).await
}

#[cfg(not(feature = "postgres"))]
async fn connect_postgres(_config: &Config) -> Result<Arc<dyn Database>> {
    anyhow::bail!(
        "DATABASE_URL points to PostgreSQL but the 'postgres' feature is not compiled in.\n\
         Rebuild with: cargo build --features postgres"
    )
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &Config) -> Result<Arc<dyn Database>> {
    photoforum::db::open_sqlite(&config.db_path)
}

#[cfg(feature = "sqlite")]
fn initialize_sqlite(config: &Config) -> Result<Arc<dyn Database>> {
    photoforum::db::initialize_sqlite(&config.db_path)
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &Config) -> Result<Arc<dyn Database>> {
    anyhow::bail!("DATABASE_URL is not a PostgreSQL URL and the 'sqlite' feature is not compiled in")
}

#[cfg(not(feature = "sqlite"))]
fn initialize_sqlite(config: &Config) -> Result<Arc<dyn Database>> {
    open_sqlite(config)
}
