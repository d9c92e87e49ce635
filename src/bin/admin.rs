//! CLI administration tool for tour-booking.
//!
//! Loads and removes development fixtures, shows statistics and runs
//! database diagnostics without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Import users, tours and reviews from dev-data/data
//! cargo run --bin admin -- data import
//!
//! # Delete every review, tour and user
//! cargo run --bin admin -- data delete
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//!
//! # Fixture Import
//!
//! Records are inserted as they are, without request validation. Passwords
//! that are already bcrypt hashes are kept; plain ones are hashed. Rating
//! aggregates of every imported tour are recomputed afterwards.

use tour_booking::domain::entities::{GeoPoint, Location, Role};
use tour_booking::domain::repositories::ReviewRepository;
use tour_booking::infrastructure::persistence::PgReviewRepository;
use tour_booking::utils::password::{hash_password, is_bcrypt_hash};
use tour_booking::utils::slug::slugify;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// CLI tool for managing tour-booking.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Import or delete fixture data
    Data {
        #[command(subcommand)]
        action: DataAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum DataAction {
    /// Load users.json, tours.json and reviews.json
    Import {
        /// Directory holding the fixture files
        #[arg(short, long, default_value = "dev-data/data")]
        dir: PathBuf,
    },

    /// Delete all reviews, tours and users
    Delete {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[derive(Debug, Deserialize)]
struct UserFixture {
    id: Uuid,
    name: String,
    email: String,
    photo: Option<String>,
    #[serde(default = "default_role")]
    role: Role,
    password: String,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_role() -> Role {
    Role::User
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TourFixture {
    id: Uuid,
    name: String,
    duration: i32,
    max_group_size: i32,
    difficulty: String,
    #[serde(default = "default_ratings_average")]
    ratings_average: f64,
    #[serde(default)]
    ratings_quantity: i32,
    price: f64,
    price_discount: Option<f64>,
    summary: String,
    description: Option<String>,
    image_cover: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    start_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    secret_tour: bool,
    start_location: Option<GeoPoint>,
    #[serde(default)]
    locations: Vec<Location>,
    #[serde(default)]
    guides: Vec<Uuid>,
}

fn default_ratings_average() -> f64 {
    4.5
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewFixture {
    id: Uuid,
    review: String,
    rating: f64,
    tour: Uuid,
    user: Uuid,
    created_at: Option<DateTime<Utc>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Data { action } => handle_data_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

async fn handle_data_action(action: DataAction, pool: &PgPool) -> Result<()> {
    match action {
        DataAction::Import { dir } => import_data(pool, &dir).await,
        DataAction::Delete { yes } => delete_data(pool, yes).await,
    }
}

fn read_fixture<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>> {
    let path = dir.join(file);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Imports all fixtures in one transaction.
///
/// # Flow
///
/// 1. Read and parse the three files
/// 2. Insert users, hashing plain passwords
/// 3. Insert tours and their guide lists
/// 4. Insert reviews
/// 5. Commit, then recompute the rating aggregate of every tour
async fn import_data(pool: &PgPool, dir: &Path) -> Result<()> {
    println!("{}", "📦 Import fixture data".bright_blue().bold());
    println!();

    let users: Vec<UserFixture> = read_fixture(dir, "users.json")?;
    let tours: Vec<TourFixture> = read_fixture(dir, "tours.json")?;
    let reviews: Vec<ReviewFixture> = read_fixture(dir, "reviews.json")?;

    let mut tx = pool.begin().await?;

    for user in &users {
        insert_user(&mut tx, user).await?;
    }
    println!("  Users:   {}", users.len().to_string().bright_green().bold());

    for tour in &tours {
        insert_tour(&mut tx, tour).await?;
    }
    println!("  Tours:   {}", tours.len().to_string().bright_green().bold());

    for review in &reviews {
        insert_review(&mut tx, review).await?;
    }
    println!("  Reviews: {}", reviews.len().to_string().bright_green().bold());

    tx.commit().await.context("Failed to commit import")?;

    let repo = PgReviewRepository::new(Arc::new(pool.clone()));
    for tour in &tours {
        repo.calc_average_ratings(tour.id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to recompute ratings of {}: {}", tour.id, e))?;
    }

    println!();
    println!("{}", "✅ Data successfully loaded!".green().bold());
    println!();

    Ok(())
}

async fn insert_user(conn: &mut PgConnection, user: &UserFixture) -> Result<()> {
    let password = if is_bcrypt_hash(&user.password) {
        user.password.clone()
    } else {
        hash_password(&user.password)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
    };

    sqlx::query(
        "INSERT INTO users (id, name, email, photo, role, password, active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(user.email.to_lowercase())
    .bind(&user.photo)
    .bind(user.role.as_str())
    .bind(password)
    .bind(user.active)
    .execute(conn)
    .await
    .with_context(|| format!("Failed to insert user {}", user.email))?;

    Ok(())
}

async fn insert_tour(conn: &mut PgConnection, tour: &TourFixture) -> Result<()> {
    let start = tour.start_location.as_ref();

    sqlx::query(
        r#"
        INSERT INTO tours (
            id, name, slug, duration, max_group_size, difficulty, ratings_average,
            ratings_quantity, price, price_discount, summary, description, image_cover,
            images, start_dates, secret_tour, start_lng, start_lat, start_address,
            start_description, locations
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21)
        "#,
    )
    .bind(tour.id)
    .bind(&tour.name)
    .bind(slugify(&tour.name))
    .bind(tour.duration)
    .bind(tour.max_group_size)
    .bind(&tour.difficulty)
    .bind(tour.ratings_average)
    .bind(tour.ratings_quantity)
    .bind(tour.price)
    .bind(tour.price_discount)
    .bind(&tour.summary)
    .bind(&tour.description)
    .bind(&tour.image_cover)
    .bind(&tour.images)
    .bind(&tour.start_dates)
    .bind(tour.secret_tour)
    .bind(start.map(GeoPoint::lng))
    .bind(start.map(GeoPoint::lat))
    .bind(start.and_then(|s| s.address.clone()))
    .bind(start.and_then(|s| s.description.clone()))
    .bind(Json(&tour.locations))
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to insert tour {}", tour.name))?;

    for (position, guide) in tour.guides.iter().enumerate() {
        sqlx::query("INSERT INTO tour_guides (tour_id, user_id, position) VALUES ($1, $2, $3)")
            .bind(tour.id)
            .bind(guide)
            .bind(position as i32)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to assign guide {guide} to {}", tour.name))?;
    }

    Ok(())
}

async fn insert_review(conn: &mut PgConnection, review: &ReviewFixture) -> Result<()> {
    sqlx::query(
        "INSERT INTO reviews (id, review, rating, tour_id, user_id, created_at) \
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()))",
    )
    .bind(review.id)
    .bind(&review.review)
    .bind(review.rating)
    .bind(review.tour)
    .bind(review.user)
    .bind(review.created_at)
    .execute(conn)
    .await
    .with_context(|| format!("Failed to insert review {}", review.id))?;

    Ok(())
}

/// Deletes every review, tour and user after confirmation.
async fn delete_data(pool: &PgPool, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑️  Delete all data".bright_blue().bold());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete ALL reviews, tours and users?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let mut tx = pool.begin().await?;
    let reviews = sqlx::query("DELETE FROM reviews").execute(&mut *tx).await?;
    let tours = sqlx::query("DELETE FROM tours").execute(&mut *tx).await?;
    let users = sqlx::query("DELETE FROM users").execute(&mut *tx).await?;
    tx.commit().await?;

    println!("  Reviews: {}", reviews.rows_affected().to_string().bright_red());
    println!("  Tours:   {}", tours.rows_affected().to_string().bright_red());
    println!("  Users:   {}", users.rows_affected().to_string().bright_red());
    println!();
    println!("{}", "✅ Data successfully deleted!".green().bold());
    println!();

    Ok(())
}

/// Displays system statistics.
///
/// Shows:
/// - Number of tours (secret ones included)
/// - Number of active users and reviews
/// - Users per role
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let tours_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tours")
        .fetch_one(pool)
        .await?;

    let users_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE active")
        .fetch_one(pool)
        .await?;

    let reviews_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
        .fetch_one(pool)
        .await?;

    let roles: Vec<(String, i64)> = sqlx::query_as(
        "SELECT role, COUNT(*) FROM users WHERE active GROUP BY role ORDER BY role",
    )
    .fetch_all(pool)
    .await?;

    println!(
        "  Tours:        {}",
        tours_count.to_string().bright_green().bold()
    );
    println!(
        "  Active users: {}",
        users_count.to_string().bright_green().bold()
    );
    println!(
        "  Reviews:      {}",
        reviews_count.to_string().bright_green().bold()
    );
    for (role, count) in roles {
        println!("    {:<12} {}", role.cyan(), count);
    }
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
