//! SQLite persistence layer for Health Whisperer.
//!
//! This crate provides async database operations for users, health profiles,
//! Telegram links, nudge preferences, metric snapshots, the nudge log and
//! dispatch reservations using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{link, user, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:health_whisperer.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a user and hand them a link code for the bot
//!     user::create_user(db.pool(), "c27fb365-0c84-4cf2-8555-814bb065e448", "Asha").await?;
//!     let link = link::get_or_create_link_code(db.pool(), "c27fb365-0c84-4cf2-8555-814bb065e448").await?;
//!     println!("Send /link {} to the bot", link.link_code);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod link;
pub mod metric;
pub mod models;
pub mod nudge_log;
pub mod preference;
pub mod reservation;
pub mod timestamp;
pub mod user;
pub mod user_profile;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use metric::{LatestMetric, MetricColumn};
pub use models::{
    LogOutcome, MetricSnapshot, MetricValues, NewNudgeLogEntry, NudgeLogEntry,
    NudgePreferenceRecord, TelegramLink, User, UserProfile,
};
pub use user_profile::{ProfileField, ProfileValue};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size; covers the batch runner's parallel users plus admin commands.
    const DEFAULT_POOL_SIZE: u32 = 8;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/health_whisperer.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
