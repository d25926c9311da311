//! SQLite persistence layer for Reverie.
//!
//! This crate provides async database operations for characters,
//! lorebooks and chat sessions using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{character, models::CharacterData, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:reverie.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a character
//!     let data = CharacterData {
//!         name: "Mara".to_string(),
//!         description: "A wry ranger.".to_string(),
//!         ..CharacterData::default()
//!     };
//!     let card = character::create_character(db.pool(), "c27fb365", &data).await?;
//!     println!("created {}", card.name);
//!
//!     Ok(())
//! }
//! ```

pub mod character;
pub mod error;
pub mod lorebook;
pub mod models;
pub mod session;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Character, CharacterData, ChatMessageRow, ChatSession, LoreEntryData, LoreEntryRow,
    LorebookData, LorebookRow, SessionData,
};
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
    /// Default pool size for database connections.
    /// High enough to handle concurrent chat turns alongside CRUD traffic.
    const DEFAULT_POOL_SIZE: u32 = 20;

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
    /// let db = database::Database::connect("sqlite:data/reverie.db?mode=rwc").await?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CharacterData;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_character_crud() {
        let db = test_db().await;

        // Create
        let data = CharacterData {
            name: "Mara".to_string(),
            description: "A wry ranger.".to_string(),
            tags: vec!["fantasy".to_string()],
            ..CharacterData::default()
        };
        let created = character::create_character(db.pool(), "char-1", &data)
            .await
            .unwrap();
        assert_eq!(created.name, "Mara");
        assert_eq!(created.tags.0, vec!["fantasy".to_string()]);

        // Read
        let fetched = character::get_character(db.pool(), "char-1").await.unwrap();
        assert_eq!(fetched.description, "A wry ranger.");

        // Update
        let update = CharacterData {
            description: "A tired ranger.".to_string(),
            ..data.clone()
        };
        character::update_character(db.pool(), "char-1", &update)
            .await
            .unwrap();
        let fetched = character::get_character(db.pool(), "char-1").await.unwrap();
        assert_eq!(fetched.description, "A tired ranger.");

        // List
        let all = character::list_characters(db.pool()).await.unwrap();
        assert_eq!(all.len(), 1);

        // Delete
        character::delete_character(db.pool(), "char-1").await.unwrap();
        let result = character::get_character(db.pool(), "char-1").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
