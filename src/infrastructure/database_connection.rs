//! SQLite connection pool and schema for the target catalog

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use anyhow::{Context, Result};
use std::path::Path;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db_path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);

        // In-memory databases must stay on a single connection to share state
        let in_memory = db_path.starts_with(":memory:");
        if !in_memory {
            if let Some(parent) = Path::new(db_path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create database directory for {db_path}"))?;
            }
            if !Path::new(db_path).exists() {
                tokio::fs::File::create(db_path)
                    .await
                    .with_context(|| format!("Failed to create database file {db_path}"))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 10 })
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to {database_url}"))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_products_sql = r"
            CREATE TABLE IF NOT EXISTS catalog_products (
                id TEXT PRIMARY KEY,
                sku TEXT NOT NULL UNIQUE,
                name TEXT,
                regular_price TEXT NOT NULL DEFAULT '',
                sale_price TEXT NOT NULL DEFAULT '',
                on_sale BOOLEAN NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'publish',
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        ";

        let create_indexes_sql = r"
            CREATE INDEX IF NOT EXISTS idx_catalog_products_status ON catalog_products (status)
        ";

        sqlx::query(create_products_sql).execute(&self.pool).await?;
        sqlx::query(create_indexes_sql).execute(&self.pool).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_database_connection() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("nested").join("catalog.db");
        let database_url = format!("sqlite:{}", db_path.to_string_lossy());

        let db = DatabaseConnection::new(&database_url).await?;

        assert!(!db.pool().is_closed());
        assert!(db_path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_database_migration() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("migration.db");
        let database_url = format!("sqlite:{}", db_path.display());

        let db = DatabaseConnection::new(&database_url).await?;
        db.migrate().await?;
        // second run is a no-op
        db.migrate().await?;

        let result = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='catalog_products'")
            .fetch_optional(db.pool())
            .await?;

        assert!(result.is_some());
        Ok(())
    }
}
