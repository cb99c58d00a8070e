//! Database access layer
//!
//! Typed pull/push of the three registry entities against SQLite. The
//! connection string comes from `DB_DSN`; without one the service runs on an
//! ephemeral in-memory database, which is useful for evaluation but loses
//! everything on shutdown.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::Result;

pub mod actors;
pub mod labels;
pub mod transactions;

pub use actors::Actor;
pub use labels::Label;
pub use transactions::{Detail, Transaction};

/// Connect to the store described by `DB_DSN`
///
/// Returns the pool together with the driver name recorded in the bootstrap
/// sidecar. An unset or empty `DB_DSN` falls back to in-memory storage.
pub async fn connect() -> Result<(SqlitePool, &'static str)> {
    match std::env::var("DB_DSN") {
        Ok(dsn) if !dsn.is_empty() => {
            let pool = SqlitePool::connect(&dsn).await?;
            info!("connected to sqlite database");
            Ok((pool, "sqlite"))
        }
        _ => {
            warn!("DB_DSN is not set, using ephemeral in-memory storage");
            Ok((memory_pool().await?, "ephemeral"))
        }
    }
}

/// Single-connection in-memory pool
///
/// Each SQLite `:memory:` connection is its own database, so the pool is
/// pinned to one connection that is never recycled.
pub async fn memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    Ok(pool)
}

/// Create the registry schema (idempotent)
pub async fn install(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS actors (
            name TEXT PRIMARY KEY,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS labels (
            name TEXT PRIMARY KEY,
            parent_name TEXT REFERENCES labels(name),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            uuid TEXT PRIMARY KEY,
            signature TEXT NOT NULL,
            date TEXT NOT NULL,
            amount INTEGER NOT NULL,
            sender_name TEXT NOT NULL REFERENCES actors(name),
            receiver_name TEXT NOT NULL REFERENCES actors(name),
            label_name TEXT NOT NULL REFERENCES labels(name),
            headers TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS details (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_uuid TEXT NOT NULL REFERENCES transactions(uuid) ON DELETE CASCADE,
            amount INTEGER NOT NULL,
            label_name TEXT NOT NULL REFERENCES labels(name),
            CHECK (amount >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_signature ON transactions(signature)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_details_transaction ON details(transaction_uuid)")
        .execute(pool)
        .await?;

    Ok(())
}
