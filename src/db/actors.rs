//! Actor database operations
//!
//! Actors are the parties of a transaction, keyed by name alone.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::error::Result;

/// A transaction party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
}

/// Load actors ordered by name, bounded by the batch limit
pub async fn pull(pool: &SqlitePool, limit: i64) -> Result<Vec<Actor>> {
    let rows = sqlx::query("SELECT name FROM actors ORDER BY name LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| Actor { name: row.get("name") })
        .collect())
}

/// Upsert actors by name in batches of at most `batch` rows
pub async fn push(pool: &SqlitePool, actors: &[Actor], batch: usize) -> Result<()> {
    for chunk in actors.chunks(batch.max(1)) {
        let mut tx = pool.begin().await?;

        for actor in chunk {
            sqlx::query("INSERT INTO actors (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
                .bind(&actor.name)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
    }

    Ok(())
}
