//! Label database operations
//!
//! Labels form a tree through `parent_name`. The wire shape keeps an absent
//! parent apart from an explicit null: a push that omits the field leaves any
//! stored parent untouched, while a null clears it. Parents named by a push
//! are created before the pointer is set so the reference always resolves.

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{Row, SqlitePool};

use crate::error::Result;

/// A transaction category, optionally nested under a parent label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,

    /// `None` = field absent, `Some(None)` = explicit null,
    /// `Some(Some(name))` = parent pointer
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<Option<String>>,
}

/// Keep a present `null` apart from a missing key
///
/// A plain `Option<Option<_>>` field collapses both to the outer `None`:
/// serde only runs the field default for a missing key, while a literal
/// `null` still deserializes as `None`. Wrapping whatever value is present
/// restores the two-level contract the push relies on.
fn double_option<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Load labels ordered by name, bounded by the batch limit
pub async fn pull(pool: &SqlitePool, limit: i64) -> Result<Vec<Label>> {
    let rows = sqlx::query("SELECT name, parent_name FROM labels ORDER BY name LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| Label {
            name: row.get("name"),
            parent: Some(row.get::<Option<String>, _>("parent_name")),
        })
        .collect())
}

/// Upsert labels by name in batches of at most `batch` rows
///
/// Runs two passes per batch: names first (including any named parents),
/// then parent pointers for the entries that carried the field.
pub async fn push(pool: &SqlitePool, labels: &[Label], batch: usize) -> Result<()> {
    for chunk in labels.chunks(batch.max(1)) {
        let mut tx = pool.begin().await?;

        for label in chunk {
            sqlx::query("INSERT INTO labels (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
                .bind(&label.name)
                .execute(&mut *tx)
                .await?;

            if let Some(Some(parent)) = &label.parent {
                sqlx::query("INSERT INTO labels (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
                    .bind(parent)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        for label in chunk {
            if let Some(parent) = &label.parent {
                sqlx::query("UPDATE labels SET parent_name = ? WHERE name = ?")
                    .bind(parent)
                    .bind(&label.name)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
    }

    Ok(())
}
