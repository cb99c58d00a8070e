//! Transaction database operations
//!
//! Transactions are keyed by `uuid` (generated on push when absent) and
//! partitioned by `signature`. Pulls load the detail children eagerly and
//! order by date, newest first. A push also materializes every actor and
//! label the batch refers to, so a single call with previously-unknown names
//! is self-contained.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::Result;

/// An amount breakdown line inside a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub amount: i64,
    pub label: String,
}

/// A persisted ledger entry
///
/// `amount` is in signed minor units; a negative value is outgoing from the
/// sender. `headers` holds free-form space-separated `key=value` tokens;
/// `sender=` and `receiver=` override the structured names during journal
/// derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub signature: String,
    pub date: DateTime<Utc>,
    pub amount: i64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub headers: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Detail>,
}

const SELECT: &str = "SELECT uuid, signature, date, amount, sender_name, receiver_name, \
                      label_name, headers FROM transactions";

/// Load all transactions, newest first
pub async fn pull(pool: &SqlitePool, limit: i64) -> Result<Vec<Transaction>> {
    let sql = format!("{SELECT} ORDER BY date DESC, rowid LIMIT ?");
    let rows = sqlx::query(&sql).bind(limit).fetch_all(pool).await?;

    load_details(pool, rows).await
}

/// Load the transactions of one ledger, newest first
pub async fn pull_by_signature(
    pool: &SqlitePool,
    signature: &str,
    limit: i64,
) -> Result<Vec<Transaction>> {
    let sql = format!("{SELECT} WHERE signature = ? ORDER BY date DESC, rowid LIMIT ?");
    let rows = sqlx::query(&sql)
        .bind(signature)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    load_details(pool, rows).await
}

/// Load transactions within an inclusive date window, newest first
pub async fn pull_between(
    pool: &SqlitePool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Transaction>> {
    let sql = format!("{SELECT} WHERE date BETWEEN ? AND ? ORDER BY date DESC, rowid LIMIT ?");
    let rows = sqlx::query(&sql)
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    load_details(pool, rows).await
}

/// Load one ledger's transactions within an inclusive date window, newest first
pub async fn pull_by_signature_between(
    pool: &SqlitePool,
    signature: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Transaction>> {
    let sql = format!(
        "{SELECT} WHERE signature = ? AND date BETWEEN ? AND ? ORDER BY date DESC, rowid LIMIT ?"
    );
    let rows = sqlx::query(&sql)
        .bind(signature)
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    load_details(pool, rows).await
}

async fn load_details(pool: &SqlitePool, rows: Vec<SqliteRow>) -> Result<Vec<Transaction>> {
    let mut transactions = Vec::with_capacity(rows.len());

    for row in rows {
        let uuid: String = row.get("uuid");

        let details = sqlx::query(
            "SELECT amount, label_name FROM details WHERE transaction_uuid = ? ORDER BY id",
        )
        .bind(&uuid)
        .fetch_all(pool)
        .await?
        .iter()
        .map(|d| Detail {
            amount: d.get("amount"),
            label: d.get("label_name"),
        })
        .collect();

        transactions.push(Transaction {
            uuid: Some(uuid),
            signature: row.get("signature"),
            date: row.get("date"),
            amount: row.get("amount"),
            label: row.get("label_name"),
            sender: row.get("sender_name"),
            receiver: row.get("receiver_name"),
            headers: row.get("headers"),
            details,
        });
    }

    Ok(transactions)
}

/// Upsert transactions by uuid in batches of at most `batch` rows
///
/// Generated uuids are written back into the slice so callers can echo the
/// persisted list. Re-pushing an existing uuid replaces the row and its
/// whole detail set.
pub async fn push(pool: &SqlitePool, transactions: &mut [Transaction], batch: usize) -> Result<()> {
    for chunk in transactions.chunks_mut(batch.max(1)) {
        let mut tx = pool.begin().await?;

        for trx in chunk.iter_mut() {
            let uuid = trx
                .uuid
                .get_or_insert_with(|| Uuid::new_v4().to_string())
                .clone();

            for name in [&trx.sender, &trx.receiver] {
                sqlx::query("INSERT INTO actors (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
                    .bind(name)
                    .execute(&mut *tx)
                    .await?;
            }

            sqlx::query("INSERT INTO labels (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
                .bind(&trx.label)
                .execute(&mut *tx)
                .await?;
            for detail in &trx.details {
                sqlx::query("INSERT INTO labels (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
                    .bind(&detail.label)
                    .execute(&mut *tx)
                    .await?;
            }

            sqlx::query(
                r#"
                INSERT INTO transactions (
                    uuid, signature, date, amount, sender_name, receiver_name, label_name, headers
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(uuid) DO UPDATE SET
                    signature = excluded.signature,
                    date = excluded.date,
                    amount = excluded.amount,
                    sender_name = excluded.sender_name,
                    receiver_name = excluded.receiver_name,
                    label_name = excluded.label_name,
                    headers = excluded.headers
                "#,
            )
            .bind(&uuid)
            .bind(&trx.signature)
            .bind(trx.date)
            .bind(trx.amount)
            .bind(&trx.sender)
            .bind(&trx.receiver)
            .bind(&trx.label)
            .bind(&trx.headers)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM details WHERE transaction_uuid = ?")
                .bind(&uuid)
                .execute(&mut *tx)
                .await?;
            for detail in &trx.details {
                sqlx::query(
                    "INSERT INTO details (transaction_uuid, amount, label_name) VALUES (?, ?, ?)",
                )
                .bind(&uuid)
                .bind(detail.amount)
                .bind(&detail.label)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
    }

    Ok(())
}
