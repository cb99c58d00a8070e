//! Journal subsystem
//!
//! Takes a signature's stored transactions, explodes them into per-detail
//! records with integrity validation, builds the tendency model and caches
//! both under the signature. Analysis requests score candidate records
//! against that cache and against overlapping stored history.

use crate::db::{self, Transaction};
use crate::error::Result;
use crate::AppState;

pub mod analyze;
pub mod feature;
pub mod record;
pub mod tendency;

pub use analyze::{PointBus, Similarity, Statement};
pub use feature::Feature;
pub use record::Record;
pub use tendency::Tendency;

/// Cached outcome of one evaluate run
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub records: Vec<Record>,
    pub patterns: Tendency,
}

/// Rebuild the record list and tendency model for a signature
///
/// The cache entry is replaced wholesale under a single write lock, so
/// concurrent readers observe either the previous or the new state.
pub async fn evaluate(state: &AppState, signature: &str) -> Result<()> {
    let transactions = db::transactions::pull_by_signature(&state.db, signature, state.batch).await?;

    let records = explode(&transactions);
    let patterns = tendency::compute(&records);

    state
        .journal
        .write()
        .await
        .insert(signature.to_string(), JournalEntry { records, patterns });

    Ok(())
}

/// Explode stored transactions into journal records
///
/// A detail-bearing transaction becomes one record per detail, with the
/// detail's label and amount and the sign borrowed from the parent. When the
/// signed detail total disagrees with the transaction amount the whole
/// transaction is corrupt and contributes nothing; it stays in storage.
pub fn explode(transactions: &[Transaction]) -> Vec<Record> {
    let mut records = Vec::with_capacity(transactions.len());

    for trx in transactions {
        if trx.details.is_empty() {
            records.push(Record::from_transaction(trx));
            continue;
        }

        let mut shadows = Vec::with_capacity(trx.details.len());
        let mut total: i64 = 0;

        for detail in &trx.details {
            let mut shadow = Record::from_transaction(trx);
            shadow.label = detail.label.clone();
            shadow.amount = if trx.amount < 0 { -detail.amount } else { detail.amount };

            total += shadow.amount;
            shadows.push(shadow);
        }

        if trx.amount == total {
            records.append(&mut shadows);
        }
    }

    records
}
