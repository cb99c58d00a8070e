//! Journal records
//!
//! A record is the journal-level view of a transaction, or of one of its
//! details. Names go through the `headers` override so a ledger can carry
//! party aliases without rewriting its structured fields.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Transaction;

/// A journal-level value derived from a transaction or one of its details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub label: String,
    pub date: DateTime<Utc>,
    pub amount: i64,
    #[serde(default)]
    pub parent: String,
}

/// Look up a `key=` token in a transaction's headers field
pub fn header_override<'a>(headers: &'a str, keyword: &str) -> Option<&'a str> {
    headers
        .split_whitespace()
        .find_map(|token| token.strip_prefix(keyword))
}

impl Record {
    /// Build a record from a stored transaction, applying header overrides
    pub fn from_transaction(trx: &Transaction) -> Self {
        let sender = header_override(&trx.headers, "sender=").unwrap_or(&trx.sender);
        let receiver = header_override(&trx.headers, "receiver=").unwrap_or(&trx.receiver);

        Record {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            label: trx.label.clone(),
            date: trx.date,
            amount: trx.amount,
            parent: trx.uuid.clone().unwrap_or_default(),
        }
    }

    /// Tendency key for this record's sender/receiver pair
    pub fn party(&self) -> String {
        format!("sender={} receiver={}", self.sender, self.receiver)
    }

    /// Day of week with Sunday as 0
    pub fn weekday(&self) -> u32 {
        self.date.weekday().num_days_from_sunday()
    }

    /// Similarity grade against a stored transaction
    ///
    /// Zero unless amount and date match exactly; otherwise sender adds 1,
    /// receiver 2 and label 4, with header overrides applied on the
    /// transaction side.
    pub fn compare_with_transaction(&self, trx: &Transaction) -> i64 {
        let mut grade = 0;

        if trx.amount == self.amount && trx.date == self.date {
            let sender = header_override(&trx.headers, "sender=").unwrap_or(&trx.sender);
            if sender == self.sender {
                grade += 1;
            }

            let receiver = header_override(&trx.headers, "receiver=").unwrap_or(&trx.receiver);
            if receiver == self.receiver {
                grade += 2;
            }

            if trx.label == self.label {
                grade += 4;
            }
        }

        grade
    }

    /// One CSV line: sender, receiver, label, unix seconds, amount, parent
    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            csv_field(&self.sender),
            csv_field(&self.receiver),
            csv_field(&self.label),
            self.date.timestamp(),
            self.amount,
            csv_field(&self.parent),
        )
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
