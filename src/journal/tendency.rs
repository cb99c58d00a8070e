//! Tendency model build
//!
//! The builder walks the record list from the oldest entry up to index 1 and
//! reads each record together with its successor in the list, whose month is
//! the "next month" hint. A hint that is month-adjacent to a feature's head
//! month marks a recurring monthly obligation: the hint month is prepended
//! and the record folded in. A record in the same calendar month as the head
//! folds without extending the months. Anything else opens a fresh feature,
//! keeping the older episode in the tail of the list. The index-0 record
//! itself never contributes; it only ever serves as a hint.

use std::collections::HashMap;

use chrono::Datelike;
use indexmap::IndexMap;
use tracing::warn;

use super::feature::Feature;
use super::record::Record;

/// Label sentinel for records that carry no category
pub const UNNAMED_ENTRY: &str = "?";

/// Flattened party → feature-list model for one signature
pub type Tendency = HashMap<String, Vec<Feature>>;

/// Internal model: party → category → features, newest feature first.
/// Categories keep first-insertion order so flattening is deterministic.
type Routines = HashMap<String, IndexMap<String, Vec<Feature>>>;

/// Build the tendency model from a signature's record list
pub fn compute(records: &[Record]) -> Tendency {
    let mut model = Routines::new();

    for i in (1..records.len()).rev() {
        let record = &records[i];
        if record.label != UNNAMED_ENTRY {
            let next_month = records[i - 1].date.month();
            calculate(&mut model, record.party(), next_month, record);
        }
    }

    let mut conclusion = Tendency::new();
    for (party, categories) in model {
        let mut flat = Vec::new();
        for (_, features) in categories {
            flat.extend(features);
        }
        conclusion.insert(party, flat);
    }

    conclusion
}

fn calculate(model: &mut Routines, party: String, next_month: u32, record: &Record) {
    let features = model
        .entry(party)
        .or_default()
        .entry(record.label.clone())
        .or_default();

    if features.is_empty() {
        features.push(Feature::from_record(record));
        return;
    }

    let last_month = features[0].months[0];

    if last_month + 1 == next_month || (last_month == 12 && next_month == 1) {
        // recurring monthly obligation: extend the month chain and fold
        let mut head = features[0].clone();
        head.months.insert(0, next_month);
        match head.update(record) {
            Ok(()) => features[0] = head,
            Err(e) => warn!("calculate features error: {e}"),
        }
    } else if record.date.month() == last_month {
        let mut head = features[0].clone();
        match head.update(record) {
            Ok(()) => features[0] = head,
            Err(e) => warn!("calculate features error: {e}"),
        }
    } else {
        // month gap: a new recurring episode begins
        features.insert(0, Feature::from_record(record));
    }
}
