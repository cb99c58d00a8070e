//! Candidate scoring and similarity grading
//!
//! Each candidate record is compared against the overlapping stored
//! transactions for near-duplicates and scored against the cached tendency
//! model for a label prediction. Scores travel on a six-slot point bus whose
//! positions are a stable schema: 0 deviation hit, 1 approximate hit,
//! 2 month hit, 3 weekday hit, 4 day hit, 5 popularity.

use std::collections::HashMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::record::Record;
use super::tendency::Tendency;
use crate::db::Transaction;

/// Six-slot score vector for one (candidate, category) pairing
pub type PointBus = [i64; 6];

/// A graded near-duplicate match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Similarity {
    pub grade: i64,
    #[serde(rename = "record")]
    pub mirror: Record,
    pub parent: Transaction,
}

/// Analysis output for one candidate record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    #[serde(flatten)]
    pub record: Record,

    #[serde(rename = "$calculated")]
    pub calculated: HashMap<String, PointBus>,
    #[serde(rename = "$similarity")]
    pub similarity: Vec<Similarity>,
}

/// Score candidates against stored transactions and the tendency model
///
/// `patterns` is the cached model for the candidates' signature; without one
/// the prediction side stays empty and only similarity is graded.
pub fn research(
    stored: &[Transaction],
    candidates: &[Record],
    patterns: Option<&Tendency>,
) -> Vec<Statement> {
    let mut statements = Vec::with_capacity(candidates.len());

    for record in candidates {
        let mut statement = Statement {
            record: record.clone(),
            calculated: HashMap::new(),
            similarity: Vec::new(),
        };

        // look for duplicate or similar transactions
        for transaction in stored {
            let grade = record.compare_with_transaction(transaction);
            if grade > 0 {
                statement.similarity.push(Similarity {
                    grade,
                    mirror: Record::from_transaction(transaction),
                    parent: transaction.clone(),
                });
            }
        }

        // look for labels based on previously calculated patterns
        if let Some(features) = patterns.and_then(|p| p.get(&record.party())) {
            let mut score: HashMap<String, PointBus> = HashMap::new();

            for feature in features {
                if feature.amounts.is_empty() {
                    warn!("feature \"{}\" has no amounts", feature.category);
                    continue;
                }

                // polarity gate: the feature must have seen money flowing the
                // same way as the candidate
                if (feature.polarity[0] == 0 && record.amount > 0)
                    || (feature.polarity[1] == 0 && record.amount < 0)
                {
                    continue;
                }

                let abs_value = record.amount.abs();
                let mut points: PointBus = [0; 6];

                if feature.amounts.len() > 1 {
                    if is_between_amount_deviation(&feature.amounts, abs_value) {
                        points[0] += 1;
                    }
                } else if is_between_amount_aprox(feature.amounts[0], abs_value) {
                    points[1] += 1;
                }

                if feature.has_month(record.date.month()) {
                    points[2] += 1;
                }
                if feature.has_weekday(record.weekday()) {
                    points[3] += 1;
                }
                if feature.has_day(record.date.day()) {
                    points[4] += 1;
                }

                if points.iter().sum::<i64>() == 0 {
                    continue;
                }

                // polarity average as a crude popularity weight
                points[5] += (feature.polarity[0] + feature.polarity[1]) / 2;

                score
                    .entry(feature.category.clone())
                    .and_modify(|acc| {
                        for (slot, point) in acc.iter_mut().zip(points) {
                            *slot += point;
                        }
                    })
                    .or_insert(points);
            }

            statement.calculated = score;
        }

        statements.push(statement);
    }

    statements
}

/// Deviation-band test for features with more than one observed amount
///
/// The candidate joins the sorted amount stack; the band is the integer
/// amount median widened by the median of the neighbor-gap ratios.
pub fn is_between_amount_deviation(amounts: &[i64], value: i64) -> bool {
    let mut all = amounts.to_vec();
    all.push(value);
    all.sort_unstable();

    let mut deviation = Vec::with_capacity(all.len() - 1);
    for pair in all.windows(2) {
        deviation.push((pair[1] - pair[0]) as f64 / pair[1] as f64);
    }

    let amount_median = int_median(&all) as f64;
    let deviation_median = float_median(&deviation);

    let dif = amount_median * deviation_median;
    let min = amount_median - dif;
    let max = amount_median + dif;

    min as i64 <= value && value <= max as i64
}

/// Approximate-band test for single-amount features
///
/// The band spans the round-hundreds neighborhood of the amount: two decimal
/// digits are dropped so only the integral currency part is kept.
pub fn is_between_amount_aprox(amount: i64, value: i64) -> bool {
    let digits = amount.to_string().len() as i32 - 2;

    let pow10 = power(10, digits) as f64;
    let ratio = amount as f64 / pow10;

    let min = ratio.floor() * pow10;
    let max = ratio.ceil() * pow10;

    min as i64 <= value && value <= max as i64
}

fn int_median(ns: &[i64]) -> i64 {
    if ns.len() % 2 == 1 {
        return ns[ns.len() / 2];
    }

    let next = ns.len() / 2;
    (ns[next - 1] + ns[next]) / 2
}

fn float_median(ns: &[f64]) -> f64 {
    if ns.len() % 2 == 1 {
        return ns[ns.len() / 2];
    }

    let next = ns.len() / 2;
    (ns[next - 1] + ns[next]) / 2.0
}

fn power(num: i64, exp: i32) -> i64 {
    if exp == 0 {
        return 1;
    }

    let mut result = num;
    for _ in 2..=exp {
        result *= num;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::feature::Feature;
    use crate::journal::tendency::compute;

    fn record(date: &str, amount: i64, label: &str) -> Record {
        Record {
            sender: "Actor #1".to_string(),
            receiver: "Actor #2".to_string(),
            label: label.to_string(),
            date: date.parse().unwrap(),
            amount,
            parent: "xxx".to_string(),
        }
    }

    #[test]
    fn deviation_band_accepts_nearby_amounts() {
        // stack [930, 2410], candidate 1200: median 1200, gap ratios
        // 0.225 and 0.502 give a band of about ±436
        assert!(is_between_amount_deviation(&[930, 2410], 1200));
        assert!(!is_between_amount_deviation(&[930, 2410], 5000));
    }

    #[test]
    fn deviation_band_handles_tight_stacks() {
        assert!(is_between_amount_deviation(&[5000, 5000], 5000));
        assert!(!is_between_amount_deviation(&[5000, 5000], 9000));
    }

    #[test]
    fn aprox_band_spans_round_hundreds() {
        // 3822 → band [3800, 3900]
        assert!(is_between_amount_aprox(3822, 3822));
        assert!(is_between_amount_aprox(3822, 3899));
        assert!(!is_between_amount_aprox(3822, 1200));
        assert!(!is_between_amount_aprox(3822, 3999));
    }

    #[test]
    fn aprox_band_survives_tiny_amounts() {
        // fewer than three digits leaves a single power of ten
        assert!(is_between_amount_aprox(5, 5));
        assert!(is_between_amount_aprox(57, 57));
    }

    #[test]
    fn power_matches_integer_exponentiation() {
        assert_eq!(power(10, 0), 1);
        assert_eq!(power(10, 1), 10);
        assert_eq!(power(10, 3), 1000);
        // negative exponents collapse to the base
        assert_eq!(power(10, -1), 10);
    }

    fn catering_patterns() -> Tendency {
        let records = vec![
            record("2020-04-10T00:00:00Z", -5149, "Catering"),
            record("2020-03-20T00:00:00Z", -5899, "Catering"),
            record("2020-03-05T00:00:00Z", -3000, "Catering"),
        ];
        compute(&records)
    }

    #[test]
    fn polarity_gate_blocks_opposite_flow() {
        let patterns = catering_patterns();

        // the model only saw outgoing catering money; an incoming candidate
        // of the same size scores nothing
        let incoming = record("2020-03-12T00:00:00Z", 4000, "");
        let statements = research(&[], &[incoming], Some(&patterns));
        assert!(statements[0].calculated.is_empty());

        let outgoing = record("2020-03-12T00:00:00Z", -4000, "");
        let statements = research(&[], &[outgoing], Some(&patterns));
        let points = statements[0].calculated.get("Catering").unwrap();
        assert!(points[0] > 0 || points[1] > 0 || points[2] > 0);
    }

    #[test]
    fn popularity_rides_slot_five() {
        let patterns = catering_patterns();

        let candidate = record("2020-03-12T00:00:00Z", -4000, "");
        let statements = research(&[], &[candidate], Some(&patterns));
        let points = statements[0].calculated.get("Catering").unwrap();

        // two contributions halve to one
        assert_eq!(points[5], 1);
    }

    #[test]
    fn zero_point_features_are_dropped() {
        let feature = Feature {
            category: "Chirie".to_string(),
            polarity: [0, 4],
            amounts: vec![90000, 90000, 90000, 90000],
            weekdays: vec![1],
            months: vec![1],
            days: vec![1],
        };
        let mut patterns = Tendency::new();
        patterns.insert("sender=Actor #1 receiver=Actor #2".to_string(), vec![feature]);

        // far away on every dimension: no entry at all, popularity included
        let candidate = record("2020-06-20T00:00:00Z", -123, "");
        let statements = research(&[], &[candidate], Some(&patterns));
        assert!(statements[0].calculated.is_empty());
    }

    #[test]
    fn scores_accumulate_per_category() {
        let make = |amounts: Vec<i64>| Feature {
            category: "Catering".to_string(),
            polarity: [0, amounts.len() as i64],
            amounts,
            weekdays: vec![0, 1, 2, 3, 4, 5, 6],
            months: vec![3],
            days: vec![12],
        };
        let mut patterns = Tendency::new();
        patterns.insert(
            "sender=Actor #1 receiver=Actor #2".to_string(),
            vec![make(vec![4000, 4100]), make(vec![3900, 4050])],
        );

        let candidate = record("2020-03-12T00:00:00Z", -4000, "");
        let statements = research(&[], &[candidate], Some(&patterns));
        let points = statements[0].calculated.get("Catering").unwrap();

        // both features hit month, weekday and day
        assert_eq!(points[2], 2);
        assert_eq!(points[3], 2);
        assert_eq!(points[4], 2);
    }

    #[test]
    fn missing_model_still_grades_similarity() {
        let trx = Transaction {
            uuid: Some("e1bd9319-e4f2-47cc-98b4-764d83d755dc".to_string()),
            signature: "test-signature".to_string(),
            date: "2020-02-06T00:00:00Z".parse().unwrap(),
            amount: -1500,
            label: "Label #1.1".to_string(),
            sender: "Actor #1".to_string(),
            receiver: "Actor #5".to_string(),
            headers: String::new(),
            details: Vec::new(),
        };

        let mut candidate = record("2020-02-06T00:00:00Z", -1500, "");
        candidate.receiver = "Actor #5".to_string();

        let statements = research(&[trx], &[candidate], None);
        assert_eq!(statements[0].similarity.len(), 1);
        assert_eq!(statements[0].similarity[0].grade, 3);
        assert!(statements[0].calculated.is_empty());
    }
}
