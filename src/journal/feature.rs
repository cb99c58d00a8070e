//! Tendency features
//!
//! A feature summarizes the records of one (party, category) cluster:
//! polarity counts, the sorted amount stack and the calendar positions the
//! cluster has been seen at. The month list is special: it is only extended
//! by the month-adjacency rule in the tendency builder, never here.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::record::Record;
use crate::error::Error;

/// A clustered summary of records sharing party and category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub category: String,
    /// `[incoming, outgoing]` contribution counts; exactly one slot is
    /// incremented per record
    pub polarity: [i64; 2],
    /// Absolute amounts, sorted ascending, duplicates kept
    pub amounts: Vec<i64>,
    /// Weekdays seen (Sunday = 0), sorted, unique
    pub weekdays: Vec<u32>,
    /// Months seen, newest first
    pub months: Vec<u32>,
    /// Days of month seen, sorted, unique
    pub days: Vec<u32>,
}

impl Feature {
    /// Seed a feature from a single record
    pub fn from_record(record: &Record) -> Self {
        let mut polarity = [0, 0];
        let abs_value = if record.amount < 0 {
            polarity[1] += 1;
            -record.amount
        } else {
            polarity[0] += 1;
            record.amount
        };

        Feature {
            category: record.label.clone(),
            polarity,
            amounts: vec![abs_value],
            weekdays: vec![record.weekday()],
            months: vec![record.date.month()],
            days: vec![record.date.day()],
        }
    }

    /// Fold another record of the same category into this feature
    ///
    /// Months are untouched: the tendency builder owns the month list.
    pub fn update(&mut self, record: &Record) -> Result<(), Error> {
        if record.label != self.category {
            return Err(Error::FeatureMismatch {
                feature: self.category.clone(),
                record: record.label.clone(),
            });
        }

        let abs_value = if record.amount < 0 {
            self.polarity[1] += 1;
            -record.amount
        } else {
            self.polarity[0] += 1;
            record.amount
        };

        let at = self.amounts.partition_point(|&a| a < abs_value);
        self.amounts.insert(at, abs_value);

        let weekday = record.weekday();
        if !self.weekdays.contains(&weekday) {
            let at = self.weekdays.partition_point(|&w| w < weekday);
            self.weekdays.insert(at, weekday);
        }

        let day = record.date.day();
        if !self.days.contains(&day) {
            let at = self.days.partition_point(|&d| d < day);
            self.days.insert(at, day);
        }

        Ok(())
    }

    pub fn has_month(&self, month: u32) -> bool {
        self.months.contains(&month)
    }

    pub fn has_weekday(&self, weekday: u32) -> bool {
        self.weekdays.contains(&weekday)
    }

    pub fn has_day(&self, day: u32) -> bool {
        self.days.contains(&day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, amount: i64, label: &str) -> Record {
        Record {
            sender: "Alexandru".to_string(),
            receiver: "(livrator)".to_string(),
            label: label.to_string(),
            date: date.parse().unwrap(),
            amount,
            parent: "x".to_string(),
        }
    }

    #[test]
    fn seeding_sets_polarity_by_sign() {
        let outgoing = Feature::from_record(&record("2020-02-16T00:00:00Z", -5000, "Catering"));
        assert_eq!(outgoing.polarity, [0, 1]);
        assert_eq!(outgoing.amounts, vec![5000]);

        let incoming = Feature::from_record(&record("2020-02-16T00:00:00Z", 5000, "Catering"));
        assert_eq!(incoming.polarity, [1, 0]);
    }

    #[test]
    fn update_keeps_amounts_sorted_with_duplicates() {
        let mut feature = Feature::from_record(&record("2020-02-16T00:00:00Z", -5000, "Catering"));
        feature.update(&record("2020-02-21T00:00:00Z", -4000, "Catering")).unwrap();
        feature.update(&record("2020-02-25T00:00:00Z", -5000, "Catering")).unwrap();

        assert_eq!(feature.amounts, vec![4000, 5000, 5000]);
        assert_eq!(feature.polarity, [0, 3]);
        // polarity total equals the number of contributing records
        assert_eq!(feature.polarity[0] + feature.polarity[1], 3);
    }

    #[test]
    fn update_dedups_weekdays_and_days() {
        let mut feature = Feature::from_record(&record("2020-02-16T00:00:00Z", -5000, "Catering"));
        // same calendar slot twice
        feature.update(&record("2020-02-16T00:00:00Z", -100, "Catering")).unwrap();
        feature.update(&record("2020-02-21T00:00:00Z", -200, "Catering")).unwrap();

        assert_eq!(feature.weekdays.len(), 2);
        assert_eq!(feature.days, vec![16, 21]);
        assert!(feature.weekdays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn update_rejects_foreign_categories() {
        let mut feature = Feature::from_record(&record("2020-02-16T00:00:00Z", -5000, "Catering"));
        let before = feature.clone();

        assert!(feature.update(&record("2020-02-21T00:00:00Z", -100, "Alimente")).is_err());
        assert_eq!(feature, before);
    }

    #[test]
    fn update_leaves_months_alone() {
        let mut feature = Feature::from_record(&record("2020-02-16T00:00:00Z", -5000, "Catering"));
        feature.update(&record("2020-06-25T00:00:00Z", -5899, "Catering")).unwrap();

        assert_eq!(feature.months, vec![2]);
    }
}
