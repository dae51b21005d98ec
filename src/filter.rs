use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{FilterSelection, Record};

const QUARTERS: [(&str, [&str; 3]); 2] = [
    ("Q1 2025", ["2025-01", "2025-02", "2025-03"]),
    ("Q2 2025", ["2025-04", "2025-05", "2025-06"]),
];

/// Quarter label for a month token, if the month falls in a known quarter.
pub fn quarter_for_month(month: &str) -> Option<&'static str> {
    QUARTERS
        .iter()
        .find(|(_, months)| months.iter().any(|m| month.contains(m)))
        .map(|(quarter, _)| *quarter)
}

pub fn filter_records(records: &[Record], selection: &FilterSelection) -> Vec<Record> {
    records
        .iter()
        .filter(|record| matches_selection(record, selection))
        .cloned()
        .collect()
}

pub fn matches_selection(record: &Record, selection: &FilterSelection) -> bool {
    if !selection.reps.is_empty() && !selection.reps.contains(&record.rep_name) {
        return false;
    }
    matches_team_scope(record, selection)
}

/// Metric, month and quarter checks only. Team averages are computed over
/// every rep, so the rep dimension is never consulted here.
pub fn matches_team_scope(record: &Record, selection: &FilterSelection) -> bool {
    if !selection.metrics.is_empty() && !selection.metrics.contains(&record.metric) {
        return false;
    }
    if !selection.months.is_empty() && !selection.months.contains(&record.month) {
        return false;
    }
    if !selection.quarters.is_empty() {
        match quarter_for_month(&record.month) {
            Some(quarter) if selection.quarters.contains(quarter) => {}
            _ => return false,
        }
    }
    true
}

/// Choices offered for each filter dimension, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub reps: Vec<String>,
    pub metrics: Vec<String>,
    pub months: Vec<String>,
    pub quarters: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[Record]) -> Self {
        let mut reps = BTreeSet::new();
        let mut metrics = BTreeSet::new();
        let mut months = BTreeSet::new();
        let mut quarters = BTreeSet::new();

        for record in records {
            reps.insert(record.rep_name.clone());
            metrics.insert(record.metric.clone());
            months.insert(record.month.clone());
            if let Some(quarter) = quarter_for_month(&record.month) {
                quarters.insert(quarter.to_string());
            }
        }

        Self {
            reps: reps.into_iter().collect(),
            metrics: metrics.into_iter().collect(),
            months: months.into_iter().collect(),
            quarters: quarters.into_iter().collect(),
        }
    }
}
