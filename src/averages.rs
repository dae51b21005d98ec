use std::collections::HashMap;

use crate::filter::matches_team_scope;
use crate::models::{CohortKind, Cohorts, FilterSelection, MonthAverages, MonthlyAverageTable, Record};

#[derive(Debug, Default)]
struct MonthBucket {
    buyside: Vec<f64>,
    sellside: Vec<f64>,
    all: Vec<f64>,
}

/// Per-month cohort averages for one metric across every rep. The rep
/// filter in `selection` is ignored; metric, month and quarter filters apply.
pub fn team_averages(
    records: &[Record],
    metric: &str,
    selection: &FilterSelection,
    cohorts: &Cohorts,
) -> MonthlyAverageTable {
    let mut order: Vec<(String, MonthBucket)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records.iter() {
        if record.metric != metric || !matches_team_scope(record, selection) {
            continue;
        }

        let slot = *index.entry(record.month.as_str()).or_insert_with(|| {
            order.push((record.month.clone(), MonthBucket::default()));
            order.len() - 1
        });
        let bucket = &mut order[slot].1;

        bucket.all.push(record.value);
        match cohorts.membership(&record.rep_name) {
            Some(CohortKind::Buyside) => bucket.buyside.push(record.value),
            Some(CohortKind::Sellside) => bucket.sellside.push(record.value),
            None => {}
        }
    }

    let months = order
        .into_iter()
        .filter_map(|(month, bucket)| {
            Some(MonthAverages {
                month,
                buyside: rounded_mean(&bucket.buyside),
                sellside: rounded_mean(&bucket.sellside),
                overall: rounded_mean(&bucket.all)?,
            })
        })
        .collect();

    MonthlyAverageTable { months }
}

pub fn rounded_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(round_to_cents(mean))
}

/// Two decimals, halves rounded towards positive infinity.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}
