use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::models::Record;

pub const EXCLUDED_METRIC: &str = "Total Calls (Interaction)";

/// Source labels whose units were ambiguous, mapped to their explicit forms.
pub const METRIC_RENAMES: [(&str, &str); 5] = [
    ("Longest Monologue (min)", "Longest Monologue (sec)"),
    ("Longest Interview (min)", "Longest Interview (sec)"),
    ("Total Call Time (min)", "Total Call Time (Avg min)"),
    ("Avg Call Duration (min)", "Avg Call Duration (Avg min)"),
    ("Call Time per Week (min)", "Call Time per Week (Avg min)"),
];

const REQUIRED_COLUMNS: [&str; 4] = ["User Name", "Month", "Metric", "Value"];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV header is missing the `{0}` column")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Ready,
    Failed(String),
}

/// Records produced by one load. A failed load carries no records.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub status: LoadStatus,
}

impl Dataset {
    pub fn failed(err: &LoadError) -> Self {
        Self {
            records: Vec::new(),
            status: LoadStatus::Failed(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "User Name")]
    user_name: Option<String>,
    #[serde(rename = "Month")]
    month: Option<String>,
    #[serde(rename = "Metric")]
    metric: Option<String>,
    #[serde(rename = "Value")]
    value: Option<String>,
}

pub async fn load(path: &Path) -> Dataset {
    info!(path = %path.display(), "loading call metrics");

    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(source) => {
            let err = LoadError::Io {
                path: path.to_path_buf(),
                source,
            };
            error!(error = %err, "error loading CSV");
            return Dataset::failed(&err);
        }
    };

    match parse_records(&text) {
        Ok(records) => {
            info!("Loaded {} records from CSV", records.len());
            Dataset {
                records,
                status: LoadStatus::Ready,
            }
        }
        Err(err) => {
            error!(error = %err, "error parsing CSV");
            Dataset::failed(&err)
        }
    }
}

pub fn parse_records(text: &str) -> Result<Vec<Record>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(LoadError::MissingColumn(column));
        }
    }

    let mut records = Vec::new();
    for (index, result) in reader.deserialize::<RawRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                warn!(row = index + 1, error = %err, "skipping undecodable row");
                continue;
            }
        };
        match normalize_row(row) {
            Some(record) => records.push(record),
            None => debug!(row = index + 1, "dropped row"),
        }
    }

    Ok(records)
}

fn normalize_row(row: RawRow) -> Option<Record> {
    let rep_name = non_empty(row.user_name)?;
    let month = non_empty(row.month)?;
    let metric = non_empty(row.metric)?;

    if metric == EXCLUDED_METRIC {
        return None;
    }

    let value = coerce_value(row.value.as_deref())?;

    Some(Record {
        rep_name,
        month,
        metric: rename_metric(metric),
        value,
    })
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

pub fn rename_metric(metric: String) -> String {
    METRIC_RENAMES
        .iter()
        .find(|(from, _)| *from == metric)
        .map(|(_, to)| to.to_string())
        .unwrap_or(metric)
}

fn coerce_value(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}
