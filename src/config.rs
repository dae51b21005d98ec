use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::models::{Cohort, Cohorts};

pub const CSV_ENV_VAR: &str = "GONG_DASHBOARD_CSV";
/// Absolute path of the sample shipped in the crate, so the default works from
/// any working directory.
pub const DEFAULT_CSV_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/data/gong_mom_2025.csv");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read cohort file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid cohort file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("rep {0} is listed in both cohorts")]
    OverlappingRep(String),
}

/// Flag, then environment, then the bundled sample.
pub fn resolve_csv_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(CSV_ENV_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH))
}

#[derive(Debug, Deserialize)]
struct CohortFile {
    buyside: Vec<String>,
    sellside: Vec<String>,
}

pub fn load_cohorts(path: Option<&Path>) -> Result<Cohorts, ConfigError> {
    let Some(path) = path else {
        return Ok(Cohorts::default());
    };

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cohorts(&text, path)
}

fn parse_cohorts(text: &str, path: &Path) -> Result<Cohorts, ConfigError> {
    let file: CohortFile = serde_json::from_str(text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(rep) = file.buyside.iter().find(|rep| file.sellside.contains(rep)) {
        return Err(ConfigError::OverlappingRep(rep.clone()));
    }

    let defaults = Cohorts::default();
    Ok(Cohorts {
        buyside: Cohort {
            name: defaults.buyside.name,
            members: file.buyside,
        },
        sellside: Cohort {
            name: defaults.sellside.name,
            members: file.sellside,
        },
    })
}
