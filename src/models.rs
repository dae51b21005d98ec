use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub rep_name: String,
    pub month: String,
    pub metric: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub name: String,
    pub members: Vec<String>,
}

impl Cohort {
    pub fn new(name: &str, members: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            members: members.iter().map(|member| member.to_string()).collect(),
        }
    }

    pub fn contains(&self, rep_name: &str) -> bool {
        self.members.iter().any(|member| member == rep_name)
    }

    pub fn average_label(&self) -> String {
        format!("{} Team Avg", self.name)
    }
}

/// The two named cohorts. Reps listed in neither only count towards the
/// overall average.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohorts {
    pub buyside: Cohort,
    pub sellside: Cohort,
}

pub const OVERALL_AVERAGE_LABEL: &str = "Overall Team Avg";
pub const TEAM_AVERAGE_LABEL: &str = "Team Average";

impl Default for Cohorts {
    fn default() -> Self {
        Self {
            buyside: Cohort::new(
                "Buyside",
                &[
                    "Arturo Alvarado",
                    "Brandon Monroe",
                    "Courtney Close",
                    "Isabella Diaz",
                    "Kyle Schaefer",
                    "Mark Romeo",
                ],
            ),
            sellside: Cohort::new(
                "Sellside",
                &[
                    "Gabby Steele",
                    "Jack O'Connell",
                    "Josh Huntsman",
                    "Louise Ryan",
                    "Marlon Sabo",
                    "Tabatha Silva",
                ],
            ),
        }
    }
}

impl Cohorts {
    pub fn membership(&self, rep_name: &str) -> Option<CohortKind> {
        if self.buyside.contains(rep_name) {
            Some(CohortKind::Buyside)
        } else if self.sellside.contains(rep_name) {
            Some(CohortKind::Sellside)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortKind {
    Buyside,
    Sellside,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub reps: BTreeSet<String>,
    pub metrics: BTreeSet<String>,
    pub months: BTreeSet<String>,
    pub quarters: BTreeSet<String>,
}

impl FilterSelection {
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
            && self.metrics.is_empty()
            && self.months.is_empty()
            && self.quarters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthAverages {
    pub month: String,
    pub buyside: Option<f64>,
    pub sellside: Option<f64>,
    pub overall: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyAverageTable {
    pub months: Vec<MonthAverages>,
}

impl MonthlyAverageTable {
    pub fn get(&self, month: &str) -> Option<&MonthAverages> {
        self.months.iter().find(|entry| entry.month == month)
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Labelled view of one month, omitting cohorts without contributions.
    pub fn labelled(&self, month: &str, cohorts: &Cohorts) -> Vec<(String, f64)> {
        let Some(entry) = self.get(month) else {
            return Vec::new();
        };
        let mut values = Vec::new();
        if let Some(value) = entry.buyside {
            values.push((cohorts.buyside.average_label(), value));
        }
        if let Some(value) = entry.sellside {
            values.push((cohorts.sellside.average_label(), value));
        }
        values.push((OVERALL_AVERAGE_LABEL.to_string(), entry.overall));
        values
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeriesRow {
    pub month: String,
    pub values: BTreeMap<String, f64>,
    #[serde(skip)]
    order: Vec<String>,
}

impl ChartSeriesRow {
    pub fn new(month: &str) -> Self {
        Self {
            month: month.to_string(),
            values: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Sets a series value. Overwriting keeps the series' original position.
    pub fn insert(&mut self, series: String, value: f64) {
        if !self.values.contains_key(&series) {
            self.order.push(series.clone());
        }
        self.values.insert(series, value);
    }

    /// Series names in the order they were first set on this row.
    pub fn series(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, series: &str) -> Option<f64> {
        self.values.get(series).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Individual,
    Team,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TeamView {
    #[default]
    All,
    Buyside,
    Sellside,
}

impl TeamView {
    pub fn shows_buyside(self) -> bool {
        matches!(self, TeamView::All | TeamView::Buyside)
    }

    pub fn shows_sellside(self) -> bool {
        matches!(self, TeamView::All | TeamView::Sellside)
    }

    pub fn shows_overall(self) -> bool {
        self == TeamView::All
    }
}
