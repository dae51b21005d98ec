use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::averages::team_averages;
use crate::filter::filter_records;
use crate::models::{
    ChartSeriesRow, Cohorts, FilterSelection, MonthlyAverageTable, Record, TeamView, ViewMode,
    OVERALL_AVERAGE_LABEL, TEAM_AVERAGE_LABEL,
};

pub const ACTIVITY_METRICS: [&str; 5] = [
    "Total Calls",
    "Calls per Week",
    "Total Call Time (Avg min)",
    "Avg Call Duration (Avg min)",
    "Call Time per Week (Avg min)",
];

pub const INTERACTION_METRICS: [&str; 6] = [
    "Avg Talk %",
    "Longest Monologue (sec)",
    "Longest Interview (sec)",
    "Interactivity Score",
    "Patience (sec)",
    "Questions/hr",
];

const BENCHMARKS: [(&str, f64); 6] = [
    ("Avg Talk %", 65.0),
    ("Longest Monologue (sec)", 150.0),
    ("Longest Interview (sec)", 60.0),
    ("Interactivity Score", 5.0),
    ("Patience (sec)", 0.6),
    ("Questions/hr", 18.0),
];

const PERCENT_METRIC: &str = "Avg Talk %";

/// Reference value drawn as a marker on a metric's chart.
pub fn benchmark(metric: &str) -> Option<f64> {
    BENCHMARKS
        .iter()
        .find(|(name, _)| *name == metric)
        .map(|(_, value)| *value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    Percent,
    Seconds,
    Plain,
}

impl ValueFormat {
    pub fn for_metric(metric: &str) -> Self {
        if metric == PERCENT_METRIC {
            ValueFormat::Percent
        } else if metric.contains("(sec)") {
            ValueFormat::Seconds
        } else {
            ValueFormat::Plain
        }
    }

    pub fn format(self, value: f64) -> String {
        match self {
            ValueFormat::Percent => format!("{value}%"),
            ValueFormat::Seconds => format!("{value}s"),
            ValueFormat::Plain => format!("{value}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSection {
    Activity,
    Interaction,
}

impl MetricSection {
    pub fn title(self) -> &'static str {
        match self {
            MetricSection::Activity => "Activity Metrics",
            MetricSection::Interaction => "Interaction Metrics",
        }
    }

    pub fn metrics(self) -> &'static [&'static str] {
        match self {
            MetricSection::Activity => &ACTIVITY_METRICS,
            MetricSection::Interaction => &INTERACTION_METRICS,
        }
    }
}

pub fn shape_individual(
    filtered: &[Record],
    metric: &str,
    overlay: Option<(&MonthlyAverageTable, TeamView, &Cohorts)>,
) -> Vec<ChartSeriesRow> {
    let mut rows: Vec<ChartSeriesRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in filtered.iter().filter(|record| record.metric == metric) {
        let slot = *index.entry(record.month.as_str()).or_insert_with(|| {
            rows.push(ChartSeriesRow::new(&record.month));
            rows.len() - 1
        });
        rows[slot].insert(record.rep_name.clone(), record.value);
    }

    if let Some((table, team_view, cohorts)) = overlay {
        for row in rows.iter_mut() {
            let Some(averages) = table.get(&row.month) else {
                continue;
            };
            if team_view.shows_buyside() {
                if let Some(value) = averages.buyside {
                    row.insert(cohorts.buyside.average_label(), value);
                }
            }
            if team_view.shows_sellside() {
                if let Some(value) = averages.sellside {
                    row.insert(cohorts.sellside.average_label(), value);
                }
            }
            if team_view.shows_overall() {
                row.insert(OVERALL_AVERAGE_LABEL.to_string(), averages.overall);
            }
        }
    }

    rows
}

pub fn shape_team(table: &MonthlyAverageTable) -> Vec<ChartSeriesRow> {
    table
        .months
        .iter()
        .map(|entry| {
            let mut row = ChartSeriesRow::new(&entry.month);
            row.insert(TEAM_AVERAGE_LABEL.to_string(), entry.overall);
            row
        })
        .collect()
}

/// Stable sort by calendar month. Tokens that do not parse as `YYYY-MM`
/// go last, ordered as strings.
pub fn sort_chronologically(rows: &mut [ChartSeriesRow]) {
    rows.sort_by(|a, b| match (parse_month(&a.month), parse_month(&b.month)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.month.cmp(&b.month),
    });
}

fn parse_month(month: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Team-average bars only.
    Bar,
    /// Rep bars with team-average lines.
    Composed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesRole {
    Rep,
    Team,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSpec {
    pub name: String,
    pub role: SeriesRole,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricChart {
    pub metric: String,
    pub section: MetricSection,
    pub kind: ChartKind,
    pub benchmark: Option<f64>,
    pub format: ValueFormat,
    pub series: Vec<SeriesSpec>,
    pub rows: Vec<ChartSeriesRow>,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    pub selection: FilterSelection,
    pub view_mode: ViewMode,
    pub show_team_average: bool,
    pub team_view: TeamView,
    pub chronological: bool,
}

/// One chart per catalogued metric that survives the metric filter and has
/// data, activity metrics first.
pub fn build_dashboard(
    records: &[Record],
    request: &DashboardRequest,
    cohorts: &Cohorts,
) -> Vec<MetricChart> {
    let filtered = filter_records(records, &request.selection);
    let mut charts = Vec::new();

    for section in [MetricSection::Activity, MetricSection::Interaction] {
        for metric in section.metrics() {
            let selected = request.selection.metrics.is_empty()
                || request.selection.metrics.contains(*metric);
            if !selected {
                continue;
            }
            if let Some(chart) = build_chart(records, &filtered, metric, section, request, cohorts)
            {
                charts.push(chart);
            }
        }
    }

    charts
}

fn build_chart(
    records: &[Record],
    filtered: &[Record],
    metric: &str,
    section: MetricSection,
    request: &DashboardRequest,
    cohorts: &Cohorts,
) -> Option<MetricChart> {
    let (kind, mut rows) = match request.view_mode {
        ViewMode::Individual => {
            let rows = if request.show_team_average {
                let table = team_averages(records, metric, &request.selection, cohorts);
                let overlay = Some((&table, request.team_view, cohorts));
                shape_individual(filtered, metric, overlay)
            } else {
                shape_individual(filtered, metric, None)
            };
            (ChartKind::Composed, rows)
        }
        ViewMode::Team => {
            let table = team_averages(records, metric, &request.selection, cohorts);
            (ChartKind::Bar, shape_team(&table))
        }
    };

    if rows.is_empty() {
        return None;
    }
    if request.chronological {
        sort_chronologically(&mut rows);
    }

    Some(MetricChart {
        metric: metric.to_string(),
        section,
        kind,
        benchmark: benchmark(metric),
        format: ValueFormat::for_metric(metric),
        series: series_specs(&rows, kind, cohorts),
        rows,
    })
}

/// Rep series first, then team series, each in first-seen order across rows.
fn series_specs(rows: &[ChartSeriesRow], kind: ChartKind, cohorts: &Cohorts) -> Vec<SeriesSpec> {
    let is_team = |name: &str| {
        kind == ChartKind::Bar
            || name == OVERALL_AVERAGE_LABEL
            || name == cohorts.buyside.average_label()
            || name == cohorts.sellside.average_label()
    };

    let mut reps: Vec<&str> = Vec::new();
    let mut teams: Vec<&str> = Vec::new();
    for row in rows {
        for name in row.series() {
            let bucket = if is_team(name) { &mut teams } else { &mut reps };
            if !bucket.contains(&name.as_str()) {
                bucket.push(name);
            }
        }
    }

    let rep_count = reps.len() as f64;
    let mut specs = Vec::with_capacity(reps.len() + teams.len());
    for (index, name) in reps.into_iter().enumerate() {
        let hue = index as f64 * 360.0 / rep_count;
        specs.push(SeriesSpec {
            name: name.to_string(),
            role: SeriesRole::Rep,
            color: format!("hsl({hue}, 70%, 50%)"),
        });
    }
    for name in teams {
        specs.push(SeriesSpec {
            name: name.to_string(),
            role: SeriesRole::Team,
            color: team_color(name, cohorts).to_string(),
        });
    }
    specs
}

fn team_color(name: &str, cohorts: &Cohorts) -> &'static str {
    if name == cohorts.buyside.average_label() {
        "#10B981"
    } else if name == cohorts.sellside.average_label() {
        "#F59E0B"
    } else if name == OVERALL_AVERAGE_LABEL || name == TEAM_AVERAGE_LABEL {
        "#8B5CF6"
    } else {
        "#6B7280"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonthAverages;

    fn record(rep: &str, month: &str, metric: &str, value: f64) -> Record {
        Record {
            rep_name: rep.to_string(),
            month: month.to_string(),
            metric: metric.to_string(),
            value,
        }
    }

    fn talk_records() -> Vec<Record> {
        vec![
            record("Mark Romeo", "2025-02", "Avg Talk %", 61.0),
            record("Gabby Steele", "2025-02", "Avg Talk %", 79.0),
            record("Mark Romeo", "2025-01", "Avg Talk %", 58.0),
            record("Gabby Steele", "2025-01", "Questions/hr", 20.0),
        ]
    }

    fn table() -> MonthlyAverageTable {
        MonthlyAverageTable {
            months: vec![
                MonthAverages {
                    month: "2025-02".to_string(),
                    buyside: Some(61.0),
                    sellside: Some(79.0),
                    overall: 70.0,
                },
                MonthAverages {
                    month: "2025-01".to_string(),
                    buyside: Some(58.0),
                    sellside: None,
                    overall: 58.0,
                },
            ],
        }
    }

    #[test]
    fn individual_rows_carry_raw_rep_values() {
        let rows = shape_individual(&talk_records(), "Avg Talk %", None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, "2025-02");
        assert_eq!(rows[0].get("Mark Romeo"), Some(61.0));
        assert_eq!(rows[0].get("Gabby Steele"), Some(79.0));
        assert_eq!(rows[1].month, "2025-01");
        assert_eq!(rows[1].get("Mark Romeo"), Some(58.0));
        assert_eq!(rows[1].get("Gabby Steele"), None);
    }

    #[test]
    fn later_duplicate_overwrites_rep_value() {
        let records = vec![
            record("Mark Romeo", "2025-01", "Avg Talk %", 58.0),
            record("Mark Romeo", "2025-01", "Avg Talk %", 59.5),
        ];
        let rows = shape_individual(&records, "Avg Talk %", None);
        assert_eq!(rows[0].get("Mark Romeo"), Some(59.5));
    }

    #[test]
    fn overlay_follows_team_view() {
        let cohorts = Cohorts::default();
        let table = table();

        let overlay = Some((&table, TeamView::All, &cohorts));
        let all = shape_individual(&talk_records(), "Avg Talk %", overlay);
        assert_eq!(all[0].get("Buyside Team Avg"), Some(61.0));
        assert_eq!(all[0].get("Sellside Team Avg"), Some(79.0));
        assert_eq!(all[0].get("Overall Team Avg"), Some(70.0));
        assert_eq!(all[1].get("Sellside Team Avg"), None);

        let overlay = Some((&table, TeamView::Sellside, &cohorts));
        let sellside = shape_individual(&talk_records(), "Avg Talk %", overlay);
        assert_eq!(sellside[0].get("Sellside Team Avg"), Some(79.0));
        assert_eq!(sellside[0].get("Buyside Team Avg"), None);
        assert_eq!(sellside[0].get("Overall Team Avg"), None);
    }

    #[test]
    fn team_rows_use_overall_average() {
        let rows = shape_team(&table());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(TEAM_AVERAGE_LABEL), Some(70.0));
        assert_eq!(rows[1].get(TEAM_AVERAGE_LABEL), Some(58.0));
        assert_eq!(rows[0].values.len(), 1);
    }

    #[test]
    fn chronological_sort_is_opt_in() {
        let mut rows = shape_team(&table());
        assert_eq!(rows[0].month, "2025-02");
        sort_chronologically(&mut rows);
        let months: Vec<&str> = rows.iter().map(|row| row.month.as_str()).collect();
        assert_eq!(months, vec!["2025-01", "2025-02"]);
    }

    #[test]
    fn unparseable_months_sort_last() {
        let mut rows = vec![
            ChartSeriesRow::new("unknown"),
            ChartSeriesRow::new("2025-03"),
            ChartSeriesRow::new("2024-12"),
        ];
        sort_chronologically(&mut rows);
        let months: Vec<&str> = rows.iter().map(|row| row.month.as_str()).collect();
        assert_eq!(months, vec!["2024-12", "2025-03", "unknown"]);
    }

    #[test]
    fn catalog_lookups() {
        assert_eq!(benchmark("Avg Talk %"), Some(65.0));
        assert_eq!(benchmark("Patience (sec)"), Some(0.6));
        assert_eq!(benchmark("Total Calls"), None);
        assert_eq!(ValueFormat::for_metric("Avg Talk %").format(60.0), "60%");
        assert_eq!(ValueFormat::for_metric("Longest Monologue (sec)").format(150.5), "150.5s");
        assert_eq!(ValueFormat::for_metric("Questions/hr").format(18.0), "18");
    }

    #[test]
    fn dashboard_orders_sections_and_skips_empty_metrics() {
        let records = talk_records();
        let charts = build_dashboard(&records, &DashboardRequest::default(), &Cohorts::default());
        let metrics: Vec<&str> = charts.iter().map(|chart| chart.metric.as_str()).collect();
        assert_eq!(metrics, vec!["Avg Talk %", "Questions/hr"]);
        assert_eq!(charts[0].kind, ChartKind::Composed);
        assert_eq!(charts[0].benchmark, Some(65.0));
        assert_eq!(charts[0].format, ValueFormat::Percent);
    }

    #[test]
    fn dashboard_respects_metric_filter() {
        let mut request = DashboardRequest::default();
        request.selection.metrics.insert("Questions/hr".to_string());
        let charts = build_dashboard(&talk_records(), &request, &Cohorts::default());
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].metric, "Questions/hr");
    }

    #[test]
    fn team_overlay_survives_rep_filter() {
        let mut request = DashboardRequest {
            show_team_average: true,
            ..DashboardRequest::default()
        };
        request.selection.reps.insert("Mark Romeo".to_string());
        let charts = build_dashboard(&talk_records(), &request, &Cohorts::default());
        let talk = &charts[0];
        assert_eq!(talk.rows[0].get("Gabby Steele"), None);
        assert_eq!(talk.rows[0].get("Sellside Team Avg"), Some(79.0));
        assert_eq!(talk.rows[0].get("Overall Team Avg"), Some(70.0));

        let roles: Vec<(&str, SeriesRole)> = talk
            .series
            .iter()
            .map(|spec| (spec.name.as_str(), spec.role))
            .collect();
        assert!(roles.contains(&("Mark Romeo", SeriesRole::Rep)));
        assert!(roles.contains(&("Overall Team Avg", SeriesRole::Team)));
    }

    #[test]
    fn team_mode_builds_bar_charts() {
        let request = DashboardRequest {
            view_mode: ViewMode::Team,
            chronological: true,
            ..DashboardRequest::default()
        };
        let charts = build_dashboard(&talk_records(), &request, &Cohorts::default());
        let talk = &charts[0];
        assert_eq!(talk.kind, ChartKind::Bar);
        assert_eq!(talk.rows[0].month, "2025-01");
        assert_eq!(talk.rows[0].get(TEAM_AVERAGE_LABEL), Some(58.0));
        assert_eq!(talk.series.len(), 1);
        assert_eq!(talk.series[0].color, "#8B5CF6");
    }

    #[test]
    fn bundled_sample_charts_every_metric() {
        let records =
            crate::normalize::parse_records(include_str!("../data/gong_mom_2025.csv")).unwrap();
        let charts = build_dashboard(&records, &DashboardRequest::default(), &Cohorts::default());
        assert_eq!(charts.len(), ACTIVITY_METRICS.len() + INTERACTION_METRICS.len());
        assert!(charts.iter().all(|chart| chart.rows.len() == 5));
    }

    #[test]
    fn rep_colors_are_spread_over_the_hue_circle() {
        let rows = shape_individual(&talk_records(), "Avg Talk %", None);
        let specs = series_specs(&rows, ChartKind::Composed, &Cohorts::default());
        let names: Vec<&str> = specs.iter().map(|spec| spec.name.as_str()).collect();
        let colors: Vec<&str> = specs.iter().map(|spec| spec.color.as_str()).collect();
        assert_eq!(names, vec!["Mark Romeo", "Gabby Steele"]);
        assert_eq!(colors, vec!["hsl(0, 70%, 50%)", "hsl(180, 70%, 50%)"]);
    }

    #[test]
    fn series_follow_first_appearance_with_team_lines_last() {
        let records = vec![
            record("Zed", "2025-01", "Avg Talk %", 70.0),
            record("Amy", "2025-01", "Avg Talk %", 50.0),
            record("Bob", "2025-02", "Avg Talk %", 65.0),
        ];
        let request = DashboardRequest {
            show_team_average: true,
            ..DashboardRequest::default()
        };
        let charts = build_dashboard(&records, &request, &Cohorts::default());
        let series: Vec<(&str, SeriesRole)> = charts[0]
            .series
            .iter()
            .map(|spec| (spec.name.as_str(), spec.role))
            .collect();
        assert_eq!(
            series,
            vec![
                ("Zed", SeriesRole::Rep),
                ("Amy", SeriesRole::Rep),
                ("Bob", SeriesRole::Rep),
                ("Overall Team Avg", SeriesRole::Team),
            ]
        );
        assert_eq!(charts[0].series[0].color, "hsl(0, 70%, 50%)");
        assert_eq!(charts[0].series[1].color, "hsl(120, 70%, 50%)");
    }

    #[test]
    fn rep_hues_keep_fractional_degrees() {
        let mut row = ChartSeriesRow::new("2025-01");
        for rep in ["A", "B", "C", "D", "E", "F", "G"] {
            row.insert(rep.to_string(), 1.0);
        }
        let specs = series_specs(&[row], ChartKind::Composed, &Cohorts::default());
        assert_eq!(
            specs[1].color,
            format!("hsl({}, 70%, 50%)", 360.0_f64 / 7.0)
        );
        assert!(specs[1].color.starts_with("hsl(51.428"));
    }
}
