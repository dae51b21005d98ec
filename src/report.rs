use std::fmt::Write;

use crate::filter::FilterOptions;
use crate::models::{Cohorts, MonthlyAverageTable};
use crate::series::{ChartKind, MetricChart, MetricSection};

/// Receives finished charts. Nothing flows back into the pipeline.
pub trait ChartRenderer {
    fn draw(&mut self, chart: &MetricChart) -> anyhow::Result<()>;

    fn finish(self: Box<Self>) -> anyhow::Result<String>;
}

#[derive(Debug, Default)]
pub struct MarkdownRenderer {
    output: String,
    section: Option<MetricSection>,
    charts: usize,
}

impl MarkdownRenderer {
    pub fn new(title: &str) -> Self {
        let mut output = String::new();
        let _ = writeln!(output, "# {title}");
        Self {
            output,
            section: None,
            charts: 0,
        }
    }
}

impl ChartRenderer for MarkdownRenderer {
    fn draw(&mut self, chart: &MetricChart) -> anyhow::Result<()> {
        let out = &mut self.output;

        if self.section != Some(chart.section) {
            self.section = Some(chart.section);
            writeln!(out)?;
            writeln!(out, "## {}", chart.section.title())?;
        }

        writeln!(out)?;
        writeln!(out, "### {}", chart.metric)?;
        let style = match chart.kind {
            ChartKind::Bar => "bar chart",
            ChartKind::Composed => "rep bars with team lines",
        };
        writeln!(out, "_{style}_")?;
        if let Some(benchmark) = chart.benchmark {
            writeln!(out, "Benchmark: {}", chart.format.format(benchmark))?;
        }
        writeln!(out)?;

        let mut header = String::from("| Month |");
        let mut divider = String::from("| --- |");
        for series in &chart.series {
            let _ = write!(header, " {} |", series.name);
            divider.push_str(" --- |");
        }
        writeln!(out, "{header}")?;
        writeln!(out, "{divider}")?;

        for row in &chart.rows {
            let mut line = format!("| {} |", row.month);
            for series in &chart.series {
                match row.get(&series.name) {
                    Some(value) => {
                        let _ = write!(line, " {} |", chart.format.format(value));
                    }
                    None => line.push_str(" - |"),
                }
            }
            writeln!(out, "{line}")?;
        }

        self.charts += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> anyhow::Result<String> {
        let mut output = self.output;
        if self.charts == 0 {
            writeln!(output)?;
            writeln!(output, "No data for the current filters.")?;
        }
        Ok(output)
    }
}

#[derive(Debug, Default)]
pub struct JsonRenderer {
    charts: Vec<MetricChart>,
}

impl ChartRenderer for JsonRenderer {
    fn draw(&mut self, chart: &MetricChart) -> anyhow::Result<()> {
        self.charts.push(chart.clone());
        Ok(())
    }

    fn finish(self: Box<Self>) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.charts)?)
    }
}

pub fn render_options(options: &FilterOptions) -> String {
    let mut output = String::new();
    let groups: [(&str, &[String]); 4] = [
        ("Sales Reps", &options.reps),
        ("Metrics", &options.metrics),
        ("Months", &options.months),
        ("Quarters", &options.quarters),
    ];

    for (title, values) in groups {
        let _ = writeln!(output, "{title}:");
        if values.is_empty() {
            let _ = writeln!(output, "  (none)");
        }
        for value in values {
            let _ = writeln!(output, "  - {value}");
        }
    }

    output
}

pub fn render_averages(metric: &str, table: &MonthlyAverageTable, cohorts: &Cohorts) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Team averages for {metric}:");

    if table.is_empty() {
        let _ = writeln!(output, "No records for this metric and filter.");
        return output;
    }

    for entry in &table.months {
        let values: Vec<String> = table
            .labelled(&entry.month, cohorts)
            .into_iter()
            .map(|(label, value)| format!("{label} {value:.2}"))
            .collect();
        let _ = writeln!(output, "- {}: {}", entry.month, values.join(", "));
    }

    output
}
