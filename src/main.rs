use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod averages;
mod config;
mod filter;
mod models;
mod normalize;
mod report;
mod series;

use crate::models::{FilterSelection, TeamView, ViewMode};
use crate::normalize::LoadStatus;
use crate::report::{ChartRenderer, JsonRenderer, MarkdownRenderer};
use crate::series::DashboardRequest;

#[derive(Parser)]
#[command(name = "gong-dashboard")]
#[command(about = "Month-over-month sales call metrics by rep and team", long_about = None)]
struct Cli {
    /// Metrics CSV; falls back to $GONG_DASHBOARD_CSV, then the sample bundled with the build
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
    /// JSON file with `buyside` and `sellside` rosters
    #[arg(long, global = true)]
    cohorts: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct SelectionArgs {
    #[arg(long = "rep")]
    reps: Vec<String>,
    #[arg(long = "metric")]
    metrics: Vec<String>,
    #[arg(long = "month")]
    months: Vec<String>,
    #[arg(long = "quarter")]
    quarters: Vec<String>,
}

impl SelectionArgs {
    fn into_selection(self) -> FilterSelection {
        if self.reps.is_empty()
            && self.metrics.is_empty()
            && self.months.is_empty()
            && self.quarters.is_empty()
        {
            return FilterSelection::clear();
        }
        FilterSelection {
            reps: self.reps.into_iter().collect(),
            metrics: self.metrics.into_iter().collect(),
            months: self.months.into_iter().collect(),
            quarters: self.quarters.into_iter().collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one chart per metric
    Charts {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, value_enum, default_value_t = ViewMode::Individual)]
        view: ViewMode,
        /// Overlay team averages on individual charts
        #[arg(long)]
        team_average: bool,
        #[arg(long, value_enum, default_value_t = TeamView::All)]
        team: TeamView,
        /// Order months by calendar instead of first appearance
        #[arg(long)]
        chronological: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the values available to each filter
    Options,
    /// Print monthly team averages for one metric
    Averages {
        /// Metric name, after unit renames (e.g. "Longest Monologue (sec)")
        metric: String,
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The one user-facing line for a failed load; the details are already logged.
fn load_notice(path: &Path, status: &LoadStatus) -> Option<String> {
    match status {
        LoadStatus::Ready => None,
        LoadStatus::Failed(_) => Some(format!(
            "No data loaded from {}; showing an empty dashboard.",
            path.display()
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cohorts =
        config::load_cohorts(cli.cohorts.as_deref()).context("failed to load cohort rosters")?;
    let csv_path = config::resolve_csv_path(cli.csv);

    let dataset = normalize::load(&csv_path).await;
    if let Some(notice) = load_notice(&csv_path, &dataset.status) {
        eprintln!("{notice}");
    }
    let records = &dataset.records;

    match cli.command {
        Commands::Charts {
            selection,
            view,
            team_average,
            team,
            chronological,
            format,
            out,
        } => {
            let request = DashboardRequest {
                selection: selection.into_selection(),
                view_mode: view,
                show_team_average: team_average,
                team_view: team,
                chronological,
            };
            if request.selection.is_empty() {
                debug!("no filters selected");
            }

            let charts = series::build_dashboard(records, &request, &cohorts);
            let mut renderer: Box<dyn ChartRenderer> = match format {
                OutputFormat::Markdown => {
                    Box::new(MarkdownRenderer::new("Gong Call Metrics Dashboard"))
                }
                OutputFormat::Json => Box::new(JsonRenderer::default()),
            };
            for chart in &charts {
                renderer.draw(chart)?;
            }
            let rendered = renderer.finish()?;

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Wrote {} charts to {}.", charts.len(), path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Options => {
            let options = filter::FilterOptions::from_records(records);
            print!("{}", report::render_options(&options));
        }
        Commands::Averages { metric, selection } => {
            let selection = selection.into_selection();
            let table = averages::team_averages(records, &metric, &selection, &cohorts);
            print!("{}", report::render_averages(&metric, &table, &cohorts));
        }
    }

    Ok(())
}
