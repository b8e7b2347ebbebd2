//! Batch roster generation from CSV files.
//!
//! Run with: cargo run --release --bin roster -- --staff staff.csv --jobs jobs.csv

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use staff_rostering::config::RosterConfig;
use staff_rostering::domain::Granularity;
use staff_rostering::planner;
use staff_rostering::solver::MicroLpSolver;
use staff_rostering::tabular;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Staff records: StaffID,Location,Tools
    #[arg(long, default_value = "staff.csv")]
    staff: PathBuf,

    /// Job records: JobID,Location,JobLength,ToolsRequired
    #[arg(long, default_value = "jobs.csv")]
    jobs: PathBuf,

    /// Where the roster is written
    #[arg(short, long, default_value = "7_day_roster.csv")]
    output: PathBuf,

    /// Where unfulfilled jobs are written (partial-hours runs only)
    #[arg(short, long, default_value = "unfulfilled_jobs.csv")]
    unfulfilled: PathBuf,

    /// whole-slot or partial-hours; defaults to ROSTER_GRANULARITY or whole-slot
    #[arg(short, long)]
    granularity: Option<Granularity>,

    #[arg(long)]
    days: Option<u8>,

    #[arg(long)]
    max_hours_per_day: Option<f64>,

    #[arg(long)]
    max_days_per_week: Option<u8>,

    /// Caps whole-slot assignments per job
    #[arg(long)]
    max_assignments_per_job: Option<u32>,

    /// Seconds before the best roster so far is kept; defaults to
    /// ROSTER_SOLVE_TIME_LIMIT_SECS or 30
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// Debug logging for this crate, on top of RUST_LOG
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    /// Environment settings first, flags on top.
    fn config(&self) -> anyhow::Result<RosterConfig> {
        let mut config = RosterConfig::from_env().context("invalid ROSTER_* environment")?;
        if let Some(granularity) = self.granularity {
            config.granularity = granularity;
        }
        if let Some(days) = self.days {
            config.days = days;
        }
        if let Some(hours) = self.max_hours_per_day {
            config.max_hours_per_day = hours;
        }
        if let Some(max_days) = self.max_days_per_week {
            config.max_days_per_week = max_days;
        }
        if self.max_assignments_per_job.is_some() {
            config.max_assignments_per_job = self.max_assignments_per_job;
        }
        if self.time_limit.is_some() {
            config.solve_time_limit_secs = self.time_limit;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.debug { "staff_rostering=debug" } else { "staff_rostering=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let config = cli.config()?;
    let staff = tabular::load_staff(&cli.staff)
        .with_context(|| format!("failed to load staff from {}", cli.staff.display()))?;
    let jobs = tabular::load_jobs(&cli.jobs)
        .with_context(|| format!("failed to load jobs from {}", cli.jobs.display()))?;

    #[cfg(feature = "console")]
    {
        staff_rostering::console::print_banner();
        staff_rostering::console::print_config(
            staff.len(),
            jobs.len(),
            config.days,
            config.granularity,
        );
    }

    let started = Instant::now();
    let result = planner::plan_roster(&staff, &jobs, &config, &MicroLpSolver)?;

    #[cfg(feature = "console")]
    staff_rostering::console::print_solving_ended(started.elapsed(), &result);

    tabular::save_roster(&cli.output, &result)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!(path = %cli.output.display(), entries = result.roster.len(), "Roster saved");

    if !result.has_roster() {
        warn!(status = %result.status, "Solution could not be found");
        return Ok(());
    }

    if result.granularity == Granularity::PartialHours {
        tabular::save_unfulfilled(&cli.unfulfilled, &result.unfulfilled)
            .with_context(|| format!("failed to write {}", cli.unfulfilled.display()))?;
        info!(
            path = %cli.unfulfilled.display(),
            jobs = result.unfulfilled.len(),
            "Unfulfilled jobs saved"
        );
    }
    info!(elapsed_secs = started.elapsed().as_secs_f64(), "Done");
    Ok(())
}
