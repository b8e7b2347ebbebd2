//! Colorful console output for roster runs.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::domain::{Granularity, RosterResult};
use crate::solver::SolveStatus;

/// Width of the summary box content area.
const BOX_CONTENT: usize = 56;

pub fn print_banner() {
    let banner = r#"
  ____            _
 |  _ \ ___  ___| |_ ___ _ __
 | |_) / _ \/ __| __/ _ \ '__|
 |  _ < (_) \__ \ ||  __/ |
 |_| \_\___/|___/\__\___|_|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Staff Rostering".bright_cyan()
    );
}

/// Prints the problem dimensions.
pub fn print_config(staff: usize, jobs: usize, days: u8, granularity: Granularity) {
    println!(
        "{} {} {} Problem: staff ({}), jobs ({}), days ({}), granularity ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Roster]".bright_cyan(),
        staff.to_formatted_string(&Locale::en).bright_yellow(),
        jobs.to_formatted_string(&Locale::en).bright_yellow(),
        days.to_string().bright_yellow(),
        granularity.as_str().white().bold()
    );
}

/// Prints the size of a built model.
pub fn print_model_built(variables: usize, constraints: usize, elapsed: Duration) {
    println!(
        "{} {} {} Model built: time spent ({}), variables ({}), constraints ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Model]".bright_cyan(),
        format_duration(elapsed).yellow(),
        variables.to_formatted_string(&Locale::en).bright_magenta(),
        constraints.to_formatted_string(&Locale::en).bright_magenta()
    );
}

/// Prints the end-of-run summary box.
pub fn print_solving_ended(total_duration: Duration, result: &RosterResult) {
    println!(
        "{} {} {} Solving ended: time spent ({}), status ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        format_duration(total_duration).yellow(),
        format_status(result.status)
    );

    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════╗".bright_cyan());

    let status_text = match result.status {
        SolveStatus::Optimal => "✓ OPTIMAL ROSTER FOUND",
        SolveStatus::Feasible => "✓ BEST ROSTER WITHIN TIME LIMIT",
        SolveStatus::Infeasible => "✗ INFEASIBLE (no roster satisfies the rules)",
        SolveStatus::Unbounded => "✗ UNBOUNDED",
        SolveStatus::NotSolved => "✗ NOT SOLVED",
    };
    let status_colored = if result.is_optimal() {
        status_text.bright_green().bold().to_string()
    } else if result.has_roster() {
        status_text.bright_yellow().bold().to_string()
    } else {
        status_text.bright_red().bold().to_string()
    };
    let status_padding = BOX_CONTENT.saturating_sub(status_text.chars().count());
    let left_pad = status_padding / 2;
    let right_pad = status_padding - left_pad;
    println!(
        "{}{}{}{}{}",
        "║".bright_cyan(),
        " ".repeat(left_pad),
        status_colored,
        " ".repeat(right_pad),
        "║".bright_cyan()
    );

    println!("{}", "╠══════════════════════════════════════════════════════════╣".bright_cyan());

    let objective = result
        .objective
        .map(|o| format!("{o}"))
        .unwrap_or_else(|| "-".to_string());
    summary_row("Objective:", &objective);
    summary_row(
        "Roster Entries:",
        &result.roster.len().to_formatted_string(&Locale::en),
    );
    if result.granularity == Granularity::PartialHours {
        summary_row(
            "Unfulfilled Jobs:",
            &result.unfulfilled.len().to_formatted_string(&Locale::en),
        );
    }
    summary_row("Solving Time:", &format!("{:.2}s", total_duration.as_secs_f64()));

    println!("{}", "╚══════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

fn summary_row(label: &str, value: &str) {
    println!(
        "{}  {:<18}{:>36}  {}",
        "║".bright_cyan(),
        label,
        value,
        "║".bright_cyan()
    );
}

fn format_status(status: SolveStatus) -> String {
    match status {
        SolveStatus::Optimal => status.as_str().bright_green().to_string(),
        SolveStatus::Feasible => status.as_str().bright_yellow().to_string(),
        _ => status.as_str().bright_red().to_string(),
    }
}

fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0.000".to_string())
}
