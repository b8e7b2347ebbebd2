//! One planning run end to end: build, solve, extract.

use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::RosterConfig;
use crate::domain::{Granularity, Job, RosterResult, Staff};
use crate::error::Result;
use crate::extract;
use crate::model::{ConstraintKind, ModelBuilder};
use crate::solver::{SolveStatus, Solver};

/// Builds the model, solves it and extracts the roster.
///
/// Construction problems (bad configuration, malformed records) are returned
/// as errors. A solver that finds no roster is not an error: the result
/// carries its status and empty collections.
pub fn plan_roster<S: Solver + ?Sized>(
    staff: &[Staff],
    jobs: &[Job],
    config: &RosterConfig,
    solver: &S,
) -> Result<RosterResult> {
    let started = Instant::now();
    let model = ModelBuilder::new(staff, jobs, config).build()?;
    info!(
        staff = staff.len(),
        jobs = jobs.len(),
        days = config.days,
        granularity = %config.granularity,
        variables = model.variables().len(),
        constraints = model.constraints().len(),
        "Roster model ready"
    );

    let outcome = solver.solve(&model);
    match outcome.status {
        SolveStatus::Optimal => {}
        SolveStatus::Feasible => info!(
            time_limit_secs = config.solve_time_limit_secs,
            "Time limit reached, roster not proven optimal"
        ),
        status => warn!(%status, "No roster found"),
    }

    let result = extract::extract(&model, &outcome);
    info!(
        status = %result.status,
        objective = result.objective,
        roster_entries = result.roster.len(),
        unfulfilled = result.unfulfilled.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Roster extracted"
    );
    Ok(result)
}

/// Size of a model per constraint family, without solving it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAnalysis {
    pub granularity: Granularity,
    pub variables: usize,
    pub constraints: Vec<ConstraintCount>,
    /// Staff/job pairs excluded by missing tools.
    pub skill_mismatches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintCount {
    pub name: &'static str,
    pub count: usize,
}

pub fn analyze(staff: &[Staff], jobs: &[Job], config: &RosterConfig) -> Result<ModelAnalysis> {
    let model = ModelBuilder::new(staff, jobs, config).build()?;
    let constraints = ConstraintKind::ALL
        .iter()
        .map(|&kind| ConstraintCount {
            name: kind.as_str(),
            count: model.constraints_of(kind).count(),
        })
        .filter(|c| c.count > 0)
        .collect();

    Ok(ModelAnalysis {
        granularity: model.granularity(),
        variables: model.variables().len(),
        constraints,
        skill_mismatches: model.constraints_of(ConstraintKind::SkillMatch).count(),
    })
}
