//! Solver contract, the `good_lp` backend, and the background solving service.
//!
//! The model is handed to a [`Solver`] which reports a [`SolveStatus`] and,
//! when a roster was found, one value per model variable. [`MicroLpSolver`] is
//! the default backend: it starts from the construction heuristic and stops at
//! the configured time limit. [`SolverService`] runs planning runs in the
//! background for the HTTP API.

use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus,
    SolverModel, WithInitialSolution, WithTimeLimit,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RosterConfig;
use crate::construction;
use crate::domain::{Job, RosterResult, Staff};
use crate::model::{LinearExpr, RosterModel, Sense, VarId, VariableDomain};
use crate::planner;

/// Verdict of a solver on a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    /// Best roster found when the time limit ran out; optimality not proven.
    Feasible,
    Infeasible,
    Unbounded,
    NotSolved,
}

impl SolveStatus {
    /// ```
    /// use staff_rostering::solver::SolveStatus;
    ///
    /// assert_eq!(SolveStatus::Optimal.as_str(), "OPTIMAL");
    /// assert_eq!(SolveStatus::NotSolved.as_str(), "NOT_SOLVED");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unbounded => "UNBOUNDED",
            SolveStatus::NotSolved => "NOT_SOLVED",
        }
    }
}

impl SolveStatus {
    /// Whether the solver hands back a usable roster.
    ///
    /// ```
    /// use staff_rostering::solver::SolveStatus;
    ///
    /// assert!(SolveStatus::Feasible.has_roster());
    /// assert!(!SolveStatus::Infeasible.has_roster());
    /// ```
    pub fn has_roster(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Solved value of every model variable, indexed by [`VarId`].
#[derive(Debug, Clone, PartialEq)]
pub struct VariableValues(Vec<f64>);

impl VariableValues {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// All-zero assignment for a model.
    pub fn zeros(model: &RosterModel<'_>) -> Self {
        Self(vec![0.0; model.variables().len()])
    }

    pub fn get(&self, id: VarId) -> f64 {
        self.0.get(id.0).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, id: VarId, value: f64) {
        if let Some(slot) = self.0.get_mut(id.0) {
            *slot = value;
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a solver hands back: a status and, only when a roster was found, the values.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub values: Option<VariableValues>,
}

impl SolveOutcome {
    pub fn optimal(values: VariableValues) -> Self {
        Self {
            status: SolveStatus::Optimal,
            values: Some(values),
        }
    }

    /// Values of a roster that was not proven optimal.
    pub fn feasible(values: VariableValues) -> Self {
        Self {
            status: SolveStatus::Feasible,
            values: Some(values),
        }
    }

    pub fn without_values(status: SolveStatus) -> Self {
        Self {
            status,
            values: None,
        }
    }
}

/// Anything that can solve a [`RosterModel`].
pub trait Solver {
    fn solve(&self, model: &RosterModel<'_>) -> SolveOutcome;
}

/// Pure-Rust MILP backend: `good_lp` driving `microlp`.
///
/// The search is seeded with [`construction::construction_heuristic`], so an
/// incumbent exists as soon as the root relaxation is solved. With `solve_time_limit_secs` set, the
/// search stops at the limit and returns that incumbent or a better one as
/// [`SolveStatus::Feasible`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl Solver for MicroLpSolver {
    fn solve(&self, model: &RosterModel<'_>) -> SolveOutcome {
        let mut vars = ProblemVariables::new();
        let handles: Vec<good_lp::Variable> = model
            .variables()
            .iter()
            .map(|v| match v.domain {
                VariableDomain::Binary => vars.add(variable().binary()),
                VariableDomain::Continuous { min, max } => vars.add(variable().min(min).max(max)),
            })
            .collect();

        let start = construction::construction_heuristic(model);
        let hint: Vec<(good_lp::Variable, f64)> = handles
            .iter()
            .enumerate()
            .map(|(i, h)| (*h, start.get(VarId(i))))
            .collect();

        let objective = to_expression(model.objective(), &handles);
        let mut problem = vars
            .maximise(objective)
            .using(microlp)
            .with_initial_solution(hint);
        if let Some(seconds) = model.config().solve_time_limit_secs {
            problem = problem.with_time_limit(seconds);
        }
        for c in model.constraints() {
            let lhs = to_expression(&c.expr, &handles);
            let built = match c.sense {
                Sense::LessOrEqual => constraint::leq(lhs, c.rhs),
                Sense::Equal => constraint::eq(lhs, c.rhs),
            };
            problem.add_constraint(built);
        }

        match problem.solve() {
            Ok(solution) => {
                let values =
                    VariableValues::new(handles.iter().map(|h| solution.value(*h)).collect());
                match solution.status() {
                    SolutionStatus::Optimal => SolveOutcome::optimal(values),
                    SolutionStatus::TimeLimit | SolutionStatus::GapLimit => {
                        debug!("Time limit reached, keeping best roster found");
                        SolveOutcome::feasible(values)
                    }
                }
            }
            Err(ResolutionError::Infeasible) => SolveOutcome::without_values(SolveStatus::Infeasible),
            Err(ResolutionError::Unbounded) => SolveOutcome::without_values(SolveStatus::Unbounded),
            Err(e) => {
                warn!(error = %e, "Solver failed");
                SolveOutcome::without_values(SolveStatus::NotSolved)
            }
        }
    }
}

fn to_expression(expr: &LinearExpr, handles: &[good_lp::Variable]) -> Expression {
    let mut out = Expression::from(0.0);
    for &(var, coefficient) in expr.terms() {
        out += coefficient * handles[var.0];
    }
    out
}

// ============================================================================
// Background solving service
// ============================================================================

/// Lifecycle of a planning run held by the [`SolverService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolvingState {
    NotSolving,
    Solving,
}

impl SolvingState {
    /// ```
    /// use staff_rostering::solver::SolvingState;
    ///
    /// assert_eq!(SolvingState::NotSolving.as_str(), "NOT_SOLVING");
    /// assert_eq!(SolvingState::Solving.as_str(), "SOLVING");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            SolvingState::NotSolving => "NOT_SOLVING",
            SolvingState::Solving => "SOLVING",
        }
    }
}

/// A submitted rostering problem and, once solved, its result.
pub struct PlanningRun {
    pub id: String,
    pub state: SolvingState,
    pub staff: Vec<Staff>,
    pub jobs: Vec<Job>,
    pub config: RosterConfig,
    pub result: Option<RosterResult>,
    /// Set when the model could not be built.
    pub error: Option<String>,
}

impl PlanningRun {
    pub fn new(id: String, staff: Vec<Staff>, jobs: Vec<Job>, config: RosterConfig) -> Self {
        Self {
            id,
            state: SolvingState::NotSolving,
            staff,
            jobs,
            config,
            result: None,
            error: None,
        }
    }
}

/// Manages planning runs.
///
/// # Examples
///
/// ```
/// use staff_rostering::config::RosterConfig;
/// use staff_rostering::demo_data::{generate, DemoData};
/// use staff_rostering::solver::{SolverService, SolvingState};
///
/// let service = SolverService::new();
/// let (staff, jobs) = generate(DemoData::Small);
///
/// // Registering a run does not start solving.
/// let run = service.create_run("run-1".to_string(), staff, jobs, RosterConfig::default());
/// assert_eq!(run.read().state, SolvingState::NotSolving);
/// assert_eq!(service.list_runs(), vec!["run-1".to_string()]);
/// ```
pub struct SolverService {
    runs: RwLock<HashMap<String, Arc<RwLock<PlanningRun>>>>,
}

impl SolverService {
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
        }
    }

    pub fn create_run(
        &self,
        id: String,
        staff: Vec<Staff>,
        jobs: Vec<Job>,
        config: RosterConfig,
    ) -> Arc<RwLock<PlanningRun>> {
        let run = Arc::new(RwLock::new(PlanningRun::new(id.clone(), staff, jobs, config)));
        self.runs.write().insert(id, run.clone());
        run
    }

    pub fn get_run(&self, id: &str) -> Option<Arc<RwLock<PlanningRun>>> {
        self.runs.read().get(id).cloned()
    }

    pub fn list_runs(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.runs.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Forgets a run. A solve still in flight finishes but its result is dropped.
    pub fn remove_run(&self, id: &str) -> Option<Arc<RwLock<PlanningRun>>> {
        self.runs.write().remove(id)
    }

    /// Starts solving a run on the blocking thread pool. The run's
    /// `solve_time_limit_secs` bounds how long the thread stays busy.
    pub fn start_solving(&self, run: Arc<RwLock<PlanningRun>>) {
        run.write().state = SolvingState::Solving;
        tokio::task::spawn_blocking(move || solve_blocking(run, &MicroLpSolver));
    }
}

impl Default for SolverService {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one planning run to completion and stores the outcome on it.
pub fn solve_blocking<S: Solver>(run: Arc<RwLock<PlanningRun>>, solver: &S) {
    let (id, staff, jobs, config) = {
        let guard = run.read();
        (
            guard.id.clone(),
            guard.staff.clone(),
            guard.jobs.clone(),
            guard.config.clone(),
        )
    };
    let started = Instant::now();
    info!(run_id = %id, staff = staff.len(), jobs = jobs.len(), "Starting roster solve");

    let outcome = planner::plan_roster(&staff, &jobs, &config, solver);

    let mut guard = run.write();
    match outcome {
        Ok(result) => {
            info!(
                run_id = %id,
                status = %result.status,
                duration_secs = started.elapsed().as_secs_f64(),
                "Roster solve finished"
            );
            guard.result = Some(result);
            guard.error = None;
        }
        Err(e) => {
            warn!(run_id = %id, error = %e, "Roster model rejected");
            guard.error = Some(e.to_string());
        }
    }
    guard.state = SolvingState::NotSolving;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_data::{generate, DemoData};
    use crate::domain::{Day, Granularity, Location};
    use crate::model::ModelBuilder;

    #[test]
    fn test_microlp_solves_single_assignment() {
        let staff = vec![Staff::new("S1", Location::North)];
        let jobs = vec![Job::new("J1", Location::North, 4.0)];
        let config = RosterConfig {
            max_days_per_week: 1,
            ..RosterConfig::default().with_days(2)
        };
        let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        let outcome = MicroLpSolver.solve(&model);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        let values = outcome.values.unwrap();
        assert_eq!(values.len(), model.variables().len());
        assert!((model.objective_value(&values) - 1.0).abs() < 1e-6);

        let worked: f64 = (0..2).map(|d| values.get(model.decision(0, 0, Day(d)))).sum();
        assert!((worked - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_microlp_respects_every_constraint() {
        let staff = vec![
            Staff::new("S1", Location::East).with_tools(["drill"]),
            Staff::new("S2", Location::North),
        ];
        let jobs = vec![
            Job::new("J1", Location::West, 5.0).with_required_tools(["drill"]),
            Job::new("J2", Location::South, 3.0),
        ];
        let config = RosterConfig {
            max_days_per_week: 2,
            ..RosterConfig::default()
                .with_days(3)
                .with_granularity(Granularity::PartialHours)
        };
        let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        let outcome = MicroLpSolver.solve(&model);
        let values = outcome.values.expect("optimal solution");
        for c in model.constraints() {
            assert!(c.is_satisfied(&values, 1e-6), "{:?} violated", c.kind);
        }
    }

    #[test]
    fn test_time_limited_solve_keeps_construction_start() {
        let (staff, jobs) = generate(DemoData::Small);
        for granularity in [Granularity::WholeSlot, Granularity::PartialHours] {
            let config = RosterConfig::default()
                .with_granularity(granularity)
                .with_time_limit(Some(3.0));
            let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();
            let start = construction::construction_heuristic(&model);

            let outcome = MicroLpSolver.solve(&model);
            assert!(outcome.status.has_roster(), "{granularity}: {}", outcome.status);
            let values = outcome.values.unwrap();
            for c in model.constraints() {
                assert!(c.is_satisfied(&values, 1e-6), "{:?} violated", c.kind);
            }
            assert!(model.objective_value(&values) >= model.objective_value(&start) - 1e-6);
        }
    }

    #[test]
    fn test_solve_blocking_records_result() {
        let staff = vec![Staff::new("S1", Location::North)];
        let jobs = vec![Job::new("J1", Location::North, 4.0)];
        let service = SolverService::new();
        let run = service.create_run("r".to_string(), staff, jobs, RosterConfig::default());

        solve_blocking(run.clone(), &MicroLpSolver);

        let guard = run.read();
        assert_eq!(guard.state, SolvingState::NotSolving);
        assert!(guard.error.is_none());
        assert_eq!(guard.result.as_ref().unwrap().status, SolveStatus::Optimal);
    }

    #[test]
    fn test_solve_blocking_records_build_error() {
        let service = SolverService::new();
        let run = service.create_run("r".to_string(), vec![], vec![], RosterConfig::default());

        solve_blocking(run.clone(), &MicroLpSolver);

        let guard = run.read();
        assert!(guard.result.is_none());
        assert!(guard.error.as_deref().unwrap().contains("no staff"));
    }
}
