//! Solver-neutral MILP model of a rostering run.
//!
//! [`ModelBuilder`] turns staff, jobs and a [`RosterConfig`] into a
//! [`RosterModel`]: a registry of typed variables, a linear objective to
//! maximise and the constraint set produced by [`crate::constraints`].
//! Any [`Solver`](crate::solver::Solver) can consume the result.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::debug;

use crate::config::RosterConfig;
use crate::constraints;
use crate::domain::{Day, Granularity, Job, Staff};
use crate::error::{Result, RosterError};
use crate::solver::VariableValues;
use crate::travel::{CompassTravelTimes, TravelTimeOracle};

/// Composite identity of a model variable, derived from entity positions and
/// the day index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableKey {
    /// Whole-slot decision: staff works the job on that day.
    Assign { staff: usize, job: usize, day: Day },
    /// Partial-hours decision: hours the staff contributes to the job that day.
    Hours { staff: usize, job: usize, day: Day },
    /// Partial-hours indicator: staff travels to the job that day.
    Visit { staff: usize, job: usize, day: Day },
    /// Staff is scheduled at all on that day.
    Work { staff: usize, day: Day },
    /// Hours of the job left uncovered.
    Shortfall { job: usize },
}

/// Dense handle into [`RosterModel::variables`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableDomain {
    Binary,
    Continuous { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub key: VariableKey,
    pub domain: VariableDomain,
}

/// Sparse linear combination of model variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Total coefficient of `var` in this expression.
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms
            .iter()
            .filter(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .sum()
    }

    pub fn evaluate(&self, values: &VariableValues) -> f64 {
        self.terms.iter().map(|(v, c)| c * values.get(*v)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    LessOrEqual,
    Equal,
}

/// Constraint families, used for lookup, logging and analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintKind {
    SkillMatch,
    DailyHours,
    VisitLink,
    WeeklyDays,
    WorkingDayLink,
    DayOrder,
    JobCompletion,
    JobAssignmentCap,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 8] = [
        ConstraintKind::SkillMatch,
        ConstraintKind::DailyHours,
        ConstraintKind::VisitLink,
        ConstraintKind::WeeklyDays,
        ConstraintKind::WorkingDayLink,
        ConstraintKind::DayOrder,
        ConstraintKind::JobCompletion,
        ConstraintKind::JobAssignmentCap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintKind::SkillMatch => "Skill match",
            ConstraintKind::DailyHours => "Daily hours incl. travel",
            ConstraintKind::VisitLink => "Hours require a visit",
            ConstraintKind::WeeklyDays => "Working days per week",
            ConstraintKind::WorkingDayLink => "Work implies working day",
            ConstraintKind::DayOrder => "Working days in calendar order",
            ConstraintKind::JobCompletion => "Job completion",
            ConstraintKind::JobAssignmentCap => "Assignments per job",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities a constraint was generated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintScope {
    pub staff: Option<usize>,
    pub job: Option<usize>,
    pub day: Option<Day>,
}

/// `expr (<= | ==) rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub kind: ConstraintKind,
    pub scope: ConstraintScope,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, values: &VariableValues, tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::LessOrEqual => lhs <= self.rhs + tolerance,
            Sense::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// A complete model for one planning run.
#[derive(Debug, Clone)]
pub struct RosterModel<'a> {
    staff: &'a [Staff],
    jobs: &'a [Job],
    config: &'a RosterConfig,
    variables: Vec<Variable>,
    index: HashMap<VariableKey, VarId>,
    decisions: Vec<VarId>,
    visits: Vec<VarId>,
    working_days: Vec<VarId>,
    shortfalls: Vec<VarId>,
    objective: LinearExpr,
    constraints: Vec<LinearConstraint>,
}

impl<'a> RosterModel<'a> {
    fn empty(staff: &'a [Staff], jobs: &'a [Job], config: &'a RosterConfig) -> Self {
        Self {
            staff,
            jobs,
            config,
            variables: Vec::new(),
            index: HashMap::new(),
            decisions: Vec::new(),
            visits: Vec::new(),
            working_days: Vec::new(),
            shortfalls: Vec::new(),
            objective: LinearExpr::new(),
            constraints: Vec::new(),
        }
    }

    pub fn staff(&self) -> &'a [Staff] {
        self.staff
    }

    pub fn jobs(&self) -> &'a [Job] {
        self.jobs
    }

    pub fn config(&self) -> &'a RosterConfig {
        self.config
    }

    pub fn granularity(&self) -> Granularity {
        self.config.granularity
    }

    pub fn days(&self) -> impl Iterator<Item = Day> {
        self.config.planning_days()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    /// Looks a variable up by its composite key.
    pub fn var(&self, key: VariableKey) -> Option<VarId> {
        self.index.get(&key).copied()
    }

    /// Decision variable for a (staff, job, day) triple: `Assign` or `Hours`
    /// depending on granularity.
    pub fn decision(&self, staff: usize, job: usize, day: Day) -> VarId {
        self.decisions[self.triple_offset(staff, job, day)]
    }

    /// Visit indicator for a triple. Only present in partial-hours models.
    pub fn visit(&self, staff: usize, job: usize, day: Day) -> Option<VarId> {
        self.visits.get(self.triple_offset(staff, job, day)).copied()
    }

    pub fn working_day(&self, staff: usize, day: Day) -> VarId {
        self.working_days[staff * self.config.days as usize + day.index()]
    }

    /// Shortfall variable of a job. Only present in partial-hours models.
    pub fn shortfall(&self, job: usize) -> Option<VarId> {
        self.shortfalls.get(job).copied()
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn constraints_of(&self, kind: ConstraintKind) -> impl Iterator<Item = &LinearConstraint> {
        self.constraints.iter().filter(move |c| c.kind == kind)
    }

    pub(crate) fn push_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    /// Human-readable, deterministic name of a variable, e.g. `assign[S1,J2,d3]`.
    pub fn label(&self, id: VarId) -> String {
        let staff = |i: usize| self.staff[i].id.as_str();
        let job = |i: usize| self.jobs[i].id.as_str();
        match self.variable(id).key {
            VariableKey::Assign { staff: s, job: j, day } => {
                format!("assign[{},{},d{}]", staff(s), job(j), day)
            }
            VariableKey::Hours { staff: s, job: j, day } => {
                format!("hours[{},{},d{}]", staff(s), job(j), day)
            }
            VariableKey::Visit { staff: s, job: j, day } => {
                format!("visit[{},{},d{}]", staff(s), job(j), day)
            }
            VariableKey::Work { staff: s, day } => format!("work[{},d{}]", staff(s), day),
            VariableKey::Shortfall { job: j } => format!("shortfall[{}]", job(j)),
        }
    }

    /// Objective value under a solver assignment.
    pub fn objective_value(&self, values: &VariableValues) -> f64 {
        self.objective.evaluate(values)
    }

    fn triple_offset(&self, staff: usize, job: usize, day: Day) -> usize {
        let days = self.config.days as usize;
        (staff * self.jobs.len() + job) * days + day.index()
    }

    fn register(&mut self, key: VariableKey, domain: VariableDomain) -> Result<VarId> {
        let id = VarId(self.variables.len());
        if self.index.insert(key, id).is_some() {
            return Err(RosterError::DuplicateVariable(format!("{key:?}")));
        }
        self.variables.push(Variable { key, domain });
        Ok(id)
    }
}

/// Builds a [`RosterModel`] from entities and configuration.
///
/// # Examples
///
/// ```
/// use staff_rostering::config::RosterConfig;
/// use staff_rostering::domain::{Job, Location, Staff};
/// use staff_rostering::model::ModelBuilder;
///
/// let staff = vec![Staff::new("S1", Location::North).with_tools(["drill"])];
/// let jobs = vec![Job::new("J1", Location::North, 4.0).with_required_tools(["drill"])];
/// let config = RosterConfig::default();
///
/// let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();
/// // 7 assignment variables plus 7 working-day flags.
/// assert_eq!(model.variables().len(), 14);
/// ```
pub struct ModelBuilder<'a, T = CompassTravelTimes> {
    staff: &'a [Staff],
    jobs: &'a [Job],
    config: &'a RosterConfig,
    travel: T,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(staff: &'a [Staff], jobs: &'a [Job], config: &'a RosterConfig) -> Self {
        Self {
            staff,
            jobs,
            config,
            travel: CompassTravelTimes,
        }
    }
}

impl<'a, T: TravelTimeOracle> ModelBuilder<'a, T> {
    /// Replaces the travel-time table used by the daily-hours constraints.
    pub fn with_travel_times<U: TravelTimeOracle>(self, travel: U) -> ModelBuilder<'a, U> {
        ModelBuilder {
            staff: self.staff,
            jobs: self.jobs,
            config: self.config,
            travel,
        }
    }

    pub fn build(self) -> Result<RosterModel<'a>> {
        self.config.validate()?;
        validate_entities(self.staff, self.jobs, self.config.completion_tolerance)?;

        let mut model = RosterModel::empty(self.staff, self.jobs, self.config);
        create_variables(&mut model)?;
        define_objective(&mut model);
        constraints::attach_all(&mut model, &self.travel);

        for kind in ConstraintKind::ALL {
            debug!(family = %kind, count = model.constraints_of(kind).count(), "Constraint family");
        }
        debug!(
            granularity = %model.granularity(),
            variables = model.variables.len(),
            constraints = model.constraints.len(),
            "Roster model built"
        );
        Ok(model)
    }
}

/// A job must be longer than the completion tolerance, otherwise it would
/// count as complete with no hours worked and appear in neither output.
fn validate_entities(staff: &[Staff], jobs: &[Job], tolerance: f64) -> Result<()> {
    if staff.is_empty() {
        return Err(RosterError::configuration("no staff to roster"));
    }
    if jobs.is_empty() {
        return Err(RosterError::configuration("no jobs to roster"));
    }

    let mut seen = HashSet::new();
    for member in staff {
        if member.id.trim().is_empty() {
            return Err(RosterError::data("staff", "missing StaffID"));
        }
        if !seen.insert(member.id.as_str()) {
            return Err(RosterError::data(&member.id, "duplicate StaffID"));
        }
    }

    seen.clear();
    for job in jobs {
        if job.id.trim().is_empty() {
            return Err(RosterError::data("job", "missing JobID"));
        }
        if !seen.insert(job.id.as_str()) {
            return Err(RosterError::data(&job.id, "duplicate JobID"));
        }
        if !job.duration_hours.is_finite() || job.duration_hours <= 0.0 {
            return Err(RosterError::data(
                &job.id,
                format!("job length must be a positive number, got {}", job.duration_hours),
            ));
        }
        if job.duration_hours <= tolerance {
            return Err(RosterError::data(
                &job.id,
                format!(
                    "job length {} is within the completion tolerance {tolerance}",
                    job.duration_hours
                ),
            ));
        }
    }
    Ok(())
}

fn create_variables(model: &mut RosterModel<'_>) -> Result<()> {
    let granularity = model.granularity();
    let max_hours = model.config.max_hours_per_day;
    let days: Vec<Day> = model.days().collect();

    for s in 0..model.staff.len() {
        for j in 0..model.jobs.len() {
            for &day in &days {
                let id = match granularity {
                    Granularity::WholeSlot => model.register(
                        VariableKey::Assign { staff: s, job: j, day },
                        VariableDomain::Binary,
                    )?,
                    Granularity::PartialHours => model.register(
                        VariableKey::Hours { staff: s, job: j, day },
                        VariableDomain::Continuous { min: 0.0, max: max_hours },
                    )?,
                };
                model.decisions.push(id);
            }
        }
    }

    for s in 0..model.staff.len() {
        for &day in &days {
            let id = model.register(VariableKey::Work { staff: s, day }, VariableDomain::Binary)?;
            model.working_days.push(id);
        }
    }

    if granularity == Granularity::PartialHours {
        for s in 0..model.staff.len() {
            for j in 0..model.jobs.len() {
                for &day in &days {
                    let id = model.register(
                        VariableKey::Visit { staff: s, job: j, day },
                        VariableDomain::Binary,
                    )?;
                    model.visits.push(id);
                }
            }
        }
        for j in 0..model.jobs.len() {
            let duration = model.jobs[j].duration_hours;
            let id = model.register(
                VariableKey::Shortfall { job: j },
                VariableDomain::Continuous { min: 0.0, max: duration },
            )?;
            model.shortfalls.push(id);
        }
    }
    Ok(())
}

fn define_objective(model: &mut RosterModel<'_>) {
    let mut objective = LinearExpr::new();
    for &var in &model.decisions {
        objective.add_term(var, 1.0);
    }
    if model.config.visit_penalty > 0.0 {
        for &var in &model.visits {
            objective.add_term(var, -model.config.visit_penalty);
        }
    }
    model.objective = objective;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Location;

    fn entities() -> (Vec<Staff>, Vec<Job>) {
        let staff = vec![
            Staff::new("S1", Location::North).with_tools(["drill"]),
            Staff::new("S2", Location::East).with_tools(["ladder"]),
        ];
        let jobs = vec![
            Job::new("J1", Location::North, 4.0).with_required_tools(["drill"]),
            Job::new("J2", Location::West, 3.0),
            Job::new("J3", Location::South, 2.0).with_required_tools(["ladder"]),
        ];
        (staff, jobs)
    }

    #[test]
    fn test_whole_slot_variable_counts() {
        let (staff, jobs) = entities();
        let config = RosterConfig::default();
        let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        let assign = model
            .variables()
            .iter()
            .filter(|v| matches!(v.key, VariableKey::Assign { .. }))
            .count();
        let work = model
            .variables()
            .iter()
            .filter(|v| matches!(v.key, VariableKey::Work { .. }))
            .count();

        assert_eq!(assign, 2 * 3 * 7);
        assert_eq!(work, 2 * 7);
        assert_eq!(model.variables().len(), assign + work);
        assert!(model.visit(0, 0, Day(0)).is_none());
        assert!(model.shortfall(0).is_none());
    }

    #[test]
    fn test_partial_hours_variables() {
        let (staff, jobs) = entities();
        let config = RosterConfig::default().with_granularity(Granularity::PartialHours);
        let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        // hours + visits per triple, working days, one shortfall per job
        assert_eq!(model.variables().len(), 2 * 2 * 3 * 7 + 2 * 7 + 3);

        let hours = model.decision(1, 2, Day(4));
        assert_eq!(
            model.variable(hours).key,
            VariableKey::Hours { staff: 1, job: 2, day: Day(4) }
        );
        assert_eq!(
            model.variable(hours).domain,
            VariableDomain::Continuous { min: 0.0, max: 9.0 }
        );
        assert_eq!(
            model.variable(model.shortfall(0).unwrap()).domain,
            VariableDomain::Continuous { min: 0.0, max: 4.0 }
        );
    }

    #[test]
    fn test_keys_are_unique_and_resolvable() {
        let (staff, jobs) = entities();
        let config = RosterConfig::default().with_granularity(Granularity::PartialHours);
        let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        let keys: HashSet<_> = model.variables().iter().map(|v| v.key).collect();
        assert_eq!(keys.len(), model.variables().len());

        for (i, variable) in model.variables().iter().enumerate() {
            assert_eq!(model.var(variable.key), Some(VarId(i)));
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let (staff, jobs) = entities();
        let config = RosterConfig::default().with_granularity(Granularity::PartialHours);
        let first = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();
        let second = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        assert_eq!(first.variables(), second.variables());
        assert_eq!(first.constraints(), second.constraints());
        assert_eq!(first.objective(), second.objective());
    }

    #[test]
    fn test_every_constraint_belongs_to_a_family() {
        let (staff, jobs) = entities();
        for granularity in [Granularity::WholeSlot, Granularity::PartialHours] {
            let config = RosterConfig {
                max_assignments_per_job: Some(2),
                ..RosterConfig::default().with_granularity(granularity)
            };
            let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

            let per_family: usize = ConstraintKind::ALL
                .iter()
                .map(|&kind| model.constraints_of(kind).count())
                .sum();
            assert_eq!(per_family, model.constraints().len());
        }
    }

    #[test]
    fn test_labels_use_entity_ids() {
        let (staff, jobs) = entities();
        let config = RosterConfig::default();
        let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        assert_eq!(model.label(model.decision(1, 0, Day(3))), "assign[S2,J1,d3]");
        assert_eq!(model.label(model.working_day(0, Day(6))), "work[S1,d6]");
    }

    #[test]
    fn test_objective_counts_decisions() {
        let (staff, jobs) = entities();
        let config = RosterConfig::default();
        let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        assert_eq!(model.objective().terms().len(), 2 * 3 * 7);
        assert!(model.objective().terms().iter().all(|(_, c)| *c == 1.0));
    }

    #[test]
    fn test_empty_collections_are_configuration_errors() {
        let (staff, jobs) = entities();
        let config = RosterConfig::default();

        assert!(matches!(
            ModelBuilder::new(&[], &jobs, &config).build(),
            Err(RosterError::Configuration(_))
        ));
        assert!(matches!(
            ModelBuilder::new(&staff, &[], &config).build(),
            Err(RosterError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected_before_build() {
        let (staff, jobs) = entities();
        let config = RosterConfig {
            max_hours_per_day: 0.0,
            ..RosterConfig::default()
        };
        assert!(matches!(
            ModelBuilder::new(&staff, &jobs, &config).build(),
            Err(RosterError::Configuration(_))
        ));
    }

    #[test]
    fn test_bad_records_are_data_errors() {
        let (staff, mut jobs) = entities();
        let config = RosterConfig::default();

        jobs[1].duration_hours = f64::NAN;
        match ModelBuilder::new(&staff, &jobs, &config).build() {
            Err(RosterError::Data { entity, .. }) => assert_eq!(entity, "J2"),
            other => panic!("expected data error, got {other:?}"),
        }

        let (staff, mut jobs) = entities();
        jobs[0].duration_hours = 1e-7;
        match ModelBuilder::new(&staff, &jobs, &config).build() {
            Err(RosterError::Data { entity, reason }) => {
                assert_eq!(entity, "J1");
                assert!(reason.contains("tolerance"));
            }
            other => panic!("expected data error, got {other:?}"),
        }

        let (mut staff, jobs) = entities();
        staff[1].id = "S1".to_string();
        match ModelBuilder::new(&staff, &jobs, &config).build() {
            Err(RosterError::Data { entity, reason }) => {
                assert_eq!(entity, "S1");
                assert!(reason.contains("duplicate"));
            }
            other => panic!("expected data error, got {other:?}"),
        }
    }
}
