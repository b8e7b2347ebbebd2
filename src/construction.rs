//! Construction heuristic: a feasible starting roster for the solver.
//!
//! Staff are filled one at a time, day by day from the start of the week.
//! Each day takes the cheapest performable jobs until the daily budget is
//! spent. Costs are read from the model's own daily-hours rows, so the start
//! respects whatever travel table the model was built with.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{Day, Granularity};
use crate::model::{ConstraintKind, LinearConstraint, RosterModel};
use crate::solver::VariableValues;

/// Slack kept below each daily cap when hours are split.
const BUDGET_EPSILON: f64 = 1e-9;

/// Builds a roster that satisfies every constraint of `model`.
///
/// The all-zero roster (with every job in shortfall) is always feasible, and
/// the heuristic only adds work that keeps each row satisfied.
pub fn construction_heuristic(model: &RosterModel<'_>) -> VariableValues {
    let daily: HashMap<(usize, Day), &LinearConstraint> = model
        .constraints_of(ConstraintKind::DailyHours)
        .filter_map(|c| Some(((c.scope.staff?, c.scope.day?), c)))
        .collect();

    let mut values = VariableValues::zeros(model);
    let placed = match model.granularity() {
        Granularity::WholeSlot => whole_slot(model, &daily, &mut values),
        Granularity::PartialHours => partial_hours(model, &daily, &mut values),
    };
    debug!(placed, "Construction heuristic finished");
    values
}

fn whole_slot(
    model: &RosterModel<'_>,
    daily: &HashMap<(usize, Day), &LinearConstraint>,
    values: &mut VariableValues,
) -> usize {
    let max_days = usize::from(model.config().max_days_per_week);
    let cap = model.config().max_assignments_per_job.unwrap_or(u32::MAX);
    let mut left = vec![cap; model.jobs().len()];
    let mut placed = 0;

    for (s, member) in model.staff().iter().enumerate() {
        let mut days_worked = 0;
        for day in model.days() {
            if days_worked == max_days {
                break;
            }
            let Some(row) = daily.get(&(s, day)) else {
                break;
            };

            let mut options: Vec<(usize, f64)> = model
                .jobs()
                .iter()
                .enumerate()
                .filter(|(j, job)| left[*j] > 0 && member.can_perform(job))
                .map(|(j, _)| (j, row.expr.coefficient(model.decision(s, j, day))))
                .collect();
            options.sort_by(|a, b| a.1.total_cmp(&b.1));

            let mut load = 0.0;
            let mut worked = false;
            for (j, cost) in options {
                if left[j] == 0 || load + cost > row.rhs {
                    continue;
                }
                values.set(model.decision(s, j, day), 1.0);
                load += cost;
                left[j] -= 1;
                placed += 1;
                worked = true;
            }

            // Jobs only run out, so an empty day stays empty for the rest of the week.
            if !worked {
                break;
            }
            values.set(model.working_day(s, day), 1.0);
            days_worked += 1;
        }
    }
    placed
}

fn partial_hours(
    model: &RosterModel<'_>,
    daily: &HashMap<(usize, Day), &LinearConstraint>,
    values: &mut VariableValues,
) -> usize {
    let tolerance = model.config().completion_tolerance;
    let max_days = usize::from(model.config().max_days_per_week);
    let mut remaining: Vec<f64> = model.jobs().iter().map(|j| j.duration_hours).collect();
    let mut placed = 0;

    for (s, member) in model.staff().iter().enumerate() {
        let mut days_worked = 0;
        for day in model.days() {
            if days_worked == max_days {
                break;
            }
            let Some(row) = daily.get(&(s, day)) else {
                break;
            };

            let mut options: Vec<(usize, f64)> = model
                .jobs()
                .iter()
                .enumerate()
                .filter(|(_, job)| member.can_perform(job))
                .filter_map(|(j, _)| {
                    let visit = model.visit(s, j, day)?;
                    Some((j, row.expr.coefficient(visit)))
                })
                .collect();
            options.sort_by(|a, b| a.1.total_cmp(&b.1));

            let mut load = 0.0;
            let mut worked = false;
            for (j, trip) in options {
                if remaining[j] <= tolerance {
                    continue;
                }
                let available = row.rhs - BUDGET_EPSILON - load - trip;
                if available <= tolerance {
                    continue;
                }
                let Some(visit) = model.visit(s, j, day) else {
                    continue;
                };
                let hours = available.min(remaining[j]);
                values.set(model.decision(s, j, day), hours);
                values.set(visit, 1.0);
                load += hours + trip;
                remaining[j] -= hours;
                placed += 1;
                worked = true;
            }

            if !worked {
                break;
            }
            values.set(model.working_day(s, day), 1.0);
            days_worked += 1;
        }
    }

    for (j, job) in model.jobs().iter().enumerate() {
        if let Some(shortfall) = model.shortfall(j) {
            values.set(shortfall, remaining[j].clamp(0.0, job.duration_hours));
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RosterConfig;
    use crate::demo_data::{generate, DemoData};
    use crate::domain::{Job, Location, Staff};
    use crate::model::ModelBuilder;

    fn assert_feasible(model: &RosterModel<'_>, values: &VariableValues) {
        for c in model.constraints() {
            assert!(
                c.is_satisfied(values, 1e-9),
                "{} violated for {:?}",
                c.kind,
                c.scope
            );
        }
    }

    #[test]
    fn test_start_is_feasible_on_demo_data() {
        for demo in [DemoData::Small, DemoData::Large] {
            let (staff, jobs) = generate(demo);
            for granularity in [Granularity::WholeSlot, Granularity::PartialHours] {
                let config = RosterConfig::default().with_granularity(granularity);
                let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

                let values = construction_heuristic(&model);
                assert_feasible(&model, &values);
                assert!(
                    model.objective_value(&values) > 0.0,
                    "{} {granularity} placed nothing",
                    demo.as_str()
                );
            }
        }
    }

    #[test]
    fn test_start_respects_assignment_cap() {
        let (staff, jobs) = generate(DemoData::Small);
        let config = RosterConfig {
            max_assignments_per_job: Some(1),
            ..RosterConfig::default()
        };
        let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        let values = construction_heuristic(&model);
        assert_feasible(&model, &values);
        for j in 0..jobs.len() {
            let total: f64 = (0..staff.len())
                .flat_map(|s| model.days().map(move |d| (s, d)))
                .map(|(s, d)| values.get(model.decision(s, j, d)))
                .sum();
            assert!(total <= 1.0);
        }
    }

    #[test]
    fn test_partial_hours_splits_long_job_over_days() {
        let staff = vec![Staff::new("S1", Location::North)];
        let jobs = vec![Job::new("J1", Location::East, 12.0)];
        let config = RosterConfig::default().with_granularity(Granularity::PartialHours);
        let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        let values = construction_heuristic(&model);
        assert_feasible(&model, &values);

        // North -> East costs 0.5h of travel, leaving just under 8.5h per day
        let first = values.get(model.decision(0, 0, Day(0)));
        let second = values.get(model.decision(0, 0, Day(1)));
        assert!((first - 8.5).abs() < 1e-6);
        assert!((first + second - 12.0).abs() < 1e-6);
        assert_eq!(values.get(model.working_day(0, Day(2))), 0.0);
        assert!(values.get(model.shortfall(0).unwrap()) < 1e-6);
    }

    #[test]
    fn test_unskilled_staff_get_nothing() {
        let staff = vec![Staff::new("S1", Location::North)];
        let jobs = vec![Job::new("J1", Location::North, 3.0).with_required_tools(["drill"])];
        let config = RosterConfig::default().with_granularity(Granularity::PartialHours);
        let model = ModelBuilder::new(&staff, &jobs, &config).build().unwrap();

        let values = construction_heuristic(&model);
        assert_feasible(&model, &values);
        assert_eq!(model.objective_value(&values), 0.0);
        assert_eq!(values.get(model.shortfall(0).unwrap()), 3.0);
    }
}
