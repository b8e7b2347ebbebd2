//! Constraint library for the rostering model.
//!
//! Each family is generated by its own function over the variables already
//! registered on the [`RosterModel`]. Generation order carries no meaning.

use crate::domain::{Day, Granularity};
use crate::model::{
    ConstraintKind, ConstraintScope, LinearConstraint, LinearExpr, RosterModel, Sense,
};
use crate::travel::TravelTimeOracle;

/// Attaches every constraint family that applies to the model's granularity.
pub fn attach_all<T: TravelTimeOracle>(model: &mut RosterModel<'_>, travel: &T) {
    skill_match(model);
    daily_hours(model, travel);
    weekly_days(model);
    working_day_link(model);
    day_order(model);

    match model.granularity() {
        Granularity::WholeSlot => {
            if let Some(cap) = model.config().max_assignments_per_job {
                job_assignment_cap(model, cap);
            }
        }
        Granularity::PartialHours => {
            visit_link(model);
            job_completion(model);
        }
    }
}

// =========================================================================
// Skill match
// =========================================================================
// A staff member lacking any required tool can never work the job: the
// decisions for that pair sum to zero over the week. The variables stay in the
// model so every pair has the same shape.
fn skill_match(model: &mut RosterModel<'_>) {
    let days: Vec<Day> = model.days().collect();
    for (s, member) in model.staff().iter().enumerate() {
        for (j, job) in model.jobs().iter().enumerate() {
            if member.can_perform(job) {
                continue;
            }
            let mut expr = LinearExpr::new();
            for &day in &days {
                expr.add_term(model.decision(s, j, day), 1.0);
            }
            model.push_constraint(LinearConstraint {
                kind: ConstraintKind::SkillMatch,
                scope: ConstraintScope {
                    staff: Some(s),
                    job: Some(j),
                    day: None,
                },
                expr,
                sense: Sense::Equal,
                rhs: 0.0,
            });
        }
    }
}

// =========================================================================
// Daily hours including travel
// =========================================================================
// Whole slot: each assignment costs the job length plus the trip.
// Partial hours: hours count one-for-one, the trip is paid once per visited
// job regardless of how many hours are worked there.
fn daily_hours<T: TravelTimeOracle>(model: &mut RosterModel<'_>, travel: &T) {
    let days: Vec<Day> = model.days().collect();
    let max_hours = model.config().max_hours_per_day;

    for (s, member) in model.staff().iter().enumerate() {
        let trips: Vec<f64> = model
            .jobs()
            .iter()
            .map(|job| travel.travel_time(&member.location, &job.location))
            .collect();

        for &day in &days {
            let mut expr = LinearExpr::new();
            for (j, job) in model.jobs().iter().enumerate() {
                let decision = model.decision(s, j, day);
                match model.visit(s, j, day) {
                    Some(visit) => {
                        expr.add_term(decision, 1.0);
                        if trips[j] > 0.0 {
                            expr.add_term(visit, trips[j]);
                        }
                    }
                    None => expr.add_term(decision, job.duration_hours + trips[j]),
                }
            }
            model.push_constraint(LinearConstraint {
                kind: ConstraintKind::DailyHours,
                scope: ConstraintScope {
                    staff: Some(s),
                    job: None,
                    day: Some(day),
                },
                expr,
                sense: Sense::LessOrEqual,
                rhs: max_hours,
            });
        }
    }
}

// =========================================================================
// Hours require a visit (partial hours only)
// =========================================================================
// `hours <= bound * visit` with the bound at the smaller of the daily cap and
// the job length, the most hours one visit can ever contribute.
fn visit_link(model: &mut RosterModel<'_>) {
    let days: Vec<Day> = model.days().collect();
    let max_hours = model.config().max_hours_per_day;

    for s in 0..model.staff().len() {
        for (j, job) in model.jobs().iter().enumerate() {
            let bound = max_hours.min(job.duration_hours);
            for &day in &days {
                let Some(visit) = model.visit(s, j, day) else {
                    continue;
                };
                let expr = LinearExpr::new()
                    .with_term(model.decision(s, j, day), 1.0)
                    .with_term(visit, -bound);
                model.push_constraint(LinearConstraint {
                    kind: ConstraintKind::VisitLink,
                    scope: ConstraintScope {
                        staff: Some(s),
                        job: Some(j),
                        day: Some(day),
                    },
                    expr,
                    sense: Sense::LessOrEqual,
                    rhs: 0.0,
                });
            }
        }
    }
}

// =========================================================================
// Working days per week
// =========================================================================
fn weekly_days(model: &mut RosterModel<'_>) {
    let days: Vec<Day> = model.days().collect();
    let max_days = f64::from(model.config().max_days_per_week);

    for s in 0..model.staff().len() {
        let mut expr = LinearExpr::new();
        for &day in &days {
            expr.add_term(model.working_day(s, day), 1.0);
        }
        model.push_constraint(LinearConstraint {
            kind: ConstraintKind::WeeklyDays,
            scope: ConstraintScope {
                staff: Some(s),
                ..ConstraintScope::default()
            },
            expr,
            sense: Sense::LessOrEqual,
            rhs: max_days,
        });
    }
}

// =========================================================================
// Work implies a working day
// =========================================================================
// `Σ work <= capacity * Work(staff, day)`. The link is one-sided: a flagged
// day may carry no work at all. Each job the staff member can perform also
// gets its own `assign (or visit) <= Work` row, which gives the relaxation the
// same bound without the capacity factor.
fn working_day_link(model: &mut RosterModel<'_>) {
    let days: Vec<Day> = model.days().collect();
    let capacity = match model.granularity() {
        Granularity::WholeSlot => model.jobs().len() as f64,
        Granularity::PartialHours => model.config().max_hours_per_day,
    };

    for s in 0..model.staff().len() {
        let performable: Vec<usize> = model
            .jobs()
            .iter()
            .enumerate()
            .filter(|(_, job)| model.staff()[s].can_perform(job))
            .map(|(j, _)| j)
            .collect();

        for &day in &days {
            let work = model.working_day(s, day);
            let mut expr = LinearExpr::new();
            for j in 0..model.jobs().len() {
                expr.add_term(model.decision(s, j, day), 1.0);
            }
            expr.add_term(work, -capacity);
            model.push_constraint(LinearConstraint {
                kind: ConstraintKind::WorkingDayLink,
                scope: ConstraintScope {
                    staff: Some(s),
                    job: None,
                    day: Some(day),
                },
                expr,
                sense: Sense::LessOrEqual,
                rhs: 0.0,
            });

            for &j in &performable {
                let touched = model.visit(s, j, day).unwrap_or(model.decision(s, j, day));
                model.push_constraint(LinearConstraint {
                    kind: ConstraintKind::WorkingDayLink,
                    scope: ConstraintScope {
                        staff: Some(s),
                        job: Some(j),
                        day: Some(day),
                    },
                    expr: LinearExpr::new().with_term(touched, 1.0).with_term(work, -1.0),
                    sense: Sense::LessOrEqual,
                    rhs: 0.0,
                });
            }
        }
    }
}

// =========================================================================
// Working days in calendar order
// =========================================================================
// Days carry no data of their own, so any roster can be rearranged to put a
// staff member's working days first. `Work(d) <= Work(d - 1)` keeps only that
// arrangement and removes the equivalent permutations from the search.
fn day_order(model: &mut RosterModel<'_>) {
    let days: Vec<Day> = model.days().collect();

    for s in 0..model.staff().len() {
        for pair in days.windows(2) {
            let expr = LinearExpr::new()
                .with_term(model.working_day(s, pair[1]), 1.0)
                .with_term(model.working_day(s, pair[0]), -1.0);
            model.push_constraint(LinearConstraint {
                kind: ConstraintKind::DayOrder,
                scope: ConstraintScope {
                    staff: Some(s),
                    job: None,
                    day: Some(pair[1]),
                },
                expr,
                sense: Sense::LessOrEqual,
                rhs: 0.0,
            });
        }
    }
}

// =========================================================================
// Job completion (partial hours only)
// =========================================================================
// `Σ hours + shortfall == duration`. The shortfall absorbs any deficit so an
// uncoverable job is reported instead of making the model infeasible.
fn job_completion(model: &mut RosterModel<'_>) {
    let days: Vec<Day> = model.days().collect();

    for (j, job) in model.jobs().iter().enumerate() {
        let Some(shortfall) = model.shortfall(j) else {
            continue;
        };
        let mut expr = LinearExpr::new();
        for s in 0..model.staff().len() {
            for &day in &days {
                expr.add_term(model.decision(s, j, day), 1.0);
            }
        }
        expr.add_term(shortfall, 1.0);
        model.push_constraint(LinearConstraint {
            kind: ConstraintKind::JobCompletion,
            scope: ConstraintScope {
                job: Some(j),
                ..ConstraintScope::default()
            },
            expr,
            sense: Sense::Equal,
            rhs: job.duration_hours,
        });
    }
}

// =========================================================================
// Assignments per job (whole slot, opt-in)
// =========================================================================
fn job_assignment_cap(model: &mut RosterModel<'_>, cap: u32) {
    let days: Vec<Day> = model.days().collect();

    for j in 0..model.jobs().len() {
        let mut expr = LinearExpr::new();
        for s in 0..model.staff().len() {
            for &day in &days {
                expr.add_term(model.decision(s, j, day), 1.0);
            }
        }
        model.push_constraint(LinearConstraint {
            kind: ConstraintKind::JobAssignmentCap,
            scope: ConstraintScope {
                job: Some(j),
                ..ConstraintScope::default()
            },
            expr,
            sense: Sense::LessOrEqual,
            rhs: f64::from(cap),
        });
    }
}
