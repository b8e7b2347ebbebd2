//! Turns solver values into roster entries and unfulfilled-job reports.

use crate::domain::{Granularity, RosterEntry, RosterResult, UnfulfilledJob, WorkAmount};
use crate::model::RosterModel;
use crate::solver::{SolveOutcome, SolveStatus, VariableValues};

/// Binary values above this are read as 1.
const BINARY_THRESHOLD: f64 = 0.5;

/// Interprets a solve outcome against the model it came from.
///
/// Optimal and time-limited (feasible) outcomes are extracted. Anything else,
/// or a roster status without values, yields an empty result that carries the
/// status; no partial extraction is attempted.
pub fn extract(model: &RosterModel<'_>, outcome: &SolveOutcome) -> RosterResult {
    let granularity = model.granularity();
    let status = outcome.status;
    let values = match outcome.values.as_ref() {
        Some(values) if status.has_roster() => values,
        None if status.has_roster() => {
            return RosterResult::not_solved(SolveStatus::NotSolved, granularity)
        }
        _ => return RosterResult::not_solved(status, granularity),
    };

    let (roster, unfulfilled) = match granularity {
        Granularity::WholeSlot => (whole_slot_roster(model, values), Vec::new()),
        Granularity::PartialHours => partial_hours_roster(model, values),
    };

    RosterResult {
        status,
        granularity,
        objective: Some(round_hours(assigned_work(model, values))),
        roster,
        unfulfilled,
    }
}

fn whole_slot_roster(model: &RosterModel<'_>, values: &VariableValues) -> Vec<RosterEntry> {
    let mut roster = Vec::new();
    for (s, member) in model.staff().iter().enumerate() {
        for (j, job) in model.jobs().iter().enumerate() {
            for day in model.days() {
                if values.get(model.decision(s, j, day)) > BINARY_THRESHOLD {
                    roster.push(RosterEntry {
                        job_id: job.id.clone(),
                        job_location: job.location.clone(),
                        job_length: job.duration_hours,
                        staff_id: member.id.clone(),
                        day,
                        work: WorkAmount::Assigned,
                    });
                }
            }
        }
    }
    roster
}

/// A job counts as fulfilled when its hours match its duration within the
/// configured tolerance; otherwise it is reported with its shortfall and
/// contributes no roster entries.
fn partial_hours_roster(
    model: &RosterModel<'_>,
    values: &VariableValues,
) -> (Vec<RosterEntry>, Vec<UnfulfilledJob>) {
    let tolerance = model.config().completion_tolerance;
    let mut roster = Vec::new();
    let mut unfulfilled = Vec::new();

    for (j, job) in model.jobs().iter().enumerate() {
        let mut worked = Vec::new();
        let mut total = 0.0;
        for (s, member) in model.staff().iter().enumerate() {
            for day in model.days() {
                let hours = values.get(model.decision(s, j, day));
                total += hours;
                if hours > tolerance {
                    worked.push(RosterEntry {
                        job_id: job.id.clone(),
                        job_location: job.location.clone(),
                        job_length: job.duration_hours,
                        staff_id: member.id.clone(),
                        day,
                        work: WorkAmount::Hours(round_hours(hours)),
                    });
                }
            }
        }

        if (total - job.duration_hours).abs() <= tolerance {
            roster.extend(worked);
        } else {
            unfulfilled.push(UnfulfilledJob::shortfall(
                job.id.clone(),
                round_hours(total),
                job.duration_hours,
            ));
        }
    }
    (roster, unfulfilled)
}

/// Whole-slot assignments or partial hours placed, without the tie-breaking
/// visit penalty the solver maximises alongside them.
fn assigned_work(model: &RosterModel<'_>, values: &VariableValues) -> f64 {
    let mut total = 0.0;
    for s in 0..model.staff().len() {
        for j in 0..model.jobs().len() {
            for day in model.days() {
                total += values.get(model.decision(s, j, day));
            }
        }
    }
    total
}

/// Rounds solver noise away: `3.9999999997` reads as `4`.
fn round_hours(hours: f64) -> f64 {
    let rounded = (hours * 1e6).round() / 1e6;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
