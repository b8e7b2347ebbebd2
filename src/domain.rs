//! Domain model for the weekly staff rostering problem.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::solver::SolveStatus;

/// A site or home base.
///
/// The four compass zones have dedicated travel rules; any other name is
/// kept verbatim and falls back to the default travel time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Location {
    North,
    South,
    East,
    West,
    Other(String),
}

impl Location {
    pub fn as_str(&self) -> &str {
        match self {
            Location::North => "North",
            Location::South => "South",
            Location::East => "East",
            Location::West => "West",
            Location::Other(name) => name,
        }
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        match value.trim() {
            "North" => Location::North,
            "South" => Location::South,
            "East" => Location::East,
            "West" => Location::West,
            other => Location::Other(other.to_string()),
        }
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Location::from(value.as_str())
    }
}

impl From<Location> for String {
    fn from(value: Location) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for Location {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Location::from(s))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staff member who can be rostered onto jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub location: Location,
    pub tools: BTreeSet<String>,
}

impl Staff {
    pub fn new(id: impl Into<String>, location: impl Into<Location>) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            tools: BTreeSet::new(),
        }
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for tool in tools {
            self.tools.insert(tool.into());
        }
        self
    }

    /// Whether this staff member carries every tool the job requires.
    pub fn can_perform(&self, job: &Job) -> bool {
        job.required_tools.is_subset(&self.tools)
    }
}

/// A job that needs `duration_hours` of work at `location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub location: Location,
    pub duration_hours: f64,
    pub required_tools: BTreeSet<String>,
}

impl Job {
    pub fn new(id: impl Into<String>, location: impl Into<Location>, duration_hours: f64) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            duration_hours,
            required_tools: BTreeSet::new(),
        }
    }

    pub fn with_required_tools(
        mut self,
        tools: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        for tool in tools {
            self.required_tools.insert(tool.into());
        }
        self
    }
}

/// Day index inside the planning week, 0 = Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Day(pub u8);

impl Day {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn weekday(self) -> Weekday {
        let mut weekday = Weekday::Mon;
        for _ in 0..(self.0 % 7) {
            weekday = weekday.succ();
        }
        weekday
    }

    /// Full English weekday name.
    ///
    /// ```
    /// use staff_rostering::domain::Day;
    ///
    /// assert_eq!(Day(0).name(), "Monday");
    /// assert_eq!(Day(6).name(), "Sunday");
    /// ```
    pub fn name(self) -> &'static str {
        match self.weekday() {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How work is modelled for a planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    /// Binary: a staff member works the whole job on a given day or not at all.
    #[default]
    WholeSlot,
    /// Continuous: a staff member contributes any number of hours on a given day.
    PartialHours,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::WholeSlot => "WHOLE_SLOT",
            Granularity::PartialHours => "PARTIAL_HOURS",
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "WHOLE_SLOT" => Ok(Granularity::WholeSlot),
            "PARTIAL_HOURS" => Ok(Granularity::PartialHours),
            _ => Err(format!("unknown granularity `{s}`")),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amount of work a roster entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "hours", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkAmount {
    Assigned,
    Hours(f64),
}

/// One staff member working one job on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub job_id: String,
    pub job_location: Location,
    pub job_length: f64,
    pub staff_id: String,
    pub day: Day,
    pub work: WorkAmount,
}

/// A job whose assigned hours do not cover its duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnfulfilledJob {
    pub job_id: String,
    pub reason: String,
    pub assigned_hours: f64,
    pub required_hours: f64,
}

impl UnfulfilledJob {
    pub fn shortfall(job_id: impl Into<String>, assigned_hours: f64, required_hours: f64) -> Self {
        Self {
            job_id: job_id.into(),
            reason: format!(
                "Only {} hours assigned out of {}.",
                assigned_hours, required_hours
            ),
            assigned_hours,
            required_hours,
        }
    }
}

/// Outcome of one planning run.
///
/// `roster` and `unfulfilled` are only meaningful when `status` is
/// [`SolveStatus::Optimal`] or [`SolveStatus::Feasible`]; otherwise both are
/// empty. `objective` is the work placed: assignments in whole-slot mode,
/// hours in partial-hours mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterResult {
    pub status: SolveStatus,
    pub granularity: Granularity,
    pub objective: Option<f64>,
    pub roster: Vec<RosterEntry>,
    pub unfulfilled: Vec<UnfulfilledJob>,
}

impl RosterResult {
    pub fn not_solved(status: SolveStatus, granularity: Granularity) -> Self {
        Self {
            status,
            granularity,
            objective: None,
            roster: Vec::new(),
            unfulfilled: Vec::new(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Optimal, or the best roster found within the time limit.
    pub fn has_roster(&self) -> bool {
        self.status.has_roster()
    }
}
