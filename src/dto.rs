//! DTOs for REST API requests/responses.

use serde::{Deserialize, Serialize};

use crate::config::RosterConfig;
use crate::domain::{Granularity, Job, RosterEntry, RosterResult, Staff, UnfulfilledJob, WorkAmount};
use crate::planner::ModelAnalysis;
use crate::solver::{SolveStatus, SolvingState};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffDto {
    pub id: String,
    pub location: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl From<&Staff> for StaffDto {
    fn from(s: &Staff) -> Self {
        Self {
            id: s.id.clone(),
            location: s.location.to_string(),
            tools: s.tools.iter().cloned().collect(),
        }
    }
}

impl StaffDto {
    pub fn to_staff(&self) -> Staff {
        Staff::new(self.id.clone(), self.location.as_str()).with_tools(self.tools.iter().cloned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDto {
    pub id: String,
    pub location: String,
    pub duration_hours: f64,
    #[serde(default)]
    pub required_tools: Vec<String>,
}

impl From<&Job> for JobDto {
    fn from(j: &Job) -> Self {
        Self {
            id: j.id.clone(),
            location: j.location.to_string(),
            duration_hours: j.duration_hours,
            required_tools: j.required_tools.iter().cloned().collect(),
        }
    }
}

impl JobDto {
    pub fn to_job(&self) -> Job {
        Job::new(self.id.clone(), self.location.as_str(), self.duration_hours)
            .with_required_tools(self.required_tools.iter().cloned())
    }
}

/// A rostering problem as submitted over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDto {
    pub staff: Vec<StaffDto>,
    pub jobs: Vec<JobDto>,
    #[serde(default)]
    pub config: RosterConfig,
}

impl ProblemDto {
    pub fn from_domain(staff: &[Staff], jobs: &[Job], config: RosterConfig) -> Self {
        Self {
            staff: staff.iter().map(StaffDto::from).collect(),
            jobs: jobs.iter().map(JobDto::from).collect(),
            config,
        }
    }

    pub fn to_domain(&self) -> (Vec<Staff>, Vec<Job>) {
        (
            self.staff.iter().map(StaffDto::to_staff).collect(),
            self.jobs.iter().map(JobDto::to_job).collect(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntryDto {
    pub job_id: String,
    pub job_location: String,
    pub job_length: f64,
    pub staff_id: String,
    pub day: u8,
    pub day_name: String,
    /// `None` for whole-slot assignments.
    pub hours_worked: Option<f64>,
}

impl From<&RosterEntry> for RosterEntryDto {
    fn from(e: &RosterEntry) -> Self {
        Self {
            job_id: e.job_id.clone(),
            job_location: e.job_location.to_string(),
            job_length: e.job_length,
            staff_id: e.staff_id.clone(),
            day: e.day.0,
            day_name: e.day.name().to_string(),
            hours_worked: match e.work {
                WorkAmount::Assigned => None,
                WorkAmount::Hours(h) => Some(h),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfulfilledJobDto {
    pub job_id: String,
    pub reason: String,
}

impl From<&UnfulfilledJob> for UnfulfilledJobDto {
    fn from(u: &UnfulfilledJob) -> Self {
        Self {
            job_id: u.job_id.clone(),
            reason: u.reason.clone(),
        }
    }
}

/// A planning run with its result so far.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterDto {
    pub id: String,
    pub solver_status: SolvingState,
    pub granularity: Granularity,
    pub status: Option<SolveStatus>,
    pub objective: Option<f64>,
    pub roster: Vec<RosterEntryDto>,
    pub unfulfilled: Vec<UnfulfilledJobDto>,
    pub error: Option<String>,
}

impl RosterDto {
    pub fn new(
        id: String,
        solver_status: SolvingState,
        granularity: Granularity,
        result: Option<&RosterResult>,
        error: Option<String>,
    ) -> Self {
        Self {
            id,
            solver_status,
            granularity,
            status: result.map(|r| r.status),
            objective: result.and_then(|r| r.objective),
            roster: result
                .map(|r| r.roster.iter().map(RosterEntryDto::from).collect())
                .unwrap_or_default(),
            unfulfilled: result
                .map(|r| r.unfulfilled.iter().map(UnfulfilledJobDto::from).collect())
                .unwrap_or_default(),
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub solver_engine: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub solver_status: SolvingState,
    pub status: Option<SolveStatus>,
    pub objective: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
}

pub type AnalyzeResponse = ModelAnalysis;
