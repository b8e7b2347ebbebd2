//! CSV ingestion of staff/job records and CSV output of rosters.
//!
//! Input columns: `StaffID,Location,Tools` and
//! `JobID,Location,JobLength,ToolsRequired`, tools comma-joined.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::domain::{Granularity, Job, Location, RosterResult, Staff, UnfulfilledJob, WorkAmount};
use crate::error::{Result, RosterError};

#[derive(Debug, Deserialize)]
struct StaffRecord {
    #[serde(rename = "StaffID")]
    staff_id: String,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Tools", default)]
    tools: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobRecord {
    #[serde(rename = "JobID")]
    job_id: String,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "JobLength")]
    job_length: String,
    #[serde(rename = "ToolsRequired", default)]
    tools_required: Option<String>,
}

impl StaffRecord {
    fn into_staff(self) -> Result<Staff> {
        let tools = self
            .tools
            .as_deref()
            .map(split_tools)
            .ok_or_else(|| RosterError::data(&self.staff_id, "missing Tools"))?;
        Ok(Staff {
            id: self.staff_id,
            location: Location::from(self.location),
            tools,
        })
    }
}

impl JobRecord {
    fn into_job(self) -> Result<Job> {
        let duration_hours: f64 = self.job_length.trim().parse().map_err(|_| {
            RosterError::data(
                &self.job_id,
                format!("JobLength `{}` is not a number", self.job_length),
            )
        })?;
        let required_tools = self
            .tools_required
            .as_deref()
            .map(split_tools)
            .ok_or_else(|| RosterError::data(&self.job_id, "missing ToolsRequired"))?;
        Ok(Job {
            id: self.job_id,
            location: Location::from(self.location),
            duration_hours,
            required_tools,
        })
    }
}

/// `"drill, ladder"` -> `{drill, ladder}`
fn split_tools(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_staff<R: Read>(reader: R) -> Result<Vec<Staff>> {
    let mut csv = csv::Reader::from_reader(reader);
    csv.deserialize::<StaffRecord>()
        .map(|row| row?.into_staff())
        .collect()
}

pub fn read_jobs<R: Read>(reader: R) -> Result<Vec<Job>> {
    let mut csv = csv::Reader::from_reader(reader);
    csv.deserialize::<JobRecord>()
        .map(|row| row?.into_job())
        .collect()
}

pub fn load_staff(path: impl AsRef<Path>) -> Result<Vec<Staff>> {
    read_staff(File::open(path)?)
}

pub fn load_jobs(path: impl AsRef<Path>) -> Result<Vec<Job>> {
    read_jobs(File::open(path)?)
}

#[derive(Debug, Serialize)]
struct WholeSlotRow<'a> {
    #[serde(rename = "JobID")]
    job_id: &'a str,
    #[serde(rename = "JobLength")]
    job_length: f64,
    #[serde(rename = "JobLocation")]
    job_location: &'a str,
    #[serde(rename = "StaffAssigned")]
    staff_assigned: &'a str,
    #[serde(rename = "Day")]
    day: u8,
}

#[derive(Debug, Serialize)]
struct PartialHoursRow<'a> {
    #[serde(rename = "JobID")]
    job_id: &'a str,
    #[serde(rename = "JobLocation")]
    job_location: &'a str,
    #[serde(rename = "StaffAssigned")]
    staff_assigned: &'a str,
    #[serde(rename = "Day")]
    day: &'static str,
    #[serde(rename = "HoursWorked")]
    hours_worked: f64,
}

#[derive(Debug, Serialize)]
struct UnfulfilledRow<'a> {
    #[serde(rename = "JobID")]
    job_id: &'a str,
    #[serde(rename = "Reason")]
    reason: &'a str,
}

const WHOLE_SLOT_HEADER: [&str; 5] = ["JobID", "JobLength", "JobLocation", "StaffAssigned", "Day"];
const PARTIAL_HOURS_HEADER: [&str; 5] =
    ["JobID", "JobLocation", "StaffAssigned", "Day", "HoursWorked"];
const UNFULFILLED_HEADER: [&str; 2] = ["JobID", "Reason"];

fn headerless_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().has_headers(false).from_writer(writer)
}

/// Writes the roster in the column layout of its granularity. The header is
/// written even when the roster is empty.
pub fn write_roster<W: Write>(writer: W, result: &RosterResult) -> Result<()> {
    let mut csv = headerless_writer(writer);
    match result.granularity {
        Granularity::WholeSlot => {
            csv.write_record(WHOLE_SLOT_HEADER)?;
            for entry in &result.roster {
                csv.serialize(WholeSlotRow {
                    job_id: &entry.job_id,
                    job_length: entry.job_length,
                    job_location: entry.job_location.as_str(),
                    staff_assigned: &entry.staff_id,
                    day: entry.day.0,
                })?;
            }
        }
        Granularity::PartialHours => {
            csv.write_record(PARTIAL_HOURS_HEADER)?;
            for entry in &result.roster {
                let hours_worked = match entry.work {
                    WorkAmount::Hours(h) => h,
                    WorkAmount::Assigned => entry.job_length,
                };
                csv.serialize(PartialHoursRow {
                    job_id: &entry.job_id,
                    job_location: entry.job_location.as_str(),
                    staff_assigned: &entry.staff_id,
                    day: entry.day.name(),
                    hours_worked,
                })?;
            }
        }
    }
    csv.flush()?;
    Ok(())
}

pub fn write_unfulfilled<W: Write>(writer: W, unfulfilled: &[UnfulfilledJob]) -> Result<()> {
    let mut csv = headerless_writer(writer);
    csv.write_record(UNFULFILLED_HEADER)?;
    for job in unfulfilled {
        csv.serialize(UnfulfilledRow {
            job_id: &job.job_id,
            reason: &job.reason,
        })?;
    }
    csv.flush()?;
    Ok(())
}

pub fn save_roster(path: impl AsRef<Path>, result: &RosterResult) -> Result<()> {
    write_roster(File::create(path)?, result)
}

pub fn save_unfulfilled(path: impl AsRef<Path>, unfulfilled: &[UnfulfilledJob]) -> Result<()> {
    write_unfulfilled(File::create(path)?, unfulfilled)
}
