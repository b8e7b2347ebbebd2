//! Error types for roster model construction and tabular I/O.

use thiserror::Error;

/// Errors raised before a model reaches the solver, or while moving data in
/// and out of the planner.
///
/// Solve outcomes such as an infeasible model are not errors; they are
/// reported through [`SolveStatus`](crate::solver::SolveStatus).
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("invalid record {entity}: {reason}")]
    Data { entity: String, reason: String },
    #[error("decision variable {0} registered twice")]
    DuplicateVariable(String),
    #[error("failed to read or write roster data")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV data")]
    Csv(#[from] csv::Error),
}

impl RosterError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    pub fn data(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Data {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error stems from caller input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RosterError::Configuration(_) | RosterError::Data { .. } | RosterError::Csv(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
