//! Weekly Staff Rostering
//!
//! This library builds a mixed-integer model that assigns staff to jobs across
//! a planning week, solves it with a pure-Rust MILP backend, and turns the
//! solution into a roster plus a list of jobs that could not be covered.
//!
//! Jobs are either assigned in whole slots or split into partial hours,
//! see [`domain::Granularity`].

pub mod api;
pub mod config;
#[cfg(feature = "console")]
pub mod console;
pub mod constraints;
pub mod construction;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod extract;
pub mod model;
pub mod planner;
pub mod solver;
pub mod tabular;
pub mod travel;
