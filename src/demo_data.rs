//! Demo data generators for staff rostering.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{Job, Location, Staff};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                locations: vec![Location::North, Location::South, Location::East, Location::West],
                tools: vec!["drill", "ladder", "saw"],
                staff_count: 4,
                job_count: 8,
                staff_tool_distribution: vec![(1, 1.0), (2, 3.0), (3, 1.0)],
                job_tool_distribution: vec![(0, 1.0), (1, 3.0), (2, 1.0)],
                job_length_distribution: vec![(2, 3.0), (3, 2.0), (4, 2.0), (6, 1.0)],
            },
            DemoData::Large => DemoDataParameters {
                locations: vec![
                    Location::North,
                    Location::South,
                    Location::East,
                    Location::West,
                    Location::Other("Depot".to_string()),
                ],
                tools: vec!["drill", "ladder", "saw", "multimeter", "welder"],
                staff_count: 12,
                job_count: 30,
                staff_tool_distribution: vec![(2, 2.0), (3, 3.0), (4, 1.0)],
                job_tool_distribution: vec![(0, 1.0), (1, 4.0), (2, 2.0)],
                job_length_distribution: vec![(1, 1.0), (2, 3.0), (4, 3.0), (6, 2.0), (8, 1.0)],
            },
        }
    }
}

struct DemoDataParameters {
    locations: Vec<Location>,
    tools: Vec<&'static str>,
    staff_count: usize,
    job_count: usize,
    staff_tool_distribution: Vec<(usize, f64)>,
    job_tool_distribution: Vec<(usize, f64)>,
    job_length_distribution: Vec<(usize, f64)>,
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// Generates demo staff and jobs for the given size.
///
/// The generator is seeded, so the same size always yields the same data.
pub fn generate(demo: DemoData) -> (Vec<Staff>, Vec<Job>) {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let staff = (1..=params.staff_count)
        .map(|i| {
            let count = pick_count(&mut rng, &params.staff_tool_distribution);
            let tools: Vec<&str> = params
                .tools
                .choose_multiple(&mut rng, count.min(params.tools.len()))
                .copied()
                .collect();
            Staff::new(format!("S{i}"), pick_location(&mut rng, &params.locations)).with_tools(tools)
        })
        .collect();

    let jobs = (1..=params.job_count)
        .map(|i| {
            let length = pick_count(&mut rng, &params.job_length_distribution);
            let count = pick_count(&mut rng, &params.job_tool_distribution);
            let tools: Vec<&str> = params
                .tools
                .choose_multiple(&mut rng, count.min(params.tools.len()))
                .copied()
                .collect();
            Job::new(
                format!("J{i}"),
                pick_location(&mut rng, &params.locations),
                length as f64,
            )
            .with_required_tools(tools)
        })
        .collect();

    (staff, jobs)
}

fn pick_location(rng: &mut StdRng, locations: &[Location]) -> Location {
    locations.choose(rng).cloned().unwrap_or(Location::North)
}

/// Pick a count based on weighted distribution.
fn pick_count(rng: &mut StdRng, distribution: &[(usize, f64)]) -> usize {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (count, weight) in distribution {
        if choice < *weight {
            return *count;
        }
        choice -= weight;
    }
    distribution.last().map(|(c, _)| *c).unwrap_or(1)
}
