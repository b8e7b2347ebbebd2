//! Benchmark for model construction and solving.
//!
//! Run with: cargo run --release --bin bench -- [SMALL|LARGE] [whole-slot|partial-hours]

use anyhow::{anyhow, Context};
use staff_rostering::config::RosterConfig;
use staff_rostering::demo_data::{self, DemoData};
use staff_rostering::domain::Granularity;
use staff_rostering::extract;
use staff_rostering::model::ModelBuilder;
use staff_rostering::solver::{MicroLpSolver, Solver};
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let demo: DemoData = match args.next() {
        Some(name) => name
            .parse()
            .map_err(|_| anyhow!("unknown demo data set `{name}`"))?,
        None => DemoData::Small,
    };
    let granularity: Granularity = match args.next() {
        Some(g) => g.parse().map_err(|e: String| anyhow!(e))?,
        None => Granularity::WholeSlot,
    };

    let (staff, jobs) = demo_data::generate(demo);
    let config = RosterConfig::default().with_granularity(granularity);

    println!("Benchmark: Roster Model ({})", demo.as_str());
    println!("  Staff: {}", staff.len());
    println!("  Jobs: {}", jobs.len());
    println!("  Granularity: {}", granularity);
    if let Some(seconds) = config.solve_time_limit_secs {
        println!("  Time limit: {seconds}s");
    }
    println!();

    let build_start = Instant::now();
    let model = ModelBuilder::new(&staff, &jobs, &config)
        .build()
        .context("demo data produced an invalid model")?;
    let build_time = build_start.elapsed();

    #[cfg(feature = "console")]
    staff_rostering::console::print_model_built(
        model.variables().len(),
        model.constraints().len(),
        build_time,
    );
    #[cfg(not(feature = "console"))]
    println!(
        "Model built: {} variables, {} constraints ({:?})",
        model.variables().len(),
        model.constraints().len(),
        build_time
    );

    let solve_start = Instant::now();
    let outcome = MicroLpSolver.solve(&model);
    let solve_time = solve_start.elapsed();
    let result = extract::extract(&model, &outcome);

    println!();
    println!("Results:");
    println!("  Status: {}", result.status);
    println!("  Objective: {:?}", result.objective);
    println!("  Roster entries: {}", result.roster.len());
    println!("  Unfulfilled jobs: {}", result.unfulfilled.len());
    println!("  Build time: {:.2?}", build_time);
    println!("  Solve time: {:.2?}", solve_time);
    Ok(())
}
