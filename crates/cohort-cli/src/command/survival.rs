//! Survival curve command
//!
//! Parses a raw count table, computes one survival curve per replicate, and
//! summarizes the curves per group on a shared time axis.

use std::path::PathBuf;

use clap::Args;
use cohort_analysis::survival::{
    ReplicateCurve, SurvivalSummaryRow, replicate_curves, summarize_curves,
};
use serde::Serialize;

use crate::{
    schema::{self, ObservationRow},
    util,
};

#[derive(Debug, Clone, Args)]
pub(crate) struct SurvivalArg {
    /// Path to the count rows JSON file
    pub rows: PathBuf,

    /// Bucket value marking units still alive at the end of observation
    #[arg(long, default_value = "alive")]
    pub sentinel: String,

    /// Save curves and summary rows as JSON to this path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SurvivalReport {
    curves: Vec<ReplicateCurve>,
    summary: Vec<SurvivalSummaryRow>,
}

pub(crate) fn run(arg: &SurvivalArg) -> anyhow::Result<()> {
    let rows: Vec<ObservationRow> = util::read_json_file("count rows", &arg.rows)?;
    let observations = schema::parse_observations(&rows, &arg.sentinel)?;

    let curves = replicate_curves(&observations)?;
    let summary = summarize_curves(&curves);

    println!("Survival Report (sentinel='{}')", arg.sentinel);
    println!("========================================\n");

    print_legend();
    println!();

    print_replicate_table(&curves);
    println!();

    print_summary_table(&summary);

    if let Some(output_path) = &arg.output {
        let report = SurvivalReport { curves, summary };
        util::Output::save_json(&report, Some(output_path.clone()))?;
        println!("\nSurvival report saved to: {}", output_path.display());
    }

    Ok(())
}

fn print_legend() {
    println!("Legend:");
    println!("  Final       : Surviving fraction at the last day of the series");
    println!("  Mean/Median : Cross-replicate surviving fraction at each day (forward-filled)");
    println!("  StdErr      : Standard error of the replicate fractions");
    println!("  N           : Number of replicates contributing to the group");
}

fn print_replicate_table(curves: &[ReplicateCurve]) {
    println!("Replicate Curves:");
    println!(
        "  {:<16} {:<12} {:>8} {:>8}",
        "Group", "Replicate", "Units", "Final"
    );
    println!("  {}", "-".repeat(48));
    for curve in curves {
        let final_fraction = curve.points.last().map_or(1.0, |point| point.fraction);
        println!(
            "  {:<16} {:<12} {:>8} {:>8.3}",
            curve.group, curve.replicate, curve.total_units, final_fraction
        );
    }
}

fn print_summary_table(summary: &[SurvivalSummaryRow]) {
    println!("Group Summary:");
    println!(
        "  {:<16} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8} {:>4}",
        "Group", "Day", "Mean", "Median", "StdErr", "Min", "Max", "N"
    );
    println!("  {}", "-".repeat(74));
    for row in summary {
        println!(
            "  {:<16} {:>6} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>4}",
            row.group, row.time, row.mean, row.median, row.std_err, row.min, row.max, row.n
        );
    }
}
