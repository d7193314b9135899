//! Pairwise significance sweep command
//!
//! Expands a raw count table into per-unit event records, then runs a
//! two-sample log-rank test per group pair at each censoring cutoff to show
//! when the groups start to differ.

use std::path::PathBuf;

use clap::Args;
use cohort_analysis::{
    expand::expand_observations,
    observation::HorizonPolicy,
    sweep::{SignificanceMatrix, SweepCell, SweepConfig, pairwise_sweep},
};

use crate::{
    schema::{self, ObservationRow},
    util,
};

#[derive(Debug, Clone, Args)]
pub(crate) struct SweepArg {
    /// Path to the count rows JSON file
    pub rows: PathBuf,

    /// Bucket value marking units still alive at the end of observation
    #[arg(long, default_value = "alive")]
    pub sentinel: String,

    /// P-values at or above this threshold are masked as not significant
    #[arg(long, default_value_t = 0.01)]
    pub threshold: f64,

    /// Censoring day for sentinel buckets (defaults to the last observed day)
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Save the sweep rows as JSON to this path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SweepArg) -> anyhow::Result<()> {
    let rows: Vec<ObservationRow> = util::read_json_file("count rows", &arg.rows)?;
    let observations = schema::parse_observations(&rows, &arg.sentinel)?;

    let policy = arg.horizon.map_or(HorizonPolicy::MaxObserved, HorizonPolicy::Fixed);
    let events = expand_observations(&observations, policy);
    let matrix = pairwise_sweep(
        &events,
        SweepConfig {
            significance_threshold: arg.threshold,
        },
    )?;

    println!("Significance Sweep Report (threshold={})", arg.threshold);
    println!("========================================\n");

    print_legend();
    println!();

    print_matrix(&matrix);

    if let Some(output_path) = &arg.output {
        util::Output::save_json(&matrix.rows(), Some(output_path.clone()))?;
        println!("\nSweep rows saved to: {}", output_path.display());
    }

    Ok(())
}

fn print_legend() {
    println!("Legend:");
    println!("  <p-value>   : Log-rank p-value below the significance threshold");
    println!("  ns          : Test ran but the p-value did not clear the threshold");
    println!("  -           : Test skipped (a group had no units at risk at this cutoff)");
}

fn print_matrix(matrix: &SignificanceMatrix) {
    print!("  {:>6}", "Day");
    for pair in matrix.pairs() {
        let label = pair.to_string();
        print!(" {label:>20}");
    }
    println!();
    println!(
        "  {}",
        "-".repeat(6 + 21 * matrix.pairs().len())
    );

    for &cutoff_time in matrix.cutoff_times() {
        print!("  {cutoff_time:>6}");
        for pair in matrix.pairs() {
            let cell = match matrix.cell(cutoff_time, pair) {
                SweepCell::Significant(p_value) => format!("{p_value:.2e}"),
                SweepCell::NotSignificant => "ns".to_string(),
                SweepCell::Skipped => "-".to_string(),
            };
            print!(" {cell:>20}");
        }
        println!();
    }
}
