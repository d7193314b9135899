use clap::{Parser, Subcommand};

use self::{grouping::GroupingArg, survival::SurvivalArg, sweep::SweepArg};

mod grouping;
mod survival;
mod sweep;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What analysis to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Per-replicate survival curves and cross-replicate summaries
    Survival(#[clap(flatten)] SurvivalArg),
    /// Pairwise log-rank significance sweep over censoring cutoffs
    Sweep(#[clap(flatten)] SweepArg),
    /// Factorial ANOVA with letter-coded homogeneous subsets
    Grouping(#[clap(flatten)] GroupingArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Survival(arg) => survival::run(&arg)?,
        Mode::Sweep(arg) => sweep::run(&arg)?,
        Mode::Grouping(arg) => grouping::run(&arg)?,
    }
    Ok(())
}
