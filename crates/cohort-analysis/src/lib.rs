//! Survival and factorial-grouping analysis for grouped count tables
//!
//! This crate turns raw experiment tables — per-replicate counts of units
//! that died on a given day or were still alive at the end of observation —
//! into survival curves, pairwise significance matrices, and letter-coded
//! factorial groupings.
//!
//! # Overview
//!
//! The crate supports three workflows:
//!
//! ## Survival Workflow
//!
//! Estimate per-replicate survival curves and cross-replicate summaries:
//!
//! 1. **Parse Rows** ([`observation::Observation`]): Parse bucket columns,
//!    mapping the end-of-observation sentinel to censoring
//! 2. **Per-Replicate Curves** ([`survival::replicate_curves`]): Walk each
//!    series' day buckets into a step curve of surviving fractions
//! 3. **Cross-Replicate Summary** ([`survival::summarize_curves`]):
//!    Forward-fill replicate curves onto a shared time axis and summarize
//!
//! ## Significance Sweep Workflow
//!
//! Locate when group survival starts to differ:
//!
//! 1. **Expand to Events** ([`expand::expand_observations`]): Unroll count
//!    rows into per-unit `(time, event_occurred)` records
//! 2. **Sweep Cutoffs** ([`sweep::pairwise_sweep`]): Re-censor at each
//!    distinct event time and run a two-sample log-rank test per group pair
//!
//! ## Factorial Grouping Workflow
//!
//! Compare endpoint measurements across one or two crossed factors:
//!
//! 1. **Collect Rows** ([`grouping::MeasurementRow`]): One numeric response
//!    with its factor levels per row
//! 2. **Fit and Letter** ([`grouping::factorial_grouping`]): Additive ANOVA,
//!    then pairwise post-hoc comparisons collapsed into homogeneous-subset
//!    letters
//!
//! # Examples
//!
//! ## Survival Curves from Raw Rows
//!
//! ```
//! use cohort_analysis::{
//!     observation::Observation,
//!     survival::{replicate_curves, summarize_curves},
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let observations = vec![
//!     Observation::from_raw("wt", "r1", "2", 2, "alive")?,
//!     Observation::from_raw("wt", "r1", "alive", 8, "alive")?,
//!     Observation::from_raw("wt", "r2", "2", 4, "alive")?,
//!     Observation::from_raw("wt", "r2", "alive", 6, "alive")?,
//! ];
//!
//! let curves = replicate_curves(&observations)?;
//! assert_eq!(curves.len(), 2);
//! assert!((curves[0].fraction_at(2) - 0.8).abs() < 1e-12);
//!
//! let summary = summarize_curves(&curves);
//! assert!((summary[0].mean - 0.7).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pairwise Significance Sweep
//!
//! ```
//! use cohort_analysis::{
//!     expand::expand_observations,
//!     observation::{HorizonPolicy, Observation},
//!     sweep::{SweepConfig, pairwise_sweep},
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let observations = vec![
//!     Observation::from_raw("wt", "r1", "1", 2, "alive")?,
//!     Observation::from_raw("wt", "r1", "3", 3, "alive")?,
//!     Observation::from_raw("wt", "r1", "alive", 5, "alive")?,
//!     Observation::from_raw("mut", "r1", "1", 5, "alive")?,
//!     Observation::from_raw("mut", "r1", "3", 4, "alive")?,
//!     Observation::from_raw("mut", "r1", "alive", 1, "alive")?,
//! ];
//!
//! let events = expand_observations(&observations, HorizonPolicy::MaxObserved);
//! let matrix = pairwise_sweep(&events, SweepConfig::default())?;
//! // Cutoffs stop short of the final observed time.
//! assert_eq!(matrix.cutoff_times(), &[1]);
//! # Ok(())
//! # }
//! ```

pub mod expand;
pub mod grouping;
pub mod observation;
pub mod survival;
pub mod sweep;
