//! Statistical building blocks for the cohort comparison engine.
//!
//! This crate provides the experiment-agnostic statistics the analysis layer
//! is built on:
//!
//! - **Descriptive summaries**: mean, median, standard error, min, max for
//!   cross-replicate aggregation
//! - **Log-rank test**: two-sample comparison of censored time-to-event data
//! - **Additive ANOVA**: one- or two-factor linear model with sequential
//!   omnibus F-tests
//! - **Post-hoc grouping**: Bonferroni-adjusted all-pairs comparison with
//!   letter-coded homogeneous subsets
//!
//! # Modules
//!
//! - [`descriptive`]: Summary statistics for small replicate sets
//! - [`logrank`]: Two-sample log-rank test under right-censoring
//! - [`anova`]: Additive-model analysis of variance
//! - [`posthoc`]: All-pairs comparison and homogeneous-subset letters
//!
//! # Examples
//!
//! ## Comparing two censored samples
//!
//! ```
//! use cohort_stats::logrank::log_rank_test;
//!
//! // (time, event_occurred) - `false` marks a right-censored unit
//! let treated = [(1, true), (2, true), (4, false), (4, false)];
//! let control = [(3, true), (4, true), (4, false), (4, false)];
//! let result = log_rank_test(&treated, &control).unwrap();
//! assert_eq!(result.degrees_of_freedom, 1);
//! assert!(result.p_value > 0.0 && result.p_value <= 1.0);
//! ```
//!
//! ## Fitting an additive model
//!
//! ```
//! use cohort_stats::anova::{Factor, additive_anova};
//!
//! let response = [3.0, 4.0, 5.0, 9.0, 10.0, 11.0];
//! let factor = Factor {
//!     name: "strain".to_owned(),
//!     levels: ["wt", "wt", "wt", "ko", "ko", "ko"].map(str::to_owned).to_vec(),
//! };
//! let fit = additive_anova(&response, &[factor]).unwrap();
//! assert!(fit.effects[0].p_value < 0.05);
//! ```

pub mod anova;
pub mod descriptive;
pub mod logrank;
pub mod posthoc;
