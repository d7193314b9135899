//! Two-sample log-rank test for censored time-to-event data.
//!
//! The log-rank test compares the event-time distributions of two groups
//! under right-censoring: at each distinct event time it tallies observed
//! versus expected events under the null hypothesis of identical hazards,
//! accumulating a chi-squared statistic with one degree of freedom.
//!
//! Observations are `(time, event_occurred)` pairs. `event_occurred = false`
//! marks a right-censored unit: it contributes to the at-risk set up to its
//! censoring time without counting as an event.

use std::collections::BTreeSet;

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Raised when a comparison is attempted with fewer than two populated groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("fewer than two groups with observations remain for comparison")]
pub struct InsufficientGroupsError;

/// Outcome of a two-sample log-rank test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRankResult {
    /// Chi-squared test statistic.
    pub statistic: f64,
    /// Degrees of freedom (number of groups minus one, i.e. 1).
    pub degrees_of_freedom: usize,
    /// Upper-tail chi-squared p-value.
    pub p_value: f64,
}

/// Runs a two-sample log-rank test over `(time, event_occurred)` observations.
///
/// Censored units (`event_occurred = false`) stay in the at-risk set through
/// their censoring time. When no event time carries any variance (for example
/// all units censored), the test is uninformative and reports `p_value = 1.0`
/// with a zero statistic.
///
/// # Errors
///
/// Returns [`InsufficientGroupsError`] if either sample is empty.
///
/// # Examples
///
/// ```
/// # use cohort_stats::logrank::log_rank_test;
/// // Identical groups cannot be distinguished.
/// let group = [(1, true), (2, true), (3, false)];
/// let result = log_rank_test(&group, &group).unwrap();
/// assert_eq!(result.statistic, 0.0);
/// assert_eq!(result.p_value, 1.0);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn log_rank_test(
    first: &[(u32, bool)],
    second: &[(u32, bool)],
) -> Result<LogRankResult, InsufficientGroupsError> {
    if first.is_empty() || second.is_empty() {
        return Err(InsufficientGroupsError);
    }

    let event_times = first
        .iter()
        .chain(second)
        .filter(|(_, event)| *event)
        .map(|(time, _)| *time)
        .collect::<BTreeSet<_>>();

    let mut observed_first = 0.0;
    let mut expected_first = 0.0;
    let mut variance = 0.0;

    for &t in &event_times {
        let at_risk = |sample: &[(u32, bool)]| sample.iter().filter(|(time, _)| *time >= t).count();
        let events_at = |sample: &[(u32, bool)]| {
            sample
                .iter()
                .filter(|(time, event)| *time == t && *event)
                .count()
        };

        let n_first = at_risk(first);
        let n_total = n_first + at_risk(second);
        if n_total < 2 {
            continue;
        }

        let d_first = events_at(first);
        let d_total = d_first + events_at(second);

        let n = n_total as f64;
        let n1 = n_first as f64;
        let d = d_total as f64;

        observed_first += d_first as f64;
        expected_first += d * n1 / n;
        variance += d * (n1 / n) * (1.0 - n1 / n) * (n - d) / (n - 1.0);
    }

    let (statistic, p_value) = if variance > 0.0 {
        let statistic = (observed_first - expected_first).powi(2) / variance;
        let chi_squared = ChiSquared::new(1.0).expect("one degree of freedom is valid");
        (statistic, 1.0 - chi_squared.cdf(statistic))
    } else {
        (0.0, 1.0)
    };

    Ok(LogRankResult {
        statistic,
        degrees_of_freedom: 1,
        p_value,
    })
}
