//! Day-indexed pairwise significance sweep over censored event records.
//!
//! For every candidate cutoff day and every unordered pair of groups, the
//! sweep asks: "if we had stopped watching at day t, would a difference
//! between these two groups already be detectable?" Each cell re-censors
//! the full record set as of its cutoff, restricts to its pair, and runs a
//! two-sample log-rank test; the resulting time x pair matrix is then
//! thresholded so only significant cells keep their p-values.
//!
//! Two kinds of empty cell exist and stay distinguishable in-memory:
//! a *skipped* cell (one group had no unit still alive at the cutoff, so
//! the test is undefined) is absent from the matrix, while a *masked* cell
//! (p-value at or above the threshold) is present but null. Exported rows
//! carry only present cells, so downstream tables see both as blank.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use cohort_stats::logrank::{InsufficientGroupsError, log_rank_test};
use serde::Serialize;

use crate::expand::EventRecord;

/// Sweep configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepConfig {
    /// P-values at or above this threshold are masked to null.
    pub significance_threshold: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            significance_threshold: 0.01,
        }
    }
}

/// An unordered pair of group labels.
///
/// Construction normalizes the order, so `new("b", "a")` and `new("a", "b")`
/// are the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupPair {
    first: String,
    second: String,
}

impl GroupPair {
    /// Creates a normalized unordered pair.
    #[must_use]
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Lexicographically smaller group label.
    #[must_use]
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Lexicographically larger group label.
    #[must_use]
    pub fn second(&self) -> &str {
        &self.second
    }
}

impl fmt::Display for GroupPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.first, self.second)
    }
}

/// State of one (cutoff, pair) cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepCell {
    /// The pair is distinguishable at this cutoff; the p-value is kept.
    Significant(f64),
    /// The test ran but the p-value fell at or above the threshold.
    NotSignificant,
    /// The test was undefined at this cutoff (a group had no unit still
    /// alive) and the cell was omitted.
    Skipped,
}

/// One exported matrix row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificanceRow {
    /// Cutoff day of this cell.
    pub cutoff_time: u32,
    /// Pair label, e.g. `"control vs fungus"`.
    pub pair: String,
    /// Retained p-value, or `None` when masked by the threshold.
    pub p_value: Option<f64>,
}

/// The time x pair significance matrix produced by a sweep.
///
/// The set of present cells is fixed by the data; thresholding only toggles
/// present cells between valued and null, so the matrix shape is stable
/// across thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificanceMatrix {
    cutoff_times: Vec<u32>,
    pairs: Vec<GroupPair>,
    cells: BTreeMap<(u32, GroupPair), Option<f64>>,
}

impl SignificanceMatrix {
    /// Cutoff days covered by the sweep, ascending.
    #[must_use]
    pub fn cutoff_times(&self) -> &[u32] {
        &self.cutoff_times
    }

    /// All unordered group pairs present in the input, sorted.
    #[must_use]
    pub fn pairs(&self) -> &[GroupPair] {
        &self.pairs
    }

    /// Looks up one cell.
    #[must_use]
    pub fn cell(&self, cutoff_time: u32, pair: &GroupPair) -> SweepCell {
        match self.cells.get(&(cutoff_time, pair.clone())) {
            Some(Some(p)) => SweepCell::Significant(*p),
            Some(None) => SweepCell::NotSignificant,
            None => SweepCell::Skipped,
        }
    }

    /// Masks every present cell whose p-value is at or above `threshold`.
    ///
    /// Masking never removes cells and never restores already-masked ones,
    /// so re-applying the same threshold is a no-op.
    pub fn apply_threshold(&mut self, threshold: f64) {
        for value in self.cells.values_mut() {
            if value.is_some_and(|p| p >= threshold) {
                *value = None;
            }
        }
    }

    /// Exports the present cells as flat rows for display or serialization.
    #[must_use]
    pub fn rows(&self) -> Vec<SignificanceRow> {
        self.cells
            .iter()
            .map(|((cutoff_time, pair), p_value)| SignificanceRow {
                cutoff_time: *cutoff_time,
                pair: pair.to_string(),
                p_value: *p_value,
            })
            .collect()
    }
}

/// Runs the full sweep over every cutoff day and unordered group pair.
///
/// Cutoff days are the distinct observed death times excluding the final
/// (end-of-observation) time: at the final time every unit has either died
/// or reached the censoring horizon, which makes the comparison maximal and
/// uninformative for earliest-divergence reporting.
///
/// At each cell every unit's status is recomputed as of the cutoff `t`:
/// a unit counts as an event if it truly died at a time `<= t`, and is
/// otherwise censored at `min(time, t)`. A unit is at risk at `t` only if it
/// neither died nor was censored before `t`; pairs where one group has no
/// unit at risk are skipped silently.
///
/// # Errors
///
/// Returns [`InsufficientGroupsError`] if the records cover fewer than two
/// groups.
pub fn pairwise_sweep(
    events: &[EventRecord],
    config: SweepConfig,
) -> Result<SignificanceMatrix, InsufficientGroupsError> {
    let mut samples: BTreeMap<&str, Vec<(u32, bool)>> = BTreeMap::new();
    for event in events {
        samples
            .entry(&event.group)
            .or_default()
            .push((event.time, event.event_occurred));
    }
    if samples.len() < 2 {
        return Err(InsufficientGroupsError);
    }

    let final_time = events.iter().map(|event| event.time).max().unwrap_or(0);
    let cutoff_times: Vec<u32> = events
        .iter()
        .filter(|event| event.event_occurred && event.time != final_time)
        .map(|event| event.time)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let groups: Vec<&str> = samples.keys().copied().collect();
    let pairs: Vec<GroupPair> = groups
        .iter()
        .enumerate()
        .flat_map(|(i, a)| groups[(i + 1)..].iter().map(|b| GroupPair::new(*a, *b)))
        .collect();

    let mut cells = BTreeMap::new();
    for &t in &cutoff_times {
        let recensor = |sample: &[(u32, bool)]| {
            sample
                .iter()
                .map(|&(time, event)| {
                    if event && time <= t {
                        (time, true)
                    } else {
                        (time.min(t), false)
                    }
                })
                .collect::<Vec<_>>()
        };
        let still_alive = |sample: &[(u32, bool)]| {
            sample
                .iter()
                .filter(|&&(time, event)| !(event && time <= t) && time >= t)
                .count()
        };

        for pair in &pairs {
            let first = &samples[pair.first()];
            let second = &samples[pair.second()];
            if still_alive(first) == 0 || still_alive(second) == 0 {
                continue;
            }
            let result = log_rank_test(&recensor(first), &recensor(second))?;
            cells.insert((t, pair.clone()), Some(result.p_value));
        }
    }

    let mut matrix = SignificanceMatrix {
        cutoff_times,
        pairs,
        cells,
    };
    matrix.apply_threshold(config.significance_threshold);
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::expand_observations;
    use crate::observation::{HorizonPolicy, Observation, TimeBucket};

    fn obs(group: &str, replicate: &str, bucket: TimeBucket, count: u64) -> Observation {
        Observation {
            group: group.to_owned(),
            replicate: replicate.to_owned(),
            bucket,
            count,
        }
    }

    fn two_group_events() -> Vec<EventRecord> {
        let table = [
            obs("a", "r1", TimeBucket::Day(1), 2),
            obs("a", "r1", TimeBucket::Day(2), 1),
            obs("a", "r1", TimeBucket::EndOfObservation, 7),
            obs("b", "r1", TimeBucket::Day(1), 5),
            obs("b", "r1", TimeBucket::EndOfObservation, 5),
        ];
        expand_observations(&table, HorizonPolicy::MaxObserved)
    }

    fn keep_everything() -> SweepConfig {
        SweepConfig {
            significance_threshold: 1.0,
        }
    }

    #[test]
    fn test_final_time_is_excluded() {
        let matrix = pairwise_sweep(&two_group_events(), keep_everything()).unwrap();
        assert_eq!(matrix.cutoff_times(), &[1]);
    }

    #[test]
    fn test_exact_log_rank_cell() {
        let matrix = pairwise_sweep(&two_group_events(), keep_everything()).unwrap();
        let pair = GroupPair::new("a", "b");
        // At cutoff day 1: 7 pooled deaths among 20 at risk, 2 of them in
        // group a against an expectation of 3.5 -> chi2 ~ 1.879, p ~ 0.170.
        let SweepCell::Significant(p) = matrix.cell(1, &pair) else {
            panic!("cell should be present and unmasked");
        };
        assert!((p - 0.1705).abs() < 2e-3);
    }

    #[test]
    fn test_default_threshold_masks_weak_cell() {
        let matrix = pairwise_sweep(&two_group_events(), SweepConfig::default()).unwrap();
        let pair = GroupPair::new("a", "b");
        assert_eq!(matrix.cell(1, &pair), SweepCell::NotSignificant);
        // The masked cell still exports as a (null) row.
        let rows = matrix.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].p_value, None);
    }

    #[test]
    fn test_pair_key_is_unordered() {
        let matrix = pairwise_sweep(&two_group_events(), keep_everything()).unwrap();
        assert_eq!(
            matrix.cell(1, &GroupPair::new("a", "b")),
            matrix.cell(1, &GroupPair::new("b", "a")),
        );
        assert_eq!(GroupPair::new("b", "a").to_string(), "a vs b");
    }

    #[test]
    fn test_threshold_is_idempotent() {
        let mut matrix = pairwise_sweep(&two_group_events(), keep_everything()).unwrap();
        matrix.apply_threshold(0.05);
        let once = matrix.clone();
        matrix.apply_threshold(0.05);
        assert_eq!(matrix, once);
    }

    #[test]
    fn test_extinct_group_cell_is_skipped() {
        let table = [
            obs("x", "r1", TimeBucket::Day(1), 5),
            obs("x", "r1", TimeBucket::EndOfObservation, 0),
            obs("y", "r1", TimeBucket::Day(2), 3),
            obs("y", "r1", TimeBucket::EndOfObservation, 4),
        ];
        let events = expand_observations(&table, HorizonPolicy::MaxObserved);
        let matrix = pairwise_sweep(&events, keep_everything()).unwrap();
        let pair = GroupPair::new("x", "y");
        // Group x is fully dead from day 1 onward: every cell is undefined.
        assert_eq!(matrix.cell(1, &pair), SweepCell::Skipped);
        assert!(matrix.rows().is_empty());
        // The matrix shape still lists the cutoffs and the pair.
        assert_eq!(matrix.cutoff_times(), &[1]);
        assert_eq!(matrix.pairs(), &[pair]);
    }

    #[test]
    fn test_group_censored_before_cutoff_is_skipped() {
        // Group x is exhausted by day 2: 3 deaths on day 1 and the 2
        // survivors censored at the fixed horizon. At the day-3 cutoff no x
        // unit is at risk, so the cell is undefined rather than computed.
        let table = [
            obs("x", "r1", TimeBucket::Day(1), 3),
            obs("x", "r1", TimeBucket::EndOfObservation, 2),
            obs("y", "r1", TimeBucket::Day(3), 1),
            obs("y", "r1", TimeBucket::Day(6), 1),
        ];
        let events = expand_observations(&table, HorizonPolicy::Fixed(2));
        let matrix = pairwise_sweep(&events, keep_everything()).unwrap();
        let pair = GroupPair::new("x", "y");

        assert_eq!(matrix.cutoff_times(), &[1, 3]);
        assert_eq!(matrix.cell(3, &pair), SweepCell::Skipped);
        // At day 1 the later-censored x units still count as at risk.
        assert_ne!(matrix.cell(1, &pair), SweepCell::Skipped);
    }

    #[test]
    fn test_single_group_is_rejected() {
        let table = [
            obs("only", "r1", TimeBucket::Day(1), 1),
            obs("only", "r1", TimeBucket::EndOfObservation, 1),
        ];
        let events = expand_observations(&table, HorizonPolicy::MaxObserved);
        assert_eq!(
            pairwise_sweep(&events, SweepConfig::default()),
            Err(InsufficientGroupsError)
        );
    }
}
