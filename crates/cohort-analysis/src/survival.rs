//! Survival-fraction curves and cross-replicate summaries.
//!
//! Survival fractions are computed directly from the aggregated cumulative
//! counts rather than from expanded per-unit records: the running death
//! count divided by the series total is numerically exact and avoids
//! re-deriving cumulative sums from unit-level data.
//!
//! Each (group, replicate) series yields a step function of
//! `1 - cumulative_deaths / series_total` over its finite day buckets. The
//! end-of-observation sentinel bucket carries no death event, only the
//! denominator contribution of the survivors, so it must be present in
//! every series and is excluded from the reported curve.

use std::collections::{BTreeMap, BTreeSet};

use cohort_stats::descriptive::SummaryStats;
use serde::{Deserialize, Serialize};

use crate::observation::{Observation, TimeBucket};

/// Raised when a (group, replicate) series has no end-of-observation bucket:
/// without it the series denominator is unknown.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("series (group '{group}', replicate '{replicate}') has no end-of-observation bucket")]
pub struct IncompleteSeriesError {
    /// Group label of the incomplete series.
    pub group: String,
    /// Replicate identifier of the incomplete series.
    pub replicate: String,
}

/// One step of a replicate's survival curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurvivalPoint {
    /// Day index.
    pub time: u32,
    /// Fraction of the series still alive after this day, in `[0, 1]`.
    pub fraction: f64,
}

/// The survival step function of one (group, replicate) series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateCurve {
    /// Group (treatment) label.
    pub group: String,
    /// Replicate identifier.
    pub replicate: String,
    /// Total units ever present in the series (deaths plus survivors).
    pub total_units: u64,
    /// Survival fractions per day, ascending in time, non-increasing in value.
    pub points: Vec<SurvivalPoint>,
}

impl ReplicateCurve {
    /// Survival fraction at `time` with forward-fill semantics: the last
    /// known fraction at or before `time`, or `1.0` before the first point.
    #[must_use]
    pub fn fraction_at(&self, time: u32) -> f64 {
        self.points
            .iter()
            .take_while(|point| point.time <= time)
            .last()
            .map_or(1.0, |point| point.fraction)
    }
}

/// Cross-replicate summary of survival fractions at one (group, time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalSummaryRow {
    /// Group (treatment) label.
    pub group: String,
    /// Day index.
    pub time: u32,
    /// Mean survival fraction across replicates.
    pub mean: f64,
    /// Median survival fraction across replicates.
    pub median: f64,
    /// Standard error of the mean across replicates.
    pub std_err: f64,
    /// Minimum replicate fraction.
    pub min: f64,
    /// Maximum replicate fraction.
    pub max: f64,
    /// Number of replicates contributing.
    pub n: usize,
}

/// Computes one survival curve per (group, replicate) series.
///
/// Day buckets sharing a day are merged; the curve walks the days in
/// ascending order accumulating deaths against the series total (which
/// includes the sentinel bucket's survivors).
///
/// # Errors
///
/// Returns [`IncompleteSeriesError`] for any series without an
/// end-of-observation bucket.
#[expect(clippy::cast_precision_loss)]
pub fn replicate_curves(
    observations: &[Observation],
) -> Result<Vec<ReplicateCurve>, IncompleteSeriesError> {
    let mut series: BTreeMap<(&str, &str), Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        series
            .entry((&obs.group, &obs.replicate))
            .or_default()
            .push(obs);
    }

    let mut curves = vec![];
    for ((group, replicate), rows) in series {
        if !rows
            .iter()
            .any(|obs| obs.bucket == TimeBucket::EndOfObservation)
        {
            return Err(IncompleteSeriesError {
                group: group.to_owned(),
                replicate: replicate.to_owned(),
            });
        }

        let total_units: u64 = rows.iter().map(|obs| obs.count).sum();

        let mut deaths_by_day: BTreeMap<u32, u64> = BTreeMap::new();
        for obs in &rows {
            if let TimeBucket::Day(day) = obs.bucket {
                *deaths_by_day.entry(day).or_default() += obs.count;
            }
        }

        let mut cumulative = 0;
        let points = deaths_by_day
            .into_iter()
            .map(|(time, deaths)| {
                cumulative += deaths;
                let fraction = if total_units == 0 {
                    1.0
                } else {
                    1.0 - cumulative as f64 / total_units as f64
                };
                SurvivalPoint { time, fraction }
            })
            .collect();

        curves.push(ReplicateCurve {
            group: group.to_owned(),
            replicate: replicate.to_owned(),
            total_units,
            points,
        });
    }
    Ok(curves)
}

/// Aggregates replicate curves into per-(group, time) summary rows.
///
/// The summary visits every day any replicate of the group reports;
/// replicates without a bucket on that day hold their last known fraction
/// (forward-fill), so every replicate contributes to every row.
#[must_use]
pub fn summarize_curves(curves: &[ReplicateCurve]) -> Vec<SurvivalSummaryRow> {
    let mut by_group: BTreeMap<&str, Vec<&ReplicateCurve>> = BTreeMap::new();
    for curve in curves {
        by_group.entry(&curve.group).or_default().push(curve);
    }

    let mut rows = vec![];
    for (group, group_curves) in by_group {
        let times: BTreeSet<u32> = group_curves
            .iter()
            .flat_map(|curve| curve.points.iter().map(|point| point.time))
            .collect();

        for time in times {
            let fractions = group_curves
                .iter()
                .map(|curve| curve.fraction_at(time))
                .collect::<Vec<_>>();
            let Some(stats) = SummaryStats::new(fractions) else {
                continue;
            };
            rows.push(SurvivalSummaryRow {
                group: group.to_owned(),
                time,
                mean: stats.mean,
                median: stats.median,
                std_err: stats.std_err,
                min: stats.min,
                max: stats.max,
                n: stats.n,
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(group: &str, replicate: &str, bucket: TimeBucket, count: u64) -> Observation {
        Observation {
            group: group.to_owned(),
            replicate: replicate.to_owned(),
            bucket,
            count,
        }
    }

    fn two_group_table() -> Vec<Observation> {
        vec![
            obs("a", "r1", TimeBucket::Day(1), 2),
            obs("a", "r1", TimeBucket::Day(2), 1),
            obs("a", "r1", TimeBucket::EndOfObservation, 7),
            obs("b", "r1", TimeBucket::Day(1), 5),
            obs("b", "r1", TimeBucket::EndOfObservation, 5),
        ]
    }

    #[test]
    fn test_step_fractions() {
        let curves = replicate_curves(&two_group_table()).unwrap();
        assert_eq!(curves.len(), 2);

        let a = &curves[0];
        assert_eq!(a.group, "a");
        assert_eq!(a.total_units, 10);
        assert_eq!(a.points.len(), 2);
        assert!((a.points[0].fraction - 0.8).abs() < 1e-12);
        assert!((a.points[1].fraction - 0.7).abs() < 1e-12);

        let b = &curves[1];
        assert_eq!(b.total_units, 10);
        assert_eq!(b.points.len(), 1);
        assert!((b.points[0].fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_sentinel_is_fatal() {
        let table = [obs("a", "r1", TimeBucket::Day(1), 3)];
        let err = replicate_curves(&table).unwrap_err();
        assert_eq!(err.group, "a");
        assert_eq!(err.replicate, "r1");
    }

    #[test]
    fn test_monotonic_and_boundary() {
        let table = [
            obs("g", "r1", TimeBucket::Day(2), 3),
            obs("g", "r1", TimeBucket::Day(5), 1),
            obs("g", "r1", TimeBucket::Day(9), 4),
            obs("g", "r1", TimeBucket::EndOfObservation, 12),
        ];
        let curves = replicate_curves(&table).unwrap();
        let curve = &curves[0];

        assert!(
            curve
                .points
                .windows(2)
                .all(|w| w[1].fraction <= w[0].fraction)
        );

        // First point: 1 - deaths_at_first_day / total.
        assert!((curve.points[0].fraction - (1.0 - 3.0 / 20.0)).abs() < 1e-12);

        // Last fraction plus the cumulative death fraction sums to one.
        let total_deaths = 8.0;
        let last = curve.points.last().unwrap().fraction;
        assert!((last + total_deaths / 20.0 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_day_buckets_merge() {
        let table = [
            obs("g", "r1", TimeBucket::Day(1), 2),
            obs("g", "r1", TimeBucket::Day(1), 3),
            obs("g", "r1", TimeBucket::EndOfObservation, 5),
        ];
        let curves = replicate_curves(&table).unwrap();
        assert_eq!(curves[0].points.len(), 1);
        assert!((curves[0].points[0].fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_forward_fill_summary() {
        let curves = vec![
            ReplicateCurve {
                group: "g".to_owned(),
                replicate: "r1".to_owned(),
                total_units: 10,
                points: vec![
                    SurvivalPoint { time: 1, fraction: 0.8 },
                    SurvivalPoint { time: 3, fraction: 0.6 },
                ],
            },
            ReplicateCurve {
                group: "g".to_owned(),
                replicate: "r2".to_owned(),
                total_units: 10,
                points: vec![SurvivalPoint { time: 2, fraction: 0.9 }],
            },
        ];
        let rows = summarize_curves(&curves);
        assert_eq!(rows.len(), 3);

        // Day 1: r2 has no bucket yet and holds 1.0.
        assert_eq!(rows[0].time, 1);
        assert!((rows[0].mean - 0.9).abs() < 1e-12);
        assert_eq!(rows[0].n, 2);

        // Day 2: r1 forward-fills 0.8.
        assert_eq!(rows[1].time, 2);
        assert!((rows[1].mean - 0.85).abs() < 1e-12);
        assert!((rows[1].min - 0.8).abs() < 1e-12);
        assert!((rows[1].max - 0.9).abs() < 1e-12);

        // Day 3: r2 forward-fills 0.9.
        assert_eq!(rows[2].time, 3);
        assert!((rows[2].mean - 0.75).abs() < 1e-12);
    }
}
