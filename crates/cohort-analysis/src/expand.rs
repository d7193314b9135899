//! Expansion of aggregated counts into per-unit event records.
//!
//! Survival comparisons operate on one record per individual unit, with a
//! flag separating observed deaths from right-censored survivors. This
//! module turns the aggregated (group, replicate, bucket, count) rows into
//! exactly that shape: a bucket with `count = k` becomes `k` identical
//! records, day buckets as events at their own day, sentinel buckets as
//! censored records at the observation horizon.

use serde::{Deserialize, Serialize};

use crate::observation::{HorizonPolicy, Observation, TimeBucket};

/// One individual unit's time-to-event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Group (treatment) label.
    pub group: String,
    /// Replicate identifier within the group.
    pub replicate: String,
    /// Day index of the event or censoring.
    pub time: u32,
    /// `true` for an observed death, `false` for right-censoring.
    pub event_occurred: bool,
}

/// Expands aggregated observations into per-unit event records.
///
/// Sentinel buckets map to the horizon chosen by `policy` with
/// `event_occurred = false`; day buckets map to their own day with
/// `event_occurred = true`. A bucket with `count = 0` emits nothing. Under
/// [`HorizonPolicy::MaxObserved`] with no finite bucket anywhere in the
/// table, the horizon falls back to day 0.
///
/// # Examples
///
/// ```
/// # use cohort_analysis::expand::expand_observations;
/// # use cohort_analysis::observation::{HorizonPolicy, Observation, TimeBucket};
/// let observations = [
///     Observation {
///         group: "a".into(),
///         replicate: "r1".into(),
///         bucket: TimeBucket::Day(1),
///         count: 2,
///     },
///     Observation {
///         group: "a".into(),
///         replicate: "r1".into(),
///         bucket: TimeBucket::EndOfObservation,
///         count: 3,
///     },
/// ];
/// let events = expand_observations(&observations, HorizonPolicy::MaxObserved);
/// assert_eq!(events.len(), 5);
/// assert_eq!(events.iter().filter(|e| e.event_occurred).count(), 2);
/// // Censored units sit at the maximum observed day.
/// assert!(events.iter().filter(|e| !e.event_occurred).all(|e| e.time == 1));
/// ```
#[must_use]
pub fn expand_observations(
    observations: &[Observation],
    policy: HorizonPolicy,
) -> Vec<EventRecord> {
    let horizon = match policy {
        HorizonPolicy::Fixed(day) => day,
        HorizonPolicy::MaxObserved => observations
            .iter()
            .filter_map(|obs| match obs.bucket {
                TimeBucket::Day(day) => Some(day),
                TimeBucket::EndOfObservation => None,
            })
            .max()
            .unwrap_or(0),
    };

    let mut events = vec![];
    for obs in observations {
        let (time, event_occurred) = match obs.bucket {
            TimeBucket::Day(day) => (day, true),
            TimeBucket::EndOfObservation => (horizon, false),
        };
        for _ in 0..obs.count {
            events.push(EventRecord {
                group: obs.group.clone(),
                replicate: obs.replicate.clone(),
                time,
                event_occurred,
            });
        }
    }
    events
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

    #[test]
    fn test_count_conservation_per_series() {
        let observations = [
            obs("a", "r1", TimeBucket::Day(1), 2),
            obs("a", "r1", TimeBucket::Day(2), 1),
            obs("a", "r1", TimeBucket::EndOfObservation, 7),
            obs("b", "r1", TimeBucket::Day(1), 5),
            obs("b", "r1", TimeBucket::EndOfObservation, 5),
        ];
        let events = expand_observations(&observations, HorizonPolicy::MaxObserved);

        let total: u64 = observations.iter().map(|o| o.count).sum();
        assert_eq!(events.len(), usize::try_from(total).unwrap());
        for o in &observations {
            let (time, event_occurred) = match o.bucket {
                TimeBucket::Day(day) => (day, true),
                TimeBucket::EndOfObservation => (2, false),
            };
            let matching = events
                .iter()
                .filter(|e| {
                    e.group == o.group
                        && e.replicate == o.replicate
                        && e.time == time
                        && e.event_occurred == event_occurred
                })
                .count();
            assert_eq!(matching, usize::try_from(o.count).unwrap(), "bucket {:?}", o.bucket);
        }
    }

    #[test]
    fn test_zero_count_emits_nothing() {
        let observations = [
            obs("a", "r1", TimeBucket::Day(4), 0),
            obs("a", "r1", TimeBucket::EndOfObservation, 0),
        ];
        assert!(expand_observations(&observations, HorizonPolicy::MaxObserved).is_empty());
    }

    #[test]
    fn test_fixed_horizon_overrides_max_observed() {
        let observations = [
            obs("a", "r1", TimeBucket::Day(3), 1),
            obs("a", "r1", TimeBucket::EndOfObservation, 2),
        ];
        let events = expand_observations(&observations, HorizonPolicy::Fixed(14));
        let censored: Vec<_> = events.iter().filter(|e| !e.event_occurred).collect();
        assert_eq!(censored.len(), 2);
        assert!(censored.iter().all(|e| e.time == 14));
    }

    #[test]
    fn test_all_sentinel_table_censors_at_day_zero() {
        let observations = [obs("a", "r1", TimeBucket::EndOfObservation, 3)];
        let events = expand_observations(&observations, HorizonPolicy::MaxObserved);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.time == 0 && !e.event_occurred));
    }
}
