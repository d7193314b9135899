//! Aggregated observation rows as produced by the experiment tables.
//!
//! Each row counts how many units of one (group, replicate) series fell into
//! a time bucket: either a day index on which they died, or the
//! end-of-observation sentinel ("still alive" at the end of the experiment).
//!
//! # Data Structure
//!
//! ```json
//! { "group": "fungus", "replicate": "r1", "bucket": { "Day": 3 }, "count": 4 }
//! { "group": "fungus", "replicate": "r1", "bucket": "EndOfObservation", "count": 6 }
//! ```
//!
//! Raw tables carry the bucket as a string column; [`Observation::from_raw`]
//! parses it against a caller-supplied sentinel value.

use serde::{Deserialize, Serialize};

/// Raised when a raw time-bucket value is neither the end-of-observation
/// sentinel nor a day index.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("time bucket '{bucket}' is neither the end-of-observation sentinel nor a day index")]
pub struct InvalidBucketError {
    /// The raw bucket value that failed to parse.
    pub bucket: String,
}

/// A time bucket: the day a unit died, or the "still alive" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeBucket {
    /// Death observed on this day index.
    Day(u32),
    /// Unit survived to the end of observation (right-censored).
    EndOfObservation,
}

impl TimeBucket {
    /// Parses a raw bucket value against the end-of-observation sentinel.
    ///
    /// The comparison with the sentinel is case-insensitive; any other value
    /// must parse as a day index.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBucketError`] if the value matches neither.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cohort_analysis::observation::TimeBucket;
    /// assert_eq!(TimeBucket::parse("3", "alive").unwrap(), TimeBucket::Day(3));
    /// assert_eq!(
    ///     TimeBucket::parse("Alive", "alive").unwrap(),
    ///     TimeBucket::EndOfObservation
    /// );
    /// assert!(TimeBucket::parse("day three", "alive").is_err());
    /// ```
    pub fn parse(raw: &str, sentinel: &str) -> Result<Self, InvalidBucketError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(sentinel) {
            return Ok(Self::EndOfObservation);
        }
        trimmed
            .parse::<u32>()
            .map(Self::Day)
            .map_err(|_| InvalidBucketError {
                bucket: raw.to_owned(),
            })
    }
}

/// One aggregated observation row: `count` units of a (group, replicate)
/// series assigned to a time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Group (treatment) label.
    pub group: String,
    /// Replicate identifier within the group.
    pub replicate: String,
    /// Time bucket the counted units fell into.
    pub bucket: TimeBucket,
    /// Number of units in this bucket.
    pub count: u64,
}

impl Observation {
    /// Builds an observation from a raw table row, parsing the bucket column.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBucketError`] if the bucket value cannot be parsed.
    pub fn from_raw(
        group: impl Into<String>,
        replicate: impl Into<String>,
        raw_bucket: &str,
        count: u64,
        sentinel: &str,
    ) -> Result<Self, InvalidBucketError> {
        Ok(Self {
            group: group.into(),
            replicate: replicate.into(),
            bucket: TimeBucket::parse(raw_bucket, sentinel)?,
            count,
        })
    }
}

/// How the end-of-observation sentinel maps to a concrete censoring time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizonPolicy {
    /// Censor at the maximum finite day observed in the table.
    #[default]
    MaxObserved,
    /// Censor at a caller-supplied fixed horizon day.
    Fixed(u32),
}
