//! JSON row schemas for the input tables.

use anyhow::Context as _;
use cohort_analysis::observation::Observation;
use serde::Deserialize;

/// One raw count row: a group/replicate series with a bucket column that is
/// either a day index or the end-of-observation sentinel.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservationRow {
    pub group: String,
    pub replicate: String,
    pub bucket: String,
    pub count: u64,
}

impl ObservationRow {
    pub fn parse(&self, sentinel: &str) -> anyhow::Result<Observation> {
        Observation::from_raw(&self.group, &self.replicate, &self.bucket, self.count, sentinel)
            .with_context(|| {
                format!(
                    "Failed to parse bucket for series {}/{}",
                    self.group, self.replicate
                )
            })
    }
}

/// Parses a whole table, failing on the first bad bucket value.
pub fn parse_observations(
    rows: &[ObservationRow],
    sentinel: &str,
) -> anyhow::Result<Vec<Observation>> {
    rows.iter().map(|row| row.parse(sentinel)).collect()
}
