use crate::extremum::{Extremum, ExtremumTracker};
use crate::models::VariantKey;
use crate::stats::RunningStats;

///
/// Persisted summary of every sample contributing at one position.
///
/// A record only exists while at least one sample contributes; a key with no
/// contributors is absent from the store rather than stored with a zero count.
///
#[derive(PartialEq, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregateRecord {
    pub key: VariantKey,
    pub stats: RunningStats,
    pub total_depth: u64,
    pub extrema: ExtremumTracker,
}

impl AggregateRecord {
    /// Record created by the first contributing sample at `key`.
    pub fn first(key: VariantKey, value: f64, depth: u64, sample: &str) -> Self {
        AggregateRecord {
            key,
            stats: RunningStats::single(value),
            total_depth: depth,
            extrema: ExtremumTracker::single(value, sample),
        }
    }

    ///
    /// Reassemble a record from its stored columns.
    ///
    pub fn from_parts(
        key: VariantKey,
        count: u32,
        mean: f64,
        std_dev: f64,
        total_depth: u64,
        max: Option<Extremum>,
        min: Option<Extremum>,
    ) -> Self {
        AggregateRecord {
            key,
            stats: RunningStats::new(mean, std_dev, count),
            total_depth,
            extrema: ExtremumTracker::restore(max, min),
        }
    }

    pub fn count(&self) -> u32 {
        self.stats.count
    }

    pub fn mean(&self) -> f64 {
        self.stats.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.stats.std_dev
    }

    pub fn max(&self) -> Option<&Extremum> {
        self.extrema.max.as_ref()
    }

    pub fn min(&self) -> Option<&Extremum> {
        self.extrema.min.as_ref()
    }
}
