use crate::errors::{Result, VarNoiseError};
use crate::models::VariantKey;

///
/// One sample's reading at one genomic position.
///
/// The allele fraction is only defined when the depth is non-zero; an
/// observation built with `depth == 0` carries `None` so the engine can drop it.
///
#[derive(PartialEq, Debug, Clone)]
pub struct Observation {
    pub key: VariantKey,
    pub sample: String,
    pub allele_fraction: Option<f64>,
    pub depth: u32,
}

impl Observation {
    pub fn new(key: VariantKey, sample: impl Into<String>, allele_fraction: f64, depth: u32) -> Self {
        Observation {
            key,
            sample: sample.into(),
            allele_fraction: (depth > 0).then_some(allele_fraction),
            depth,
        }
    }

    ///
    /// Build an observation from raw read counts.
    ///
    /// # Arguments
    /// - alt_reads: reads supporting the non-reference allele
    /// - depth: total read depth at the position
    ///
    pub fn from_read_counts(
        key: VariantKey,
        sample: impl Into<String>,
        alt_reads: u32,
        depth: u32,
    ) -> Self {
        Observation {
            key,
            sample: sample.into(),
            allele_fraction: (depth > 0).then(|| alt_reads as f64 / depth as f64),
            depth,
        }
    }

    /// Weight of the observation in depth sums.
    pub fn weight(&self) -> u64 {
        self.depth as u64
    }

    ///
    /// The allele fraction, if this observation may contribute to an aggregate.
    ///
    /// Fails with `DataError` for zero depth, non-finite fractions and fractions
    /// outside `[0, 1]`.
    ///
    pub fn checked_fraction(&self) -> Result<f64> {
        match self.allele_fraction {
            None => Err(VarNoiseError::DataError(format!(
                "{} at {} has zero depth, allele fraction undefined",
                self.sample, self.key
            ))),
            Some(af) if !af.is_finite() || !(0.0..=1.0).contains(&af) => {
                Err(VarNoiseError::DataError(format!(
                    "{} at {} has allele fraction {} outside [0, 1]",
                    self.sample, self.key, af
                )))
            }
            Some(af) => Ok(af),
        }
    }
}
