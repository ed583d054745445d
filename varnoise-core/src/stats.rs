//! Online mean and population standard deviation.
//!
//! `RunningStats` is a plain value: `add` and `remove` return the next state and
//! never touch the receiver. The update is Welford's; `remove` is its exact
//! algebraic inverse, so removals may undo adds in any order (up to rounding).

use crate::errors::{Result, VarNoiseError};

#[derive(PartialEq, Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunningStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: u32,
}

impl RunningStats {
    pub fn new(mean: f64, std_dev: f64, count: u32) -> Self {
        RunningStats {
            mean,
            std_dev,
            count,
        }
    }

    /// Stats of a single value.
    pub fn single(value: f64) -> Self {
        RunningStats::new(value, 0.0, 1)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Sum of squared deviations from the mean.
    fn m2(&self) -> f64 {
        self.std_dev * self.std_dev * self.count as f64
    }

    ///
    /// Fold one more value in.
    ///
    pub fn add(&self, value: f64) -> Self {
        if self.count == 0 {
            return RunningStats::single(value);
        }

        let count = self.count + 1;
        let delta = value - self.mean;
        let mean = self.mean + delta / count as f64;
        let m2 = self.m2() + delta * (value - mean);

        RunningStats {
            mean,
            std_dev: (m2 / count as f64).sqrt(),
            count,
        }
    }

    ///
    /// Take a previously added value back out.
    ///
    /// Removing the last value yields the empty state `(0, 0, 0)`, which callers
    /// treat as "delete the record". Fails with `InvalidState` on an empty state.
    ///
    pub fn remove(&self, value: f64) -> Result<Self> {
        match self.count {
            0 => Err(VarNoiseError::InvalidState(format!(
                "cannot remove {} from an empty accumulator",
                value
            ))),
            1 => Ok(RunningStats::default()),
            n => {
                let count = n - 1;
                let delta = value - self.mean;
                let mean = self.mean - delta / count as f64;
                // rounding drift can push this marginally below zero
                let m2 = (self.m2() - delta * (value - mean)).max(0.0);
                // a single value has no spread, whatever M2 drifted to
                let std_dev = if count == 1 {
                    0.0
                } else {
                    (m2 / count as f64).sqrt()
                };

                Ok(RunningStats {
                    mean,
                    std_dev,
                    count,
                })
            }
        }
    }
}
