//! Max/min tracking with sample attribution.
//!
//! Only the current holder of each extremum is remembered. Removing the holder
//! forgets that side (it becomes `None`) instead of guessing the runner-up.
//!
//! A forgotten side deliberately stays `None` on later adds, rather than
//! treating `None` as "unset" and adopting the next value: that value could sit
//! below a still-contributing sample's, breaking `max >= mean >= min`. Only a
//! tracker that has never seen a value (`seeded == false`) takes the first add
//! on both sides.

#[derive(PartialEq, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extremum {
    pub value: f64,
    pub sample: String,
}

impl Extremum {
    pub fn new(value: f64, sample: impl Into<String>) -> Self {
        Extremum {
            value,
            sample: sample.into(),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtremumTracker {
    pub max: Option<Extremum>,
    pub min: Option<Extremum>,
    seeded: bool,
}

impl ExtremumTracker {
    /// Tracker for a key that already has contributors, e.g. one read back from storage.
    pub fn restore(max: Option<Extremum>, min: Option<Extremum>) -> Self {
        ExtremumTracker {
            max,
            min,
            seeded: true,
        }
    }

    /// Tracker holding a single contributor.
    pub fn single(value: f64, sample: &str) -> Self {
        let mut tracker = ExtremumTracker::default();
        tracker.observe_add(value, sample);
        tracker
    }

    pub fn observe_add(&mut self, value: f64, sample: &str) {
        if !self.seeded {
            self.max = Some(Extremum::new(value, sample));
            self.min = Some(Extremum::new(value, sample));
            self.seeded = true;
            return;
        }

        if let Some(max) = self.max.as_mut() {
            if value > max.value {
                *max = Extremum::new(value, sample);
            }
        }
        if let Some(min) = self.min.as_mut() {
            if value < min.value {
                *min = Extremum::new(value, sample);
            }
        }
    }

    pub fn observe_remove(&mut self, _value: f64, sample: &str) {
        if self.max.as_ref().is_some_and(|m| m.sample == sample) {
            self.max = None;
        }
        if self.min.as_ref().is_some_and(|m| m.sample == sample) {
            self.min = None;
        }
    }
}
