//! Record sources and fixed-size batching.

use std::num::NonZeroUsize;

use crate::errors::Result;
use crate::models::Observation;

///
/// A single-pass stream of one sample's observations.
///
/// The sample name and the path the observations come from are known up front,
/// independently of iterating.
///
pub trait RecordSource: Iterator<Item = Result<Observation>> {
    fn sample_name(&self) -> &str;
    fn source_path(&self) -> &str;
}

///
/// Observations already held in memory, e.g. produced by another tool or a test.
///
pub struct ObservationList {
    sample: String,
    path: String,
    observations: std::vec::IntoIter<Observation>,
}

impl ObservationList {
    pub fn new(
        sample: impl Into<String>,
        path: impl Into<String>,
        observations: Vec<Observation>,
    ) -> Self {
        ObservationList {
            sample: sample.into(),
            path: path.into(),
            observations: observations.into_iter(),
        }
    }
}

impl Iterator for ObservationList {
    type Item = Result<Observation>;

    fn next(&mut self) -> Option<Self::Item> {
        self.observations.next().map(Ok)
    }
}

impl RecordSource for ObservationList {
    fn sample_name(&self) -> &str {
        &self.sample
    }

    fn source_path(&self) -> &str {
        &self.path
    }
}

///
/// Chunks an observation stream into batches of `size`.
///
/// Every yielded batch is non-empty and only the last one may be shorter than
/// `size`; the end of input is `None`. A source error is yielded once and ends
/// the stream.
///
pub struct Batches<I> {
    inner: I,
    size: NonZeroUsize,
    done: bool,
}

impl<I> Batches<I>
where
    I: Iterator<Item = Result<Observation>>,
{
    pub fn new(inner: I, size: NonZeroUsize) -> Self {
        Batches {
            inner,
            size,
            done: false,
        }
    }
}

impl<I> Iterator for Batches<I>
where
    I: Iterator<Item = Result<Observation>>,
{
    type Item = Result<Vec<Observation>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.size.get());
        while batch.len() < self.size.get() {
            match self.inner.next() {
                Some(Ok(obs)) => batch.push(obs),
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}
