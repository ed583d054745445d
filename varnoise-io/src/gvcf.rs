//! gVCF reading.
//!
//! Every data line whose ALT column carries the `<NON_REF>` symbolic allele
//! becomes one observation of the first sample: allele fraction is the
//! `<NON_REF>` entry of `AD` over `DP`. Lines without `<NON_REF>` are not
//! observations; lines with unusable AD/DP are skipped with a warning.

use std::io::BufRead;
use std::path::Path;

use log::warn;

use varnoise_core::{Observation, RecordSource, VarNoiseError, VariantKey};

use crate::error::{GvcfError, Result};
use crate::utils::get_dynamic_reader;

const NON_REF: &str = "<NON_REF>";

pub struct GvcfSource {
    reader: Box<dyn BufRead>,
    path: String,
    sample: String,
    line_buf: String,
    line_num: usize,
    failed: bool,
}

impl GvcfSource {
    ///
    /// Open a gVCF (plain, `.gz` or `.bgz`) and read its header.
    ///
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = get_dynamic_reader(path)?;
        GvcfSource::from_reader(reader, path.to_string_lossy())
    }

    ///
    /// Read the header from an already opened reader.
    ///
    /// # Arguments
    /// - reader: positioned at the start of the file
    /// - path: recorded as the sample's source path
    ///
    pub fn from_reader(mut reader: Box<dyn BufRead>, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let mut line_buf = String::new();
        let mut line_num = 0;

        let sample = loop {
            line_buf.clear();
            if reader.read_line(&mut line_buf)? == 0 {
                return Err(GvcfError::MissingHeader(path));
            }
            line_num += 1;

            let line = line_buf.trim_end();
            if line.starts_with("##") {
                continue;
            }
            if line.starts_with("#CHROM") {
                match line.split('\t').nth(9) {
                    Some(name) if !name.is_empty() => break name.to_string(),
                    _ => return Err(GvcfError::NoSampleColumn(path)),
                }
            }
            return Err(GvcfError::MissingHeader(path));
        };

        Ok(GvcfSource {
            reader,
            path,
            sample,
            line_buf,
            line_num,
            failed: false,
        })
    }

    /// Register the observations under `name` instead of the header's sample name.
    pub fn with_sample_name(mut self, name: impl Into<String>) -> Self {
        self.sample = name.into();
        self
    }
}

impl Iterator for GvcfSource {
    type Item = varnoise_core::Result<Observation>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    self.failed = true;
                    return Some(Err(VarNoiseError::source(GvcfError::Io(err))));
                }
            }
            self.line_num += 1;

            let line = self.line_buf.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_record(line, &self.sample, self.line_num) {
                Ok(Some(obs)) => return Some(Ok(obs)),
                Ok(None) => continue,
                Err(err) => warn!("Skipping {} in {}", err, self.path),
            }
        }
    }
}

impl RecordSource for GvcfSource {
    fn sample_name(&self) -> &str {
        &self.sample
    }

    fn source_path(&self) -> &str {
        &self.path
    }
}

///
/// Turn one gVCF data line into an observation for `sample`.
///
/// Returns `Ok(None)` for lines that do not carry a `<NON_REF>` allele.
///
pub fn parse_record(line: &str, sample: &str, line_num: usize) -> Result<Option<Observation>> {
    let malformed = |reason: String| GvcfError::MalformedRecord {
        line: line_num,
        reason,
    };

    let fields: Vec<&str> = line.splitn(11, '\t').collect();
    if fields.len() < 10 {
        return Err(malformed(format!("expected at least 10 columns, found {}", fields.len())));
    }

    let Some(non_ref_index) = fields[4].split(',').position(|alt| alt == NON_REF) else {
        return Ok(None);
    };

    let chrom = fields[0];
    let pos: u64 = fields[1]
        .parse()
        .map_err(|_| malformed(format!("invalid POS '{}'", fields[1])))?;

    let format_keys: Vec<&str> = fields[8].split(':').collect();
    let values: Vec<&str> = fields[9].split(':').collect();
    let format_value = |key: &str| {
        format_keys
            .iter()
            .position(|k| *k == key)
            .and_then(|i| values.get(i).copied())
            .ok_or_else(|| malformed(format!("no {} value", key)))
    };

    // AD lists the REF count first, so ALT i sits at i + 1
    let ad = format_value("AD")?;
    let alt_reads: u32 = ad
        .split(',')
        .nth(non_ref_index + 1)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| malformed(format!("no {} read count in AD '{}'", NON_REF, ad)))?;

    let dp = format_value("DP")?;
    let depth: u32 = dp
        .parse()
        .map_err(|_| malformed(format!("invalid DP '{}'", dp)))?;

    Ok(Some(Observation::from_read_counts(
        VariantKey::new(chrom, pos),
        sample,
        alt_reads,
        depth,
    )))
}
