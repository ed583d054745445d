use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use varnoise_core::{AggregateRecord, Extremum};

use crate::utils::is_gzipped;

/// Written in place of an extremum that is no longer known.
pub const MISSING: &str = ".";

pub const VCF_HEADER: &str = "##fileformat=VCFv4.2
##source=varnoise
##INFO=<ID=MEAN_AF,Number=1,Type=Float,Description=\"Mean non-reference allele fraction\">
##INFO=<ID=SD_AF,Number=1,Type=Float,Description=\"Population standard deviation of the non-reference allele fraction\">
##INFO=<ID=MAX_AF,Number=1,Type=Float,Description=\"Maximum non-reference allele fraction\">
##INFO=<ID=MAX_SAMPLE,Number=1,Type=String,Description=\"Sample holding the maximum\">
##INFO=<ID=MIN_AF,Number=1,Type=Float,Description=\"Minimum non-reference allele fraction\">
##INFO=<ID=MIN_SAMPLE,Number=1,Type=String,Description=\"Sample holding the minimum\">
##INFO=<ID=DEPTH,Number=1,Type=Float,Description=\"Total sequencing depth\">
##INFO=<ID=SAMPLES,Number=1,Type=Integer,Description=\"Number of samples\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO";

fn extremum_fields(extremum: Option<&Extremum>) -> (String, &str) {
    match extremum {
        Some(e) => (format!("{:.6}", e.value), e.sample.as_str()),
        None => (MISSING.to_string(), MISSING),
    }
}

///
/// Format one aggregate as a VCF data line (no trailing newline).
///
pub fn format_record(record: &AggregateRecord) -> String {
    let (max_af, max_sample) = extremum_fields(record.max());
    let (min_af, min_sample) = extremum_fields(record.min());

    format!(
        "{}\t{}\t.\tN\t<NON_REF>\t.\tPASS\tMEAN_AF={:.6};SD_AF={:.6};MAX_AF={};MAX_SAMPLE={};MIN_AF={};MIN_SAMPLE={};DEPTH={:.1};SAMPLES={}",
        record.key.chrom,
        record.key.pos,
        record.mean(),
        record.std_dev(),
        max_af,
        max_sample,
        min_af,
        min_sample,
        record.total_depth as f64,
        record.count(),
    )
}

///
/// Write the header and one line per record, ordered by key.
///
/// Returns the number of records written.
///
pub fn write_vcf<W: Write>(writer: &mut W, records: &[AggregateRecord]) -> std::io::Result<usize> {
    let mut sorted: Vec<&AggregateRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));

    writeln!(writer, "{}", VCF_HEADER)?;
    for record in &sorted {
        writeln!(writer, "{}", format_record(record))?;
    }
    Ok(sorted.len())
}

pub trait VcfWrite {
    ///
    /// Write aggregates to disk as a VCF; `.gz`/`.bgz` paths are gzip compressed.
    ///
    /// # Arguments
    /// - path: the path to the file to dump to
    fn write_vcf<T: AsRef<Path>>(&self, path: T) -> std::io::Result<usize>;
}

impl VcfWrite for [AggregateRecord] {
    fn write_vcf<T: AsRef<Path>>(&self, path: T) -> std::io::Result<usize> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = BufWriter::new(File::create(path)?);

        if is_gzipped(path) {
            let mut encoder = GzEncoder::new(file, Compression::default());
            let written = write_vcf(&mut encoder, self)?;
            encoder.finish()?.flush()?;
            Ok(written)
        } else {
            let mut file = file;
            let written = write_vcf(&mut file, self)?;
            file.flush()?;
            Ok(written)
        }
    }
}
