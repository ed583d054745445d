use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::Serialize;

use varnoise_core::{AggregateRecord, AggregationEngine, VariantKey};

use crate::context;

#[derive(Serialize, Debug, PartialEq)]
struct QueryOutput<'a> {
    chrom: &'a str,
    pos: u64,
    sample_count: u32,
    mean_af: f64,
    sd_af: f64,
    max_af: Option<f64>,
    max_sample: Option<&'a str>,
    min_af: Option<f64>,
    min_sample: Option<&'a str>,
    total_depth: u64,
}

impl<'a> From<&'a AggregateRecord> for QueryOutput<'a> {
    fn from(record: &'a AggregateRecord) -> Self {
        QueryOutput {
            chrom: &record.key.chrom,
            pos: record.key.pos,
            sample_count: record.count(),
            mean_af: record.mean(),
            sd_af: record.std_dev(),
            max_af: record.max().map(|e| e.value),
            max_sample: record.max().map(|e| e.sample.as_str()),
            min_af: record.min().map(|e| e.value),
            min_sample: record.min().map(|e| e.sample.as_str()),
            total_depth: record.total_depth,
        }
    }
}

pub fn run_query(matches: &ArgMatches) -> Result<()> {
    let chrom = matches
        .get_one::<String>("chrom")
        .context("--chrom is required")?;
    let pos = *matches.get_one::<u64>("pos").context("--pos is required")?;

    let mut ctx = context::open(matches)?;
    let engine = AggregationEngine::new(ctx.store.as_mut());
    let record = engine.query(&VariantKey::new(chrom.as_str(), pos))?;

    println!("{}", serde_json::to_string_pretty(&QueryOutput::from(&record))?);
    Ok(())
}
