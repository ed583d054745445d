use std::num::NonZeroUsize;

use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use log::info;

use varnoise_core::{AggregationEngine, RecordSource, SampleRegistry};
use varnoise_io::GvcfSource;

use crate::context;

pub fn run_load(matches: &ArgMatches) -> Result<()> {
    let gvcf = matches
        .get_one::<String>("gvcf")
        .context("--gvcf is required")?;
    let replace = matches.get_flag("replace");

    let mut ctx = context::open(matches)?;
    let batch_size = match matches.get_one::<NonZeroUsize>("batch-size") {
        Some(n) => *n,
        None => ctx.batch_size()?,
    };

    let mut source =
        GvcfSource::open(gvcf).with_context(|| format!("Failed to open gVCF {}", gvcf))?;
    if let Some(name) = matches.get_one::<String>("sample-name") {
        source = source.with_sample_name(name);
    }
    let sample = source.sample_name().to_string();

    let registered = ctx
        .store
        .lookup(&sample)
        .context("Failed to read the sample registry")?;
    if registered.is_some() && !replace {
        bail!("Sample '{}' is already loaded; pass --replace to reload it", sample);
    }

    let mut engine = AggregationEngine::new(ctx.store.as_mut());

    match registered {
        Some(entry) => {
            let previous = GvcfSource::open(&entry.source_path)
                .with_context(|| {
                    format!(
                        "Failed to open {}, the gVCF sample '{}' was loaded from",
                        entry.source_path, sample
                    )
                })?
                .with_sample_name(&sample);
            let (removed, loaded) = engine
                .replace_sample(previous, source, batch_size)
                .with_context(|| format!("Failed to replace sample '{}'", sample))?;
            info!(
                "Replaced sample '{}': {} observations taken out, {} put in",
                sample,
                removed.merged.observations,
                loaded.merged.observations
            );
        }
        None => {
            engine
                .load_sample(source, batch_size)
                .with_context(|| format!("Failed to load sample '{}'", sample))?;
        }
    }

    Ok(())
}
