mod context;
mod export;
mod init;
mod load;
mod query;
mod remove;
mod samples;

use anyhow::Result;
use clap::{Command, arg};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "varnoise";
    pub const CONFIG_ARG: &str = "config";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Aggregate per-position allele fraction statistics (mean, standard deviation, max, min, depth) across gVCF samples.")
        .subcommand_required(true)
        .arg(
            arg!(--config <CONFIG>)
                .global(true)
                .required(false)
                .help("Path to YAML config file (default: $VARNOISEDB_CONFIG, then built-in defaults)"),
        )
        .subcommand(init::cli::create_init_cli())
        .subcommand(load::cli::create_load_cli())
        .subcommand(remove::cli::create_remove_cli())
        .subcommand(export::cli::create_export_cli())
        .subcommand(query::cli::create_query_cli())
        .subcommand(samples::cli::create_samples_cli())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // INIT
        //
        Some((init::cli::INIT_CMD, matches)) => {
            init::handlers::run_init(matches)?;
        }

        //
        // LOAD
        //
        Some((load::cli::LOAD_CMD, matches)) => {
            load::handlers::run_load(matches)?;
        }

        //
        // REMOVE
        //
        Some((remove::cli::REMOVE_CMD, matches)) => {
            remove::handlers::run_remove(matches)?;
        }

        //
        // EXPORT
        //
        Some((export::cli::EXPORT_CMD, matches)) => {
            export::handlers::run_export(matches)?;
        }

        //
        // QUERY
        //
        Some((query::cli::QUERY_CMD, matches)) => {
            query::handlers::run_query(matches)?;
        }

        //
        // SAMPLES
        //
        Some((samples::cli::SAMPLES_CMD, matches)) => {
            samples::handlers::run_samples(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
