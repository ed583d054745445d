use std::num::NonZeroUsize;

use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const LOAD_CMD: &str = "load";

pub fn create_load_cli() -> Command {
    Command::new(LOAD_CMD)
        .about("Add one gVCF sample to the aggregate statistics.")
        .arg(
            arg!(--gvcf <GVCF>)
                .required(true)
                .help("Path to the sample's gVCF (plain, .gz or .bgz)"),
        )
        .arg(
            Arg::new("batch-size")
                .long("batch-size")
                .required(false)
                .value_parser(value_parser!(NonZeroUsize))
                .help("Observations merged per batch (default: from config, else 1000)"),
        )
        .arg(
            Arg::new("sample-name")
                .long("sample-name")
                .required(false)
                .help("Register the sample under this name instead of the gVCF header's"),
        )
        .arg(
            Arg::new("replace")
                .long("replace")
                .action(ArgAction::SetTrue)
                .help("If the sample is already loaded, take its old observations out first"),
        )
}
