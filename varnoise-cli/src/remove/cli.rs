use std::num::NonZeroUsize;

use clap::{Arg, Command, arg, value_parser};

pub const REMOVE_CMD: &str = "remove";

pub fn create_remove_cli() -> Command {
    Command::new(REMOVE_CMD)
        .about("Take a loaded sample back out of the aggregate statistics.")
        .arg(arg!(<SAMPLE>).help("Name the sample was registered under"))
        .arg(
            arg!(--gvcf <GVCF>)
                .required(false)
                .help("gVCF to replay (default: the path recorded when the sample was loaded)"),
        )
        .arg(
            Arg::new("batch-size")
                .long("batch-size")
                .required(false)
                .value_parser(value_parser!(NonZeroUsize))
                .help("Observations merged per batch (default: from config, else 1000)"),
        )
}
