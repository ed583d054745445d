use clap::{Command, arg, value_parser};

pub const QUERY_CMD: &str = "query";

pub fn create_query_cli() -> Command {
    Command::new(QUERY_CMD)
        .about("Print the aggregate record at one position as JSON.")
        .arg(
            arg!(--chrom <CHROM>)
                .required(true)
                .help("Chromosome name, as written in the gVCFs"),
        )
        .arg(
            arg!(--pos <POS>)
                .required(true)
                .value_parser(value_parser!(u64))
                .help("1-based position"),
        )
}
