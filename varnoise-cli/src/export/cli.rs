use clap::{Command, arg};

pub const EXPORT_CMD: &str = "export";

pub fn create_export_cli() -> Command {
    Command::new(EXPORT_CMD)
        .about("Write every aggregate record to a VCF, statistics in the INFO column.")
        .arg(
            arg!(--output <OUTPUT>)
                .required(false)
                .default_value("variants.vcf")
                .help("Output VCF path; a .gz suffix writes gzip"),
        )
}
