use clap::Command;

pub const SAMPLES_CMD: &str = "samples";

pub fn create_samples_cli() -> Command {
    Command::new(SAMPLES_CMD).about("List loaded samples with their source path and load time.")
}
