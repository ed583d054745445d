use clap::Command;

pub const INIT_CMD: &str = "init";

pub fn create_init_cli() -> Command {
    Command::new(INIT_CMD).about("Create the database tables and indices if they do not exist.")
}
