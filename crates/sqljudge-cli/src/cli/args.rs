use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sqljudge",
    version,
    about = "Automated grading pipeline for stored SQL submissions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll for pending submissions and check them until interrupted
    Run(RunArgs),
    /// Load and validate a configuration file
    Validate(ConfigArgs),
    /// Create the judge tables in the main database
    Init(ConfigArgs),
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file (.yaml, .yml or .json)
    #[arg(long = "config", short = 'c', env = "SQLJUDGE_CONFIG", default_value = "config.yml")]
    pub config: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Check what is pending right now, then exit
    #[arg(long)]
    pub once: bool,
}
