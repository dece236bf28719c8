mod compare;
mod config;
mod decode;
mod inputs;
mod run;

use anyhow::{Context, Result};
use clap::{Args, Parser};
use std::path::PathBuf;

#[macro_use]
extern crate log;

pub const DEFAULT_CONFIG: &str = "./urldiff.toml";

#[derive(Parser)]
#[clap(
    author,
    version,
    about = "Differential testing of URL parsers through their fuzzing harnesses 🔗"
)]
pub enum Urldiff {
    /// Run the built-in harness on inputs and print the records
    Run(Run),

    /// Run every configured target on the inputs and report differentials
    Compare(Compare),

    /// Decode record lines into readable URL components
    Decode(Decode),
}

#[derive(Args)]
pub struct Run {
    /// Input files, directories or glob patterns
    #[clap(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Recursively run nested directories for all input directories
    #[clap(short, long)]
    recursive: bool,

    /// Also print the decoded components
    #[clap(short, long)]
    decoded: bool,
}

#[derive(Args)]
pub struct Compare {
    /// Target configuration file
    #[clap(short, long, env = "URLDIFF_CONFIG", value_name = "FILE", default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Input files, directories or glob patterns
    #[clap(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Recursively run nested directories for all input directories
    #[clap(short, long)]
    recursive: bool,

    /// Exit with an error when any differential is found
    #[clap(long, action)]
    fail_on_differential: bool,
}

#[derive(Args)]
pub struct Decode {
    /// File with one record per line (default: stdin)
    #[clap(value_name = "FILE")]
    input: Option<PathBuf>,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    match Urldiff::parse() {
        Urldiff::Run(args) => args.run().context("Failure running inputs"),
        Urldiff::Compare(args) => args.compare().context("Failure comparing targets"),
        Urldiff::Decode(args) => args.decode().context("Failure decoding records"),
    }
}
