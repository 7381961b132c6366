//! Main entry point for the nezha-bootimg CLI tool

use clap::Parser;
use colored::Colorize;
use nezha_bootimg::cli::{Args, init_logger, run_cli};

fn main() {
    let args = Args::parse();
    init_logger(&args);

    if let Err(e) = run_cli(args) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
