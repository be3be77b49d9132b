use std::process;

use clap::Parser;
use colored::Colorize;
use ktally::{cli::Args, commands};

fn main() {
    let args = Args::parse();

    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::run(&args) {
        eprintln!("{} {e}", "error:".red().bold());
        process::exit(1);
    }
}
