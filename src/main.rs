use clap::Parser;
use lognorm::cli::{Cli, Commands};
use lognorm::commands::{run_adapters, run_check, run_normalize};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Normalize(args) => run_normalize(args, &cli.global),
        Commands::Adapters(args) => run_adapters(args, &cli.global),
        Commands::Check(args) => run_check(args, &cli.global),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    // stdout carries records, diagnostics go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
