use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tigerclip::cli::Cli;
use tigerclip::commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,tigerclip={}", cli.log_level())));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    println!("=== TIGER {} clipper (State / City / County FIPS) ===\n", cli.year);

    match commands::run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
