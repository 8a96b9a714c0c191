mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::liquidation::LiquidationArgs;
use commands::renegotiation::RenegotiationArgs;

/// Structural credit-risk valuation and optimal capital structure
#[derive(Parser)]
#[command(
    name = "capstruct",
    version,
    about = "Structural credit-risk valuation and optimal capital structure",
    long_about = "A CLI for valuing a levered firm's equity and debt under continuous-time \
                  structural models with decimal precision. Supports immediate liquidation \
                  at an exogenous boundary and strategic debt renegotiation with an \
                  endogenous trigger and value-maximizing coupon."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter used when RUST_LOG is unset (logs go to stderr)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Value claims under strategic renegotiation; solves the optimal coupon unless --coupon is given
    Renegotiation(RenegotiationArgs),
    /// Value claims under immediate liquidation at an exogenous boundary
    Liquidation(LiquidationArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Renegotiation(args) => commands::renegotiation::run_renegotiation(args),
        Commands::Liquidation(args) => commands::liquidation::run_liquidation(args),
        Commands::Version => {
            println!("capstruct {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
