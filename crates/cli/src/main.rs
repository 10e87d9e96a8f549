//! Tabacaria CLI - Database migrations and reports.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! tabacaria-cli migrate
//!
//! # Print the stock runout projection
//! tabacaria-cli insights stock-runout
//!
//! # Print the full dashboard report as JSON
//! tabacaria-cli insights report
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `insights` - Inventory and customer reports

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tabacaria-cli")]
#[command(author, version, about = "Tabacaria CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Dashboard insight reports
    Insights {
        #[command(subcommand)]
        report: InsightsReport,
    },
}

#[derive(Subcommand)]
enum InsightsReport {
    /// Products projected to run out of stock
    StockRunout,
    /// Full report (cross-sell, churn risk, stock runout) as JSON
    Report,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Insights { report } => match report {
            InsightsReport::StockRunout => commands::insights::stock_runout().await?,
            InsightsReport::Report => commands::insights::report().await?,
        },
    }
    Ok(())
}
