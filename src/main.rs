//! Command-line entry point for the forecasting pipeline.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use forecast_ml::workflow;
use forecast_ml::Config;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "forecast_ml")]
#[command(about = "Short-horizon equity return forecasts from candles and news")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the four forecast heads and persist artifacts
    Train {
        /// Path to the candle CSV
        #[arg(long)]
        candles: PathBuf,

        /// Optional path to the news CSV
        #[arg(long)]
        news: Option<PathBuf>,

        /// Output directory for artifacts
        #[arg(long)]
        outdir: PathBuf,

        /// Last date of the training split (inclusive)
        #[arg(long)]
        t0: NaiveDate,

        /// Last date of the validation split (inclusive)
        #[arg(long)]
        t1: NaiveDate,
    },

    /// Produce forecasts from persisted artifacts
    Predict {
        /// Path to the candle CSV
        #[arg(long)]
        candles: PathBuf,

        /// Optional path to the news CSV
        #[arg(long)]
        news: Option<PathBuf>,

        /// Artifact directory produced by `train`
        #[arg(long)]
        artifacts: PathBuf,

        /// Output CSV for forecasts
        #[arg(long)]
        outfile: PathBuf,
    },

    /// Score forecasts against realized outcomes
    Evaluate {
        /// Forecasts CSV
        #[arg(long)]
        pred: PathBuf,

        /// Ground-truth CSV
        #[arg(long)]
        truth: PathBuf,
    },
}

fn main() -> Result<()> {
    FmtSubscriber::builder().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    let cfg = Config::default();

    match cli.command {
        Commands::Train {
            candles,
            news,
            outdir,
            t0,
            t1,
        } => {
            workflow::train(&candles, news.as_deref(), &outdir, t0, t1, &cfg)?;
        }
        Commands::Predict {
            candles,
            news,
            artifacts,
            outfile,
        } => {
            workflow::predict(&candles, news.as_deref(), &artifacts, &outfile)?;
        }
        Commands::Evaluate { pred, truth } => {
            let report = workflow::evaluate(&pred, &truth)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
