pub mod commands;
pub mod dataset;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use smartcart_core::config::{AppConfig, LoadOptions, LogFormat};
use smartcart_core::signals::SimilarityAxis;

use crate::commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "smartcart",
    about = "Smart cart recommendation CLI",
    long_about = "Refresh recommendation indices from a transaction dataset and query habit, pairing, trending and similarity suggestions.",
    after_help = "Examples:\n  smartcart recommend --history SKU0009,SKU0009,SKU0012 --basket SKU0034\n  smartcart pairs --min-support 1\n  smartcart config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Combine all four signals for a shopper's history and basket")]
    Recommend {
        #[arg(long, help = "Comma-separated purchase history, oldest first")]
        history: Option<String>,
        #[arg(long, help = "Comma-separated current basket")]
        basket: Option<String>,
        #[arg(long, help = "Dataset JSON file, sales CSV, or directory with sales.csv and skus.csv (defaults to data.dataset_path or demo data)")]
        dataset: Option<PathBuf>,
        #[arg(long, help = "Override engine.habit_threshold")]
        habit_threshold: Option<u32>,
        #[arg(long, help = "Fail when a basket item is missing from the catalog")]
        strict: bool,
    },
    #[command(about = "List co-purchased item pairs meeting minimum support")]
    Pairs {
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long, help = "Override engine.min_support")]
        min_support: Option<u32>,
    },
    #[command(about = "Rank catalog items by baseline demand")]
    Trending {
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long, help = "Override engine.top_n_trending")]
        top_n: Option<usize>,
    },
    #[command(about = "Rank items by cosine similarity to the given items")]
    Similar {
        #[arg(long, help = "Comma-separated items to score against")]
        items: Option<String>,
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long, help = "Override engine.top_n_similarity")]
        top_n: Option<usize>,
        #[arg(long, help = "Similarity column key: transaction|date")]
        axis: Option<SimilarityAxis>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
}

fn init_logging() {
    use tracing::Level;

    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_writer(std::io::stderr).with_target(false).with_max_level(log_level);

    // A second init (e.g. from tests) is harmless; keep the first subscriber.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Recommend { history, basket, dataset, habit_threshold, strict } => {
            commands::recommend::run(RecommendArgs {
                history,
                basket,
                dataset,
                habit_threshold,
                strict,
            })
        }
        Command::Pairs { dataset, min_support } => commands::pairs::run(dataset, min_support),
        Command::Trending { dataset, top_n } => commands::trending::run(dataset, top_n),
        Command::Similar { items, dataset, top_n, axis } => {
            commands::similar::run(items, dataset, top_n, axis)
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
