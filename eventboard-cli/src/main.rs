mod commands;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eventboard_core::EventStore;
use eventboard_core::config::AppConfig;
use eventboard_core::day_window::parse_day;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eventboard")]
#[command(about = "Add, import and browse eventboard events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a single event
    Add {
        title: String,

        /// Occurrence as an ISO 8601 timestamp (repeat for multi-day events)
        #[arg(short, long = "date", required = true)]
        dates: Vec<String>,

        #[arg(short, long)]
        location: String,

        /// Where the event was found
        #[arg(short, long)]
        source_url: String,

        #[arg(long)]
        description: Option<String>,

        /// Time of day, e.g. "19:00" or "19:00-22:30"
        #[arg(short, long)]
        time: Option<String>,
    },
    /// Import events from a JSON array
    Import { file: PathBuf },
    /// Show one day's events
    Day {
        /// Day to show (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },
    /// List all events ordered by date
    List {
        #[arg(short, long, default_value_t = 1)]
        page: i64,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page_size: Option<u32>,
    },
    /// Rewrite stored dates into the array form
    MigrateDates,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let store = EventStore::connect(&config)
        .await
        .context("Failed to connect to the event database")?;

    let result = match cli.command {
        Commands::Add {
            title,
            dates,
            location,
            source_url,
            description,
            time,
        } => {
            let input = commands::add::input_from_args(
                title,
                dates,
                location,
                source_url,
                description,
                time,
            );
            commands::add::run(&store, input).await
        }
        Commands::Import { file } => commands::import::run(&store, &file).await,
        Commands::Day { date, page } => {
            let day = match date {
                Some(raw) => parse_day(&raw).map_err(|e| anyhow::anyhow!(e))?,
                None => chrono::Utc::now().date_naive(),
            };
            commands::day::run(&store, day, page, config.page_size).await
        }
        Commands::List { page, page_size } => {
            commands::list::run(&store, page, page_size.unwrap_or(config.page_size)).await
        }
        Commands::MigrateDates => commands::migrate::run(&store).await,
    };

    store.close().await;
    result
}
