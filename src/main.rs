use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::info;

use student_predictor::cli::InteractiveSession;
use student_predictor::config::PredictorConfig;
use student_predictor::monitoring::{self, LogLevel};
use student_predictor::storage::SqliteRecordStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, JSON5 or YAML)
    #[arg(short, long, env = "STUDENT_PREDICTOR_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file, or ":memory:"
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Predicted scores below this value raise an early warning
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(short, long, value_enum)]
    log_level: Option<LogLevel>,

    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load .env file
    dotenv().ok();

    let cli = Cli::parse();

    let mut config = PredictorConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(database) = cli.database {
        config.store.path = database;
    }
    if let Some(threshold) = cli.threshold {
        config.warning.threshold = threshold;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    if let Some(path) = cli.save_config {
        config.save(&path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    monitoring::init_telemetry(config.logging.level)?;
    info!(store = %config.store.path.display(), "Student predictor starting up...");

    let store = SqliteRecordStore::open(&config.store)
        .context("Could not open the student record store")?;
    println!("Table 'students' created or verified successfully.");

    let mut session = InteractiveSession::new(Box::new(store), config);
    session.run()
}
