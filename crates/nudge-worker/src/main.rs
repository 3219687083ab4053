//! Health Whisperer nudge worker.
//!
//! Runs the nudge batch on a schedule and offers the link-code commands
//! used to connect a user to a Telegram chat.

mod config;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use database::{link, nudge_log, Database};
use grok_writer::GrokWriter;
use nudge_core::NudgeConfig;
use orchestrator::{
    ChannelSender, LoggingSender, NudgeOrchestrator, OrchestratorConfig, SqliteStore, Stores,
    TelegramChannel,
};
use telegram_sender::{TelegramClient, TelegramConfig};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "nudge-worker")]
#[command(about = "Send scheduled wellness nudges and manage chat links")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the nudge batch, once or on an interval
    Run {
        /// Run a single batch and exit
        #[arg(long)]
        once: bool,

        /// Seconds between batches (overrides NUDGE_RUN_INTERVAL_SECS)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Choose content and log it without claiming, sending or recording
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the link code for a user, creating one if needed
    LinkCode {
        #[arg(long)]
        user: String,
    },

    /// Redeem a link code for a Telegram chat id
    Redeem {
        #[arg(long)]
        code: String,

        #[arg(long)]
        telegram_id: i64,
    },

    /// Disconnect a user's Telegram chat
    Unlink {
        #[arg(long)]
        user: String,
    },

    /// Show a user's most recent nudge attempts
    History {
        #[arg(long)]
        user: String,

        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    match cli.command {
        Command::Run {
            once,
            interval_secs,
            dry_run,
        } => {
            let interval = interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(config.run_interval);
            run(db.clone(), once, interval, dry_run).await?;
        }
        Command::LinkCode { user } => {
            let link = link::get_or_create_link_code(db.pool(), &user).await?;
            match link.telegram_id {
                Some(telegram_id) => println!("{} is linked to Telegram chat {}", user, telegram_id),
                None => println!("{}", link.link_code),
            }
        }
        Command::Redeem { code, telegram_id } => {
            let user_id = link::redeem_link_code(db.pool(), &code, telegram_id).await?;
            println!("Linked Telegram chat {} to {}", telegram_id, user_id);
        }
        Command::Unlink { user } => {
            if link::unlink(db.pool(), &user).await? {
                println!("Unlinked {}", user);
            } else {
                println!("{} has no linked chat", user);
            }
        }
        Command::History { user, limit } => {
            for entry in nudge_log::list_entries(db.pool(), &user, limit).await? {
                println!(
                    "{}  {:<6}  {:<9}  {}{}",
                    entry.attempted_at,
                    entry.outcome,
                    entry.target,
                    entry.message,
                    entry
                        .error
                        .map(|e| format!("  ({})", e))
                        .unwrap_or_default()
                );
            }
        }
    }

    db.close().await;
    Ok(())
}

async fn run(
    db: Database,
    once: bool,
    interval: Duration,
    dry_run: bool,
) -> Result<(), Box<dyn Error>> {
    let engine = NudgeConfig::from_env()?;
    let mut settings = OrchestratorConfig::from_env()?;
    settings.dry_run = dry_run;
    let stores = Stores::shared(Arc::new(SqliteStore::new(db)));

    let generator = GrokWriter::from_env_optional()?;
    if generator.is_none() {
        info!("GROK_API_KEY not set, using template nudges only");
    }

    if dry_run {
        let orchestrator = NudgeOrchestrator::new(stores, LoggingSender, &engine, settings);
        let orchestrator = match generator {
            Some(writer) => orchestrator.with_generator(Arc::new(writer)),
            None => orchestrator,
        };
        return run_loop(&orchestrator, once, interval).await;
    }

    let client = TelegramClient::new(TelegramConfig::from_env()?)?;
    if let Err(err) = client.get_me().await {
        warn!("Telegram token check failed, sends may fail: {}", err);
    }
    let orchestrator = NudgeOrchestrator::new(stores, TelegramChannel::new(client), &engine, settings);
    let orchestrator = match generator {
        Some(writer) => orchestrator.with_generator(Arc::new(writer)),
        None => orchestrator,
    };
    run_loop(&orchestrator, once, interval).await
}

async fn run_loop<S: ChannelSender>(
    orchestrator: &NudgeOrchestrator<S>,
    once: bool,
    interval: Duration,
) -> Result<(), Box<dyn Error>> {
    if once {
        let report = orchestrator.run_batch(Utc::now()).await?;
        println!(
            "total={} sent={} failed={} skipped={} contended={} previewed={} errored={}",
            report.total,
            report.sent,
            report.failed,
            report.skipped,
            report.contended,
            report.previewed,
            report.errored
        );
        return Ok(());
    }

    info!(interval = ?interval, "Nudge worker running, Ctrl+C to stop");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = orchestrator.run_batch(Utc::now()).await {
                    error!("Nudge batch failed: {}", err);
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    error!("Failed to listen for Ctrl+C: {}", err);
                }
                info!("Shutting down nudge worker");
                return Ok(());
            }
        }
    }
}
