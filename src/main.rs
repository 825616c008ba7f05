use anyhow::Result;
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod scheduler;
mod script;
mod session;
mod storage;
mod tutor;

use scheduler::Stimulus;
use storage::DataDir;

/// kanaflow - mastery-tracking scheduler for kana and kanji practice
#[derive(Parser)]
#[command(name = "kanaflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Decides which kana or kanji to practice next", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Data directory (defaults to ./.kanaflow, then ~/.kanaflow)
    #[arg(long, env = "KANAFLOW_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory, config and progress files
    Init,

    /// Select the units for the next practice turn
    Next {
        /// Number of units (defaults to selection.focus_count)
        #[arg(long)]
        count: Option<NonZeroUsize>,
        /// Print the focus set as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a practice outcome
    Record {
        /// Japanese text the learner practiced
        #[arg(required_unless_present = "words")]
        text: Option<String>,
        /// Track whole words instead of characters (repeatable)
        #[arg(long = "word", conflicts_with = "text")]
        words: Vec<String>,
        /// The learner answered incorrectly
        #[arg(long)]
        incorrect: bool,
    },

    /// Apply a raw tutor reply (reads stdin when omitted)
    Outcome {
        reply: Option<String>,
    },

    /// Show current status
    Status,

    /// Show detailed statistics
    Stats,

    /// Debug: show per-unit records
    Debug {
        /// Number of units to show per tier
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Reset all progress
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `next` prints its payload on stdout, keep logs quiet unless verbose
    let is_next = matches!(cli.command, Commands::Next { .. });
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if is_next {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let dir = DataDir::resolve(cli.data_dir)?;

    match cli.command {
        Commands::Init => {
            info!("Initializing kanaflow");
            storage::init(&dir).await?;
        }
        Commands::Next { count, json } => {
            session::next_focus(&dir, count.map(NonZeroUsize::get), json).await?;
        }
        Commands::Record { text, words, incorrect } => {
            let stimulus = match text {
                Some(text) => Stimulus::Text(text),
                None => Stimulus::Words(words),
            };
            session::record_outcome(&dir, stimulus, incorrect).await?;
        }
        Commands::Outcome { reply } => {
            let reply = match reply {
                Some(reply) => reply,
                None => {
                    let mut buf = String::new();
                    tokio::io::stdin().read_to_string(&mut buf).await?;
                    buf
                }
            };
            session::apply_tutor_reply(&dir, &reply).await?;
        }
        Commands::Status => {
            storage::show_status(&dir).await?;
        }
        Commands::Stats => {
            storage::show_stats(&dir).await?;
        }
        Commands::Debug { limit } => {
            storage::debug_units(&dir, limit).await?;
        }
        Commands::Reset { yes } => {
            storage::reset(&dir, yes).await?;
        }
    }

    Ok(())
}
