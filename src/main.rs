//! # Preach Point CLI (`preach`)
//!
//! ## Usage
//!
//! ```bash
//! preach --config ./config/preach.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `preach serve` | Start the HTTP server |
//! | `preach books` | List book names |
//! | `preach chapters <book>` | List chapter numbers of a book |
//! | `preach verses <book> <chapter>` | List verse numbers of a chapter |
//! | `preach passage <book> <start> [end]` | Print a passage, e.g. `Genesis 1:31 2:2` |

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use preach_point::config::{self, Config};
use preach_point::extract::extract_verses;
use preach_point::reference::parse_range;
use preach_point::server;
use preach_point::store::VerseStore;

/// Preach Point: Bible passage extraction with AI translation and commentary.
#[derive(Parser)]
#[command(name = "preach", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/preach.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` (the `PORT` environment variable overrides
    /// the port) and serves the passage API and static UI assets.
    Serve,

    /// List book names in document order.
    Books,

    /// List chapter numbers of a book.
    Chapters {
        /// Book name (case-sensitive).
        book: String,
    },

    /// List verse numbers of a chapter.
    Verses {
        /// Book name (case-sensitive).
        book: String,
        /// Chapter number.
        chapter: u32,
    },

    /// Print a passage.
    Passage {
        /// Book name (case-sensitive).
        book: String,
        /// Start location as `CHAPTER:VERSE`.
        start: String,
        /// End location as `CHAPTER:VERSE`; defaults to the start.
        end: Option<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "preach_point=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_store(cfg: &Config) -> Result<VerseStore> {
    VerseStore::load(&cfg.data.path)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Books => {
            let store = open_store(&cfg)?;
            for name in store.book_names() {
                println!("{}", name);
            }
        }
        Commands::Chapters { book } => {
            let store = open_store(&cfg)?;
            let chapters = store
                .chapter_numbers(&book)
                .ok_or_else(|| anyhow::anyhow!("Book not found: {}", book))?;
            println!("{}", join_numbers(&chapters));
        }
        Commands::Verses { book, chapter } => {
            let store = open_store(&cfg)?;
            let verses = store.verse_numbers(&book, chapter)?;
            println!("{}", join_numbers(&verses));
        }
        Commands::Passage { book, start, end } => {
            let store = open_store(&cfg)?;
            let range = parse_range(&start, end.as_deref())?;
            for line in extract_verses(&store, &book, &range)? {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
