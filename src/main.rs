//! # Docs Copilot CLI (`dcp`)
//!
//! The `dcp` binary is the interface for Docs Copilot. It builds a
//! vector index from a Markdown corpus and runs an interactive
//! retrieval-augmented question loop against it.
//!
//! ## Usage
//!
//! ```bash
//! dcp --config ./config/copilot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dcp index` | Rebuild the vector index from the configured corpus |
//! | `dcp index --dry-run` | Show file and chunk counts without indexing |
//! | `dcp ask` | Start the interactive question loop |
//!
//! ## Examples
//!
//! ```bash
//! # Build the index from ./data (per config)
//! dcp index --config ./config/copilot.toml
//!
//! # Rebuild without the confirmation prompt
//! dcp index --yes
//!
//! # Ask questions against the index
//! dcp ask
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use docs_copilot::{ask_cmd, chat, config, embedding, index_cmd, store};

/// Docs Copilot CLI — retrieval-augmented question answering for
/// Markdown documentation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/copilot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "dcp",
    about = "Docs Copilot — retrieval-augmented question answering for Markdown documentation",
    version,
    long_about = "Docs Copilot scans a directory of Markdown files, splits them into \
    heading-bounded chunks, embeds the chunks into a persisted vector index, and answers \
    questions in an interactive loop grounded in the retrieved chunks."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/copilot.toml`. Corpus, index, provider, and
    /// retrieval settings are read from this file.
    #[arg(long, global = true, default_value = "./config/copilot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Rebuild the vector index from the Markdown corpus.
    ///
    /// Scans the corpus directory, splits each file on headings, embeds
    /// every chunk, and writes the result to the configured index path.
    /// When an index already exists it is deleted and rebuilt from
    /// scratch after confirmation.
    Index {
        /// Skip the confirmation prompt when an index already exists.
        #[arg(long)]
        yes: bool,

        /// Show file and chunk counts without embedding or writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Start the interactive question loop.
    ///
    /// Retrieves the most relevant chunks for each question, composes a
    /// grounding prompt, and prints the chat model's answer. Type `quit`
    /// to exit.
    Ask,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Index { yes, dry_run } => {
            if dry_run {
                let (files, chunks) = index_cmd::run_index_dry(&cfg)?;
                println!("index (dry-run)");
                println!("  files found: {}", files);
                println!("  estimated chunks: {}", chunks);
                return Ok(());
            }

            let embedder = embedding::create_embedder(&cfg.embedding)?;
            let mut confirm = move || confirm_rebuild(yes);

            match index_cmd::run_index(&cfg, embedder, &mut confirm).await? {
                Some(report) => {
                    println!("index rebuild");
                    println!("  files scanned: {}", report.scanned());
                    println!("  files indexed: {}", report.indexed());
                    println!("  chunks written: {}", report.chunks_written());
                    let failures = report.failures();
                    if !failures.is_empty() {
                        println!("  files failed: {}", failures.len());
                    }
                    println!("ok");
                }
                None => {
                    println!("Exiting index rebuild.");
                }
            }
        }
        Commands::Ask => {
            if !store::VectorIndex::exists(&cfg.index.path) {
                eprintln!("Vector index not initialized. Run \"dcp index\" first.");
                std::process::exit(1);
            }

            let embedder = embedding::create_embedder(&cfg.embedding)?;
            let chat_model = chat::create_chat_model(&cfg.chat)?;
            let index = store::VectorIndex::open(&cfg.index.path, embedder).await?;

            println!("========================");
            println!("Welcome to Docs Copilot.");
            println!("========================");

            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut output = std::io::stdout();
            ask_cmd::run_loop(
                &cfg.retrieval,
                &index,
                chat_model.as_ref(),
                &mut input,
                &mut output,
            )
            .await?;

            index.close().await;
        }
    }

    Ok(())
}

/// Ask the user before deleting an existing index. An empty reply counts
/// as consent.
fn confirm_rebuild(yes: bool) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }

    println!("Vector index is already initialized. If you continue, the existing");
    println!("index will be deleted and a new one will be built from the corpus.");
    print!("Do you wish to continue (yes/no): [yes] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "yes")
}
