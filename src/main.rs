//! # TutorBot CLI (`tutorbot`)
//!
//! ## Usage
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//! tutorbot serve                          # http://127.0.0.1:5000
//! tutorbot --config ./tutorbot.toml serve --bind 0.0.0.0:8080
//! tutorbot chunk notes.txt                # preview chunking offline
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tutorbot::chat::OpenAIChat;
use tutorbot::config;
use tutorbot::embedding::OpenAIEmbedder;
use tutorbot::server;
use tutorbot::tutor::Tutor;
use tutorbot_core::chunk::chunk_text;

/// TutorBot — paste study material, then ask questions about it.
#[derive(Parser)]
#[command(name = "tutorbot", version, about)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Reads the provider API key from the environment once; the server
    /// refuses to start without it.
    Serve {
        /// Override `[server].bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print how a text file would be chunked. Makes no network calls.
    Chunk {
        /// File to chunk.
        path: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut cfg = config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }

            let api_key = config::read_api_key(&cfg.provider)?;
            let embedder = OpenAIEmbedder::new(&cfg.provider, &cfg.embedding, api_key.clone())?;
            let chat = OpenAIChat::new(&cfg.provider, &cfg.chat, api_key)?;
            let tutor = Tutor::from_config(&cfg, Arc::new(embedder), Arc::new(chat));

            server::run_server(&cfg, Arc::new(tutor)).await?;
        }
        Commands::Chunk { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let chunks = chunk_text(&text, &cfg.chunking);
            println!(
                "{}: {} chunk(s) (max_words={}, overlap={})",
                path.display(),
                chunks.len(),
                cfg.chunking.max_words(),
                cfg.chunking.overlap()
            );
            for (i, chunk) in chunks.iter().enumerate() {
                println!("--- chunk {} ({} words)", i, chunk.split(' ').count());
                println!("{}", chunk);
            }
        }
    }

    Ok(())
}
