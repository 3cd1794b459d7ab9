//! # Quarry CLI
//!
//! The `quarry` binary is the operator interface for the pipeline. It
//! provides commands for ingesting a folder of documents and for asking
//! grounded questions against the indexed corpus.
//!
//! ## Usage
//!
//! ```bash
//! quarry --config ./quarry.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quarry ingest` | Chunk, embed, and index every supported file in a folder |
//! | `quarry ask "<question>"` | Answer a question from the indexed corpus |
//! | `quarry stats` | Show what's indexed and the active configuration |
//!
//! Requires a running Ollama-compatible service for embeddings and chat
//! (`ollama serve`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use quarry::config::{self, Config};
use quarry::embedding::OllamaEmbedder;
use quarry::extract;
use quarry::llm::OllamaChat;
use quarry::pipeline::Pipeline;
use quarry::stats;
use quarry::store::VectorStore;

/// Quarry — a local-first document question answering pipeline.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; when the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "quarry",
    about = "Quarry — ask grounded questions against a local document corpus",
    version,
    long_about = "Quarry ingests PDF, text, and markdown documents, splits them into \
    overlapping sentence-aware chunks, embeds and indexes them locally, and answers \
    natural-language questions grounded in the retrieved chunks, with citations."
)]
struct Cli {
    /// Path to configuration file (TOML). Missing file = defaults.
    #[arg(long, global = true, default_value = "./quarry.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Ingest documents from a folder into the vector store.
    ///
    /// Recursively scans the folder for `.pdf`, `.txt`, and `.md` files,
    /// chunks and embeds each one, and reports per-file results plus a
    /// cumulative chunk total. A file that fails does not stop the run.
    Ingest {
        /// Folder containing documents to ingest.
        #[arg(long, default_value = "docs")]
        folder: PathBuf,
    },

    /// Ask a question against the indexed corpus.
    ///
    /// Retrieves the most relevant chunks, asks the chat model for a
    /// grounded answer, and prints it with the numbered source list.
    Ask {
        /// The question to answer.
        question: String,

        /// How many contexts to retrieve (defaults to the configured value).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show index statistics and the active configuration.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest { folder } => run_ingest(&cfg, &folder).await?,
        Commands::Ask { question, top_k } => run_ask(&cfg, &question, top_k).await?,
        Commands::Stats => {
            let store = open_store(&cfg).await?;
            stats::run_stats(&cfg, &store).await?;
        }
    }

    Ok(())
}

async fn open_store(config: &Config) -> Result<VectorStore> {
    Ok(VectorStore::open(&config.store.persist_dir, &config.store.collection).await?)
}

fn build_pipeline(config: &Config, store: VectorStore) -> Result<Pipeline> {
    let embedder = OllamaEmbedder::new(
        &config.ollama.base_url,
        &config.ollama.embed_model,
        config.ollama.embed_timeout_secs,
    )?;
    let chat = OllamaChat::new(
        &config.ollama.base_url,
        &config.ollama.chat_model,
        config.ollama.chat_timeout_secs,
    )?;

    Ok(Pipeline::new(
        store,
        Box::new(embedder),
        Box::new(chat),
        config,
    ))
}

async fn run_ingest(config: &Config, folder: &Path) -> Result<()> {
    std::fs::create_dir_all(folder)?;
    println!("scanning folder: {}", folder.display());

    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| extract::is_supported(path))
        .collect();
    files.sort();

    if files.is_empty() {
        println!("no supported files found in {}", folder.display());
        println!("supported formats: .pdf, .txt, .md");
        return Ok(());
    }

    println!("found {} files to process", files.len());
    println!();

    let store = open_store(config).await?;
    let pipeline = build_pipeline(config, store)?;

    let mut processed = 0usize;
    let mut failed = 0usize;
    let mut total_chunks = 0usize;

    for file in &files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());
        println!("processing: {}", name);

        match pipeline.ingest(file).await {
            Ok(0) => {
                failed += 1;
                println!("  no chunks added (empty or unsupported content)");
            }
            Ok(count) => {
                processed += 1;
                total_chunks += count;
                println!("  added {} chunks", count);
            }
            Err(e) => {
                failed += 1;
                eprintln!("  error: {}", e);
            }
        }
    }

    println!();
    println!("ingestion complete");
    println!("  processed: {} files", processed);
    if failed > 0 {
        println!("  failed: {} files", failed);
    }
    println!("  chunks added: {}", total_chunks);

    if total_chunks == 0 {
        println!();
        println!("hints:");
        println!("  - ensure your documents contain readable text");
        println!("  - scanned-image PDFs yield no extractable text");
        println!("  - make sure the embedding service is running: ollama serve");
    }

    Ok(())
}

async fn run_ask(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    let store = open_store(config).await?;

    if store.count().await? == 0 {
        println!("No documents indexed yet. Run `quarry ingest` first.");
        return Ok(());
    }

    let k = top_k.unwrap_or(config.retrieval.top_k);
    let pipeline = build_pipeline(config, store)?;
    let result = pipeline.retrieve_and_answer(question, k).await?;

    println!("{}", result.answer);

    if !result.sources.is_empty() {
        println!();
        println!("Sources:");
        for (i, source) in result.sources.iter().enumerate() {
            println!("  [{}] {} (chunk {})", i + 1, source.source, source.chunk);
            println!("      {}", source.text.replace('\n', " "));
        }
    }

    Ok(())
}
