//! Index statistics and health overview.
//!
//! Provides a quick summary of what's indexed: record counts, per-source
//! breakdowns, database size, and the active configuration. Used by
//! `quarry stats` to give confidence that ingestion is working as expected.

use anyhow::Result;

use crate::config::Config;
use crate::store::VectorStore;

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config, store: &VectorStore) -> Result<()> {
    let total_chunks = store.count().await?;
    let db_size = VectorStore::db_size(&config.store.persist_dir);

    println!("Quarry — Index Stats");
    println!("====================");
    println!();
    println!("  Store:       {}", config.store.persist_dir.display());
    println!("  Collection:  {}", config.store.collection);
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Chunks:      {}", total_chunks);

    let breakdown = store.source_breakdown().await?;
    if !breakdown.is_empty() {
        println!();
        println!("  By source:");
        println!("  {:<32} {:>8}", "SOURCE", "CHUNKS");
        println!("  {}", "-".repeat(42));
        for (source, count) in &breakdown {
            println!("  {:<32} {:>8}", source, count);
        }
    }

    println!();
    println!("  Configuration:");
    println!("    embed model:  {}", config.ollama.embed_model);
    println!("    chat model:   {}", config.ollama.chat_model);
    println!("    max chars:    {}", config.chunking.max_chars);
    println!("    overlap:      {}", config.chunking.overlap_chars);
    println!("    top k:        {}", config.retrieval.top_k);
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
