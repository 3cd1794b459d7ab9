use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_dir: default_persist_dir(),
            collection: default_collection(),
        }
    }
}

fn default_persist_dir() -> PathBuf {
    PathBuf::from("vectorstore")
}
fn default_collection() -> String {
    "rag_docs".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OllamaConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embed_model: default_embed_model(),
            chat_model: default_chat_model(),
            embed_timeout_secs: default_embed_timeout_secs(),
            chat_timeout_secs: default_chat_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}
fn default_embed_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_chat_model() -> String {
    "qwen2.5".to_string()
}
fn default_embed_timeout_secs() -> u64 {
    120
}
fn default_chat_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            overlap_chars: default_overlap_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    1100
}
fn default_overlap_chars() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

/// Load configuration from a TOML file, falling back to the built-in
/// defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::default()
    };

    if config.chunking.max_chars == 0 {
        anyhow::bail!("chunking.max_chars must be > 0");
    }

    if config.chunking.overlap_chars >= config.chunking.max_chars {
        anyhow::bail!("chunking.overlap_chars must be < chunking.max_chars");
    }

    if config.ollama.base_url.trim().is_empty() {
        anyhow::bail!("ollama.base_url must not be empty");
    }

    // Retrieval depth is capped to a safe range rather than rejected.
    config.retrieval.top_k = config.retrieval.top_k.clamp(1, 10);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_file_missing() {
        let config = load_config(Path::new("/nonexistent/quarry.toml")).unwrap();
        assert_eq!(config.ollama.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.ollama.embed_model, "nomic-embed-text");
        assert_eq!(config.ollama.chat_model, "qwen2.5");
        assert_eq!(config.store.persist_dir, PathBuf::from("vectorstore"));
        assert_eq!(config.store.collection, "rag_docs");
        assert_eq!(config.chunking.max_chars, 1100);
        assert_eq!(config.chunking.overlap_chars, 200);
        assert_eq!(config.retrieval.top_k, 5);
    }

    #[test]
    fn top_k_clamped_to_safe_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retrieval]\ntop_k = 50").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.retrieval.top_k, 10);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retrieval]\ntop_k = 0").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.retrieval.top_k, 1);
    }

    #[test]
    fn rejects_zero_max_chars() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chunking]\nmax_chars = 0").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_overlap_at_or_above_max() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chunking]\nmax_chars = 100\noverlap_chars = 100").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ollama]\nchat_model = \"llama3\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ollama.chat_model, "llama3");
        assert_eq!(config.ollama.embed_model, "nomic-embed-text");
        assert_eq!(config.chunking.max_chars, 1100);
    }
}
