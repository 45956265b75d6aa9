//! TOML configuration.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working configuration:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:5000"
//!
//! [provider]
//! api_base = "https://api.openai.com/v1"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [chunking]
//! max_words = 200
//! overlap = 40
//!
//! [retrieval]
//! top_k = 5
//!
//! [embedding]
//! model = "text-embedding-3-small"
//! timeout_secs = 30
//!
//! [chat]
//! model = "gpt-4o-mini"
//! max_tokens = 600
//! temperature = 0.2
//! timeout_secs = 60
//!
//! [store]
//! max_documents = 0        # 0 = unbounded
//! on_full = "reject"       # or "evict_oldest"
//! ```
//!
//! The provider API key is never stored in the file; [`read_api_key`] pulls
//! it from the environment variable named by `provider.api_key_env`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use tutorbot_core::chunk::ChunkParams;
use tutorbot_core::retrieve::DEFAULT_TOP_K;
use tutorbot_core::store::CapacityPolicy;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub chunking: ChunkParams,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub store: CapacityPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

/// Where the OpenAI-compatible API lives and how to authenticate to it.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
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
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_chat_timeout_secs(),
        }
    }
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_tokens() -> u32 {
    600
}
fn default_temperature() -> f32 {
    0.2
}
fn default_chat_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Reject values that parse but cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be >= 1");
        }
        if self.chat.max_tokens == 0 {
            bail!("chat.max_tokens must be >= 1");
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            bail!("chat.temperature must be in [0.0, 2.0]");
        }
        if self.embedding.timeout_secs == 0 || self.chat.timeout_secs == 0 {
            bail!("timeout_secs must be > 0");
        }
        if self.provider.api_base.trim().is_empty() {
            bail!("provider.api_base must not be empty");
        }
        Ok(())
    }
}

/// Parse and validate a config file.
///
/// Chunking parameters are checked during deserialization, so an
/// `overlap >= max_words` setting fails here rather than hanging an ingest.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Load `path` if given, otherwise fall back to defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => Ok(Config::default()),
    }
}

/// Read the provider API key from the configured environment variable.
///
/// Called once at startup; a missing or blank key is fatal.
pub fn read_api_key(provider: &ProviderConfig) -> Result<String> {
    match std::env::var(&provider.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!(
            "Set the {} environment variable before running.",
            provider.api_key_env
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tutorbot_core::store::OnFull;

    fn write_config(tmp: &TempDir, content: &str) -> std::path::PathBuf {
        let path = tmp.path().join("tutorbot.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(&write_config(&tmp, "")).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:5000");
        assert_eq!(cfg.chunking.max_words(), 200);
        assert_eq!(cfg.chunking.overlap(), 40);
        assert_eq!(cfg.retrieval.top_k, 5);
        assert_eq!(cfg.embedding.model, "text-embedding-3-small");
        assert_eq!(cfg.chat.model, "gpt-4o-mini");
        assert_eq!(cfg.chat.max_tokens, 600);
        assert!((cfg.chat.temperature - 0.2).abs() < f32::EPSILON);
        assert!(!cfg.store.is_bounded());
        assert_eq!(cfg.provider.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_overrides() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(&write_config(
            &tmp,
            r#"
[server]
bind = "0.0.0.0:8080"

[chunking]
max_words = 50
overlap = 10

[retrieval]
top_k = 3

[store]
max_documents = 10
on_full = "evict_oldest"
"#,
        ))
        .unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.chunking.stride(), 40);
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.store.max_documents, 10);
        assert_eq!(cfg.store.on_full, OnFull::EvictOldest);
    }

    #[test]
    fn test_overlap_not_smaller_than_window_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[chunking]\nmax_words = 40\noverlap = 40\n");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("overlap"));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[retrieval]\ntop_k = 0\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(&tmp.path().join("nope.toml")).is_err());
        assert!(load_or_default(None).is_ok());
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let provider = ProviderConfig {
            api_key_env: "TUTORBOT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ProviderConfig::default()
        };
        let err = read_api_key(&provider).unwrap_err();
        assert!(err.to_string().contains("TUTORBOT_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
