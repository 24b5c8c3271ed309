/*!
common/src/lib.rs

Shared configuration types and credential helpers for newsart.

This file provides:
- Config data structures (deserialized from TOML, every field defaulted)
- An async loader merging a default config file with an optional override
- Resolution of the four API credentials from the environment
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// News aggregator configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Base URL of the aggregator (NewsAPI compatible)
    pub api_url: String,
    /// Name of the env var holding the aggregator API key
    pub api_key_env: String,
    pub category: String,
    pub language: String,
    pub page_size: u32,
    pub timeout_seconds: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://newsapi.org".to_string(),
            api_key_env: "NEWSAPI_KEY".to_string(),
            category: "general".to_string(),
            language: "en".to_string(),
            page_size: 10,
            timeout_seconds: 30,
        }
    }
}

/// Remote LLM config (OpenAI-compatible chat completion endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key_env: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_tokens: usize,
    /// Word count hinted to the model in the summarization prompt
    pub word_limit: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            timeout_seconds: 30,
            max_tokens: 500,
            word_limit: 50,
        }
    }
}

/// Image generation service config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Service root; API paths (`key/api/v1/...`) are joined onto it
    pub api_url: String,
    pub api_key_env: String,
    pub secret_key_env: String,
    pub style: String,
    pub width: u32,
    pub height: u32,
    pub poll_interval_seconds: u64,
    /// Upper bound on status checks per job before giving up on it
    pub max_poll_attempts: u32,
    pub timeout_seconds: u64,
    /// Directory generated images are written to and served from
    pub output_dir: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api-key.fusionbrain.ai/".to_string(),
            api_key_env: "FB_API_KEY".to_string(),
            secret_key_env: "FB_SECRET_KEY".to_string(),
            style: "PHOTO".to_string(),
            width: 1024,
            height: 1024,
            poll_interval_seconds: 5,
            max_poll_attempts: 120,
            timeout_seconds: 60,
            output_dir: "static/images".to_string(),
        }
    }
}

/// HTTP server config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Number of images shown on the index page
    pub recent_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
            recent_limit: 10,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub news: NewsConfig,
    pub llm: LlmConfig,
    pub images: ImagesConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). Missing files are
    /// skipped, so with neither present the built-in defaults apply.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// The four secrets a generation run needs. Resolved once at startup and handed to the
/// clients; nothing reads the environment after this.
#[derive(Clone)]
pub struct Credentials {
    pub news_api_key: String,
    pub llm_api_key: String,
    pub image_api_key: String,
    pub image_secret_key: String,
}

// Keys never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

/// Names of the env vars that were absent (or empty) during resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing API keys: {}", .0.join(", "))]
pub struct MissingCredentials(pub Vec<String>);

impl Credentials {
    /// Resolve every credential through `lookup` (usually `std::env::var`).
    /// Empty values count as missing. All missing names are reported together.
    pub fn resolve<F>(config: &Config, lookup: F) -> std::result::Result<Self, MissingCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut fetch = |name: &str| match lookup(name).filter(|v| !v.trim().is_empty()) {
            Some(v) => v,
            None => {
                missing.push(name.to_string());
                String::new()
            }
        };

        let creds = Credentials {
            news_api_key: fetch(&config.news.api_key_env),
            llm_api_key: fetch(&config.llm.api_key_env),
            image_api_key: fetch(&config.images.api_key_env),
            image_secret_key: fetch(&config.images.secret_key_env),
        };

        if missing.is_empty() {
            Ok(creds)
        } else {
            Err(MissingCredentials(missing))
        }
    }

    /// Resolve from the process environment.
    pub fn from_env(config: &Config) -> std::result::Result<Self, MissingCredentials> {
        Self::resolve(config, |name| std::env::var(name).ok())
    }
}
