//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_RETRIEVAL__TOP_K=5`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::splitter::ChunkingConfig;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let base_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Ok(Self { figment, base_dir })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract the typed settings, resolve storage paths and validate.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.storage.upload_dir =
            resolve_with_base(&self.base_dir, settings.storage.upload_dir.to_string_lossy());
        settings.storage.index_dir =
            resolve_with_base(&self.base_dir, settings.storage.index_dir.to_string_lossy());
        if let Some(dir) = settings.embedding.model_dir.take() {
            settings.embedding.model_dir = Some(resolve_with_base(&self.base_dir, dir.to_string_lossy()));
        }
        if let Some(path) = settings.generation.tokenizer.take() {
            settings.generation.tokenizer = Some(resolve_with_base(&self.base_dir, path.to_string_lossy()));
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be positive".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        for (key, value) in [
            ("retrieval.score_threshold", self.retrieval.score_threshold),
            ("retrieval.evaluate_threshold", self.retrieval.evaluate_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!("{key} must be a non-negative number, got {value}")));
            }
        }
        if self.storage.table.trim().is_empty() {
            return Err(Error::InvalidConfig("storage.table must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub upload_dir: PathBuf,
    /// Directory holding the single persisted index. Wiped on every build.
    pub index_dir: PathBuf,
    pub table: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            index_dir: PathBuf::from("uploads/index"),
            table: "chunks".to_string(),
        }
    }
}

/// Nearest-neighbor policy. Distances are cosine distances in `[0, 2]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// `ask` answers only when the best match is at or below this distance.
    pub score_threshold: f32,
    /// `evaluate` counts an answer as supported at or below this distance.
    pub evaluate_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3, score_threshold: 0.5, evaluate_threshold: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: Option<PathBuf>,
    pub max_len: usize,
    pub fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, max_len: 256, fake: false, fake_dim: 1024 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Base URL of an OpenAI-compatible server, e.g. `http://127.0.0.1:8080/v1`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub summarize_model: String,
    pub answer_model: String,
    pub question_model: String,
    pub timeout_secs: u64,
    /// `tokenizer.json` used to cut prompts to the model input window.
    pub tokenizer: Option<PathBuf>,
    pub summary_window: usize,
    pub question_window: usize,
    pub fake: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/v1".to_string(),
            api_key: None,
            summarize_model: "facebook/bart-large-cnn".to_string(),
            answer_model: "TinyLlama/TinyLlama-1.1B-Chat-v1.0".to_string(),
            question_model: "google/flan-t5-base".to_string(),
            timeout_secs: 120,
            tokenizer: None,
            summary_window: 1024,
            question_window: 512,
            fake: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Request body limit for document uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8000, max_upload_bytes: 50 * 1024 * 1024 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
