//! Layered configuration and path helpers.
//!
//! Figment merges built-in defaults, `config.toml`, `config.<env>.toml` and
//! `APP_*` env vars (`__` separates nesting: `APP_SEARCH__DEFAULT_LIMIT=5`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
    base: PathBuf,
}

impl Config {
    /// Loads from the working directory; environment taken from `RUST_ENV`.
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(&env::current_dir()?, &env_name)
    }

    pub fn load_from(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base: dir.to_path_buf() };
        config.settings()?;
        Ok(config)
    }

    /// Typed view of the merged configuration, with relative paths resolved
    /// against the directory the configuration was loaded from.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        settings.data.data_dir = path_string(resolve_with_base(&self.base, &settings.data.data_dir));
        settings.data.db_path = path_string(resolve_with_base(&self.base, &settings.data.db_path));
        settings.data.cache_dir = path_string(resolve_with_base(&self.base, &settings.data.cache_dir));
        settings.embedding.model_dir = path_string(resolve_with_base(&self.base, &settings.embedding.model_dir));
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub data: DataSettings,
    pub search: SearchSettings,
    pub embedding: EmbeddingSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=100.0).contains(&self.search.fuzzy_cutoff) {
            return Err(Error::InvalidConfig(format!(
                "search.fuzzy_cutoff must be within 0..=100, got {}",
                self.search.fuzzy_cutoff
            )));
        }
        if !(-1.0..=1.0).contains(&self.search.semantic_threshold) {
            return Err(Error::InvalidConfig(format!(
                "search.semantic_threshold must be within -1..=1, got {}",
                self.search.semantic_threshold
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be positive".into()));
        }
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be positive".into()));
        }
        Ok(())
    }

    /// Applies command-line path overrides, expanded and resolved against
    /// `base` like paths from configuration files.
    pub fn apply_overrides(&mut self, base: &Path, data_dir: Option<&str>, db_path: Option<&str>, cache_dir: Option<&str>) {
        if let Some(dir) = data_dir {
            self.data.data_dir = path_string(resolve_with_base(base, dir));
        }
        if let Some(db) = db_path {
            self.data.db_path = path_string(resolve_with_base(base, db));
        }
        if let Some(dir) = cache_dir {
            self.data.cache_dir = path_string(resolve_with_base(base, dir));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory of `<translation>.json` source documents.
    pub data_dir: String,
    pub db_path: String,
    /// Where embedding cache files are written.
    pub cache_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            data_dir: "bible_data".into(),
            db_path: "bible_search.db".into(),
            cache_dir: ".".into(),
        }
    }
}

/// How fusion puts cosine scores next to the 0..=100 scores of the literal
/// and fuzzy strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreScale {
    /// Compare raw values: cosine stays in 0..=1.
    #[default]
    Native,
    /// Multiply cosine by 100 before comparing.
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_limit: i64,
    pub fuzzy_cutoff: f64,
    pub semantic_threshold: f64,
    pub score_scale: ScoreScale,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { default_limit: 20, fuzzy_cutoff: 70.0, semantic_threshold: 0.5, score_scale: ScoreScale::Native }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Sentence-transformer weights loaded from `model_dir`.
    #[default]
    Model,
    /// Deterministic token hashing; no weights needed.
    Hash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model_name: String,
    pub model_dir: String,
    /// Output dimension of the hash backend.
    pub dim: usize,
    pub max_len: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Model,
            model_name: "paraphrase-MiniLM-L6-v2".into(),
            model_dir: "models/paraphrase-MiniLM-L6-v2".into(),
            dim: 384,
            max_len: 128,
            batch_size: 64,
        }
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

fn path_string(p: PathBuf) -> String {
    p.to_string_lossy().into_owned()
}
