//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_RETRIEVAL__TOP_K=8`). Every setting
//! has a default so an empty environment still yields a usable [`Settings`].

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            other => tracing::warn!(env = other, "unknown RUST_ENV, using base config only"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub fallback: FallbackSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if r.max_top_k < r.top_k {
            return Err(Error::InvalidConfig(format!(
                "retrieval.max_top_k ({}) is below retrieval.top_k ({})",
                r.max_top_k, r.top_k
            )));
        }
        if r.sentences_per_candidate == 0 {
            return Err(Error::InvalidConfig(
                "retrieval.sentences_per_candidate must be at least 1".into(),
            ));
        }
        if self.embedding.dimension == 0 || self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig(
                "embedding.dimension and embedding.batch_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// One chunk per line, or a JSON array of `{id, text}` passages.
    pub chunks_path: String,
    pub index_dir: String,
}

impl DataSettings {
    pub fn chunks_path(&self) -> PathBuf {
        expand_path(&self.chunks_path)
    }

    pub fn index_dir(&self) -> PathBuf {
        expand_path(&self.index_dir)
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            chunks_path: "data/tokenized_chunks.txt".into(),
            index_dir: "data/indexes".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: String,
    pub dimension: usize,
    pub max_len: usize,
    pub batch_size: usize,
    /// Use the hashing embedder instead of loading model weights.
    pub fake: bool,
}

impl EmbeddingSettings {
    pub fn model_dir(&self) -> PathBuf {
        expand_path(&self.model_dir)
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_dir: "models/all-MiniLM-L6-v2".into(),
            dimension: 384,
            max_len: 256,
            batch_size: 32,
            fake: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Upper clamp on caller-supplied `top_k`.
    pub max_top_k: usize,
    pub sentences_per_candidate: usize,
    pub use_lexical: bool,
    /// Sentences scoring below this are dropped. `None` keeps everything.
    pub min_score: Option<f32>,
    /// Sentences shorter than this (in chars, after trimming) are not scored.
    pub min_sentence_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_top_k: 50,
            sentences_per_candidate: 2,
            use_lexical: true,
            min_score: None,
            min_sentence_chars: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackSettings {
    /// What the corpus is called in fallback sentences.
    pub subject: String,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self { subject: "the book".into() }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let settings = Settings::default();
        settings.validate().expect("defaults are valid");
        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.retrieval.sentences_per_candidate, 2);
        assert!(settings.retrieval.min_score.is_none());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut settings = Settings::default();
        settings.retrieval.top_k = 0;
        assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
    }
}
