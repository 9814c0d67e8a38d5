use std::path::{Path, PathBuf};
use std::time::Duration;

use lexqa_core::ExtractionParams;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub bm25: Bm25Config,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
        }
    }
}

impl DatabaseConfig {
    fn default_url() -> String {
        config_dir().map_or_else(
            |_| "sqlite://lexqa.db?mode=rwc".to_string(),
            |dir| format!("sqlite://{}?mode=rwc", dir.join("lexqa.db").display()),
        )
    }
}

/// Remote span-extraction model and the bounds sent with every call.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractorConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub concurrency: usize,
    /// Characters added on each side of a span for the extended answer.
    pub extended_answer_size: usize,
    pub handle_impossible_answer: bool,
    pub max_answer_len: usize,
    pub max_question_len: usize,
    pub max_seq_len: usize,
    pub num_answers_to_predict: usize,
    pub doc_stride: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        let params = ExtractionParams::default();
        Self {
            base_url: "http://localhost:8000".to_string(),
            model: "distilbert-base-cased-distilled-squad".to_string(),
            timeout_secs: 30,
            concurrency: 4,
            extended_answer_size: 30,
            handle_impossible_answer: params.handle_impossible_answer,
            max_answer_len: params.max_answer_len,
            max_question_len: params.max_question_len,
            max_seq_len: params.max_seq_len,
            num_answers_to_predict: params.top_k,
            doc_stride: params.doc_stride,
        }
    }
}

impl ExtractorConfig {
    #[must_use]
    pub const fn params(&self) -> ExtractionParams {
        ExtractionParams {
            top_k: self.num_answers_to_predict,
            max_answer_len: self.max_answer_len,
            max_question_len: self.max_question_len,
            max_seq_len: self.max_seq_len,
            doc_stride: self.doc_stride,
            handle_impossible_answer: self.handle_impossible_answer,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub num_faq: usize,
    pub num_questions: usize,
    pub num_docs: usize,
    /// `doc_type` values kept out of the documentation index.
    pub excluded_doc_types: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            num_faq: 3,
            num_questions: 10,
            num_docs: 10,
            excluded_doc_types: vec!["release_notes".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Bm25Config {
    pub k1: f64,
    pub b: f64,
    pub epsilon: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

/// `~/lexqa`, where the config file and the default database live.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
        .join("lexqa"))
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = config_dir()?.join(CONFIG_FILE);

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'lexqa init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    /// Read and validate the config file at `path`.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let dir = config_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn create_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::ensure_config_dir()?.join(CONFIG_FILE);

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        Self::default().write_to(&config_path)?;
        info!("Created config file at {}", config_path.display());
        Ok(config_path)
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> lexqa_core::Result<()> {
        let invalid = |msg: &str| Err(lexqa_core::Error::Config(msg.to_string()));
        let extractor = &self.extractor;

        if extractor.model.trim().is_empty() {
            return invalid("extractor.model must not be empty");
        }
        if extractor.base_url.trim().is_empty() {
            return invalid("extractor.base_url must not be empty");
        }
        if extractor.concurrency == 0 {
            return invalid("extractor.concurrency must be at least 1");
        }
        if extractor.timeout_secs == 0 {
            return invalid("extractor.timeout_secs must be at least 1");
        }
        if extractor.max_seq_len == 0 {
            return invalid("extractor.max_seq_len must be at least 1");
        }
        if extractor.doc_stride >= extractor.max_seq_len {
            return invalid("extractor.doc_stride must be smaller than extractor.max_seq_len");
        }
        if self.database.url.trim().is_empty() {
            return invalid("database.url must not be empty");
        }
        Ok(())
    }
}
