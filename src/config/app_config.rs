use serde::Deserialize;

use crate::domain::guardrail::GuardrailConfig;
use crate::domain::retrieval::RetrievalConfig;
use crate::domain::VerifierConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(default)]
    pub guardrails: GuardrailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusConfig {
    /// Directory corpus files are read from
    pub base_dir: String,
    /// Sections retrieved per query
    pub top_k: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            corpus: CorpusConfig::default(),
            retrieval: RetrievalConfig::default(),
            verifier: VerifierConfig::default(),
            guardrails: GuardrailConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            base_dir: "corpus".to_string(),
            top_k: 5,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
