use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Record store configuration
    pub store: StoreConfig,

    /// Model artifact configuration
    pub model: ModelConfig,

    /// Training configuration
    #[serde(default)]
    pub training: TrainingConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: VULNSCOPE_)
            .add_source(
                config::Environment::with_prefix("VULNSCOPE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend type
    #[serde(default)]
    pub backend: StoreBackend,

    /// Path for the embedded database
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory holding persisted artifact bundles
    #[serde(default = "default_model_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Maximum vocabulary size for the text vectorizer
    #[serde(default = "default_max_vocab_size")]
    pub max_vocab_size: usize,

    /// Hidden layer width of the classifier
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,

    /// Maximum training epochs
    #[serde(default = "default_max_epochs")]
    pub max_epochs: usize,

    /// Gradient descent step size
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Seed for weight initialization (training is reproducible for a fixed seed)
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_vocab_size: default_max_vocab_size(),
            hidden_size: default_hidden_size(),
            max_epochs: default_max_epochs(),
            learning_rate: default_learning_rate(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_store_path() -> PathBuf {
    "./data/store".into()
}

fn default_model_dir() -> PathBuf {
    "./data/models".into()
}

fn default_max_vocab_size() -> usize {
    10_000
}

fn default_hidden_size() -> usize {
    100
}

fn default_max_epochs() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    0.5
}

fn default_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "vulnscope".to_string()
}
