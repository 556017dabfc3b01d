use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Folioscan server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the external recognition service.
    pub recognition_url: String,
    /// Model identifier used for page text extraction.
    pub recognition_model: String,
    /// Optional model override for outline generation (defaults to the
    /// extraction model).
    pub outline_model: Option<String>,
    /// Embedding model identifier passed to the recognition service.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Request timeout applied to recognition service calls, in seconds.
    pub recognition_timeout_secs: Option<u64>,
    /// Byte budget for the concatenated text sent to outline generation.
    pub outline_input_budget: Option<usize>,
    /// Number of candidates fetched from the vector index per query.
    pub search_top_k: Option<usize>,
    /// Maximum number of fused results returned per query.
    pub search_result_limit: Option<usize>,
    /// Whether failed pages count toward document completion.
    pub count_failed_pages: Option<bool>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Default recognition request timeout in seconds.
pub const DEFAULT_RECOGNITION_TIMEOUT_SECS: u64 = 120;
/// Default byte budget for outline generation input.
pub const DEFAULT_OUTLINE_INPUT_BUDGET: usize = 120_000;
/// Default number of semantic candidates per search.
pub const DEFAULT_SEARCH_TOP_K: usize = 10;
/// Default fused result limit per search.
pub const DEFAULT_SEARCH_RESULT_LIMIT: usize = 10;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            recognition_url: load_env("RECOGNITION_URL")?,
            recognition_model: load_env("RECOGNITION_MODEL")?,
            outline_model: load_env_optional("OUTLINE_MODEL"),
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: load_env("EMBEDDING_DIMENSION")?
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))?,
            recognition_timeout_secs: parse_optional("RECOGNITION_TIMEOUT_SECS")?,
            outline_input_budget: parse_optional("OUTLINE_INPUT_BUDGET")?,
            search_top_k: parse_optional("SEARCH_TOP_K")?,
            search_result_limit: parse_optional("SEARCH_RESULT_LIMIT")?,
            count_failed_pages: load_env_optional("COUNT_FAILED_PAGES")
                .map(|value| parse_bool("COUNT_FAILED_PAGES", &value))
                .transpose()?,
            server_port: parse_optional("SERVER_PORT")?,
        })
    }

    /// Effective recognition timeout with the default applied.
    pub fn recognition_timeout_secs(&self) -> u64 {
        self.recognition_timeout_secs
            .unwrap_or(DEFAULT_RECOGNITION_TIMEOUT_SECS)
    }

    /// Effective outline input budget with the default applied.
    pub fn outline_input_budget(&self) -> usize {
        self.outline_input_budget
            .unwrap_or(DEFAULT_OUTLINE_INPUT_BUDGET)
    }

    /// Effective semantic candidate count with the default applied.
    pub fn search_top_k(&self) -> usize {
        self.search_top_k.unwrap_or(DEFAULT_SEARCH_TOP_K)
    }

    /// Effective fused result limit with the default applied.
    pub fn search_result_limit(&self) -> usize {
        self.search_result_limit
            .unwrap_or(DEFAULT_SEARCH_RESULT_LIMIT)
    }

    /// Whether failed pages are reported toward completion (defaults to true).
    pub fn count_failed_pages(&self) -> bool {
        self.count_failed_pages.unwrap_or(true)
    }

    /// Model used for outline generation, falling back to the extraction model.
    pub fn outline_model(&self) -> &str {
        self.outline_model
            .as_deref()
            .unwrap_or(&self.recognition_model)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        recognition_url = %config.recognition_url,
        recognition_model = %config.recognition_model,
        embedding_model = %config.embedding_model,
        embedding_dimension = config.embedding_dimension,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert!(parse_bool("K", "true").unwrap());
        assert!(parse_bool("K", "1").unwrap());
        assert!(!parse_bool("K", "no").unwrap());
        assert!(parse_bool("K", "maybe").is_err());
    }

    #[test]
    fn outline_model_falls_back_to_recognition_model() {
        let config = Config {
            recognition_url: "http://127.0.0.1:11434".into(),
            recognition_model: "scan-reader".into(),
            outline_model: None,
            embedding_model: "embedder".into(),
            embedding_dimension: 8,
            recognition_timeout_secs: None,
            outline_input_budget: None,
            search_top_k: None,
            search_result_limit: None,
            count_failed_pages: None,
            server_port: None,
        };
        assert_eq!(config.outline_model(), "scan-reader");
        assert!(config.count_failed_pages());
        assert_eq!(config.search_top_k(), DEFAULT_SEARCH_TOP_K);
    }
}
