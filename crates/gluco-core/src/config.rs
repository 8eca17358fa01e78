//! Gluco Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with sensible defaults for local development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Record store connection
    pub database: DatabaseConfig,

    /// Classifier model
    pub model: ModelConfig,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Feature extraction settings
    pub extraction: ExtractionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError { path, message },
            other => other,
        })
    }

    /// Parse from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Merge with environment variables
    ///
    /// Every variable that is set replaces the corresponding value, even when
    /// it equals the default.
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Server
        if let Some(host) = var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("API_PORT") {
            self.server.port = parse_var("API_PORT", port)?;
        }
        if let Some(origins) = var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Record store
        if let Some(url) = var("DATABASE_URL") {
            self.database.url = url;
        }

        // Model
        if let Some(path) = var("MODEL_PATH") {
            self.model.path = PathBuf::from(path);
        }

        // LLM
        if let Some(provider) = var("LLM_PROVIDER") {
            self.llm.provider = provider.parse()?;
        }
        if let Some(key) = var("GROQ_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = var("LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(url) = var("OLLAMA_URL") {
            self.llm.ollama_url = url;
        }
        if let Some(model) = var("LLM_MODEL") {
            self.llm.model = model;
        }

        // Extraction
        if let Some(min) = var("MIN_TEXT_CHARS") {
            self.extraction.min_text_chars = parse_var("MIN_TEXT_CHARS", min)?;
        }

        // Logging
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Allowed origins for CORS (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_size: 10 * 1024 * 1024, // 10MB
            cors_enabled: true,
            cors_origins: vec![],
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Connection pool size
    pub pool_size: u32,

    /// Number of records returned by listings
    pub list_limit: i64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/diabetes.db".to_string(),
            pool_size: 5,
            list_limit: 50,
        }
    }
}

/// Classifier model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the serialized model
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/model.json"),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// LLM provider to use
    pub provider: LlmProvider,

    /// API key for hosted providers
    pub api_key: Option<String>,

    /// Override for the provider's base URL
    pub base_url: Option<String>,

    /// Ollama server URL
    pub ollama_url: String,

    /// Model name to use
    pub model: String,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            api_key: None,
            base_url: None,
            ollama_url: "http://localhost:11434".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            max_tokens: 1024,
            temperature: 0.2,
            timeout_secs: 30,
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Groq,
    OpenAI,
    Ollama,
}

impl LlmProvider {
    /// Default base URL for OpenAI-compatible providers
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("https://api.groq.com/openai/v1"),
            Self::OpenAI => Some("https://api.openai.com/v1"),
            Self::Ollama => None,
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Feature extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Documents whose trimmed text is shorter than this are unreadable
    pub min_text_chars: usize,

    /// Characters of extracted text echoed to debug logs
    pub preview_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 10,
            preview_chars: 200,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.list_limit, 50);
        assert_eq!(config.extraction.min_text_chars, 10);
        assert_eq!(config.llm.provider, LlmProvider::Groq);
        assert_eq!(config.model.path, PathBuf::from("models/model.json"));
    }

    #[test]
    fn test_llm_provider_parse() {
        assert_eq!("groq".parse::<LlmProvider>().unwrap(), LlmProvider::Groq);
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert!("invalid".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9000

            [extraction]
            min_text_chars = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.extraction.min_text_chars, 25);
        assert_eq!(config.database.url, "sqlite://data/diabetes.db");
    }

    #[test]
    fn test_example_config_parses() {
        let config =
            AppConfig::from_toml(include_str!("../../../config/gluco.example.toml")).unwrap();
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.llm.provider, LlmProvider::Groq);
        assert_eq!(config.llm.api_key, None);
    }

    #[test]
    fn test_env_overrides_every_file_value() {
        let vars: HashMap<&str, &str> = [
            ("LLM_PROVIDER", "ollama"),
            ("LLM_MODEL", "llama3"),
            ("LLM_BASE_URL", "http://proxy:8080/v1"),
            ("OLLAMA_URL", "http://gpu-box:11434"),
            ("MIN_TEXT_CHARS", "25"),
            ("API_PORT", "8000"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_toml(include_str!("../../../config/gluco.example.toml"))
            .unwrap()
            .with_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.base_url.as_deref(), Some("http://proxy:8080/v1"));
        assert_eq!(config.llm.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.extraction.min_text_chars, 25);
        assert_eq!(config.server.port, 8000);
        // untouched values come from the file
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_env_value_equal_to_default_still_overrides() {
        let config = AppConfig::from_toml("[server]\nport = 9000\n")
            .unwrap()
            .with_vars(|key| (key == "API_PORT").then(|| "8000".to_string()))
            .unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_invalid_env_value_is_reported() {
        let err = AppConfig::default()
            .with_vars(|key| (key == "MIN_TEXT_CHARS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "MIN_TEXT_CHARS"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\npath = \"/srv/model.json\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.model.path, PathBuf::from("/srv/model.json"));
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
