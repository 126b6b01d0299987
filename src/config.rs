use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::{info, warn};

use crate::llm_providers::LLMProviderType;

// Import logging macros
use crate::{log_system_event, log_validation};

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub llm: LLMConfig,
    pub wikipedia: WikipediaConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Generative backend configuration. A missing `api_key` selects the stub generator.
#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub provider: LLMProviderType,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub verify_on_startup: bool,
}

/// Article fetching configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WikipediaConfig {
    /// Overrides the origin derived from the article URL
    pub base_url: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Logging system configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        log_system_event!(config, "Loading application configuration from environment variables");

        let config = Config {
            database: DatabaseConfig::from_env()?,
            llm: LLMConfig::from_env()?,
            wikipedia: WikipediaConfig::from_env()?,
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        };

        log_system_event!(config, "Configuration loaded successfully");

        Ok(config)
    }

    /// Log a summary of loaded configuration (without sensitive data)
    pub fn log_configuration_summary(&self) {
        info!(
            database_url_masked = %mask_sensitive_data(&self.database.url),
            llm_provider = ?self.llm.provider,
            llm_model = ?self.llm.model,
            llm_credential = %self.llm.api_key.as_deref().map(mask_sensitive_data).unwrap_or_else(|| "<unset>".to_string()),
            wikipedia_base_url = ?self.wikipedia.base_url,
            fetch_max_attempts = self.wikipedia.max_attempts,
            server_address = %format!("{}:{}", self.server.host, self.server.port),
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.database.url.starts_with("sqlite:") {
            return Err(invalid("DATABASE_URL must start with 'sqlite:'"));
        }

        if self.server.port == 0 {
            return Err(invalid("Server port must be greater than 0"));
        }

        if self.wikipedia.max_attempts == 0 {
            return Err(invalid("FETCH_MAX_ATTEMPTS must be at least 1"));
        }

        if self.wikipedia.timeout_secs == 0 {
            return Err(invalid("FETCH_TIMEOUT_SECS must be at least 1"));
        }

        if self.llm.timeout_secs == 0 {
            return Err(invalid("LLM_TIMEOUT_SECS must be at least 1"));
        }

        if self.llm.api_key.is_none() {
            warn!("No LLM API key configured - quizzes will come from the stub generator");
        }

        if !["trace", "debug", "info", "warn", "error"]
            .iter()
            .any(|level| self.logging.level.to_lowercase().starts_with(level))
        {
            warn!("Unrecognized log level '{}', filter may fall back to defaults", self.logging.level);
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self> {
        let url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:quiz_history.db".to_string());

        Ok(DatabaseConfig { url })
    }
}

impl LLMConfig {
    fn from_env() -> Result<Self> {
        let api_key = non_empty_env("LLM_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"));

        let base_url = env::var("LLM_BASE_URL").ok();

        let provider_str = env::var("LLM_PROVIDER")
            .unwrap_or_else(|_| "gemini".to_string());
        let provider = LLMProviderType::parse(&provider_str);

        let model = env::var("LLM_MODEL").ok();

        let timeout_secs = parse_env("LLM_TIMEOUT_SECS", 60)?;
        let verify_on_startup = env::var("LLM_VERIFY_ON_STARTUP")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        Ok(LLMConfig {
            api_key,
            base_url,
            provider,
            model,
            timeout_secs,
            verify_on_startup,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            provider: LLMProviderType::Gemini,
            model: None,
            timeout_secs: 60,
            verify_on_startup: false,
        }
    }
}

impl WikipediaConfig {
    fn from_env() -> Result<Self> {
        let base_url = env::var("WIKIPEDIA_BASE_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let user_agent = env::var("WIKIPEDIA_USER_AGENT")
            .unwrap_or_else(|_| default_user_agent());

        Ok(WikipediaConfig {
            base_url,
            user_agent,
            timeout_secs: parse_env("FETCH_TIMEOUT_SECS", 20)?,
            max_attempts: parse_env("FETCH_MAX_ATTEMPTS", 3)?,
            backoff_ms: parse_env("FETCH_BACKOFF_MS", 2000)?,
        })
    }
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: default_user_agent(),
            timeout_secs: 20,
            max_attempts: 3,
            backoff_ms: 2000,
        }
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self> {
        let port_str = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string());

        let port = port_str.parse::<u16>()
            .map_err(|_| anyhow!("Invalid PORT value: '{}'. Must be a number between 1-65535", port_str))?;

        let host = env::var("HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(ServerConfig { port, host })
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self> {
        let level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info,wiki_quiz=debug".to_string());

        let file_enabled = env::var("LOG_FILE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let console_enabled = env::var("LOG_CONSOLE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let log_directory = env::var("LOG_DIRECTORY")
            .unwrap_or_else(|_| "logs".to_string());

        Ok(LoggingConfig {
            level,
            file_enabled,
            console_enabled,
            log_directory,
        })
    }
}

fn default_user_agent() -> String {
    format!("wiki-quiz/{} (quiz generator)", env!("CARGO_PKG_VERSION"))
}

/// Trimmed value of `name`, treating blank values as unset
fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn invalid(message: &str) -> anyhow::Error {
    log_validation!(failure, "configuration", error = message);
    anyhow!("{}", message)
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("Invalid {} value: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

/// Mask sensitive data in configuration for safe logging
fn mask_sensitive_data(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            database: DatabaseConfig {
                url: "sqlite:test.db".to_string(),
            },
            llm: LLMConfig::default(),
            wikipedia: WikipediaConfig::default(),
            server: ServerConfig {
                port: 8000,
                host: "0.0.0.0".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_enabled: false,
                console_enabled: true,
                log_directory: "logs".to_string(),
            },
        }
    }

    #[test]
    fn test_mask_sensitive_data() {
        assert_eq!(mask_sensitive_data("short"), "*****");
        assert_eq!(mask_sensitive_data("sqlite:quiz_history.db"), "sqli***y.db");
        assert_eq!(mask_sensitive_data("sk-1234567890abcdef"), "sk-1***cdef");
    }

    #[test]
    fn test_wikipedia_defaults() {
        let config = WikipediaConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.timeout_secs, 20);
        assert_eq!(config.backoff_ms, 2000);
        assert!(config.base_url.is_none());
        assert!(config.user_agent.starts_with("wiki-quiz/"));
    }

    #[test]
    fn test_config_validation() {
        let config = valid_config();
        assert!(config.validate().is_ok());

        let mut invalid = config.clone();
        invalid.server.port = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.database.url = "postgres://localhost/quiz".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.wikipedia.max_attempts = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.wikipedia.timeout_secs = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = config;
        invalid.llm.timeout_secs = 0;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_blank_llm_key_falls_back_to_google_key() {
        unsafe {
            env::set_var("LLM_API_KEY", "  ");
            env::set_var("GOOGLE_API_KEY", "google-secret");
        }
        let config = LLMConfig::from_env().unwrap();
        assert_eq!(config.api_key.as_deref(), Some("google-secret"));

        unsafe { env::set_var("GOOGLE_API_KEY", ""); }
        let config = LLMConfig::from_env().unwrap();
        assert!(config.api_key.is_none());

        unsafe {
            env::remove_var("LLM_API_KEY");
            env::remove_var("GOOGLE_API_KEY");
        }
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        unsafe { env::set_var("WIKI_QUIZ_TEST_NUMBER", "not-a-number"); }
        assert!(parse_env::<u64>("WIKI_QUIZ_TEST_NUMBER", 5).is_err());
        unsafe { env::set_var("WIKI_QUIZ_TEST_NUMBER", " 42 "); }
        assert_eq!(parse_env::<u64>("WIKI_QUIZ_TEST_NUMBER", 5).unwrap(), 42);
        unsafe { env::remove_var("WIKI_QUIZ_TEST_NUMBER"); }
        assert_eq!(parse_env::<u64>("WIKI_QUIZ_TEST_NUMBER", 5).unwrap(), 5);
    }
}
