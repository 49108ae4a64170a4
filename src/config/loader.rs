//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/default.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::coingecko::CoinGeckoConfig;
use crate::adapters::jupiter::JupiterTokenConfig;
use crate::adapters::pools::PoolStatsConfig;
use crate::adapters::token_lists::{TokenListFetcherConfig, TokenListSource, MAX_ATTEMPTS};
use crate::adapters::yahoo::YahooConfig;

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerSection,
    pub coingecko: CoinGeckoSection,
    pub yahoo: YahooSection,
    pub jupiter: JupiterSection,
    pub pools: PoolsSection,
    pub token_lists: TokenListsSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub chart: ChartSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// HTTP server section
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    pub bind: String,
    pub port: u16,
}

impl ServerSection {
    /// Checks TOKEN_PULSE_BIND env var first, falls back to config value
    pub fn get_bind(&self) -> String {
        std::env::var("TOKEN_PULSE_BIND").unwrap_or_else(|_| self.bind.clone())
    }

    /// Checks TOKEN_PULSE_PORT env var first, falls back to config value
    pub fn get_port(&self) -> u16 {
        std::env::var("TOKEN_PULSE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(self.port)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.get_bind(), self.get_port())
    }
}

/// CoinGecko API section
#[derive(Debug, Clone, Deserialize)]
pub struct CoinGeckoSection {
    pub api_url: String,
    /// Demo or pro key, see CoinGecko's plan docs
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl CoinGeckoSection {
    /// Checks COINGECKO_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        non_empty(self.api_key.as_deref()).or_else(|| std::env::var("COINGECKO_API_KEY").ok())
    }
}

/// Yahoo Finance chart API section
#[derive(Debug, Clone, Deserialize)]
pub struct YahooSection {
    pub api_url: String,
    pub timeout_secs: u64,
}

/// Jupiter Token/Price API section
#[derive(Debug, Clone, Deserialize)]
pub struct JupiterSection {
    pub token_api_url: String,
    pub price_api_url: String,
    /// Optional API key for higher rate limits (get from jup.ag)
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl JupiterSection {
    /// Checks JUPITER_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        non_empty(self.api_key.as_deref()).or_else(|| std::env::var("JUPITER_API_KEY").ok())
    }
}

/// GeckoTerminal pool statistics section
#[derive(Debug, Clone, Deserialize)]
pub struct PoolsSection {
    pub api_url: String,
    pub timeout_secs: u64,
}

/// One `[[token_lists.sources]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct TokenListSourceSection {
    pub name: String,
    pub primary_url: String,
    #[serde(default)]
    pub fallback_url: Option<String>,
}

/// Token list sources and retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct TokenListsSection {
    /// Backoff after each failed attempt, exactly three entries
    pub retry_delays_ms: Vec<u64>,
    pub request_timeout_secs: u64,
    /// How often the server reloads every list (0 disables)
    #[serde(default)]
    pub refresh_interval_secs: u64,
    /// Replacement for the bundled static list, `~` is expanded
    #[serde(default)]
    pub static_list_path: Option<String>,
    #[serde(default)]
    pub sources: Vec<TokenListSourceSection>,
}

impl TokenListsSection {
    pub fn get_static_list_path(&self) -> Option<PathBuf> {
        non_empty(self.static_list_path.as_deref())
            .map(|p| PathBuf::from(shellexpand::tilde(&p).into_owned()))
    }

    pub fn sources(&self) -> Vec<TokenListSource> {
        self.sources
            .iter()
            .map(|s| TokenListSource {
                name: s.name.clone(),
                primary_url: s.primary_url.clone(),
                fallback_url: non_empty(s.fallback_url.as_deref()),
            })
            .collect()
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn fetcher_config(&self) -> Result<TokenListFetcherConfig, ConfigError> {
        let delays: [u64; MAX_ATTEMPTS] = self.retry_delays_ms.as_slice().try_into().map_err(|_| {
            ConfigError::ValidationError(format!(
                "retry_delays_ms must have exactly {} entries, got {}",
                MAX_ATTEMPTS,
                self.retry_delays_ms.len()
            ))
        })?;

        Ok(TokenListFetcherConfig {
            retry_delays: delays.map(Duration::from_millis),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            static_list_path: self.get_static_list_path(),
        })
    }
}

/// Shared response cache section
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    pub default_ttl_secs: u64,
    pub max_entries: usize,
    pub coingecko_ttl_secs: u64,
    pub yahoo_ttl_secs: u64,
    pub pools_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            default_ttl_secs: 60,
            max_entries: 10_000,
            coingecko_ttl_secs: 60,
            yahoo_ttl_secs: 30,
            pools_ttl_secs: 120,
        }
    }
}

impl CacheSection {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

/// Chart widget section
#[derive(Debug, Clone, Deserialize)]
pub struct ChartSection {
    /// Exchange prefix for crypto chart symbols
    pub default_exchange: String,
}

impl Default for ChartSection {
    fn default() -> Self {
        Self {
            default_exchange: crate::domain::chart_symbol::DEFAULT_CRYPTO_EXCHANGE.to_string(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.is_empty() {
            return Err(ConfigError::ValidationError(
                "server.bind cannot be empty".to_string(),
            ));
        }

        let urls = [
            ("coingecko.api_url", &self.coingecko.api_url),
            ("yahoo.api_url", &self.yahoo.api_url),
            ("jupiter.token_api_url", &self.jupiter.token_api_url),
            ("jupiter.price_api_url", &self.jupiter.price_api_url),
            ("pools.api_url", &self.pools.api_url),
        ];
        for (field, url) in urls {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{} cannot be empty",
                    field
                )));
            }
        }

        // Token lists
        self.token_lists.fetcher_config()?;

        if self.token_lists.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "token_lists.request_timeout_secs must be > 0".to_string(),
            ));
        }

        for (i, source) in self.token_lists.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "token_lists.sources[{}].name cannot be empty",
                    i
                )));
            }
            if source.primary_url.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "token_lists.sources[{}].primary_url cannot be empty",
                    i
                )));
            }
        }

        // Cache
        let ttls = [
            ("cache.default_ttl_secs", self.cache.default_ttl_secs),
            ("cache.coingecko_ttl_secs", self.cache.coingecko_ttl_secs),
            ("cache.yahoo_ttl_secs", self.cache.yahoo_ttl_secs),
            ("cache.pools_ttl_secs", self.cache.pools_ttl_secs),
        ];
        for (field, ttl) in ttls {
            if ttl == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be > 0",
                    field
                )));
            }
        }

        if self.cache.max_entries == 0 {
            return Err(ConfigError::ValidationError(
                "cache.max_entries must be > 0".to_string(),
            ));
        }

        if self.chart.default_exchange.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "chart.default_exchange cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// Conversions from Config to the adapter configs
impl From<&Config> for CoinGeckoConfig {
    fn from(config: &Config) -> Self {
        CoinGeckoConfig {
            api_url: config.coingecko.api_url.clone(),
            api_key: config.coingecko.get_api_key(),
            timeout: Duration::from_secs(config.coingecko.timeout_secs),
            cache_ttl: Duration::from_secs(config.cache.coingecko_ttl_secs),
        }
    }
}

impl From<&Config> for YahooConfig {
    fn from(config: &Config) -> Self {
        YahooConfig {
            api_url: config.yahoo.api_url.clone(),
            timeout: Duration::from_secs(config.yahoo.timeout_secs),
            cache_ttl: Duration::from_secs(config.cache.yahoo_ttl_secs),
        }
    }
}

impl From<&Config> for PoolStatsConfig {
    fn from(config: &Config) -> Self {
        PoolStatsConfig {
            api_url: config.pools.api_url.clone(),
            timeout: Duration::from_secs(config.pools.timeout_secs),
            cache_ttl: Duration::from_secs(config.cache.pools_ttl_secs),
        }
    }
}

impl From<&Config> for JupiterTokenConfig {
    fn from(config: &Config) -> Self {
        JupiterTokenConfig {
            token_api_url: config.jupiter.token_api_url.clone(),
            price_api_url: config.jupiter.price_api_url.clone(),
            api_key: config.jupiter.get_api_key(),
            timeout: Duration::from_secs(config.jupiter.timeout_secs),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[server]
bind = "127.0.0.1"
port = 8080

[coingecko]
api_url = "https://api.coingecko.com/api/v3"
timeout_secs = 10

[yahoo]
api_url = "https://query1.finance.yahoo.com"
timeout_secs = 10

[jupiter]
token_api_url = "https://lite-api.jup.ag/tokens/v2"
price_api_url = "https://lite-api.jup.ag/price/v3"
timeout_secs = 15

[pools]
api_url = "https://api.geckoterminal.com/api/v2"
timeout_secs = 10

[token_lists]
retry_delays_ms = [1000, 2000, 4000]
request_timeout_secs = 10
refresh_interval_secs = 3600

[[token_lists.sources]]
name = "uniswap"
primary_url = "https://tokens.uniswap.org"
fallback_url = "https://ipfs.io/ipns/tokens.uniswap.org"

[[token_lists.sources]]
name = "jupiter"
primary_url = "https://token.jup.ag/strict"

[cache]
default_ttl_secs = 60
max_entries = 5000
coingecko_ttl_secs = 60
yahoo_ttl_secs = 30
pools_ttl_secs = 120

[chart]
default_exchange = "BINANCE"

[logging]
level = "info"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.max_entries, 5000);
        assert_eq!(config.token_lists.sources.len(), 2);
        assert_eq!(config.chart.default_exchange, "BINANCE");

        let sources = config.token_lists.sources();
        assert_eq!(sources[0].fallback_url.as_deref(), Some("https://ipfs.io/ipns/tokens.uniswap.org"));
        assert_eq!(sources[1].fallback_url, None);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("[server\nbind = ");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_retry_table_must_have_three_delays() {
        let invalid = create_valid_config().replace("[1000, 2000, 4000]", "[1000, 2000]");
        let file = write_config(&invalid);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("retry_delays_ms")));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let invalid = create_valid_config().replace("yahoo_ttl_secs = 30", "yahoo_ttl_secs = 0");
        let file = write_config(&invalid);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("yahoo_ttl_secs")));
    }

    #[test]
    fn test_empty_url_rejected() {
        let invalid = create_valid_config().replace(
            "api_url = \"https://api.geckoterminal.com/api/v2\"",
            "api_url = \"\"",
        );
        let file = write_config(&invalid);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("pools.api_url")));
    }

    #[test]
    fn test_optional_sections_default() {
        let content = create_valid_config();
        let trimmed = content
            .split("[cache]")
            .next()
            .unwrap()
            .to_string();
        let file = write_config(&trimmed);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.cache.max_entries, 10_000);
        assert_eq!(config.chart.default_exchange, "BINANCE");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_fetcher_config_conversion() {
        let config: Config = toml::from_str(&create_valid_config()).unwrap();
        let fetcher = config.token_lists.fetcher_config().unwrap();

        assert_eq!(
            fetcher.retry_delays,
            [
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
        assert_eq!(fetcher.request_timeout, Duration::from_secs(10));
        assert_eq!(fetcher.static_list_path, None);
        assert_eq!(config.token_lists.refresh_interval(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_static_list_path_expands_tilde() {
        let content = create_valid_config().replace(
            "refresh_interval_secs = 3600",
            "refresh_interval_secs = 0\nstatic_list_path = \"~/lists/static.json\"",
        );
        let config: Config = toml::from_str(&content).unwrap();

        let path = config.token_lists.get_static_list_path().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("lists/static.json"));
        assert_eq!(config.token_lists.refresh_interval(), None);
    }

    #[test]
    fn test_adapter_config_conversions() {
        let config: Config = toml::from_str(&create_valid_config()).unwrap();

        let yahoo = YahooConfig::from(&config);
        assert_eq!(yahoo.cache_ttl, Duration::from_secs(30));

        let pools = PoolStatsConfig::from(&config);
        assert_eq!(pools.api_url, "https://api.geckoterminal.com/api/v2");
        assert_eq!(pools.cache_ttl, Duration::from_secs(120));

        let jupiter = JupiterTokenConfig::from(&config);
        assert_eq!(jupiter.timeout, Duration::from_secs(15));
        assert_eq!(jupiter.price_api_url, "https://lite-api.jup.ag/price/v3");
    }

    #[test]
    fn test_configured_api_key_wins_over_env() {
        let content = create_valid_config().replace(
            "[coingecko]\n",
            "[coingecko]\napi_key = \"from-file\"\n",
        );
        let config: Config = toml::from_str(&content).unwrap();
        assert_eq!(config.coingecko.get_api_key().as_deref(), Some("from-file"));
    }
}
