// src/config.rs

use std::{env, path::PathBuf};

use dotenvy::dotenv;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    /// Echo internal error details to clients.
    pub debug: bool,
    pub cors_origins: Vec<String>,
    pub bind_addr: String,
    /// Directory for uploaded profile and article images.
    pub media_root: PathBuf,
    /// Directory holding the gold/silver price CSV files.
    pub market_data_dir: PathBuf,
    /// Run feed ingestion when the product list is requested on an empty catalog.
    pub lazy_bootstrap: bool,
    /// Run a full catalog refresh before serving.
    pub ingest_on_startup: bool,
    pub providers: ProviderConfig,
}

/// Keys and endpoints of the external providers.
/// Handed to each adapter at construction.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub finlife_api_key: Option<String>,
    pub finlife_base_url: String,
    pub market_data_base_url: String,
    pub kakao_api_key: Option<String>,
    pub kakao_local_base_url: String,
    pub kakao_navi_base_url: String,
    pub youtube_api_key: Option<String>,
    pub youtube_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_analysis_model: String,
    pub llm_recommend_model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            finlife_api_key: None,
            finlife_base_url: "http://finlife.fss.or.kr/finlifeapi".to_string(),
            market_data_base_url: "https://query1.finance.yahoo.com".to_string(),
            kakao_api_key: None,
            kakao_local_base_url: "https://dapi.kakao.com".to_string(),
            kakao_navi_base_url: "https://apis-navi.kakaomobility.com".to_string(),
            youtube_api_key: None,
            youtube_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            llm_api_key: None,
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_analysis_model: "gpt-4o-mini".to_string(),
            llm_recommend_model: "gpt-4o".to_string(),
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            finlife_api_key: optional("FINLIFE_API_KEY"),
            finlife_base_url: optional("FINLIFE_BASE_URL").unwrap_or(defaults.finlife_base_url),
            market_data_base_url: optional("MARKET_DATA_BASE_URL")
                .unwrap_or(defaults.market_data_base_url),
            kakao_api_key: optional("KAKAO_MAP_API_KEY"),
            kakao_local_base_url: optional("KAKAO_LOCAL_BASE_URL")
                .unwrap_or(defaults.kakao_local_base_url),
            kakao_navi_base_url: optional("KAKAO_NAVI_BASE_URL")
                .unwrap_or(defaults.kakao_navi_base_url),
            youtube_api_key: optional("YOUTUBE_API_KEY"),
            youtube_base_url: optional("YOUTUBE_BASE_URL").unwrap_or(defaults.youtube_base_url),
            llm_api_key: optional("LLM_API_KEY"),
            llm_base_url: optional("LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_analysis_model: optional("LLM_ANALYSIS_MODEL")
                .unwrap_or(defaults.llm_analysis_model),
            llm_recommend_model: optional("LLM_RECOMMEND_MODEL")
                .unwrap_or(defaults.llm_recommend_model),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = optional("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = optional("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration = match optional("JWT_EXPIRATION") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "JWT_EXPIRATION",
                value: raw,
            })?,
            None => 86_400,
        };

        let rust_log = optional("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let cors_origins = optional("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173,http://127.0.0.1:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            debug: flag("DEBUG", false)?,
            cors_origins,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            media_root: optional("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("media")),
            market_data_dir: optional("MARKET_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            lazy_bootstrap: flag("CATALOG_LAZY_BOOTSTRAP", true)?,
            ingest_on_startup: flag("INGEST_ON_STARTUP", false)?,
            providers: ProviderConfig::from_env(),
        })
    }
}

/// Reads a variable, treating empty values as unset.
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value: raw }),
        },
    }
}
