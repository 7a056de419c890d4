use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    /// Optional: without it the corpus lives in the in-memory arena store.
    pub database_url: Option<String>,
    pub hh_api_base_url: String,
    pub hh_user_agent: String,
    pub hh_http_timeout_secs: u64,
    /// Delay between successive result pages, external rate-limit courtesy.
    pub collect_page_delay_ms: u64,
    pub api_rps: u32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "127.0.0.1:8080"),
            database_url: env::var("DATABASE_URL").ok(),
            hh_api_base_url: get_env_or("HH_API_BASE_URL", "https://api.hh.ru"),
            hh_user_agent: get_env_or(
                "HH_USER_AGENT",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
            hh_http_timeout_secs: get_env_parse_or("HH_HTTP_TIMEOUT_SECS", 10)?,
            collect_page_delay_ms: get_env_parse_or("COLLECT_PAGE_DELAY_MS", 500)?,
            api_rps: get_env_parse_or("API_RPS", 50)?,
        })
    }
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
