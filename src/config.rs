// config.rs
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::filter::LevelFilter;

const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_FALLBACK_RPC_URLS: &str = "https://solana-rpc.publicnode.com,https://rpc.ankr.com/solana";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub port: u16,
    pub log_level: LevelFilter,
    pub allowed_origins: Vec<String>,
    // Wallet balance lookups
    pub solana_rpc_url: String,
    pub solana_fallback_rpc_urls: Vec<String>,
    pub rpc_timeout: Duration,
    pub bulk_concurrency: usize,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} must be a number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn init() -> anyhow::Result<Config> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let log_level = var_or("LOG_LEVEL", "debug")
            .parse::<LevelFilter>()
            .context("LOG_LEVEL must be one of off, error, warn, info, debug, trace")?;

        Ok(Config {
            database_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 10)?,
            port: parse_var("PORT", 8000)?,
            log_level,
            allowed_origins: split_list(&var_or("ALLOWED_ORIGINS", "http://localhost:5173")),
            solana_rpc_url: var_or("SOLANA_RPC_URL", DEFAULT_RPC_URL),
            solana_fallback_rpc_urls: split_list(&var_or(
                "SOLANA_FALLBACK_RPC_URLS",
                DEFAULT_FALLBACK_RPC_URLS,
            )),
            rpc_timeout: Duration::from_millis(parse_var("RPC_TIMEOUT_MS", 10_000)?),
            bulk_concurrency: parse_var("BULK_CONCURRENCY", 16)?,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Config {
        Config {
            database_url: None,
            db_max_connections: 1,
            port: 0,
            log_level: LevelFilter::OFF,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            solana_rpc_url: "http://127.0.0.1:1".to_string(),
            solana_fallback_rpc_urls: Vec::new(),
            rpc_timeout: Duration::from_millis(200),
            bulk_concurrency: 4,
        }
    }
}
