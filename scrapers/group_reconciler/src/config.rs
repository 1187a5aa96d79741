use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapingConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787".to_string(),
            user_agent: "Mozilla/5.0 (compatible; GroupReconciler/1.0)".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupSyncConfig {
    pub database: DatabaseConfig,
    pub scraping: ScrapingConfig,
    pub server: ServerConfig,
}

impl GroupSyncConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database.url = Some(url);
        }
        if let Some(max) = parsed(&lookup, "DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = max;
        }
        if let Some(base_url) = lookup("SCRAPER_BASE_URL") {
            config.scraping.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(user_agent) = lookup("SCRAPER_USER_AGENT") {
            config.scraping.user_agent = user_agent;
        }
        if let Some(timeout) = parsed(&lookup, "SCRAPER_TIMEOUT_SECS") {
            config.scraping.request_timeout_secs = timeout;
        }
        if let Some(host) = lookup("SERVER_HOST") {
            config.server.host = host;
        }
        if let Some(port) = parsed(&lookup, "SERVER_PORT") {
            config.server.port = port;
        }

        config
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}
