// ===============================
// src/config.rs
// ===============================
use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_REST_URL: &str = "https://api.binance.com";
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_RECV_WINDOW: u64 = 15_000;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// HMAC key must be present and non-empty.
    #[error("SECRET is missing or empty; cannot sign requests")]
    MissingSecret,
}

#[derive(Clone, Debug)]
pub struct Config {
    // credentials
    pub api_key: String,
    pub secret: String,

    // what to watch
    pub symbol: String,
    pub recv_window: u64,
    pub poll_interval: Duration,

    // endpoints
    pub rest_base: String,
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Build config from any key lookup (process env in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API").unwrap_or_default();
        if api_key.is_empty() {
            warn!("API is not set; requests will be sent without an API key");
        }
        let secret = lookup("SECRET").unwrap_or_default();

        let symbol = lookup("SYMBOL")
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());

        let recv_window = parse_or(&lookup, "RECV_WINDOW", DEFAULT_RECV_WINDOW);
        let poll_secs = parse_or(&lookup, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS).max(1);

        let rest_base = lookup("BINANCE_REST_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_REST_URL.to_string());

        let metrics_port = lookup("METRICS_PORT").and_then(|raw| match raw.trim().parse() {
            Ok(p) => Some(p),
            Err(_) => {
                warn!(value = %raw, "METRICS_PORT is not a port number; metrics disabled");
                None
            }
        });

        Config {
            api_key,
            secret,
            symbol,
            recv_window,
            poll_interval: Duration::from_secs(poll_secs),
            rest_base,
            metrics_port,
        }
    }
}

/// Reads `.env` (if any) and then the process environment.
pub fn load() -> Config {
    let _ = dotenv();
    Config::from_lookup(|key| env::var(key).ok())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, %default, "invalid number, using default");
            default
        }),
    }
}
