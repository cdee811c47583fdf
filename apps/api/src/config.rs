use std::str::FromStr;

use anyhow::{Context, Result};

use crate::export::{clamp_scale, MIN_SCALE};
use crate::render::DEFAULT_PUBLIC_BASE_URL;

/// Application configuration loaded from environment variables.
/// Fails at startup if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// HS256 secret shared with the external auth provider.
    pub auth_jwt_secret: String,
    /// Unset: portfolios, modules and grants live in memory.
    pub database_url: Option<String>,
    /// Unset: drafts are handed off through an in-memory store.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub bio_latency_ms: u64,
    pub handoff_ttl_secs: u64,
    pub export_scale: f32,
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            auth_jwt_secret: require_env("AUTH_JWT_SECRET")?,
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            bio_latency_ms: parse_env("BIO_LATENCY_MS", 2000)
                .context("BIO_LATENCY_MS must be a number of milliseconds")?,
            handoff_ttl_secs: parse_env("HANDOFF_TTL_SECS", 3600)
                .context("HANDOFF_TTL_SECS must be a number of seconds")?,
            export_scale: clamp_scale(
                parse_env::<f32>("EXPORT_SCALE", MIN_SCALE)
                    .context("EXPORT_SCALE must be a number")?,
            ),
            public_base_url: optional_env("PUBLIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for {key}")),
        None => Ok(default),
    }
}
