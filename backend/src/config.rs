//! Runtime configuration, read from the environment with sensible defaults.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use chrono_tz::Tz;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATABASE_URL: &str = "sqlite:habits.db";
/// Day boundaries fall back to this zone for users without a stored timezone.
const DEFAULT_TIMEZONE: &str = "Europe/Istanbul";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub default_timezone: Tz,
}

impl Config {
    /// Load configuration from `HABITS_BIND_ADDR`, `DATABASE_URL` and
    /// `HABITS_DEFAULT_TIMEZONE`, falling back to compiled-in defaults.
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("HABITS_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("invalid HABITS_BIND_ADDR")?;

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let default_timezone = std::env::var("HABITS_DEFAULT_TIMEZONE")
            .unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string())
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid HABITS_DEFAULT_TIMEZONE: {e}"))?;

        Ok(Self {
            bind_addr,
            database_url,
            default_timezone,
        })
    }
}
