//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cache::CacheSettings;

/// Runtime configuration for the data-access core.
#[derive(Debug, Clone)]
pub struct Config {
    /// Result-cache sizing and expiry.
    pub cache: CacheSettings,
}

impl Config {
    /// Load configuration from the environment (`.env` honored).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let max_entries = match env::var("CURATOR_CACHE_MAX_ENTRIES") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("CURATOR_CACHE_MAX_ENTRIES must be a number")?,
            Err(_) => CacheSettings::default().max_entries,
        };

        let ttl = match env::var("CURATOR_CACHE_TTL_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("CURATOR_CACHE_TTL_SECS must be a number of seconds")?,
            ),
            Err(_) => CacheSettings::default().ttl,
        };

        Ok(Self {
            cache: CacheSettings { max_entries, ttl },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
        }
    }
}
