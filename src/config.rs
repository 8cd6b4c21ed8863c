//! Runtime configuration.
//!
//! Each setting is resolved from, in priority order: the command-line flag,
//! the environment variable, the built-in default.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::time::Duration;

use crate::paths::{DEFAULT_STORE_DIR, Paths};

pub const STORE_DIR_ENV: &str = "SFCONN_STORE_DIR";
pub const TIMEOUT_ENV: &str = "SFCONN_TIMEOUT_SECS";
pub const API_VERSION_ENV: &str = "SFCONN_API_VERSION";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_VERSION: &str = "42.0";

#[derive(Debug, Clone)]
pub struct Config {
    pub paths: Paths,
    /// Upper bound for one login round-trip
    pub login_timeout: Duration,
    /// SOAP API version used for login
    pub api_version: String,
}

impl Config {
    pub fn resolve(store_dir: Option<PathBuf>, timeout_secs: Option<u64>) -> Result<Self> {
        let store_dir = store_dir
            .or_else(|| non_empty_env(STORE_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));

        let timeout_secs = match timeout_secs {
            Some(secs) => secs,
            None => match non_empty_env(TIMEOUT_ENV) {
                Some(raw) => raw.parse::<u64>().with_context(|| {
                    format!("Invalid {}: '{}' is not a number of seconds", TIMEOUT_ENV, raw)
                })?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };
        if timeout_secs == 0 {
            bail!("Login timeout must be at least 1 second");
        }

        let api_version =
            non_empty_env(API_VERSION_ENV).unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Ok(Self {
            paths: Paths::new(store_dir),
            login_timeout: Duration::from_secs(timeout_secs),
            api_version,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
