//! Configuration file structures for the overlay.
//!
//! This module defines the configuration file format using YAML. The
//! configuration is split into two sections: the push channel to subscribe
//! to, and the overlay presentation timings.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Real-time channel configuration
//! channel:
//!   # Base URL of the channel server
//!   url: "https://kickclone-api.onrender.com"
//!   # Seconds to wait before the first reconnection attempt (doubles on failure)
//!   reconnect_delay: 2
//!   # Upper bound of the reconnection delay in seconds
//!   max_reconnect_delay: 60
//!
//! # Overlay configuration
//! overlay:
//!   # Milliseconds an alert stays fully visible
//!   show_ms: 5000
//!   # Milliseconds of exit animation before the next alert may start
//!   exit_ms: 500
//! ```
//!
//! Only `channel.url` is required.
//!
//! # Environment Variable Overrides
//!
//! Any value can be overridden with an `ALERTCAST_` prefixed variable, nested
//! keys being separated by `__`:
//!
//! ```bash
//! export ALERTCAST_CHANNEL__URL="http://localhost:3000"
//! export ALERTCAST_OVERLAY__SHOW_MS=8000
//! ```

use anyhow::{Result, anyhow, bail};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use reqwest::Url;
use serde::Deserialize;
use tokio::time::Duration;

use crate::alerts::{DEFAULT_EXIT_MS, DEFAULT_SHOW_MS, Timings};

/// Prefix of the environment variables overriding the configuration file.
const ENV_PREFIX: &str = "ALERTCAST_";

/// Root configuration structure.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Real-time channel configuration
    pub channel: Channel,
    /// Overlay configuration
    #[serde(default)]
    pub overlay: Overlay,
}

/// Real-time channel configuration.
///
/// # YAML Section
///
/// ```yaml
/// channel:
///   url: "https://kickclone-api.onrender.com"
///   reconnect_delay: 2
///   max_reconnect_delay: 60
/// ```
#[derive(Debug, Deserialize)]
pub struct Channel {
    /// Base URL of the channel server.
    ///
    /// Should include the protocol (http/https). A trailing slash is removed
    /// when loading.
    pub url: String,

    /// Seconds before the first reconnection attempt after the stream drops.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: u64,

    /// Upper bound, in seconds, of the doubling reconnection delay.
    #[serde(default = "default_max_reconnect_delay")]
    pub max_reconnect_delay: u64,
}

/// Overlay presentation configuration.
///
/// # YAML Section
///
/// ```yaml
/// overlay:
///   show_ms: 5000
///   exit_ms: 500
/// ```
#[derive(Debug, Deserialize)]
pub struct Overlay {
    /// Milliseconds an alert stays fully visible. Must be positive.
    #[serde(default = "default_show_ms")]
    pub show_ms: u64,

    /// Milliseconds of exit animation. Zero disables the exit phase.
    #[serde(default = "default_exit_ms")]
    pub exit_ms: u64,
}

impl Default for Overlay {
    fn default() -> Self {
        Overlay {
            show_ms: DEFAULT_SHOW_MS,
            exit_ms: DEFAULT_EXIT_MS,
        }
    }
}

fn default_reconnect_delay() -> u64 {
    2
}

fn default_max_reconnect_delay() -> u64 {
    60
}

fn default_show_ms() -> u64 {
    DEFAULT_SHOW_MS
}

fn default_exit_ms() -> u64 {
    DEFAULT_EXIT_MS
}

impl Config {
    /// Loads the YAML file at `path`, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a required
    /// value is missing, or if the values are out of range.
    pub fn load(path: &str) -> Result<Config> {
        let mut config: Config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        if config.channel.url.ends_with('/') {
            config.channel.url.pop();
        }
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.channel.url)
            .map_err(|err| anyhow!("channel.url {} is invalid ({})", self.channel.url, err))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            bail!("channel.url must be an http or https base url, got {}", self.channel.url);
        }
        if self.overlay.show_ms == 0 {
            bail!("overlay.show_ms must be greater than 0");
        }
        if self.channel.reconnect_delay == 0 {
            bail!("channel.reconnect_delay must be greater than 0");
        }
        if self.channel.max_reconnect_delay < self.channel.reconnect_delay {
            bail!("channel.max_reconnect_delay must not be lower than channel.reconnect_delay");
        }
        Ok(())
    }
}

impl Channel {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.max_reconnect_delay)
    }
}

impl Overlay {
    /// Presentation timings used by the scheduler.
    pub fn timings(&self) -> Timings {
        Timings {
            show: Duration::from_millis(self.show_ms),
            exit: Duration::from_millis(self.exit_ms),
        }
    }
}
