//! Alertcast - A broadcast overlay for live-stream celebration alerts.
//!
//! This is the main entry point for Alertcast, which subscribes to a
//! streamer's room on the platform's real-time channel and presents gift and
//! level-up alerts one at a time, for capture by streaming software.
//!
//! # Overview
//!
//! Viewers send virtual gifts and level up while watching a stream. Each of
//! these celebrations is pushed into the streamer's room. Alertcast queues
//! them and shows them in arrival order, each for a fixed duration followed
//! by an exit transition, never two at once.
//!
//! # Features
//!
//! - **Ordered Alerts**: Alerts are displayed exactly in arrival order, bursts included
//! - **Single Slot**: At most one alert is on screen at any time
//! - **Configurable Timings**: Visible and exit durations are set in the configuration
//! - **Resilient Subscription**: Dropped channel streams are reconnected with backoff
//! - **Room Switching**: A new room name on stdin moves the overlay to that room
//! - **YAML Configuration**: Simple configuration file format with environment variable support
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! channel:
//!   url: "https://kickclone-api.onrender.com"
//!
//! overlay:
//!   show_ms: 5000
//!   exit_ms: 500
//! ```
//!
//! # Environment Variable Overrides
//!
//! Override any configuration value using environment variables with the `ALERTCAST_` prefix:
//!
//! ```bash
//! export ALERTCAST_CHANNEL__URL="http://localhost:3000"
//! export ALERTCAST_OVERLAY__SHOW_MS=8000
//! ```
//!
//! # Usage
//!
//! ```bash
//! alertcast --config config.yaml --room ana > frames.jsonl
//! ```
//!
//! Frames are written to stdout as JSON lines (`null` for an empty frame);
//! logs go to stderr.
//!
//! # Architecture
//!
//! The overlay consists of several modules:
//!
//! - [`alerts`] - Alert model, FIFO queue and the presentation scheduler
//! - [`channel`] - Room subscription, message normalization and the channel adapter
//! - [`config`] - YAML configuration file structures and loading with environment variable support
//! - [`overlay`] - Mount, unmount and room switching of the whole pipeline
//! - [`surface`] - Pure rendering of scheduler state and frame output
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//!   - Set to `debug` for verbose output
//!   - Set to `warn` or `error` for minimal logging

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    channel::HttpTransport,
    config::Config,
    overlay::Overlay,
    surface::JsonLinesSurface,
};

mod alerts;
mod channel;
mod config;
mod overlay;
mod surface;

/// Command-line arguments for Alertcast.
///
/// # Examples
///
/// ```bash
/// alertcast --config config.yaml --room ana
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// See the [`config`] module for the expected format.
    #[arg(short, long)]
    config: String,

    /// Room to mount the overlay for, the streamer's channel name.
    ///
    /// Writing another room name on stdin switches the overlay to it.
    #[arg(short, long)]
    room: String,
}

/// Main entry point for Alertcast.
///
/// 1. **Logging Setup**: `info` level by default, overridable with `RUST_LOG`
/// 2. **Argument Parsing**: Parses command-line arguments using `clap`
/// 3. **Configuration Loading**: Reads the YAML file and environment overrides
/// 4. **Mount**: Subscribes to the room and starts presenting alerts
/// 5. **Control Loop**: Switches room on each stdin line until Ctrl-C, then unmounts
///
/// Configuration and mount errors are logged and end the process without
/// panicking.
#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting alertcast {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };

    let new_transport = || {
        HttpTransport::new(
            &config.channel.url,
            config.channel.reconnect_delay(),
            config.channel.max_reconnect_delay(),
        )
    };

    let surface = JsonLinesSurface::new(std::io::stdout());
    let mut overlay = Overlay::new(config.overlay.timings(), surface);

    if let Err(e) = overlay.mount(&args.room, new_transport()).await {
        error!("Failed to mount overlay: {}", e);
        return;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                break;
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(room)) => {
                        let room = room.trim();
                        if room.is_empty() || overlay.room() == Some(room) {
                            continue;
                        }
                        if let Err(e) = overlay.switch_room(room, new_transport()).await {
                            error!("Failed to switch to room {}: {}", room, e);
                            break;
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }
        }
    }

    overlay.unmount().await;
    info!("Stopped alertcast");
}
