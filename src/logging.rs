//! Structured logging setup and the executive debug bitmask
//!
//! Diagnostics go through `tracing`. The subscriber is installed once by the
//! embedding program with [`init_logging`]; library code never installs one.
//!
//! ```rust,ignore
//! use rustfdm::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default());
//! tracing::info!(frame = 1, "Executive running");
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::utils::constants::{DEBUG_ENV_VAR, DEFAULT_DEBUG_LEVEL};

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Machine-readable, one JSON object per event
    Json,
    #[default]
    Pretty,
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Log file path (None for stderr only)
    pub file: Option<PathBuf>,
    pub timestamps: bool,
    /// Include source location (file:line)
    pub source_location: bool,
    /// Target filter, e.g. "rustfdm::exec=debug"
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            file: None,
            timestamps: true,
            source_location: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Errors only, no timestamps
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            timestamps: false,
            ..Default::default()
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides the configured level unless an explicit filter is set.
/// Subsequent calls are ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = match config.filter {
        Some(ref custom) => {
            EnvFilter::try_new(custom).unwrap_or_else(|_| EnvFilter::new(config.level.to_string()))
        }
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.to_string())),
    };

    let writer = match config.file {
        Some(ref path) => match std::fs::File::create(path) {
            Ok(file) => fmt::writer::BoxMakeWriter::new(std::sync::Mutex::new(file)),
            Err(e) => {
                eprintln!("Could not open log file {}: {e}", path.display());
                fmt::writer::BoxMakeWriter::new(std::io::stderr)
            }
        },
        None => fmt::writer::BoxMakeWriter::new(std::io::stderr),
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let result = match (config.format, config.timestamps) {
        (LogFormat::Json, _) => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init(),
        (LogFormat::Pretty, true) => tracing_subscriber::registry()
            .with(filter)
            .with(layer.pretty())
            .try_init(),
        (LogFormat::Pretty, false) => tracing_subscriber::registry()
            .with(filter)
            .with(layer.pretty().without_time())
            .try_init(),
        (LogFormat::Compact, true) => tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .try_init(),
        (LogFormat::Compact, false) => tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact().without_time())
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

/// Verbosity bitmask carried by each executive
///
/// Each bit enables one class of diagnostics; the value is also published
/// as `simulation/debug-level` so it can be changed mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebugLevel(pub u32);

impl DebugLevel {
    /// Startup and configuration echo
    pub const STARTUP: u32 = 1;
    /// Instantiation and destruction notices
    pub const INSTANTIATION: u32 = 2;
    /// Per-frame run entry
    pub const RUN: u32 = 4;
    /// Runtime state
    pub const STATE: u32 = 8;
    /// Sanity checks
    pub const SANITY: u32 = 16;

    /// Read the initial level from the environment
    pub fn from_env() -> Self {
        std::env::var(DEBUG_ENV_VAR)
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map(DebugLevel)
            .unwrap_or_default()
    }

    #[inline]
    pub fn enabled(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn startup(self) -> bool {
        self.enabled(Self::STARTUP)
    }

    pub fn instantiation(self) -> bool {
        self.enabled(Self::INSTANTIATION)
    }

    pub fn run(self) -> bool {
        self.enabled(Self::RUN)
    }

    pub fn state(self) -> bool {
        self.enabled(Self::STATE)
    }

    pub fn sanity(self) -> bool {
        self.enabled(Self::SANITY)
    }
}

impl Default for DebugLevel {
    fn default() -> Self {
        DebugLevel(DEFAULT_DEBUG_LEVEL)
    }
}
