//! Configuration for structured logging.
//!
//! Output format, level filter and decoration options for the jukebox's
//! tracing subscriber.

use std::io;
use std::str::FromStr;
use thiserror::Error;

/// Crates whose debug output drowns the jukebox's own events
const NOISY_TARGETS: &[&str] = &[
    "sqlx",
    "aws_smithy_runtime",
    "aws_sdk_s3",
    "hyper",
    "rustls",
];

/// Errors that can occur during logging configuration
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Expected one of: pretty, compact, json")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Output format for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line human-readable output
    #[default]
    Pretty,

    /// Compact single-line format
    Compact,

    /// JSON format for machine-readable logs
    Json,
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(LogError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Write to standard error
    Stderr,

    /// Write to standard output
    Stdout,
}

/// Configuration for logging
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format for logs
    pub format: LogFormat,

    /// Log level filter (e.g., "info", "debug", "jukebox_core=trace").
    /// If None, `RUST_LOG` decides.
    pub level: Option<String>,

    /// Whether to use ANSI colors
    pub use_color: bool,

    /// Whether to include timestamps in output
    pub use_timestamps: bool,

    /// Whether to include thread IDs in output
    pub include_thread_ids: bool,

    /// Whether to include target module names
    pub include_targets: bool,

    /// Keep dependency crates at `warn` unless the filter names them
    pub quiet_dependencies: bool,

    /// Output destination (stderr by default so song listings stay clean)
    pub output: LogOutput,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Pretty,
            level: None,
            use_color: true,
            use_timestamps: false,
            include_thread_ids: false,
            include_targets: false,
            quiet_dependencies: true,
            output: LogOutput::Stderr,
        }
    }
}

impl LogConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the CLI's `-v`/`-q` flags onto a level.
    ///
    /// `quiet` wins over any number of `-v`.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let level = match (quiet, verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        };
        LogConfig::new().with_level(level)
    }

    /// Set the output format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Enable or disable color output
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Enable or disable timestamps
    pub fn with_timestamps(mut self, use_timestamps: bool) -> Self {
        self.use_timestamps = use_timestamps;
        self
    }

    /// Enable or disable thread IDs
    pub fn with_thread_ids(mut self, include_thread_ids: bool) -> Self {
        self.include_thread_ids = include_thread_ids;
        self
    }

    /// Enable or disable target module names
    pub fn with_targets(mut self, include_targets: bool) -> Self {
        self.include_targets = include_targets;
        self
    }

    /// Enable or disable the dependency quieting directives
    pub fn with_quiet_dependencies(mut self, quiet: bool) -> Self {
        self.quiet_dependencies = quiet;
        self
    }

    /// Set the output destination
    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Get the effective log level from config or environment
    pub fn get_effective_level(&self) -> String {
        self.level
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| "info".to_string())
    }

    /// Filter directives handed to `EnvFilter`
    pub fn filter_directives(&self) -> String {
        let level = self.get_effective_level();
        if !self.quiet_dependencies {
            return level;
        }

        let mut directives = vec![level.clone()];
        for target in NOISY_TARGETS {
            // an explicit directive for the crate wins
            if !level.contains(target) {
                directives.push(format!("{}=warn", target));
            }
        }
        directives.join(",")
    }
}
