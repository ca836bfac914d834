//! CloudJukebox Observability Module
//!
//! Structured logging for the jukebox crates.
//!
//! # Features
//!
//! - **Multiple Output Formats**: Pretty, JSON, and compact output formats
//! - **Environment-based Filtering**: `RUST_LOG` applies when no level is configured
//! - **Quiet dependencies**: sqlx and the AWS SDK stay at `warn` by default
//!
//! # Example
//!
//! ```ignore
//! use jukebox_observability::{init_tracing_with_config, LogConfig, LogFormat};
//!
//! let config = LogConfig::from_verbosity(1, false).with_format(LogFormat::Compact);
//! init_tracing_with_config(config)?;
//! tracing::info!("jukebox started");
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};
