// Copyright (C) 2026  CloudJukebox Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Logging initialization.
//!
//! Installs a global `tracing` subscriber built from a [`LogConfig`].

use crate::config::{LogConfig, LogError, LogFormat, LogOutput};
use std::io;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Initialize tracing with the specified format and optional log level.
///
/// # Example
///
/// ```ignore
/// use jukebox_observability::{init_tracing, LogFormat};
///
/// init_tracing(LogFormat::Compact, Some("debug")).unwrap();
/// tracing::info!("jukebox started");
/// ```
pub fn init_tracing(format: LogFormat, level: Option<&str>) -> Result<(), LogError> {
    let mut config = LogConfig::new().with_format(format);
    if let Some(level) = level {
        config = config.with_level(level);
    }
    init_tracing_with_config(config)
}

/// Initialize tracing with a detailed configuration.
///
/// Fails with [`LogError::AlreadyInitialized`] if a global subscriber is
/// already installed.
pub fn init_tracing_with_config(config: LogConfig) -> Result<(), LogError> {
    let env_filter = build_env_filter(&config)?;
    let registry = Registry::default().with(env_filter);
    let writer = get_writer(config.output);

    let result = match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(config.include_targets)
                .with_thread_ids(config.include_thread_ids)
                .with_ansi(config.use_color)
                .pretty();
            if config.use_timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(config.include_targets)
                .with_thread_ids(config.include_thread_ids)
                .with_ansi(config.use_color)
                .compact();
            if config.use_timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(writer)
                .json()
                .with_target(config.include_targets)
                .with_thread_ids(config.include_thread_ids);
            if config.use_timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
    };

    result.map_err(|e| LogError::AlreadyInitialized(e.to_string()))
}

/// Get the writer for the specified output
fn get_writer(output: LogOutput) -> fn() -> Box<dyn io::Write + Send> {
    match output {
        LogOutput::Stderr => || Box::new(io::stderr()),
        LogOutput::Stdout => || Box::new(io::stdout()),
    }
}

/// Build an environment filter for the given configuration
fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let directives = config.filter_directives();

    EnvFilter::try_new(&directives).map_err(|e| {
        LogError::InvalidLogLevel(format!("failed to parse log filter '{}': {}", directives, e))
    })
}
