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
//! Integration tests for logging setup
//!
//! The global subscriber can be installed once per process, so everything that
//! installs one lives in a single test.

use jukebox_observability::{init_tracing_with_config, LogConfig, LogError, LogFormat, LogOutput};

#[test]
fn test_config_builder_chaining() {
    let config = LogConfig::new()
        .with_format(LogFormat::Json)
        .with_level("debug")
        .with_timestamps(true)
        .with_color(false)
        .with_thread_ids(true)
        .with_targets(true)
        .with_output(LogOutput::Stdout);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, Some("debug".to_string()));
    assert!(config.use_timestamps);
    assert!(!config.use_color);
    assert!(config.include_thread_ids);
    assert!(config.include_targets);
    assert_eq!(config.output, LogOutput::Stdout);
}

#[test]
fn test_second_initialization_is_an_error() {
    let config = LogConfig::new()
        .with_format(LogFormat::Compact)
        .with_level("info")
        .with_color(false);

    assert!(init_tracing_with_config(config.clone()).is_ok());
    tracing::info!(songs = 3, "subscriber installed");

    let second = init_tracing_with_config(config);
    assert!(matches!(second, Err(LogError::AlreadyInitialized(_))));
}
