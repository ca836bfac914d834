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
//! Configuration management for CloudJukebox
//!
//! Supports TOML, YAML and JSON files, `JUKEBOX_` environment variable
//! overrides and the legacy `<backend>_creds.txt` credentials files.
//!
//! # Example
//!
//! ```no_run
//! use jukebox_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = ConfigLoader::new();
//!     let config = loader.load_with_overrides("jukebox.toml").await?;
//!
//!     println!("Storage backend: {}", config.storage.backend_name());
//!     println!("Prefetch window: {}", config.jukebox.file_cache_count);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

// Re-export commonly used items
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader, CREDS_FILE_SUFFIX};
pub use schema::*;
pub use validation::Validator;
