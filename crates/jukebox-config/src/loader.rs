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
use crate::error::{ConfigError, ConfigResult};
use crate::schema::{Config, FileSystemStorage, S3Storage, StorageConfig};
use crate::validation::Validator;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Suffix of legacy credentials files (`s3_creds.txt`, `fs_creds.txt`)
pub const CREDS_FILE_SUFFIX: &str = "_creds.txt";

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.yaml` or `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        let format = ConfigFormat::from_path(path)?;

        info!(
            "Loaded {} configuration file: {}",
            format.name(),
            path.display()
        );

        self.load_from_string(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config = match format {
            ConfigFormat::Toml => self.parse_toml(content)?,
            ConfigFormat::Yaml => self.parse_yaml(content)?,
            ConfigFormat::Json => self.parse_json(content)?,
        };

        debug!("Configuration loaded from {}", format.name());

        if self.validate {
            config.validate()?;
            debug!("Configuration validated successfully");
        }

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    ///
    /// Overrides are applied after parsing, so the result is validated again.
    pub async fn load_with_overrides<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let mut config = self.load_file(path).await?;
        self.apply_env_overrides(&mut config)?;
        if self.validate {
            config.validate()?;
        }
        Ok(config)
    }

    /// Parse TOML configuration
    fn parse_toml(&self, content: &str) -> ConfigResult<Config> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Parse YAML configuration
    fn parse_yaml(&self, content: &str) -> ConfigResult<Config> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Parse JSON configuration
    fn parse_json(&self, content: &str) -> ConfigResult<Config> {
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Apply `JUKEBOX_*` environment variable overrides
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        self.apply_overrides_from(config, |name| std::env::var(name).ok())
    }

    /// Apply overrides using `lookup` to resolve variable names
    pub fn apply_overrides_from<F>(&self, config: &mut Config, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Storage selection
        if let Some(value) = lookup("JUKEBOX_STORAGE") {
            config.storage = match value.as_str() {
                "memory" => StorageConfig::Memory,
                "fs" => StorageConfig::FileSystem(FileSystemStorage::default()),
                "s3" => StorageConfig::S3(S3Storage::default()),
                _ => {
                    return Err(ConfigError::env_var_parsing_error(
                        "JUKEBOX_STORAGE",
                        &value,
                        "expected 'memory', 'fs' or 's3'",
                    ))
                }
            };
        }
        if let Some(value) = lookup("JUKEBOX_FS_ROOT_DIR") {
            if let StorageConfig::FileSystem(fs) = &mut config.storage {
                fs.root_dir = PathBuf::from(value);
            }
        }
        if let StorageConfig::S3(s3) = &mut config.storage {
            if let Some(value) = lookup("JUKEBOX_S3_ENDPOINT") {
                s3.endpoint = Some(value);
            }
            if let Some(value) = lookup("JUKEBOX_S3_REGION") {
                s3.region = value;
            }
            if let Some(value) = lookup("JUKEBOX_S3_ACCESS_KEY") {
                s3.access_key = Some(value);
            }
            if let Some(value) = lookup("JUKEBOX_S3_SECRET_KEY") {
                s3.secret_key = Some(value);
            }
            if let Some(value) = lookup("JUKEBOX_S3_CONTAINER_PREFIX") {
                s3.container_prefix = Some(value);
            }
        }

        // Jukebox settings
        if let Some(value) = lookup("JUKEBOX_FILE_CACHE_COUNT") {
            config.jukebox.file_cache_count = value.parse().map_err(|_| {
                ConfigError::env_var_parsing_error(
                    "JUKEBOX_FILE_CACHE_COUNT",
                    &value,
                    "expected positive integer",
                )
            })?;
        }
        if let Some(value) = lookup("JUKEBOX_CHECK_DATA_INTEGRITY") {
            config.jukebox.check_data_integrity =
                parse_bool("JUKEBOX_CHECK_DATA_INTEGRITY", &value)?;
        }
        if let Some(value) = lookup("JUKEBOX_USE_COMPRESSION") {
            config.jukebox.use_compression = parse_bool("JUKEBOX_USE_COMPRESSION", &value)?;
        }
        if let Some(value) = lookup("JUKEBOX_USE_ENCRYPTION") {
            config.jukebox.use_encryption = parse_bool("JUKEBOX_USE_ENCRYPTION", &value)?;
        }
        if let Some(value) = lookup("JUKEBOX_ENCRYPTION_KEY") {
            config.jukebox.encryption_key = Some(value);
        }
        if let Some(value) = lookup("JUKEBOX_ENCRYPTION_IV") {
            config.jukebox.encryption_iv = Some(value);
        }
        if let Some(value) = lookup("JUKEBOX_NUMBER_SONGS") {
            config.jukebox.number_songs = value.parse().map_err(|_| {
                ConfigError::env_var_parsing_error(
                    "JUKEBOX_NUMBER_SONGS",
                    &value,
                    "expected non-negative integer",
                )
            })?;
        }

        // Paths
        if let Some(value) = lookup("JUKEBOX_DIR") {
            config.paths.jukebox_dir = PathBuf::from(value);
        }

        // Observability settings
        if let Some(value) = lookup("JUKEBOX_LOG_LEVEL") {
            config.observability.log_level = value;
        }
        if let Some(value) = lookup("JUKEBOX_LOG_FORMAT") {
            config.observability.log_format = value;
        }

        Ok(())
    }

    /// Path of the legacy credentials file for the configured backend
    pub fn credentials_file_name(config: &Config) -> String {
        format!("{}{}", config.storage.backend_name(), CREDS_FILE_SUFFIX)
    }

    /// Merge a legacy `<backend>_creds.txt` file into the storage section
    ///
    /// Returns `Ok(false)` when the file does not exist.
    pub async fn apply_credentials_file<P: AsRef<Path>>(
        &self,
        config: &mut Config,
        path: P,
    ) -> ConfigResult<bool> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No credentials file at {}", path.display());
            return Ok(false);
        }

        let content = fs::read_to_string(path).await?;
        let creds = parse_credentials(path, &content)?;
        debug!(
            "Read {} credential entries from {}",
            creds.len(),
            path.display()
        );

        for (key, value) in creds {
            match (&mut config.storage, key.as_str()) {
                (StorageConfig::S3(s3), "aws_access_key") => s3.access_key = Some(value),
                (StorageConfig::S3(s3), "aws_secret_key") => s3.secret_key = Some(value),
                (StorageConfig::S3(s3), "endpoint_url") => s3.endpoint = Some(value),
                (StorageConfig::S3(s3), "region") => s3.region = value,
                (StorageConfig::S3(s3), "container_prefix") => {
                    s3.container_prefix = Some(value)
                }
                (StorageConfig::FileSystem(fs), "root_dir") => {
                    fs.root_dir = PathBuf::from(value)
                }
                (_, other) => warn!("Ignoring unknown credential '{}'", other),
            }
        }

        if self.validate {
            config.validate()?;
        }
        Ok(true)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `key=value` lines; blank lines are skipped
fn parse_credentials(path: &Path, content: &str) -> ConfigResult<Vec<(String, String)>> {
    let mut entries = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| ConfigError::credentials_error(path, index + 1, "expected key=value"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::credentials_error(
                path,
                index + 1,
                "empty key",
            ));
        }
        entries.push((key.to_string(), value.trim().to_string()));
    }
    Ok(entries)
}

/// Parse boolean from string (accepts: true, false, yes, no, 1, 0, on, off)
fn parse_bool(variable_name: &str, value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::env_var_parsing_error(
            variable_name,
            value,
            "expected 'true', 'false', 'yes', 'no', '1', '0', 'on', or 'off'",
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path("jukebox.toml").unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("jukebox.yaml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("jukebox.yml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("jukebox.json").unwrap(), ConfigFormat::Json);
    }

    #[test]
    fn test_format_detection_error() {
        assert!(ConfigFormat::from_path("jukebox.xml").is_err());
        assert!(ConfigFormat::from_path("jukebox").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "true").unwrap());
        assert!(parse_bool("X", "yes").unwrap());
        assert!(parse_bool("X", "1").unwrap());
        assert!(parse_bool("X", "ON").unwrap());
        assert!(!parse_bool("X", "false").unwrap());
        assert!(!parse_bool("X", "no").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(!parse_bool("X", "off").unwrap());
        assert!(parse_bool("X", "invalid").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();
        let lookup = lookup_from(&[
            ("JUKEBOX_STORAGE", "memory"),
            ("JUKEBOX_FILE_CACHE_COUNT", "5"),
            ("JUKEBOX_USE_COMPRESSION", "yes"),
            ("JUKEBOX_LOG_LEVEL", "debug"),
        ]);

        loader.apply_overrides_from(&mut config, lookup).unwrap();

        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(config.jukebox.file_cache_count, 5);
        assert!(config.jukebox.use_compression);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_env_override_parse_error_names_variable() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();
        let err = loader
            .apply_overrides_from(&mut config, lookup_from(&[("JUKEBOX_FILE_CACHE_COUNT", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("JUKEBOX_FILE_CACHE_COUNT=lots"));
    }

    #[test]
    fn test_s3_overrides_apply_after_backend_switch() {
        let loader = ConfigLoader::without_validation();
        let mut config = Config::default();
        let lookup = lookup_from(&[
            ("JUKEBOX_STORAGE", "s3"),
            ("JUKEBOX_S3_ENDPOINT", "http://localhost:9000"),
            ("JUKEBOX_S3_ACCESS_KEY", "minioadmin"),
        ]);

        loader.apply_overrides_from(&mut config, lookup).unwrap();

        match &config.storage {
            StorageConfig::S3(s3) => {
                assert_eq!(s3.endpoint.as_deref(), Some("http://localhost:9000"));
                assert_eq!(s3.access_key.as_deref(), Some("minioadmin"));
            }
            other => panic!("expected s3 storage, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_credentials() {
        let path = Path::new("s3_creds.txt");
        let creds = parse_credentials(path, "aws_access_key = abc\n\n  aws_secret_key=xyz  \n").unwrap();
        assert_eq!(
            creds,
            vec![
                ("aws_access_key".to_string(), "abc".to_string()),
                ("aws_secret_key".to_string(), "xyz".to_string()),
            ]
        );

        let err = parse_credentials(path, "just a line").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_credentials_file_name() {
        let mut config = Config::default();
        assert_eq!(ConfigLoader::credentials_file_name(&config), "fs_creds.txt");
        config.storage = StorageConfig::S3(S3Storage::default());
        assert_eq!(ConfigLoader::credentials_file_name(&config), "s3_creds.txt");
    }

    #[test]
    fn test_parse_toml() {
        let loader = ConfigLoader::without_validation();
        let toml = r#"
        [storage]
        backend = "memory"

        [jukebox]
        file_cache_count = 2
        use_encryption = true
        encryption_key = "sixteen-byte-key"
        "#;
        let config = loader.load_from_string(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.jukebox.file_cache_count, 2);
        assert!(config.jukebox.use_encryption);
    }

    #[test]
    fn test_parse_yaml() {
        let loader = ConfigLoader::without_validation();
        let yaml = r#"storage:
  backend: fs
  root_dir: /var/lib/jukebox
jukebox:
  check_data_integrity: true"#;
        let config = loader.load_from_string(yaml, ConfigFormat::Yaml).unwrap();
        assert!(config.jukebox.check_data_integrity);
        assert_eq!(
            config.storage,
            StorageConfig::FileSystem(FileSystemStorage {
                root_dir: PathBuf::from("/var/lib/jukebox")
            })
        );
    }

    #[test]
    fn test_loader_without_validation() {
        let loader = ConfigLoader::without_validation();
        let json = r#"{"jukebox": {"file_cache_count": 0}}"#;
        assert!(loader.load_from_string(json, ConfigFormat::Json).is_ok());

        let loader = ConfigLoader::new();
        assert!(loader.load_from_string(json, ConfigFormat::Json).is_err());
    }
}
