use crate::error::{ConfigError, ConfigResult};
use crate::schema::*;

/// Validator for configuration settings
pub trait Validator {
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.storage.validate()?;
        self.jukebox.validate()?;
        self.paths.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl Validator for StorageConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self {
            StorageConfig::Memory => Ok(()),
            StorageConfig::FileSystem(fs) => fs.validate(),
            StorageConfig::S3(s3) => s3.validate(),
        }
    }
}

impl Validator for FileSystemStorage {
    fn validate(&self) -> ConfigResult<()> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("storage.root_dir".to_string()));
        }
        Ok(())
    }
}

impl Validator for S3Storage {
    fn validate(&self) -> ConfigResult<()> {
        if self.region.is_empty() {
            return Err(ConfigError::MissingRequired("storage.region".to_string()));
        }

        let has_access = self.access_key.as_deref().is_some_and(|k| !k.is_empty());
        let has_secret = self.secret_key.as_deref().is_some_and(|k| !k.is_empty());
        if !has_access {
            return Err(ConfigError::MissingRequired("storage.access_key".to_string()));
        }
        if !has_secret {
            return Err(ConfigError::MissingRequired("storage.secret_key".to_string()));
        }

        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::invalid_value(
                    "storage.endpoint",
                    format!("must start with http:// or https://, got {}", endpoint),
                ));
            }
        }

        if let Some(prefix) = &self.container_prefix {
            if !prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                return Err(ConfigError::invalid_value(
                    "storage.container_prefix",
                    "must contain only lowercase letters, digits, and hyphens",
                ));
            }
        }

        Ok(())
    }
}

impl Validator for JukeboxOptions {
    fn validate(&self) -> ConfigResult<()> {
        if self.file_cache_count == 0 {
            return Err(ConfigError::invalid_value(
                "jukebox.file_cache_count",
                "must be at least 1",
            ));
        }

        if self.use_encryption
            && self
                .encryption_key
                .as_deref()
                .is_none_or(|key| key.is_empty())
        {
            return Err(ConfigError::ConflictingValues(
                "jukebox.use_encryption is set but jukebox.encryption_key is empty".to_string(),
            ));
        }

        if self.pause_poll_ms == 0 {
            return Err(ConfigError::invalid_value(
                "jukebox.pause_poll_ms",
                "must be greater than 0",
            ));
        }

        if let Some(player) = &self.audio_player {
            if player.first().is_none_or(|program| program.is_empty()) {
                return Err(ConfigError::invalid_value(
                    "jukebox.audio_player",
                    "must name a program",
                ));
            }
        }

        Ok(())
    }
}

impl Validator for PathsConfig {
    fn validate(&self) -> ConfigResult<()> {
        let named = [
            ("paths.song_import_dir", &self.song_import_dir),
            ("paths.playlist_import_dir", &self.playlist_import_dir),
            ("paths.album_art_import_dir", &self.album_art_import_dir),
            ("paths.song_play_dir", &self.song_play_dir),
            ("paths.metadata_db_file", &self.metadata_db_file),
        ];
        for (field, path) in named {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::MissingRequired(field.to_string()));
            }
        }
        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        let valid_levels = ["debug", "info", "warn", "error", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        Ok(())
    }
}
