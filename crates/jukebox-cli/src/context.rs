// CloudJukebox - Music archive and playback over object storage
// Copyright (C) 2025 CloudJukebox Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.


//! Configuration resolution and jukebox construction shared by commands.
//!
//! Precedence, lowest first: built-in defaults, `jukebox.toml`, `JUKEBOX_*`
//! environment variables, command line flags, `<backend>_creds.txt`.

use anyhow::{Context, Result};
use clap::Args;
use jukebox_config::{Config, ConfigLoader, Validator, CONFIG_FILE_NAME};
use jukebox_core::{create_backend, storage_for_name, Jukebox};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Options shared by every command that touches the jukebox
#[derive(Args, Debug, Clone, Default)]
pub struct JukeboxArgs {
    /// Jukebox directory holding config, metadata and staging folders
    #[arg(short = 'd', long, global = true, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Storage backend (memory, fs, s3)
    #[arg(short = 's', long, global = true, value_name = "NAME")]
    pub storage: Option<String>,

    /// Number of song files kept ready in the play directory
    #[arg(long, global = true, value_name = "N")]
    pub cache_count: Option<usize>,

    /// Verify sizes and md5 checksums of downloaded songs
    #[arg(long, global = true)]
    pub integrity_checks: bool,

    /// Compress songs on import
    #[arg(long, global = true)]
    pub compress: bool,

    /// Encrypt songs on import
    #[arg(long, global = true)]
    pub encrypt: bool,

    /// Encryption key
    #[arg(short = 'k', long, global = true, value_name = "KEY", conflicts_with = "keyfile")]
    pub key: Option<String>,

    /// File whose first line is the encryption key
    #[arg(long, global = true, value_name = "PATH")]
    pub keyfile: Option<PathBuf>,

    /// Stop playback after this many songs
    #[arg(short = 'n', long = "tracks", global = true, value_name = "N")]
    pub number_songs: Option<usize>,

    /// Use the local metadata store without downloading the remote snapshot
    #[arg(long, global = true)]
    pub suppress_metadata_sync: bool,
}

impl JukeboxArgs {
    /// Jukebox directory, defaulting to the current directory
    pub fn jukebox_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to get current directory"),
        }
    }

    /// Resolve the effective configuration
    pub async fn load_config(&self) -> Result<Config> {
        let jukebox_dir = self.jukebox_dir()?;
        let mut config = read_config_file(&jukebox_dir).await?;
        let configured = &config.paths.jukebox_dir;
        config.paths.jukebox_dir = if configured.is_absolute() {
            configured.clone()
        } else if configured == Path::new(".") {
            jukebox_dir
        } else {
            jukebox_dir.join(configured)
        };

        let loader = ConfigLoader::without_validation();
        loader
            .apply_env_overrides(&mut config)
            .context("Invalid JUKEBOX_* environment variable")?;
        self.apply_flags(&mut config).await?;

        let creds = config
            .paths
            .jukebox_dir
            .join(ConfigLoader::credentials_file_name(&config));
        if loader
            .apply_credentials_file(&mut config, &creds)
            .await
            .with_context(|| format!("Failed to read {}", creds.display()))?
        {
            debug!(path = %creds.display(), "Applied credentials file");
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    async fn apply_flags(&self, config: &mut Config) -> Result<()> {
        if let Some(name) = &self.storage {
            if name != config.storage.backend_name() {
                config.storage = storage_for_name(name)?;
            }
        }

        let options = &mut config.jukebox;
        if let Some(count) = self.cache_count {
            options.file_cache_count = count;
        }
        if self.integrity_checks {
            options.check_data_integrity = true;
        }
        if self.compress {
            options.use_compression = true;
        }
        if self.encrypt {
            options.use_encryption = true;
        }
        if let Some(key) = &self.key {
            options.encryption_key = Some(key.clone());
        }
        if let Some(path) = &self.keyfile {
            options.encryption_key = Some(read_key_file(path).await?);
        }
        if let Some(count) = self.number_songs {
            options.number_songs = count;
        }
        if self.suppress_metadata_sync {
            options.suppress_metadata_download = true;
        }
        Ok(())
    }

    /// Load the configuration, connect the backend and open the jukebox
    pub async fn open(&self) -> Result<Jukebox> {
        let config = self.load_config().await?;
        let storage = create_backend(&config.storage, &config.paths.jukebox_dir)
            .await
            .context("Failed to initialize storage backend")?;
        Jukebox::open(config, storage)
            .await
            .context("Failed to open jukebox")
    }
}

async fn read_config_file(jukebox_dir: &Path) -> Result<Config> {
    let path = jukebox_dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(Config::default());
    }
    ConfigLoader::without_validation()
        .load_file(&path)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))
}

async fn read_key_file(path: &Path) -> Result<String> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    let key = content.lines().next().unwrap_or_default().trim().to_string();
    if key.is_empty() {
        anyhow::bail!("Key file {} is empty", path.display());
    }
    Ok(key)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jukebox_config::StorageConfig;

    fn args_for(dir: &Path) -> JukeboxArgs {
        JukeboxArgs {
            dir: Some(dir.to_path_buf()),
            ..JukeboxArgs::default()
        }
    }

    #[tokio::test]
    async fn test_defaults_without_config_file() {
        let temp = tempfile::tempdir().unwrap();
        let config = args_for(temp.path()).load_config().await.unwrap();
        assert_eq!(config.paths.jukebox_dir, temp.path());
        assert_eq!(config.storage.backend_name(), "fs");
    }

    #[tokio::test]
    async fn test_flags_override_file() {
        let temp = tempfile::tempdir().unwrap();
        tokio::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[jukebox]\nfile_cache_count = 5\nnumber_songs = 2\n",
        )
        .await
        .unwrap();

        let args = JukeboxArgs {
            storage: Some("memory".to_string()),
            number_songs: Some(7),
            compress: true,
            ..args_for(temp.path())
        };
        let config = args.load_config().await.unwrap();
        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(config.jukebox.file_cache_count, 5);
        assert_eq!(config.jukebox.number_songs, 7);
        assert!(config.jukebox.use_compression);
    }

    #[tokio::test]
    async fn test_keyfile_first_line_is_key() {
        let temp = tempfile::tempdir().unwrap();
        let keyfile = temp.path().join("jukebox.key");
        tokio::fs::write(&keyfile, "layla\nignored\n").await.unwrap();

        let args = JukeboxArgs {
            encrypt: true,
            keyfile: Some(keyfile),
            ..args_for(temp.path())
        };
        let config = args.load_config().await.unwrap();
        assert_eq!(config.jukebox.encryption_key.as_deref(), Some("layla"));
    }

    #[tokio::test]
    async fn test_unknown_storage_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let args = JukeboxArgs {
            storage: Some("tape".to_string()),
            ..args_for(temp.path())
        };
        let err = args.load_config().await.unwrap_err();
        assert!(format!("{:#}", err).contains("tape"));
    }
}
