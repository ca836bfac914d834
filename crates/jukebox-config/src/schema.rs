use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up inside a jukebox directory
pub const CONFIG_FILE_NAME: &str = "jukebox.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Storage backend configuration
    pub storage: StorageConfig,

    /// Jukebox behaviour (cache window, transforms, playback)
    pub jukebox: JukeboxOptions,

    /// Local directory layout
    pub paths: PathsConfig,

    /// Observability settings
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load `jukebox.toml` from a jukebox directory, falling back to defaults
    pub async fn load(jukebox_dir: impl AsRef<Path>) -> ConfigResult<Self> {
        use crate::ConfigLoader;
        let config_path = jukebox_dir.as_ref().join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            let mut config = Self::default();
            config.paths.jukebox_dir = jukebox_dir.as_ref().to_path_buf();
            return Ok(config);
        }

        ConfigLoader::new().load_file(&config_path).await
    }

    /// Render the configuration as pretty TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializationError(e.to_string()))
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "backend")]
pub enum StorageConfig {
    /// Volatile in-process storage
    #[serde(rename = "memory")]
    Memory,

    /// Local directory tree, one subdirectory per container
    #[serde(rename = "fs")]
    FileSystem(FileSystemStorage),

    /// S3-compatible object storage
    #[serde(rename = "s3")]
    S3(S3Storage),
}

impl StorageConfig {
    /// Factory key for this backend
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::Memory => "memory",
            StorageConfig::FileSystem(_) => "fs",
            StorageConfig::S3(_) => "s3",
        }
    }
}

/// Filesystem storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSystemStorage {
    /// Root directory holding the containers
    #[serde(default = "default_fs_root_dir")]
    pub root_dir: PathBuf,
}

/// S3-compatible storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct S3Storage {
    /// Endpoint URL (MinIO, Garage, ...); `None` means AWS
    #[serde(default)]
    pub endpoint: Option<String>,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Access key ID
    #[serde(default)]
    pub access_key: Option<String>,

    /// Secret access key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Prefix prepended to every bucket name
    #[serde(default)]
    pub container_prefix: Option<String>,

    /// Use path-style addressing
    #[serde(default = "default_true")]
    pub path_style: bool,
}

/// Jukebox behaviour options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JukeboxOptions {
    /// Number of decoded song files kept in the play directory
    #[serde(default = "default_file_cache_count")]
    pub file_cache_count: usize,

    /// Verify md5 checksums of downloaded songs
    #[serde(default)]
    pub check_data_integrity: bool,

    /// Compress songs on import
    #[serde(default)]
    pub use_compression: bool,

    /// Encrypt songs on import
    #[serde(default)]
    pub use_encryption: bool,

    /// Encryption key (normalized to 32 bytes)
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// Initialization vector (normalized to 16 bytes)
    #[serde(default)]
    pub encryption_iv: Option<String>,

    /// Stop playback after this many songs (0 plays forever)
    #[serde(default)]
    pub number_songs: usize,

    /// Work from the local metadata store without downloading the remote snapshot
    #[serde(default)]
    pub suppress_metadata_download: bool,

    /// Length of a simulated play when no audio player is available
    #[serde(default = "default_song_play_length_seconds")]
    pub song_play_length_seconds: u64,

    /// Audio player command line; the song path is appended
    #[serde(default)]
    pub audio_player: Option<Vec<String>>,

    /// Pause flag polling interval
    #[serde(default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,
}

/// Local directory layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Base directory; relative paths below resolve against it
    #[serde(default = "default_jukebox_dir")]
    pub jukebox_dir: PathBuf,

    #[serde(default = "default_song_import_dir")]
    pub song_import_dir: PathBuf,

    #[serde(default = "default_playlist_import_dir")]
    pub playlist_import_dir: PathBuf,

    #[serde(default = "default_album_art_import_dir")]
    pub album_art_import_dir: PathBuf,

    #[serde(default = "default_song_play_dir")]
    pub song_play_dir: PathBuf,

    #[serde(default = "default_metadata_db_file")]
    pub metadata_db_file: PathBuf,
}

impl PathsConfig {
    /// Paths rooted at `jukebox_dir` with default sub-directory names
    pub fn rooted_at(jukebox_dir: impl Into<PathBuf>) -> Self {
        PathsConfig {
            jukebox_dir: jukebox_dir.into(),
            ..PathsConfig::default()
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.jukebox_dir.join(path)
        }
    }

    /// Staging directory for song files
    pub fn song_import_path(&self) -> PathBuf {
        self.resolve(&self.song_import_dir)
    }

    /// Staging directory for playlist descriptors
    pub fn playlist_import_path(&self) -> PathBuf {
        self.resolve(&self.playlist_import_dir)
    }

    /// Staging directory for album art
    pub fn album_art_import_path(&self) -> PathBuf {
        self.resolve(&self.album_art_import_dir)
    }

    /// Directory holding the prefetch window
    pub fn song_play_path(&self) -> PathBuf {
        self.resolve(&self.song_play_dir)
    }

    /// Local metadata database file
    pub fn metadata_db_path(&self) -> PathBuf {
        self.resolve(&self.metadata_db_file)
    }

    /// File holding the pid of a running playback session
    pub fn pid_file_path(&self) -> PathBuf {
        self.jukebox_dir.join("jukebox.pid")
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_fs_root_dir() -> PathBuf {
    PathBuf::from("jukebox-storage")
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_file_cache_count() -> usize {
    3
}

fn default_song_play_length_seconds() -> u64 {
    20
}

fn default_pause_poll_ms() -> u64 {
    500
}

fn default_jukebox_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_song_import_dir() -> PathBuf {
    PathBuf::from("song-import")
}

fn default_playlist_import_dir() -> PathBuf {
    PathBuf::from("playlist-import")
}

fn default_album_art_import_dir() -> PathBuf {
    PathBuf::from("album-art-import")
}

fn default_song_play_dir() -> PathBuf {
    PathBuf::from("song-play")
}

fn default_metadata_db_file() -> PathBuf {
    PathBuf::from("jukebox_db.sqlite3")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig::FileSystem(FileSystemStorage::default()),
            jukebox: JukeboxOptions::default(),
            paths: PathsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for FileSystemStorage {
    fn default() -> Self {
        FileSystemStorage {
            root_dir: default_fs_root_dir(),
        }
    }
}

impl Default for S3Storage {
    fn default() -> Self {
        S3Storage {
            endpoint: None,
            region: default_region(),
            access_key: None,
            secret_key: None,
            container_prefix: None,
            path_style: true,
        }
    }
}

impl Default for JukeboxOptions {
    fn default() -> Self {
        JukeboxOptions {
            file_cache_count: default_file_cache_count(),
            check_data_integrity: false,
            use_compression: false,
            use_encryption: false,
            encryption_key: None,
            encryption_iv: None,
            number_songs: 0,
            suppress_metadata_download: false,
            song_play_length_seconds: default_song_play_length_seconds(),
            audio_player: None,
            pause_poll_ms: default_pause_poll_ms(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            jukebox_dir: default_jukebox_dir(),
            song_import_dir: default_song_import_dir(),
            playlist_import_dir: default_playlist_import_dir(),
            album_art_import_dir: default_album_art_import_dir(),
            song_play_dir: default_song_play_dir(),
            metadata_db_file: default_metadata_db_file(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        ObservabilityConfig {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}
