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

//! Throwaway jukebox directories for integration tests.

use crate::cli::JukeboxCommand;
use crate::fixtures::TestFixtures;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory name of the filesystem backend root inside a test jukebox
pub const STORAGE_DIR: &str = "storage";

/// A jukebox directory with filesystem storage and an instant audio player
///
/// The player is `true`, so playback finishes as soon as each song is handed
/// over. The directory is deleted when this value is dropped.
pub struct TestJukebox {
    temp_dir: TempDir,
}

impl TestJukebox {
    /// Create a jukebox with default options.
    pub fn new() -> Self {
        Self::with_options("")
    }

    /// Create a jukebox, appending `jukebox_options` (TOML key/value lines)
    /// to its `[jukebox]` table.
    pub fn with_options(jukebox_options: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = format!(
            "[storage]\nbackend = \"fs\"\nroot_dir = \"{}\"\n\n\
             [jukebox]\naudio_player = [\"true\"]\nsong_play_length_seconds = 1\n\
             pause_poll_ms = 20\n{}\n",
            STORAGE_DIR, jukebox_options
        );
        fs::write(temp_dir.path().join("jukebox.toml"), config)
            .expect("Failed to write jukebox.toml");
        Self { temp_dir }
    }

    /// Get the jukebox directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Root of the filesystem storage backend.
    pub fn storage_root(&self) -> PathBuf {
        self.path().join(STORAGE_DIR)
    }

    /// Path of a stored object.
    pub fn object_path(&self, container: &str, object: &str) -> PathBuf {
        self.storage_root().join(container).join(object)
    }

    /// Stage a song file of `size` bytes for import.
    pub fn stage_song(&self, file_name: &str, size: usize) -> PathBuf {
        self.stage("song-import", file_name, &TestFixtures::song_bytes(size))
    }

    /// Stage a playlist descriptor listing `objects`.
    pub fn stage_playlist(&self, name: &str, objects: &[&str]) -> PathBuf {
        let json = TestFixtures::playlist_json(name, objects);
        self.stage(
            "playlist-import",
            &format!("{}.json", name.replace(' ', "-")),
            json.as_bytes(),
        )
    }

    /// Stage an album art image.
    pub fn stage_album_art(&self, file_name: &str) -> PathBuf {
        self.stage("album-art-import", file_name, &TestFixtures::album_art())
    }

    fn stage(&self, dir: &str, file_name: &str, data: &[u8]) -> PathBuf {
        let dir = self.path().join(dir);
        fs::create_dir_all(&dir).expect("Failed to create staging directory");
        let path = dir.join(file_name);
        fs::write(&path, data).expect("Failed to stage file");
        path
    }

    /// Command running against this jukebox.
    pub fn cmd(&self) -> JukeboxCommand {
        JukeboxCommand::new(self.path())
    }

    /// Run `import-songs` and assert success.
    pub fn import_songs(&self) {
        self.cmd().arg("import-songs").run_success();
    }
}

impl Default for TestJukebox {
    fn default() -> Self {
        Self::new()
    }
}
