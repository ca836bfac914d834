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

//! Sample data for staged imports.

/// Test fixture data
pub struct TestFixtures;

impl TestFixtures {
    /// Song-like binary content of `size` bytes.
    ///
    /// Starts with an ID3 tag marker followed by a predictable pattern.
    pub fn song_bytes(size: usize) -> Vec<u8> {
        let mut data = b"ID3\x04\x00".to_vec();
        data.extend((0..size).map(|i| (i * 31 % 251) as u8));
        data.truncate(size);
        data
    }

    /// Playlist descriptor JSON listing songs by object name.
    pub fn playlist_json(name: &str, objects: &[&str]) -> String {
        let songs: Vec<String> = objects
            .iter()
            .map(|object| format!("{{\"object\": \"{}\"}}", object))
            .collect();
        format!(
            "{{\"name\": \"{}\", \"description\": \"test playlist\", \"songs\": [{}]}}",
            name,
            songs.join(", ")
        )
    }

    /// A minimal JPEG header, enough to stand in for album art.
    pub fn album_art() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0xFF, 0xD9]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_bytes_size() {
        assert_eq!(TestFixtures::song_bytes(100).len(), 100);
        assert_eq!(TestFixtures::song_bytes(3), b"ID3".to_vec());
    }

    #[test]
    fn test_playlist_json_lists_objects() {
        let json = TestFixtures::playlist_json("Road Trip", &["Cream--Badge.mp3"]);
        assert!(json.contains("\"name\": \"Road Trip\""));
        assert!(json.contains("{\"object\": \"Cream--Badge.mp3\"}"));
    }
}
