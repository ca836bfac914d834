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

//! Object and container naming
//!
//! Song files are staged with names of the form
//! `Artist-Name--Album-Name--Song-Name.ext` (or the legacy
//! `Artist-Name--Song-Name.ext`). The same encoded name, plus a suffix for the
//! applied transforms, becomes the object key, and the artist picks one of the
//! per-letter shard containers.
//!
//! Encoding strips `'`, `!` and `?` and turns spaces into dashes. Decoding only
//! reverses the dashes, so punctuation does not survive a round trip and names
//! that contained dashes come back with spaces.

/// Separator between artist, album and song in an encoded name
pub const FIELD_SEPARATOR: &str = "--";

/// Suffix shared by all song shard containers
pub const SHARD_CONTAINER_SUFFIX: &str = "-artist-songs";

/// Container holding the metadata snapshot
pub const METADATA_CONTAINER: &str = "music-metadata";

/// Object name of the metadata snapshot
pub const METADATA_DB_OBJECT: &str = "jukebox_db.sqlite3";

/// Container holding playlist descriptors
pub const PLAYLIST_CONTAINER: &str = "playlists";

/// Container holding album descriptors
pub const ALBUM_CONTAINER: &str = "albums";

/// Container holding album art
pub const ALBUM_ART_CONTAINER: &str = "album-art";

/// Audio formats accepted by the format filter
pub const AUDIO_FORMATS: &[&str] = &["mp3", "m4a", "flac"];

/// Characters removed by [`encode`]
const STRIPPED_CHARS: &[char] = &['\'', '!', '?'];

/// Transform combination applied to stored songs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerVariant {
    /// Bytes stored as-is
    Plain,
    /// AES encrypted
    Encrypted,
    /// Gzip compressed
    Compressed,
    /// Compressed, then encrypted
    EncryptedCompressed,
}

impl ContainerVariant {
    /// Variant for a pair of transform flags
    pub fn from_flags(encrypted: bool, compressed: bool) -> Self {
        match (encrypted, compressed) {
            (false, false) => ContainerVariant::Plain,
            (true, false) => ContainerVariant::Encrypted,
            (false, true) => ContainerVariant::Compressed,
            (true, true) => ContainerVariant::EncryptedCompressed,
        }
    }

    /// Suffix appended to shard container names
    pub fn container_suffix(self) -> &'static str {
        match self {
            ContainerVariant::Plain => "",
            ContainerVariant::Encrypted => "-e",
            ContainerVariant::Compressed => "-z",
            ContainerVariant::EncryptedCompressed => "-ez",
        }
    }

    /// Suffix appended to object keys
    pub fn object_suffix(self) -> &'static str {
        match self {
            ContainerVariant::Plain => "",
            ContainerVariant::Encrypted => ".e",
            ContainerVariant::Compressed => ".gz",
            ContainerVariant::EncryptedCompressed => ".egz",
        }
    }

    /// Objects of this variant are encrypted
    pub fn is_encrypted(self) -> bool {
        matches!(
            self,
            ContainerVariant::Encrypted | ContainerVariant::EncryptedCompressed
        )
    }

    /// Objects of this variant are compressed
    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            ContainerVariant::Compressed | ContainerVariant::EncryptedCompressed
        )
    }
}

/// Encode a display value for use in object keys
pub fn encode(value: &str) -> String {
    value
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

/// Decode an encoded value back to display form (dashes become spaces)
pub fn decode(value: &str) -> String {
    value.replace('-', " ")
}

/// Object key stem for a song, without file extension
///
/// `album` is omitted for the legacy two-field form.
pub fn object_key(artist: &str, album: Option<&str>, song: &str) -> String {
    match album {
        Some(album) => format!(
            "{}{sep}{}{sep}{}",
            encode(artist),
            encode(album),
            encode(song),
            sep = FIELD_SEPARATOR
        ),
        None => format!("{}{}{}", encode(artist), FIELD_SEPARATOR, encode(song)),
    }
}

/// Key prefix shared by all songs of an artist
pub fn artist_prefix(artist: &str) -> String {
    format!("{}{}", encode(artist), FIELD_SEPARATOR)
}

/// Key prefix shared by all songs of an album
pub fn album_prefix(artist: &str, album: &str) -> String {
    format!(
        "{}{sep}{}{sep}",
        encode(artist),
        encode(album),
        sep = FIELD_SEPARATOR
    )
}

/// Uid of an album reference record
pub fn album_uid(artist: &str, album: &str) -> String {
    format!("{}{}{}", encode(artist), FIELD_SEPARATOR, encode(album))
}

/// Artist, album and song recovered from a staged file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Decoded artist name
    pub artist: String,
    /// Decoded album name, when the file name has one
    pub album: Option<String>,
    /// Decoded song name
    pub song: String,
    /// Everything after the first `.` following the last separator
    pub extension: Option<String>,
}

/// Split a file name into its stem and extension
///
/// The extension starts at the first `.` after the last `--`, so dotted artist
/// names like `R.E.M.` stay intact.
fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    let search_from = file_name
        .rfind(FIELD_SEPARATOR)
        .map(|pos| pos + FIELD_SEPARATOR.len())
        .unwrap_or(0);
    match file_name[search_from..].find('.') {
        Some(dot) => {
            let dot = search_from + dot;
            let ext = &file_name[dot + 1..];
            (&file_name[..dot], (!ext.is_empty()).then_some(ext))
        }
        None => (file_name, None),
    }
}

/// Parse `Artist--Song.ext` or `Artist--Album--Song.ext`
///
/// Returns `None` unless the stem has two or three non-empty fields.
pub fn parse_file_name(file_name: &str) -> Option<ParsedName> {
    let (stem, extension) = split_extension(file_name);
    let fields: Vec<&str> = stem.split(FIELD_SEPARATOR).collect();
    if fields.iter().any(|f| f.is_empty()) {
        return None;
    }

    let (artist, album, song) = match fields.as_slice() {
        [artist, song] => (*artist, None, *song),
        [artist, album, song] => (*artist, Some(*album), *song),
        _ => return None,
    };

    Some(ParsedName {
        artist: decode(artist),
        album: album.map(decode),
        song: decode(song),
        extension: extension.map(str::to_string),
    })
}

/// Audio format of an object key or file name (`mp3`, `flac`, ...)
///
/// Transform suffixes (`.gz`, `.e`, `.egz`) are ignored.
pub fn song_format(key: &str) -> Option<String> {
    let (_, extension) = split_extension(key);
    extension
        .and_then(|ext| ext.split('.').next())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}

/// Letter that picks an artist's shard container
///
/// A leading `A ` or `The ` is skipped, then the first character is used as
/// is, lowercased. Punctuation and non-ASCII letters shard on themselves.
/// An empty name shards on `0`.
pub fn artist_letter(artist: &str) -> char {
    let significant = artist
        .strip_prefix("A ")
        .or_else(|| artist.strip_prefix("The "))
        .unwrap_or(artist);
    significant
        .chars()
        .next()
        .and_then(|c| c.to_lowercase().next())
        .unwrap_or('0')
}

/// Shard container for an artist's songs
pub fn shard_container(artist: &str, variant: ContainerVariant) -> String {
    format!(
        "{}{}{}",
        artist_letter(artist),
        SHARD_CONTAINER_SUFFIX,
        variant.container_suffix()
    )
}

/// Every shard container of a variant (`0`-`9` and `a`-`z`)
pub fn all_shard_containers(variant: ContainerVariant) -> Vec<String> {
    ('0'..='9')
        .chain('a'..='z')
        .map(|letter| {
            format!(
                "{}{}{}",
                letter,
                SHARD_CONTAINER_SUFFIX,
                variant.container_suffix()
            )
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_strips_punctuation() {
        assert_eq!(encode("Don't Stop Me Now!"), "Dont-Stop-Me-Now");
        assert_eq!(encode("Who Are You?"), "Who-Are-You");
        assert_eq!(decode("Tales-Of-Brave-Ulysses"), "Tales Of Brave Ulysses");
    }

    #[test]
    fn test_object_key_forms() {
        assert_eq!(
            object_key("Cream", Some("Disraeli Gears"), "Tales Of Brave Ulysses"),
            "Cream--Disraeli-Gears--Tales-Of-Brave-Ulysses"
        );
        assert_eq!(object_key("Cream", None, "Badge"), "Cream--Badge");
    }

    #[test]
    fn test_parse_three_field_name() {
        let parsed =
            parse_file_name("Cream--Disraeli-Gears--Tales-Of-Brave-Ulysses.mp3").unwrap();
        assert_eq!(parsed.artist, "Cream");
        assert_eq!(parsed.album.as_deref(), Some("Disraeli Gears"));
        assert_eq!(parsed.song, "Tales Of Brave Ulysses");
        assert_eq!(parsed.extension.as_deref(), Some("mp3"));
    }

    #[test]
    fn test_parse_legacy_and_invalid_names() {
        let parsed = parse_file_name("The-Who--Baba-ORiley.flac").unwrap();
        assert_eq!(parsed.artist, "The Who");
        assert_eq!(parsed.album, None);

        assert!(parse_file_name("no-separator.mp3").is_none());
        assert!(parse_file_name("a--b--c--d.mp3").is_none());
        assert!(parse_file_name("--Song.mp3").is_none());
    }

    #[test]
    fn test_dotted_artist_keeps_its_dots() {
        let parsed = parse_file_name("R.E.M.--Losing-My-Religion.m4a").unwrap();
        assert_eq!(parsed.artist, "R.E.M.");
        assert_eq!(parsed.extension.as_deref(), Some("m4a"));
    }

    #[test]
    fn test_song_format_ignores_transform_suffix() {
        assert_eq!(
            song_format("Cream--Disraeli-Gears--Tales-Of-Brave-Ulysses.mp3.egz").as_deref(),
            Some("mp3")
        );
        assert_eq!(song_format("Cream--Badge.FLAC").as_deref(), Some("flac"));
        assert_eq!(song_format("Cream--Badge"), None);
    }

    #[test]
    fn test_shard_letters() {
        assert_eq!(artist_letter("The Who"), 'w');
        assert_eq!(artist_letter("A Flock of Seagulls"), 'f');
        assert_eq!(artist_letter("Cream"), 'c');
        assert_eq!(artist_letter("10cc"), '1');
        assert_eq!(artist_letter(""), '0');
    }

    #[test]
    fn test_shard_letter_is_first_character() {
        assert_eq!(artist_letter("Édith Piaf"), 'é');
        assert_eq!(artist_letter("The Édith Band"), 'é');
        assert_eq!(artist_letter("(hed) p.e."), '(');
        assert_eq!(
            shard_container("Édith Piaf", ContainerVariant::Plain),
            "é-artist-songs"
        );
        assert_eq!(
            shard_container("(hed) p.e.", ContainerVariant::Plain),
            "(-artist-songs"
        );
    }

    #[test]
    fn test_shard_container_variants() {
        assert_eq!(
            shard_container("Cream", ContainerVariant::from_flags(true, true)),
            "c-artist-songs-ez"
        );
        assert_eq!(
            shard_container("The Who", ContainerVariant::Plain),
            "w-artist-songs"
        );
        assert_eq!(ContainerVariant::Compressed.object_suffix(), ".gz");
        assert_eq!(all_shard_containers(ContainerVariant::Encrypted).len(), 36);
    }
}
