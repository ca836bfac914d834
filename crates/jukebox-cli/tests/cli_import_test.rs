// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 CloudJukebox Contributors

//! CLI import tests
//!
//! Songs, playlists and album art staged in a jukebox directory and imported
//! into filesystem storage.

use jukebox_test_utils::*;
use predicates::prelude::*;

const BADGE: &str = "Cream--Badge.mp3";
const ULYSSES: &str = "Cream--Disraeli-Gears--Tales-Of-Brave-Ulysses.mp3";

// ============================================================================
// Songs
// ============================================================================

#[test]
fn test_import_songs_plain() {
    let jukebox = TestJukebox::new();
    jukebox.stage_song(BADGE, 100);
    jukebox.stage_song(ULYSSES, 250);

    jukebox
        .cmd()
        .arg("import-songs")
        .run_success()
        .stdout(predicate::str::contains("2 song files imported"))
        .stdout(predicate::str::contains("average upload throughput ="))
        .stdout(predicate::str::contains("KB/sec"));

    assert_object_stored(&jukebox, "c-artist-songs", BADGE);
    assert_object_stored(&jukebox, "c-artist-songs", ULYSSES);
    assert_object_stored(&jukebox, "music-metadata", "jukebox_db.sqlite3");

    assert_song_listed(&jukebox, "Cream, Badge");
    assert_song_listed(&jukebox, "Cream, Tales Of Brave Ulysses");
}

#[test]
fn test_import_songs_compressed_and_encrypted() {
    let jukebox = TestJukebox::new();
    jukebox.stage_song(BADGE, 100);

    jukebox
        .cmd()
        .args(&["--compress", "--encrypt", "--key", "sunshine", "import-songs"])
        .run_success()
        .stdout(predicate::str::contains("1 song files imported"));

    assert_object_stored(&jukebox, "c-artist-songs-ez", "Cream--Badge.mp3.egz");
    assert_object_absent(&jukebox, "c-artist-songs", BADGE);

    let stored = std::fs::read(jukebox.object_path("c-artist-songs-ez", "Cream--Badge.mp3.egz"))
        .unwrap();
    assert_eq!(stored.len() % 16, 0);
    assert_ne!(stored, TestFixtures::song_bytes(100));
}

#[test]
fn test_import_songs_compressed_only() {
    let jukebox = TestJukebox::with_options("use_compression = true");
    jukebox.stage_song(BADGE, 4096);

    jukebox.import_songs();
    assert_object_stored(&jukebox, "c-artist-songs-z", "Cream--Badge.mp3.gz");
}

#[test]
fn test_encrypt_without_key_fails() {
    let jukebox = TestJukebox::new();
    jukebox.stage_song(BADGE, 100);

    jukebox
        .cmd()
        .args(&["--encrypt", "import-songs"])
        .run_failure()
        .stderr(predicate::str::contains("encryption_key"));

    assert_object_absent(&jukebox, "c-artist-songs-e", "Cream--Badge.mp3.e");
}

#[test]
fn test_unparsable_and_empty_files_are_skipped() {
    let jukebox = TestJukebox::new();
    jukebox.stage_song("just-a-song.mp3", 100);
    jukebox.stage_song("Cream--Badge", 100);
    jukebox.stage_song("Cream--Crossroads.mp3", 0);

    jukebox
        .cmd()
        .arg("import-songs")
        .run_success()
        .stdout(predicate::str::contains("0 song files imported"))
        .stdout(predicate::str::contains("Skipped"));

    assert_object_absent(&jukebox, "music-metadata", "jukebox_db.sqlite3");
}

#[test]
fn test_empty_import_directory() {
    let jukebox = TestJukebox::new();

    jukebox
        .cmd()
        .arg("import-songs")
        .run_success()
        .stdout(predicate::str::contains("0 song files imported"));
}

#[test]
fn test_reimport_keeps_single_listing() {
    let jukebox = TestJukebox::new();
    jukebox.stage_song(BADGE, 100);
    jukebox.import_songs();
    jukebox.import_songs();

    let output = jukebox.cmd().arg("list-songs").into_inner().output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("Cream, Badge").count(), 1);
}

// ============================================================================
// Playlists and album art
// ============================================================================

#[test]
fn test_import_playlists() {
    let jukebox = TestJukebox::new();
    jukebox.stage_song(BADGE, 100);
    jukebox.import_songs();
    jukebox.stage_playlist("Road Trip", &[BADGE]);

    jukebox
        .cmd()
        .arg("import-playlists")
        .run_success()
        .stdout(predicate::str::contains("1 playlists imported"));

    assert_object_stored(&jukebox, "playlists", "Road-Trip.json");
    jukebox
        .cmd()
        .arg("list-playlists")
        .run_success()
        .stdout(predicate::str::contains("Road Trip"));
}

#[test]
fn test_import_album_art() {
    let jukebox = TestJukebox::new();
    jukebox.stage_album_art("Cream--Disraeli-Gears.jpg");

    jukebox
        .cmd()
        .arg("import-album-art")
        .run_success()
        .stdout(predicate::str::contains("1 album art files imported"));

    let stored =
        std::fs::read(jukebox.object_path("album-art", "Cream--Disraeli-Gears.jpg")).unwrap();
    assert_eq!(stored, TestFixtures::album_art());
}
