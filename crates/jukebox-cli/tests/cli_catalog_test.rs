// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 CloudJukebox Contributors

//! CLI catalog tests: listings, deletes, storage administration and
//! metadata snapshot sync.

use jukebox_test_utils::*;
use predicates::prelude::*;

fn stocked_jukebox() -> TestJukebox {
    let jukebox = TestJukebox::new();
    jukebox.stage_song("Cream--Disraeli-Gears--Sunshine-Of-Your-Love.mp3", 120);
    jukebox.stage_song("Cream--Disraeli-Gears--Strange-Brew.flac", 130);
    jukebox.stage_song("The-Who--Baba-ORiley.mp3", 140);
    jukebox.import_songs();
    jukebox
}

// ============================================================================
// Listings
// ============================================================================

#[test]
fn test_list_songs_filters() {
    let jukebox = stocked_jukebox();

    jukebox
        .cmd()
        .args(&["list-songs", "--artist", "Cream"])
        .run_success()
        .stdout(predicate::str::contains("Cream, Sunshine Of Your Love"))
        .stdout(predicate::str::contains("The Who").not());

    jukebox
        .cmd()
        .args(&["list-songs", "--format", "flac"])
        .run_success()
        .stdout(predicate::str::contains("Cream, Strange Brew"))
        .stdout(predicate::str::contains("Sunshine").not());
}

#[test]
fn test_list_artists_and_albums() {
    let jukebox = stocked_jukebox();

    jukebox
        .cmd()
        .arg("list-artists")
        .run_success()
        .stdout(predicate::str::contains("Cream"))
        .stdout(predicate::str::contains("The Who"));

    jukebox
        .cmd()
        .arg("list-albums")
        .run_success()
        .stdout(predicate::str::contains("Disraeli Gears (Cream)"));
}

#[test]
fn test_show_album_falls_back_to_prefix() {
    let jukebox = stocked_jukebox();

    jukebox
        .cmd()
        .args(&["show-album", "Cream", "Disraeli Gears"])
        .run_success()
        .stdout(predicate::str::contains("Strange Brew"))
        .stdout(predicate::str::contains("Sunshine Of Your Love"));

    jukebox
        .cmd()
        .args(&["show-album", "Cream", "Wheels Of Fire"])
        .run_failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_show_playlist_reports_missing_songs() {
    let jukebox = stocked_jukebox();
    jukebox.stage_playlist(
        "Mixed",
        &["The-Who--Baba-ORiley.mp3", "Cream--White-Room.mp3"],
    );
    jukebox.cmd().arg("import-playlists").run_success();

    jukebox
        .cmd()
        .args(&["show-playlist", "Mixed"])
        .run_success()
        .stdout(predicate::str::contains("The Who, Baba ORiley"))
        .stdout(predicate::str::contains("not found: Cream--White-Room.mp3"));

    jukebox
        .cmd()
        .args(&["show-playlist", "Nope"])
        .run_failure();
}

// ============================================================================
// Deletes
// ============================================================================

#[test]
fn test_delete_song() {
    let jukebox = stocked_jukebox();
    let uid = "The-Who--Baba-ORiley.mp3";

    jukebox
        .cmd()
        .args(&["delete-song", uid])
        .run_success()
        .stdout(predicate::str::contains("Deleted song"));

    assert_object_absent(&jukebox, "w-artist-songs", uid);
    assert_song_not_listed(&jukebox, "Baba ORiley");

    jukebox
        .cmd()
        .args(&["delete-song", uid])
        .run_failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_delete_artist_and_album() {
    let jukebox = stocked_jukebox();

    jukebox
        .cmd()
        .args(&["delete-album", "Cream", "Disraeli Gears"])
        .run_success()
        .stdout(predicate::str::contains("Deleted 2 songs"));
    assert_song_not_listed(&jukebox, "Cream");

    jukebox
        .cmd()
        .args(&["delete-artist", "The Who"])
        .run_success()
        .stdout(predicate::str::contains("Deleted 1 songs"));
    assert_song_not_listed(&jukebox, "The Who");
}

#[test]
fn test_delete_playlist() {
    let jukebox = stocked_jukebox();
    jukebox.stage_playlist("Road Trip", &["The-Who--Baba-ORiley.mp3"]);
    jukebox.cmd().arg("import-playlists").run_success();

    jukebox
        .cmd()
        .args(&["delete-playlist", "Road Trip"])
        .run_success();
    assert_object_absent(&jukebox, "playlists", "Road-Trip.json");

    jukebox
        .cmd()
        .arg("list-playlists")
        .run_success()
        .stdout(predicate::str::contains("Road Trip").not());
}

// ============================================================================
// Storage administration and snapshot sync
// ============================================================================

#[test]
fn test_init_storage_and_list_containers() {
    let jukebox = TestJukebox::new();

    jukebox
        .cmd()
        .arg("init-storage")
        .run_success()
        .stdout(predicate::str::contains("40 containers created"));

    jukebox
        .cmd()
        .arg("list-containers")
        .run_success()
        .stdout(predicate::str::contains("music-metadata"))
        .stdout(predicate::str::contains("album-art"))
        .stdout(predicate::str::contains("0-artist-songs"))
        .stdout(predicate::str::contains("z-artist-songs"));

    jukebox
        .cmd()
        .arg("init-storage")
        .run_success()
        .stdout(predicate::str::contains("0 containers created"));
}

#[test]
fn test_snapshot_restores_local_metadata() {
    let jukebox = stocked_jukebox();
    std::fs::remove_file(jukebox.path().join("jukebox_db.sqlite3")).unwrap();

    jukebox
        .cmd()
        .args(&["--suppress-metadata-sync", "list-songs"])
        .run_success()
        .stdout(predicate::str::contains("Cream").not());

    std::fs::remove_file(jukebox.path().join("jukebox_db.sqlite3")).unwrap();
    assert_song_listed(&jukebox, "Cream, Strange Brew");
}

#[test]
fn test_upload_metadata_db() {
    let jukebox = TestJukebox::new();

    jukebox
        .cmd()
        .arg("upload-metadata-db")
        .run_success()
        .stdout(predicate::str::contains("Metadata DB uploaded"));
    assert_object_stored(&jukebox, "music-metadata", "jukebox_db.sqlite3");
}

#[test]
fn test_unknown_storage_backend() {
    let jukebox = TestJukebox::new();

    jukebox
        .cmd()
        .args(&["--storage", "swift", "list-songs"])
        .run_failure()
        .stderr(predicate::str::contains("unsupported storage system 'swift'"));
}

#[test]
fn test_completions() {
    jukebox_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jukebox"));
}
