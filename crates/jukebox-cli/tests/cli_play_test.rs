// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 CloudJukebox Contributors

//! CLI playback tests
//!
//! The test jukebox plays songs with `true`, so each song finishes as soon as
//! it is handed to the player.

use jukebox_test_utils::*;
use predicates::prelude::*;

fn play_dir_files(jukebox: &TestJukebox) -> Vec<String> {
    match std::fs::read_dir(jukebox.path().join("song-play")) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_play_stops_after_track_limit() {
    let jukebox = TestJukebox::new();
    jukebox.stage_song("Cream--Badge.mp3", 100);
    jukebox.stage_song("Cream--White-Room.mp3", 110);
    jukebox.import_songs();

    jukebox
        .cmd()
        .args(&["play", "--tracks", "3"])
        .run_success()
        .stdout(predicate::str::contains("3 songs played"));

    assert!(!jukebox.path().join("jukebox.pid").exists());
    assert!(play_dir_files(&jukebox)
        .iter()
        .all(|name| !name.ends_with(".download")));
}

#[test]
fn test_play_encrypted_with_integrity_checks() {
    let jukebox = TestJukebox::with_options(
        "use_compression = true\nuse_encryption = true\nencryption_key = \"layla\"",
    );
    jukebox.stage_song("Derek-And-The-Dominos--Layla.mp3", 500);
    jukebox.import_songs();

    jukebox
        .cmd()
        .args(&["--integrity-checks", "play", "-n", "1"])
        .run_success()
        .stdout(predicate::str::contains("1 songs played"));
}

#[test]
fn test_shuffle_play_with_artist_filter() {
    let jukebox = TestJukebox::new();
    jukebox.stage_song("Cream--Badge.mp3", 100);
    jukebox.stage_song("The-Who--My-Generation.mp3", 100);
    jukebox.import_songs();

    jukebox
        .cmd()
        .args(&["shuffle-play", "--artist", "The Who", "--tracks", "2"])
        .run_success()
        .stdout(predicate::str::contains("2 songs played"));
}

#[test]
fn test_play_without_songs_fails() {
    let jukebox = TestJukebox::new();

    jukebox
        .cmd()
        .args(&["play", "--tracks", "1"])
        .run_failure()
        .stderr(predicate::str::contains("No songs to play"));
}

#[test]
fn test_play_playlist_and_album() {
    let jukebox = TestJukebox::new();
    jukebox.stage_song("Cream--Disraeli-Gears--Strange-Brew.mp3", 100);
    jukebox.stage_song("Cream--Disraeli-Gears--SWLABR.mp3", 100);
    jukebox.import_songs();
    jukebox.stage_playlist("Brew", &["Cream--Disraeli-Gears--Strange-Brew.mp3"]);
    jukebox.cmd().arg("import-playlists").run_success();

    jukebox
        .cmd()
        .args(&["play-playlist", "Brew", "--tracks", "1"])
        .run_success()
        .stdout(predicate::str::contains("1 songs played"));

    jukebox
        .cmd()
        .args(&["play-album", "Cream", "Disraeli Gears", "--tracks", "2"])
        .run_success()
        .stdout(predicate::str::contains("2 songs played"));
}

#[test]
fn test_control_commands_need_running_player() {
    let jukebox = TestJukebox::new();

    jukebox
        .cmd()
        .arg("toggle-pause")
        .run_failure()
        .stderr(predicate::str::contains("No running jukebox"));

    jukebox
        .cmd()
        .arg("advance")
        .run_failure()
        .stderr(predicate::str::contains("No running jukebox"));
}
