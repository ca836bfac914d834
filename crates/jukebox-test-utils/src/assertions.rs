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

//! Assertions over a test jukebox's stored objects and listings.

use crate::jukebox::TestJukebox;
use predicates::prelude::*;

/// Assert that an object exists in the filesystem backend.
pub fn assert_object_stored(jukebox: &TestJukebox, container: &str, object: &str) {
    let path = jukebox.object_path(container, object);
    assert!(
        path.is_file(),
        "object {}/{} should exist at {:?}",
        container,
        object,
        path
    );
}

/// Assert that an object does not exist in the filesystem backend.
pub fn assert_object_absent(jukebox: &TestJukebox, container: &str, object: &str) {
    let path = jukebox.object_path(container, object);
    assert!(
        !path.exists(),
        "object {}/{} should not exist",
        container,
        object
    );
}

/// Assert that `list-songs` prints `line`.
pub fn assert_song_listed(jukebox: &TestJukebox, line: &str) {
    jukebox
        .cmd()
        .arg("list-songs")
        .run_success()
        .stdout(predicate::str::contains(line));
}

/// Assert that `list-songs` does not print `line`.
pub fn assert_song_not_listed(jukebox: &TestJukebox, line: &str) {
    jukebox
        .cmd()
        .arg("list-songs")
        .run_success()
        .stdout(predicate::str::contains(line).not());
}
