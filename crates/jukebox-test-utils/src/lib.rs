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

//! # CloudJukebox Test Utilities
//!
//! Shared helpers for CLI integration tests:
//! - Command helpers for running the `jukebox` binary
//! - A throwaway jukebox directory backed by filesystem storage
//! - Sample song data and staged file fixtures
//! - Assertions over the filesystem backend's containers

pub mod assertions;
pub mod cli;
pub mod fixtures;
pub mod jukebox;

pub use assertions::*;
pub use cli::{jukebox_cmd, JukeboxCommand};
pub use fixtures::TestFixtures;
pub use jukebox::TestJukebox;
