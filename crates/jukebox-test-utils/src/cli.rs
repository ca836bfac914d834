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

//! Command helpers wrapping assert_cmd for the `jukebox` binary.

use assert_cmd::Command;
use std::path::Path;

/// Creates a new `jukebox` Command for testing.
///
/// # Example
/// ```ignore
/// use jukebox_test_utils::jukebox_cmd;
///
/// jukebox_cmd()
///     .args(["--dir", dir, "list-songs"])
///     .assert()
///     .success();
/// ```
#[allow(deprecated)] // cargo_bin is deprecated but still works for our use case
pub fn jukebox_cmd() -> Command {
    Command::cargo_bin("jukebox").expect("jukebox binary not found")
}

/// Fluent wrapper that pins a command to one jukebox directory
pub struct JukeboxCommand {
    cmd: Command,
}

impl JukeboxCommand {
    /// Command running against `dir`, with colors and progress bars off.
    pub fn new(dir: &Path) -> Self {
        let mut cmd = jukebox_cmd();
        cmd.arg("--dir")
            .arg(dir)
            .arg("--color")
            .arg("never")
            .env_remove("RUST_LOG");
        for (name, _) in std::env::vars() {
            if name.starts_with("JUKEBOX_") {
                cmd.env_remove(name);
            }
        }
        Self { cmd }
    }

    /// Add an argument to the command.
    pub fn arg(mut self, arg: &str) -> Self {
        self.cmd.arg(arg);
        self
    }

    /// Add multiple arguments to the command.
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Set an environment variable for the command.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Execute the command and assert success.
    pub fn run_success(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().success()
    }

    /// Execute the command and assert failure.
    pub fn run_failure(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().failure()
    }

    /// Get the underlying Command for custom assertions.
    pub fn into_inner(self) -> Command {
        self.cmd
    }
}
