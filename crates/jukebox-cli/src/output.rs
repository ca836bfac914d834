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


//! Shared output formatting for CLI commands.
//!
//! Listings go to stdout uncolored so they can be piped; status lines carry
//! an emoji marker.

#![allow(dead_code)]

use console::style;

/// Print a success message with green checkmark emoji.
pub fn success(msg: &str) {
    println!("{} {}", style("✅").green().bold(), msg);
}

/// Print an error message to stderr with red X emoji.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("❌").red().bold(), msg);
}

/// Print an informational message with cyan info emoji.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ️").cyan(), msg);
}

/// Print a warning message with yellow warning emoji.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠️").yellow(), msg);
}

/// Print a key-value detail line, value highlighted in cyan.
pub fn detail(key: &str, value: &str) {
    println!("  {}: {}", key, style(value).cyan());
}

/// Print a header message with the jukebox marker.
pub fn header(msg: &str) {
    println!("{} {}", style("🎵").green().bold(), msg);
}

/// Print one plain listing line.
pub fn line(msg: &str) {
    println!("{}", msg);
}

/// Render a transfer rate the way import and playback summaries show it
pub fn throughput(direction: &str, kb_per_sec: f64) -> String {
    format!("average {} throughput = {:.1} KB/sec", direction, kb_per_sec)
}
