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


//! Progress display for import batches

use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use jukebox_core::{FileOutcome, ImportObserver, ImportReport};
use std::time::Duration;

const FILE_TEMPLATE: &str =
    "{spinner:.magenta} {msg} [{bar:40.magenta/blue}] {pos}/{len} files ({percent}%)";

/// Import observer backed by an indicatif bar on stderr
///
/// Stays hidden in quiet mode so stdout remains clean for piping.
pub struct ImportProgress {
    bar: ProgressBar,
}

impl ImportProgress {
    pub fn new(label: &str, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(FILE_TEMPLATE)
                    .map(|style| style.progress_chars("█▓░"))
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        };
        bar.set_message(label.to_string());
        Self { bar }
    }

    /// Human-readable byte total for summaries
    pub fn bytes(count: u64) -> String {
        format!("{}", HumanBytes(count))
    }
}

impl ImportObserver for ImportProgress {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        if total > 0 {
            self.bar.enable_steady_tick(Duration::from_millis(100));
        }
    }

    fn on_file(&self, file: &str, outcome: FileOutcome<'_>) {
        self.bar.inc(1);
        match outcome {
            FileOutcome::Imported { .. } => self.bar.set_message(file.to_string()),
            FileOutcome::Skipped(reason) => {
                self.bar.println(format!("skipping {}: {}", file, reason));
            }
            FileOutcome::Failed(err) => {
                self.bar.println(format!("error importing {}: {}", file, err));
            }
        }
    }

    fn on_finish(&self, _report: &ImportReport) {
        self.bar.finish_and_clear();
    }
}
