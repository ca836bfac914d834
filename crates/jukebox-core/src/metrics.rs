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

//! Transfer throughput accounting

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Totals for one upload or download batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferMetrics {
    /// Files transferred
    pub files: u64,

    /// Bytes transferred
    pub bytes: u64,

    /// Time spent transferring
    pub elapsed: Duration,
}

impl TransferMetrics {
    /// Empty totals
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one transferred file
    pub fn record(&mut self, bytes: u64, elapsed: Duration) {
        self.files += 1;
        self.bytes += bytes;
        self.elapsed += elapsed;
    }

    /// Average throughput in KB/sec (1 KB = 1000 bytes)
    ///
    /// # Examples
    ///
    /// ```
    /// use jukebox_core::TransferMetrics;
    /// use std::time::Duration;
    ///
    /// let mut metrics = TransferMetrics::new();
    /// metrics.record(500_000, Duration::from_secs(2));
    /// assert_eq!(metrics.kb_per_sec(), 250.0);
    /// ```
    pub fn kb_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.bytes as f64 / 1000.0 / secs
        }
    }
}

/// Shared counter updated by concurrent download passes
#[derive(Debug, Default)]
pub struct ThroughputCounter {
    files: AtomicU64,
    bytes: AtomicU64,
    elapsed_micros: AtomicU64,
}

impl ThroughputCounter {
    /// Counter with nothing recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one transferred file
    pub fn record(&self, bytes: u64, elapsed: Duration) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.elapsed_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Current totals without resetting
    pub fn snapshot(&self) -> TransferMetrics {
        TransferMetrics {
            files: self.files.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            elapsed: Duration::from_micros(self.elapsed_micros.load(Ordering::Relaxed)),
        }
    }

    /// Return the totals and reset them to zero
    pub fn take(&self) -> TransferMetrics {
        TransferMetrics {
            files: self.files.swap(0, Ordering::Relaxed),
            bytes: self.bytes.swap(0, Ordering::Relaxed),
            elapsed: Duration::from_micros(self.elapsed_micros.swap(0, Ordering::Relaxed)),
        }
    }

    /// Start a batch that resets the counter when it ends
    pub fn batch(&self) -> BatchGuard<'_> {
        BatchGuard {
            counter: self,
            started: Instant::now(),
            finished: false,
        }
    }
}

/// Scope of one transfer batch
///
/// [`finish`](Self::finish) reports and resets the counter. Dropping the guard
/// without finishing (cancellation, early return) resets it silently.
#[derive(Debug)]
pub struct BatchGuard<'a> {
    counter: &'a ThroughputCounter,
    started: Instant,
    finished: bool,
}

impl BatchGuard<'_> {
    /// Stop the batch and return its totals
    pub fn finish(mut self) -> TransferMetrics {
        self.finished = true;
        let metrics = self.counter.take();
        if metrics.files > 0 {
            info!(
                files = metrics.files,
                bytes = metrics.bytes,
                wall_ms = self.started.elapsed().as_millis() as u64,
                "average download throughput = {:.1} KB/sec",
                metrics.kb_per_sec()
            );
        }
        metrics
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.counter.take();
        }
    }
}
