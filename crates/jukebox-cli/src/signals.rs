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


//! Process control for a running play session.
//!
//! `play` records its pid in `jukebox.pid`; `toggle-pause` and `advance` send
//! it `SIGUSR1` and `SIGUSR2`. Ctrl-C stops the session.

use anyhow::{Context, Result};
use jukebox_core::PlaybackHandle;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Signal that toggles pause
pub const PAUSE_SIGNAL: &str = "USR1";

/// Signal that skips to the next song
pub const ADVANCE_SIGNAL: &str = "USR2";

/// Pid file removed when dropped
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        tokio::fs::write(&path, format!("{}\n", std::process::id()))
            .await
            .with_context(|| format!("Failed to write pid file {}", path.display()))?;
        debug!(path = %path.display(), "Wrote pid file");
        Ok(Self { path })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %err, "Unable to remove pid file");
        }
    }
}

/// Pid of the running play session
pub async fn read_pid(path: &Path) -> Result<u32> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("No running jukebox ({} not found)", path.display()))?;
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("Pid file {} is empty", path.display());
    }
    text.parse()
        .with_context(|| format!("Invalid pid '{}' in {}", text, path.display()))
}

/// Send `signal` to the play session recorded in `pid_path`
pub async fn signal_player(pid_path: &Path, signal: &str) -> Result<u32> {
    let pid = read_pid(pid_path).await?;
    let status = tokio::process::Command::new("kill")
        .arg("-s")
        .arg(signal)
        .arg(pid.to_string())
        .status()
        .await
        .context("Failed to run kill")?;
    if !status.success() {
        anyhow::bail!("Unable to signal jukebox process {} ({})", pid, status);
    }
    Ok(pid)
}

/// Forward process signals to a play session until it stops
pub fn spawn_signal_bridge(handle: PlaybackHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let streams = signal(SignalKind::user_defined1())
                .and_then(|usr1| Ok((usr1, signal(SignalKind::user_defined2())?)));
            match streams {
                Ok((mut usr1, mut usr2)) => loop {
                    tokio::select! {
                        _ = usr1.recv() => handle.toggle_pause(),
                        _ = usr2.recv() => handle.skip(),
                        _ = tokio::signal::ctrl_c() => {
                            handle.stop();
                            return;
                        }
                    }
                },
                Err(err) => warn!(error = %err, "Pause and advance signals unavailable"),
            }
        }

        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    })
}
