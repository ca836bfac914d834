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


//! Remote control of a running `play` session.

use crate::context::JukeboxArgs;
use crate::output;
use crate::signals::{signal_player, ADVANCE_SIGNAL, PAUSE_SIGNAL};
use anyhow::Result;
use clap::Parser;

/// Pause or resume the running player
#[derive(Parser, Debug)]
pub struct TogglePauseCmd {}

impl TogglePauseCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let config = args.load_config().await?;
        let pid = signal_player(&config.paths.pid_file_path(), PAUSE_SIGNAL).await?;
        output::success(&format!("Toggled pause on jukebox process {}", pid));
        Ok(())
    }
}

/// Skip to the next song
#[derive(Parser, Debug)]
pub struct AdvanceCmd {}

impl AdvanceCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let config = args.load_config().await?;
        let pid = signal_player(&config.paths.pid_file_path(), ADVANCE_SIGNAL).await?;
        output::success(&format!("Advanced jukebox process {}", pid));
        Ok(())
    }
}
