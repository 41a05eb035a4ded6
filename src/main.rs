// Copyright (C) 2025 Joshua Kesler
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

mod messages;
mod dialog;
mod capture;
mod video;
mod state;
mod gateway;
mod embed;
mod session;
mod config;
mod app;

use clap::Parser;
use crossbeam_channel::unbounded;
use eframe::NativeOptions;
use tracing::info;

fn main() -> eframe::Result<()> {
    let config = config::Config::parse();
    tracing_subscriber::fmt().with_env_filter(config.log_filter()).init();
    info!(ffmpeg = %config.ffmpeg, ffprobe = %config.ffprobe, "starting thumbset");

    let (dialog_tx, dialog_cmd_rx) = unbounded();
    let (dialog_msg_tx, dialog_rx) = unbounded();
    let (video_tx, video_cmd_rx) = unbounded();
    let (video_msg_tx, video_rx) = unbounded();
    let (thumb_tx, thumb_cmd_rx) = unbounded();
    let (thumb_status_tx, thumb_rx) = unbounded();
    dialog::start_thread(dialog_cmd_rx, dialog_msg_tx);
    video::start_thread(config.ffmpeg.clone(), config.ffprobe.clone(), video_cmd_rx, video_msg_tx);
    gateway::start_thread(embed::FfmpegBackend::new(config.ffmpeg.clone()), thumb_cmd_rx, thumb_status_tx);

    let workers = app::Workers { dialog_tx, dialog_rx, video_tx, video_rx, thumb_tx, thumb_rx };
    let options = NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([800.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native("Thumbset", options, Box::new(move |cc| {
        Ok(Box::new(app::ThumbsetApp::new(cc, workers, config.video)))
    }))
}
