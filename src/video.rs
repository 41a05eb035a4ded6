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

use crate::{capture::FrameSource, messages::video::{VideoCommand, VideoMessage, VideoMetadata}};
use anyhow::{Context, anyhow, bail};
use chrono::NaiveTime;
use crossbeam_channel::{Receiver, Sender};
use image::{RgbaImage, imageops::{self, FilterType}};
use std::{ffi::OsString, path::{Path, PathBuf}, process::{Command, Stdio}, thread};
use tracing::{debug, info, warn};

/// How far before the end a seek may land. ffmpeg yields no frame for a
/// position at or past the last frame.
pub const END_MARGIN: f64 = 0.1;

pub struct DisplayedFrame {
    pub position: f64,
    pub image: RgbaImage
}

/// The player surface: which video is loaded, how big its frames are, where
/// playback sits and the frame currently on screen.
#[derive(Default)]
pub struct VideoElement {
    path: Option<PathBuf>,
    metadata: Option<VideoMetadata>,
    position: f64,
    frame: Option<DisplayedFrame>
}

impl VideoElement {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn duration(&self) -> f64 {
        self.metadata.map(|m| m.duration).filter(|d| d.is_finite() && *d >= 0.0).unwrap_or(0.0)
    }

    /// The latest position that still decodes to a frame.
    pub fn last_seekable(&self) -> f64 {
        (self.duration() - END_MARGIN).max(0.0)
    }

    pub fn is_loaded(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn frame(&self) -> Option<&DisplayedFrame> {
        self.frame.as_ref()
    }

    /// Forgets everything about the previous video.
    pub fn load(&mut self, path: PathBuf) {
        *self = Self { path: Some(path), ..Self::default() };
    }

    fn is_current(&self, path: &Path) -> bool {
        self.path.as_deref() == Some(path)
    }

    /// Returns false for metadata of a video that is no longer loaded.
    pub fn apply_metadata(&mut self, path: &Path, metadata: VideoMetadata) -> bool {
        if !self.is_current(path) {
            return false;
        }

        self.metadata = Some(metadata);
        self.position = self.position.clamp(0.0, self.last_seekable());
        true
    }

    /// Returns false for frames of a video that is no longer loaded.
    pub fn apply_frame(&mut self, path: &Path, position: f64, image: RgbaImage) -> bool {
        if !self.is_current(path) {
            return false;
        }

        self.frame = Some(DisplayedFrame { position, image });
        true
    }

    /// Moves playback and returns the decode request for the new position,
    /// or `None` when no video is loaded.
    pub fn seek(&mut self, position: f64) -> Option<VideoCommand> {
        let path = self.path.clone()?;
        self.position = if position.is_nan() { 0.0 } else { position.clamp(0.0, self.last_seekable()) };
        Some(VideoCommand::Seek { path, position: self.position })
    }
}

impl FrameSource for VideoElement {
    fn intrinsic_size(&self) -> (u32, u32) {
        self.metadata.map(|m| (m.width, m.height)).unwrap_or((0, 0))
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn draw_frame(&self, surface: &mut RgbaImage) -> Result<(), String> {
        let frame = self.frame.as_ref().ok_or_else(|| String::from("no frame has been decoded yet"))?;
        if frame.image.dimensions() == surface.dimensions() {
            imageops::replace(surface, &frame.image, 0, 0);
        } else {
            let scaled = imageops::resize(&frame.image, surface.width(), surface.height(), FilterType::Triangle);
            imageops::replace(surface, &scaled, 0, 0);
        }
        Ok(())
    }
}

pub fn timecode(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let whole = seconds.trunc() as u32;
    let nanos = (seconds.fract() * 1e9) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(whole % 86_400, nanos)
        .map(|t| t.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| String::from("--:--:--"))
}

pub fn probe_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v", "error",
        "-select_streams", "v:0",
        "-show_entries", "stream=width,height:format=duration",
        "-of", "default=noprint_wrappers=1"
    ].iter().map(OsString::from).collect();
    args.push(path.as_os_str().to_owned());
    args
}

/// Parses `key=value` lines from ffprobe. A missing, `N/A`, negative or
/// non-finite duration is 0.
pub fn parse_probe_output(output: &str) -> anyhow::Result<VideoMetadata> {
    let mut width = None;
    let mut height = None;
    let mut duration = 0.0;

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once('=') else { continue };
        match key {
            "width" => width = value.parse::<u32>().ok(),
            "height" => height = value.parse::<u32>().ok(),
            "duration" => duration = value.parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0).unwrap_or(0.0),
            _ => {}
        }
    }

    match (width, height) {
        (Some(width), Some(height)) => Ok(VideoMetadata { width, height, duration }),
        _ => Err(anyhow!("no video stream found"))
    }
}

pub fn frame_args(path: &Path, position: f64, width: u32, height: u32) -> Vec<OsString> {
    let mut args = vec![
        OsString::from("-ss"), OsString::from(format!("{:.3}", position.max(0.0))),
        OsString::from("-i"), path.as_os_str().to_owned()
    ];
    for arg in ["-frames:v", "1", "-vf"] {
        args.push(OsString::from(arg));
    }
    args.push(OsString::from(format!("scale={}:{}", width, height)));
    for arg in ["-f", "rawvideo", "-pix_fmt", "rgba", "-"] {
        args.push(OsString::from(arg));
    }
    args
}

fn probe(ffprobe: &str, path: &Path) -> anyhow::Result<VideoMetadata> {
    let output = Command::new(ffprobe)
        .args(probe_args(path))
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run {}", ffprobe))?;

    if !output.status.success() {
        bail!("ffprobe failed: {}", String::from_utf8_lossy(&output.stderr).trim());
    }
    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

fn decode_frame(ffmpeg: &str, path: &Path, position: f64, metadata: VideoMetadata) -> anyhow::Result<RgbaImage> {
    let output = Command::new(ffmpeg)
        .args(frame_args(path, position, metadata.width, metadata.height))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("failed to run {}", ffmpeg))?;

    if !output.status.success() {
        bail!("ffmpeg failed: {}", String::from_utf8_lossy(&output.stderr).trim());
    }

    let expected = metadata.width as usize * metadata.height as usize * 4;
    if output.stdout.len() < expected {
        bail!("no frame at {:.3}s ({} of {} bytes)", position, output.stdout.len(), expected);
    }

    let mut raw = output.stdout;
    raw.truncate(expected);
    RgbaImage::from_raw(metadata.width, metadata.height, raw).ok_or_else(|| anyhow!("frame buffer has the wrong size"))
}

/// Collapses a burst of commands: everything before the last `Load` is
/// obsolete, and only the last seek after it matters.
pub fn coalesce(commands: Vec<VideoCommand>) -> Vec<VideoCommand> {
    let start = commands.iter().rposition(|c| matches!(c, VideoCommand::Load(_))).unwrap_or(0);
    let mut tail = commands.into_iter().skip(start);
    let mut out = Vec::new();
    let mut last_seek = None;

    if let Some(first) = tail.next() {
        match first {
            VideoCommand::Load(_) => out.push(first),
            seek => last_seek = Some(seek)
        }
    }
    for cmd in tail {
        last_seek = Some(cmd);
    }

    out.extend(last_seek);
    out
}

pub fn start_thread(ffmpeg: String, ffprobe: String, cmd_rx: Receiver<VideoCommand>, tx: Sender<VideoMessage>) {
    thread::spawn(move || {
        let mut current: Option<(PathBuf, VideoMetadata)> = None;

        while let Ok(first) = cmd_rx.recv() {
            let mut batch = vec![first];
            batch.extend(cmd_rx.try_iter());

            for cmd in coalesce(batch) {
                let sent = match cmd {
                    VideoCommand::Load(path) => {
                        current = None;
                        match probe(&ffprobe, &path) {
                            Ok(metadata) => {
                                info!(path = %path.display(), %metadata, "video loaded");
                                current = Some((path.clone(), metadata));
                                let sent = tx.send(VideoMessage::Metadata { path: path.clone(), metadata }).is_ok();
                                sent && send_frame(&tx, &ffmpeg, &path, 0.0, metadata)
                            },
                            Err(e) => {
                                warn!(path = %path.display(), error = %e, "video probe failed");
                                tx.send(VideoMessage::Error { path, message: format!("Could not read video: {:#}", e) }).is_ok()
                            }
                        }
                    },
                    VideoCommand::Seek { path, position } => match &current {
                        Some((loaded, metadata)) if *loaded == path => send_frame(&tx, &ffmpeg, &path, position, *metadata),
                        _ => {
                            debug!(path = %path.display(), "seek for a video that is not loaded");
                            true
                        }
                    }
                };

                if !sent {
                    return;
                }
            }
        }
    });
}

fn send_frame(tx: &Sender<VideoMessage>, ffmpeg: &str, path: &Path, position: f64, metadata: VideoMetadata) -> bool {
    let msg = match decode_frame(ffmpeg, path, position, metadata) {
        Ok(image) => VideoMessage::Frame { path: path.to_path_buf(), position, image },
        Err(e) => {
            warn!(path = %path.display(), position, error = %e, "frame decode failed");
            VideoMessage::Error { path: path.to_path_buf(), message: format!("Could not decode frame at {}: {:#}", timecode(position), e) }
        }
    };
    tx.send(msg).is_ok()
}
