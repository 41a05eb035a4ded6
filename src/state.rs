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

use crate::capture::EncodedImage;
use std::{fmt, path::{Path, PathBuf}};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    #[default]
    File,
    Capture
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::File => write!(f, "Image file"),
            SourceMode::Capture => write!(f, "Captured frame")
        }
    }
}

/// What would be embedded if the user submitted right now.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailSource {
    /// The active mode has nothing to offer yet.
    Empty(SourceMode),
    File(PathBuf),
    Capture(EncodedImage)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceSnapshot {
    pub video_path: Option<PathBuf>,
    pub source: ThumbnailSource
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("No frame has been captured yet")]
pub struct ModeRefused;

/// Tracks the chosen video and both thumbnail candidates. Only one of the
/// candidates is authoritative at a time, picked by [`SourceMode`]; the other
/// is kept so the user can switch back to it.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailSourceState {
    video_path: Option<PathBuf>,
    image_path: Option<PathBuf>,
    captured: Option<EncodedImage>,
    mode: SourceMode
}

impl ThumbnailSourceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn video_path(&self) -> Option<&Path> {
        self.video_path.as_deref()
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image_path.as_deref()
    }

    pub fn captured_frame(&self) -> Option<&EncodedImage> {
        self.captured.as_ref()
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn can_use_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// A captured frame belongs to the video it came from, so it is dropped.
    /// The image path is left alone.
    pub fn video_chosen(&mut self, path: PathBuf) {
        debug!(path = %path.display(), "video chosen, discarding captured frame");
        self.video_path = Some(path);
        self.captured = None;
        self.mode = SourceMode::File;
    }

    pub fn image_chosen(&mut self, path: PathBuf) {
        debug!(path = %path.display(), "image chosen");
        self.image_path = Some(path);
        self.mode = SourceMode::File;
    }

    pub fn frame_captured(&mut self, image: EncodedImage) {
        self.captured = Some(image);
        self.mode = SourceMode::Capture;
    }

    pub fn use_file(&mut self) {
        self.mode = SourceMode::File;
    }

    pub fn use_capture(&mut self) -> Result<(), ModeRefused> {
        if !self.can_use_capture() {
            return Err(ModeRefused);
        }

        self.mode = SourceMode::Capture;
        Ok(())
    }

    pub fn select_mode(&mut self, mode: SourceMode) -> Result<(), ModeRefused> {
        match mode {
            SourceMode::File => { self.use_file(); Ok(()) },
            SourceMode::Capture => self.use_capture()
        }
    }

    pub fn active_source(&self) -> ThumbnailSource {
        match self.mode {
            SourceMode::File => match &self.image_path {
                Some(path) => ThumbnailSource::File(path.clone()),
                None => ThumbnailSource::Empty(SourceMode::File)
            },
            SourceMode::Capture => match &self.captured {
                Some(image) => ThumbnailSource::Capture(image.clone()),
                None => ThumbnailSource::Empty(SourceMode::Capture)
            }
        }
    }

    pub fn snapshot(&self) -> SourceSnapshot {
        SourceSnapshot {
            video_path: self.video_path.clone(),
            source: self.active_source()
        }
    }
}
