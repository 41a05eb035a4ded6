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

use crate::{
    capture::{CaptureError, FrameCapture},
    dialog::DialogError,
    gateway::{self, ThumbnailRequest},
    messages::{dialog::FileKind, video::{VideoCommand, VideoMessage}},
    state::{ModeRefused, SourceMode, ThumbnailSourceState},
    video::VideoElement
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Success(String),
    Error(String)
}

impl SubmissionStatus {
    pub fn message(&self) -> Option<&str> {
        match self {
            SubmissionStatus::Idle => None,
            SubmissionStatus::Success(m) | SubmissionStatus::Error(m) => Some(m)
        }
    }
}

/// Everything the user is working on in this window.
pub struct Session {
    state: ThumbnailSourceState,
    video: VideoElement,
    capture: FrameCapture,
    status: SubmissionStatus,
    submitting: bool,
    open_dialog: Option<FileKind>
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: ThumbnailSourceState::new(),
            video: VideoElement::default(),
            capture: FrameCapture::new(),
            status: SubmissionStatus::Idle,
            submitting: false,
            open_dialog: None
        }
    }

    pub fn state(&self) -> &ThumbnailSourceState {
        &self.state
    }

    pub fn video(&self) -> &VideoElement {
        &self.video
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn open_dialog(&self) -> Option<FileKind> {
        self.open_dialog
    }

    /// A submission or a file dialog is outstanding.
    pub fn is_busy(&self) -> bool {
        self.submitting || self.open_dialog.is_some()
    }

    /// Returns false while another dialog is open or a submission is running,
    /// so inputs cannot change under an outstanding submission.
    pub fn begin_dialog(&mut self, kind: FileKind) -> bool {
        if self.is_busy() {
            return false;
        }

        self.open_dialog = Some(kind);
        true
    }

    /// Applies the dialog answer. Returns the command that loads a newly
    /// chosen video.
    pub fn finish_dialog(&mut self, kind: FileKind, result: Result<Option<PathBuf>, DialogError>) -> Option<VideoCommand> {
        self.open_dialog = None;
        match result {
            Ok(Some(path)) => match kind {
                FileKind::Video => Some(self.choose_video(path)),
                FileKind::Image => { self.choose_image(path); None }
            },
            Ok(None) => None,
            Err(e) => {
                self.status = SubmissionStatus::Error(e.to_string());
                None
            }
        }
    }

    pub fn choose_video(&mut self, path: PathBuf) -> VideoCommand {
        self.state.video_chosen(path.clone());
        self.video.load(path.clone());
        self.status = SubmissionStatus::Idle;
        VideoCommand::Load(path)
    }

    pub fn choose_image(&mut self, path: PathBuf) {
        self.state.image_chosen(path);
        self.status = SubmissionStatus::Idle;
    }

    pub fn select_mode(&mut self, mode: SourceMode) -> Result<(), ModeRefused> {
        if self.state.mode() == mode {
            return Ok(());
        }

        self.state.select_mode(mode)?;
        self.status = SubmissionStatus::Idle;
        Ok(())
    }

    pub fn seek(&mut self, position: f64) -> Option<VideoCommand> {
        self.video.seek(position)
    }

    /// Returns true when a new frame went on screen.
    pub fn apply_video_message(&mut self, msg: VideoMessage) -> bool {
        match msg {
            VideoMessage::Metadata { path, metadata } => {
                self.video.apply_metadata(&path, metadata);
                false
            },
            VideoMessage::Frame { path, position, image } => self.video.apply_frame(&path, position, image),
            VideoMessage::Error { path, message } => {
                if self.video.path() == Some(path.as_path()) {
                    self.status = SubmissionStatus::Error(message);
                }
                false
            }
        }
    }

    /// Grabs the visible frame and makes it the active thumbnail source.
    pub fn capture_frame(&mut self) -> Result<(), CaptureError> {
        match self.capture.capture(&self.video) {
            Ok(image) => {
                info!(bytes = image.byte_len(), "frame captured, using it as the thumbnail");
                self.state.frame_captured(image);
                self.status = SubmissionStatus::Idle;
                Ok(())
            },
            Err(e) => {
                warn!(error = %e, "frame capture failed");
                self.status = SubmissionStatus::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// Validates the current inputs and marks the submission as running.
    /// `None` means nothing should be dispatched: either something is
    /// already outstanding or validation failed and the status says why.
    pub fn begin_submit(&mut self) -> Option<ThumbnailRequest> {
        if self.is_busy() {
            return None;
        }

        match gateway::validate(&self.state.snapshot()) {
            Ok(request) => {
                self.submitting = true;
                self.status = SubmissionStatus::Idle;
                Some(request)
            },
            Err(e) => {
                info!(error = %e, "submission rejected");
                self.status = SubmissionStatus::Error(e.to_string());
                None
            }
        }
    }

    pub fn finish_submit(&mut self, result: Result<String, String>) {
        self.submitting = false;
        self.status = match result {
            Ok(message) => SubmissionStatus::Success(message),
            Err(message) => SubmissionStatus::Error(message)
        };
    }
}
