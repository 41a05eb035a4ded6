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

use crate::messages::{self, dialog::{DialogCommand, DialogMessage, FileKind}};
use crossbeam_channel::{Receiver, Sender};
use std::{panic, path::PathBuf, thread};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DialogError {
    #[error("Failed to open file dialog: {0}")]
    Unavailable(String),

    #[error("Cannot resolve {path:?}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("{path:?} is not a supported {kind} file (expected one of: {})", .kind.extensions().join(", "))]
    UnsupportedExtension { kind: FileKind, path: PathBuf }
}

/// Opens the native picker for `kind`. A cancelled dialog is `Ok(None)`.
pub fn choose_file(kind: FileKind) -> Result<Option<PathBuf>, DialogError> {
    let picked = panic::catch_unwind(|| {
        rfd::FileDialog::new()
            .set_title(format!("Select {} file", kind))
            .add_filter(kind.filter_name(), kind.extensions())
            .pick_file()
    }).map_err(|payload| DialogError::Unavailable(messages::panic_message(payload.as_ref())))?;

    match picked {
        Some(path) => validate_selection(kind, path).map(Some),
        None => Ok(None)
    }
}

/// Makes `path` absolute and checks it against the allow-list for `kind`.
/// Some platforms let the user type any name past the dialog filter.
pub fn validate_selection(kind: FileKind, path: PathBuf) -> Result<PathBuf, DialogError> {
    let path = std::path::absolute(&path).map_err(|e| DialogError::InvalidPath { path: path.clone(), reason: e.to_string() })?;
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension {
        Some(ext) if kind.extensions().contains(&ext.as_str()) => Ok(path),
        _ => Err(DialogError::UnsupportedExtension { kind, path })
    }
}

pub fn start_thread(cmd_rx: Receiver<DialogCommand>, tx: Sender<DialogMessage>) {
    thread::spawn(move || {
        while let Ok(DialogCommand::Open(kind)) = cmd_rx.recv() {
            let result = choose_file(kind);
            match &result {
                Ok(Some(path)) => info!(%kind, path = %path.display(), "file selected"),
                Ok(None) => info!(%kind, "file dialog cancelled"),
                Err(e) => warn!(%kind, error = %e, "file dialog failed")
            }

            if tx.send(DialogMessage::Closed { kind, result }).is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn allow_lists_match_supported_formats() {
        assert_eq!(FileKind::Video.extensions(), &["mp4", "mkv", "avi", "mov", "webm"]);
        assert_eq!(FileKind::Image.extensions(), &["png", "jpg", "jpeg", "webp"]);
    }

    #[test]
    fn absolute_path_with_allowed_extension_is_kept() {
        let path = std::path::absolute(Path::new("clips/holiday.mp4")).unwrap();
        assert_eq!(validate_selection(FileKind::Video, path.clone()), Ok(path));
    }

    #[test]
    fn relative_selection_is_made_absolute() {
        let chosen = validate_selection(FileKind::Image, PathBuf::from("cover.png")).unwrap();
        assert!(chosen.is_absolute());
        assert!(chosen.ends_with("cover.png"));
    }

    #[test]
    fn extension_check_ignores_case() {
        let chosen = validate_selection(FileKind::Image, PathBuf::from("/tmp/COVER.JPEG"));
        assert!(chosen.is_ok());
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let err = validate_selection(FileKind::Video, PathBuf::from("/tmp/cover.png")).unwrap_err();
        assert!(matches!(err, DialogError::UnsupportedExtension { kind: FileKind::Video, .. }));
        assert!(err.to_string().contains("mp4, mkv, avi, mov, webm"));
    }

    #[test]
    fn missing_extension_is_rejected() {
        let err = validate_selection(FileKind::Image, PathBuf::from("/tmp/cover")).unwrap_err();
        assert!(matches!(err, DialogError::UnsupportedExtension { kind: FileKind::Image, .. }));
    }

    #[test]
    fn empty_path_cannot_be_resolved() {
        let err = validate_selection(FileKind::Video, PathBuf::new()).unwrap_err();
        assert!(matches!(err, DialogError::InvalidPath { .. }));
    }
}
