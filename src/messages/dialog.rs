use crate::dialog::DialogError;
use std::{fmt, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Video,
    Image
}

impl FileKind {
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileKind::Video => &["mp4", "mkv", "avi", "mov", "webm"],
            FileKind::Image => &["png", "jpg", "jpeg", "webp"]
        }
    }

    pub fn filter_name(self) -> &'static str {
        match self {
            FileKind::Video => "Videos",
            FileKind::Image => "Images"
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Video => write!(f, "video"),
            FileKind::Image => write!(f, "image")
        }
    }
}

pub enum DialogCommand {
    Open(FileKind)
}

pub enum DialogMessage {
    Closed {
        kind: FileKind,
        result: Result<Option<PathBuf>, DialogError>
    }
}
