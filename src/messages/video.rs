use image::RgbaImage;
use std::{fmt, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub duration: f64
}

impl fmt::Display for VideoMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} ({:.2}s)", self.width, self.height, self.duration)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoCommand {
    Load(PathBuf),
    Seek { path: PathBuf, position: f64 }
}

pub enum VideoMessage {
    Metadata { path: PathBuf, metadata: VideoMetadata },
    Frame { path: PathBuf, position: f64, image: RgbaImage },
    Error { path: PathBuf, message: String }
}
