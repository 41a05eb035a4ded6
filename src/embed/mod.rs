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

mod ffmpeg;

use crate::gateway::{SetThumbnailArgs, ThumbnailBackend};
use anyhow::{Context, anyhow, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::{io::Write, path::{Path, PathBuf}, process::{Command, Stdio}};
use tempfile::NamedTempFile;
use tracing::debug;

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// `set_thumbnail` done by remuxing through the ffmpeg CLI.
pub struct FfmpegBackend {
    ffmpeg: String
}

impl FfmpegBackend {
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self { ffmpeg: ffmpeg.into() }
    }

    fn run(&self, video: &Path, image: &Path) -> Result<String, String> {
        let output_path = ffmpeg::output_path(video);
        let args = ffmpeg::build_cmd(video, image, &output_path);
        debug!(ffmpeg = %self.ffmpeg, ?args, "running ffmpeg");

        let mut cmd = Command::new(&self.ffmpeg);
        #[cfg(target_os = "windows")]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let output = cmd
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| format!("Failed to execute ffmpeg: {}", e))?;

        if output.status.success() {
            Ok(format!("Thumbnail set successfully!\n\nOutput saved to:\n{}", output_path.to_string_lossy()))
        } else {
            Err(format!("FFmpeg Error:\n{}", String::from_utf8_lossy(&output.stderr)))
        }
    }
}

impl ThumbnailBackend for FfmpegBackend {
    fn set_thumbnail(&self, args: &SetThumbnailArgs) -> Result<String, String> {
        let video = Path::new(&args.video_path);
        match (&args.image_path, &args.image_data) {
            (Some(image), _) => self.run(video, Path::new(image)),
            (None, Some(data)) => {
                // The temp file must outlive the ffmpeg run.
                let image = write_temp_image(data).map_err(|e| format!("Failed to prepare captured image: {:#}", e))?;
                self.run(video, image.path())
            },
            (None, None) => Err(String::from("No thumbnail image was provided"))
        }
    }
}

/// Splits a `data:<mime>;base64,<payload>` URL into its mime type and bytes.
pub fn decode_data_url(url: &str) -> anyhow::Result<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:").ok_or_else(|| anyhow!("not a data URL"))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| anyhow!("data URL has no payload"))?;
    let mime = header.strip_suffix(";base64").ok_or_else(|| anyhow!("data URL is not base64 encoded"))?;

    let bytes = STANDARD.decode(payload.trim()).context("invalid base64 in data URL")?;
    if bytes.is_empty() {
        bail!("data URL is empty");
    }
    Ok((mime.to_string(), bytes))
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/webp" => ".webp",
        _ => ".png"
    }
}

fn write_temp_image(data_url: &str) -> anyhow::Result<NamedTempFile> {
    let (mime, bytes) = decode_data_url(data_url)?;
    let mut file = NamedTempFile::with_suffix(extension_for(&mime)).context("failed to create temp file")?;
    file.write_all(&bytes).context("failed to write temp image")?;
    file.flush()?;
    debug!(path = %file.path().display(), bytes = bytes.len(), "captured frame written to temp file");
    Ok(file)
}

pub fn default_output_for(video: &Path) -> PathBuf {
    ffmpeg::output_path(video)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(image_path: Option<&str>, image_data: Option<&str>) -> SetThumbnailArgs {
        SetThumbnailArgs {
            video_path: String::from("/v.mp4"),
            image_path: image_path.map(String::from),
            image_data: image_data.map(String::from)
        }
    }

    #[test]
    fn data_urls_are_decoded() {
        let (mime, bytes) = decode_data_url("data:image/png;base64,AQID").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        assert!(decode_data_url("/tmp/cover.png").is_err());
        assert!(decode_data_url("data:image/png;base64").is_err());
        assert!(decode_data_url("data:image/png,AQID").is_err());
        assert!(decode_data_url("data:image/png;base64,!!!").is_err());
        assert!(decode_data_url("data:image/png;base64,").is_err());
    }

    #[test]
    fn temp_image_holds_the_decoded_bytes() {
        let file = write_temp_image("data:image/jpeg;base64,AQID").unwrap();
        assert_eq!(file.path().extension().unwrap(), "jpg");
        assert_eq!(std::fs::read(file.path()).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn no_image_is_an_error() {
        let backend = FfmpegBackend::new("ffmpeg");
        assert_eq!(backend.set_thumbnail(&args(None, None)), Err(String::from("No thumbnail image was provided")));
    }

    #[test]
    fn bad_image_data_is_reported_before_running_ffmpeg() {
        let backend = FfmpegBackend::new("/nonexistent/ffmpeg");
        let err = backend.set_thumbnail(&args(None, Some("data:image/png;base64,"))).unwrap_err();
        assert!(err.starts_with("Failed to prepare captured image:"), "{}", err);
    }

    #[test]
    fn missing_ffmpeg_is_reported() {
        let backend = FfmpegBackend::new("/nonexistent/ffmpeg");
        let err = backend.set_thumbnail(&args(Some("/c.png"), None)).unwrap_err();
        assert!(err.starts_with("Failed to execute ffmpeg:"), "{}", err);

        let err = backend.set_thumbnail(&args(None, Some("data:image/png;base64,AQID"))).unwrap_err();
        assert!(err.starts_with("Failed to execute ffmpeg:"), "{}", err);
    }

    #[test]
    fn default_output_matches_the_backend() {
        assert_eq!(default_output_for(Path::new("/films/trip.mov")), PathBuf::from("/films/trip_thumb.mov"));
    }
}
