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

use crate::{capture::EncodedImage, messages::{self, thumbnail::{ThumbnailCommand, ThumbnailStatus}}, state::{SourceMode, SourceSnapshot, ThumbnailSource}};
use crossbeam_channel::{Receiver, Sender};
use std::{panic::{self, AssertUnwindSafe}, path::PathBuf, thread};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("video required")]
    VideoRequired,

    #[error("image required")]
    ImageRequired,

    #[error("no captured image")]
    NoCapturedImage
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailImage {
    Path(PathBuf),
    Data(EncodedImage)
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRequest {
    pub video_path: PathBuf,
    pub image: ThumbnailImage
}

/// Arguments of the `set_thumbnail` backend call. Exactly one of
/// `image_path`/`image_data` is set when built from a [`ThumbnailRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetThumbnailArgs {
    pub video_path: String,
    pub image_path: Option<String>,
    pub image_data: Option<String>
}

impl ThumbnailRequest {
    pub fn to_args(&self) -> SetThumbnailArgs {
        let video_path = self.video_path.to_string_lossy().into_owned();
        match &self.image {
            ThumbnailImage::Path(path) => SetThumbnailArgs {
                video_path,
                image_path: Some(path.to_string_lossy().into_owned()),
                image_data: None
            },
            ThumbnailImage::Data(image) => SetThumbnailArgs {
                video_path,
                image_path: None,
                image_data: Some(image.to_data_url())
            }
        }
    }
}

pub trait ThumbnailBackend {
    /// Embeds the image and returns a message for the user, or the error
    /// text to show as-is.
    fn set_thumbnail(&self, args: &SetThumbnailArgs) -> Result<String, String>;
}

/// Checks run in order and stop at the first failure.
pub fn validate(snapshot: &SourceSnapshot) -> Result<ThumbnailRequest, ValidationError> {
    let video_path = match &snapshot.video_path {
        Some(path) if !path.as_os_str().is_empty() => path.clone(),
        _ => return Err(ValidationError::VideoRequired)
    };

    let image = match &snapshot.source {
        ThumbnailSource::File(path) if !path.as_os_str().is_empty() => ThumbnailImage::Path(path.clone()),
        ThumbnailSource::File(_) | ThumbnailSource::Empty(SourceMode::File) => return Err(ValidationError::ImageRequired),
        ThumbnailSource::Capture(image) => ThumbnailImage::Data(image.clone()),
        ThumbnailSource::Empty(SourceMode::Capture) => return Err(ValidationError::NoCapturedImage)
    };

    Ok(ThumbnailRequest { video_path, image })
}

/// Hands the request to the backend. Its messages are passed through untouched.
pub fn dispatch<B: ThumbnailBackend + ?Sized>(backend: &B, request: &ThumbnailRequest) -> Result<String, String> {
    let args = request.to_args();
    match &request.image {
        ThumbnailImage::Path(path) => info!(video = %args.video_path, image = %path.display(), "setting thumbnail from file"),
        ThumbnailImage::Data(image) => info!(video = %args.video_path, bytes = image.byte_len(), "setting thumbnail from captured frame")
    }

    let result = backend.set_thumbnail(&args);
    match &result {
        Ok(_) => info!(video = %args.video_path, "thumbnail set"),
        Err(e) => warn!(video = %args.video_path, error = %e, "thumbnail backend failed")
    }
    result
}

pub fn start_thread<B>(backend: B, cmd_rx: Receiver<ThumbnailCommand>, status_tx: Sender<ThumbnailStatus>)
where
    B: ThumbnailBackend + Send + 'static
{
    thread::spawn(move || {
        while let Ok(ThumbnailCommand::Submit(request)) = cmd_rx.recv() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| dispatch(&backend, &request)))
                .unwrap_or_else(|payload| Err(format!("Thumbnail backend crashed: {}", messages::panic_message(payload.as_ref()))));

            if status_tx.send(ThumbnailStatus::Finished(result)).is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::{cell::RefCell, time::Duration};

    /// Records every call and answers with a fixed result.
    pub struct RecordingBackend {
        pub calls: RefCell<Vec<SetThumbnailArgs>>,
        pub reply: Result<String, String>
    }

    impl RecordingBackend {
        pub fn replying(reply: Result<&str, &str>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                reply: reply.map(String::from).map_err(String::from)
            }
        }
    }

    impl ThumbnailBackend for RecordingBackend {
        fn set_thumbnail(&self, args: &SetThumbnailArgs) -> Result<String, String> {
            self.calls.borrow_mut().push(args.clone());
            self.reply.clone()
        }
    }

    fn frame() -> EncodedImage {
        EncodedImage::from_png(vec![0x89, b'P', b'N', b'G']).unwrap()
    }

    fn snapshot(video: Option<&str>, source: ThumbnailSource) -> SourceSnapshot {
        SourceSnapshot { video_path: video.map(PathBuf::from), source }
    }

    #[test]
    fn missing_video_is_reported_first() {
        let cases = [
            ThumbnailSource::Empty(SourceMode::File),
            ThumbnailSource::Empty(SourceMode::Capture),
            ThumbnailSource::File(PathBuf::from("/cover.png"))
        ];
        for source in cases {
            assert_eq!(validate(&snapshot(None, source.clone())), Err(ValidationError::VideoRequired));
            assert_eq!(validate(&snapshot(Some(""), source)), Err(ValidationError::VideoRequired));
        }
    }

    #[test]
    fn file_mode_needs_an_image_path() {
        assert_eq!(
            validate(&snapshot(Some("/v.mp4"), ThumbnailSource::Empty(SourceMode::File))),
            Err(ValidationError::ImageRequired)
        );
        assert_eq!(
            validate(&snapshot(Some("/v.mp4"), ThumbnailSource::File(PathBuf::new()))),
            Err(ValidationError::ImageRequired)
        );
    }

    #[test]
    fn capture_mode_needs_a_frame() {
        assert_eq!(
            validate(&snapshot(Some("/v.mp4"), ThumbnailSource::Empty(SourceMode::Capture))),
            Err(ValidationError::NoCapturedImage)
        );
    }

    #[test]
    fn validation_messages() {
        assert_eq!(ValidationError::VideoRequired.to_string(), "video required");
        assert_eq!(ValidationError::ImageRequired.to_string(), "image required");
        assert_eq!(ValidationError::NoCapturedImage.to_string(), "no captured image");
    }

    #[test]
    fn file_payload_has_only_the_path() {
        let request = validate(&snapshot(Some("/v.mp4"), ThumbnailSource::File(PathBuf::from("/cover.png")))).unwrap();
        assert_eq!(request.to_args(), SetThumbnailArgs {
            video_path: String::from("/v.mp4"),
            image_path: Some(String::from("/cover.png")),
            image_data: None
        });
    }

    #[test]
    fn capture_payload_has_only_the_data() {
        let request = validate(&snapshot(Some("/v.mp4"), ThumbnailSource::Capture(frame()))).unwrap();
        let args = request.to_args();
        assert_eq!(args.video_path, "/v.mp4");
        assert_eq!(args.image_path, None);
        assert_eq!(args.image_data, Some(frame().to_data_url()));
    }

    #[test]
    fn backend_messages_pass_through_verbatim() {
        let request = validate(&snapshot(Some("/v.mp4"), ThumbnailSource::Capture(frame()))).unwrap();

        let ok = RecordingBackend::replying(Ok("OK"));
        assert_eq!(dispatch(&ok, &request), Ok(String::from("OK")));

        let failing = RecordingBackend::replying(Err("FFmpeg Error:\nInvalid data found when processing input"));
        assert_eq!(dispatch(&failing, &request), Err(String::from("FFmpeg Error:\nInvalid data found when processing input")));
        assert_eq!(failing.calls.borrow().len(), 1);
    }

    #[test]
    fn dispatching_twice_gives_the_same_answer() {
        let request = validate(&snapshot(Some("/v.mp4"), ThumbnailSource::File(PathBuf::from("/cover.png")))).unwrap();
        let backend = RecordingBackend::replying(Ok("done"));

        let first = dispatch(&backend, &request);
        let second = dispatch(&backend, &request);
        assert_eq!(first, second);

        let calls = backend.calls.borrow();
        assert_eq!(calls[0], calls[1]);
    }

    struct Reply(&'static str);

    impl ThumbnailBackend for Reply {
        fn set_thumbnail(&self, args: &SetThumbnailArgs) -> Result<String, String> {
            Ok(format!("{} {}", self.0, args.video_path))
        }
    }

    struct Crashing;

    impl ThumbnailBackend for Crashing {
        fn set_thumbnail(&self, _args: &SetThumbnailArgs) -> Result<String, String> {
            panic!("container parser overflowed")
        }
    }

    fn run_worker<B: ThumbnailBackend + Send + 'static>(backend: B) -> Result<String, String> {
        let (cmd_tx, cmd_rx) = unbounded();
        let (status_tx, status_rx) = unbounded();
        start_thread(backend, cmd_rx, status_tx);

        let request = ThumbnailRequest { video_path: PathBuf::from("/v.mp4"), image: ThumbnailImage::Path(PathBuf::from("/c.png")) };
        cmd_tx.send(ThumbnailCommand::Submit(request)).unwrap();
        match status_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            ThumbnailStatus::Finished(result) => result
        }
    }

    #[test]
    fn worker_reports_the_backend_result() {
        assert_eq!(run_worker(Reply("embedded into")), Ok(String::from("embedded into /v.mp4")));
    }

    #[test]
    fn worker_survives_a_crashing_backend() {
        assert_eq!(run_worker(Crashing), Err(String::from("Thumbnail backend crashed: container parser overflowed")));
    }
}
