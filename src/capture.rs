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

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ExtendedColorType, ImageEncoder, RgbaImage, codecs::png::PngEncoder};
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::debug;

/// Anything that shows a video frame and can paint it on request.
pub trait FrameSource {
    /// Decoded width and height, `(0, 0)` until the metadata is known.
    fn intrinsic_size(&self) -> (u32, u32);

    fn current_time(&self) -> f64;

    /// Paints the visible frame over the whole of `surface`.
    fn draw_frame(&self, surface: &mut RgbaImage) -> Result<(), String>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("The video is not ready yet, wait for it to load before capturing")]
    NotReady,

    #[error("Failed to capture frame: {0}")]
    RenderFailed(String)
}

/// A PNG held in memory. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    png: Arc<[u8]>
}

impl EncodedImage {
    pub fn from_png(png: Vec<u8>) -> Option<Self> {
        if png.is_empty() {
            return None;
        }

        Some(Self { png: png.into() })
    }

    pub fn png_bytes(&self) -> &Arc<[u8]> {
        &self.png
    }

    pub fn byte_len(&self) -> usize {
        self.png.len()
    }

    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedImage({} bytes png)", self.png.len())
    }
}

/// Rasterizes the visible frame of a [`FrameSource`] into a PNG.
///
/// The surface is kept between calls to avoid reallocating it for every
/// capture of the same video, but it is wiped before each render.
pub struct FrameCapture {
    surface: RgbaImage
}

impl FrameCapture {
    pub fn new() -> Self {
        Self { surface: RgbaImage::new(0, 0) }
    }

    pub fn capture<S: FrameSource + ?Sized>(&mut self, source: &S) -> Result<EncodedImage, CaptureError> {
        let (width, height) = source.intrinsic_size();
        if width == 0 || height == 0 {
            return Err(CaptureError::NotReady);
        }

        if self.surface.dimensions() != (width, height) {
            self.surface = RgbaImage::new(width, height);
        } else {
            self.surface.fill(0);
        }

        source.draw_frame(&mut self.surface).map_err(CaptureError::RenderFailed)?;

        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(self.surface.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| CaptureError::RenderFailed(e.to_string()))?;

        debug!(width, height, position = source.current_time(), bytes = png.len(), "frame captured");
        EncodedImage::from_png(png).ok_or_else(|| CaptureError::RenderFailed(String::from("encoder produced no data")))
    }
}
