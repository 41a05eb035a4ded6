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

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "thumbset=info";

#[derive(Debug, Clone, Parser)]
#[command(name = "thumbset", version, about = "Embed a still image or a captured frame as a video's thumbnail")]
pub struct Config {
    /// ffmpeg binary used to decode frames and write the thumbnail
    #[arg(long, env = "THUMBSET_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// ffprobe binary used to read video dimensions
    #[arg(long, env = "THUMBSET_FFPROBE", default_value = "ffprobe")]
    pub ffprobe: String,

    /// Video to open at startup
    #[arg(long, value_name = "PATH")]
    pub video: Option<PathBuf>,

    /// Log filter, e.g. `thumbset=debug`. Falls back to RUST_LOG.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>
}

impl Config {
    pub fn log_filter(&self) -> EnvFilter {
        match &self.log_level {
            Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "thumbset", "--ffmpeg", "/opt/ffmpeg/bin/ffmpeg", "--video", "/films/trip.mp4", "--log-level", "thumbset=debug"
        ]).unwrap();

        assert_eq!(config.ffmpeg, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.video, Some(PathBuf::from("/films/trip.mp4")));
        assert_eq!(config.log_level.as_deref(), Some("thumbset=debug"));
        assert_eq!(config.log_filter().to_string(), "thumbset=debug");
    }

    #[test]
    fn video_is_optional() {
        let config = Config::try_parse_from(["thumbset"]).unwrap();
        assert!(config.video.is_none());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Config::try_parse_from(["thumbset", "--batch"]).is_err());
    }
}
