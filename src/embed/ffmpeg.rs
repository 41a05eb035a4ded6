use std::{ffi::OsString, path::{Path, PathBuf}};

/// `<dir>/<stem>_thumb.<ext>` next to the source video.
pub fn output_path(video: &Path) -> PathBuf {
    let parent = video.parent().unwrap_or(Path::new(""));
    let stem = video.file_stem().unwrap_or_default().to_string_lossy();
    let name = match video.extension() {
        Some(ext) => format!("{}_thumb.{}", stem, ext.to_string_lossy()),
        None => format!("{}_thumb", stem)
    };
    parent.join(name)
}

/// The image goes in as the first stream and is flagged as the cover, the
/// video's own streams are copied untouched.
pub fn build_cmd(video: &Path, image: &Path, output: &Path) -> Vec<OsString> {
    let mut args = Vec::new();
    args.push(OsString::from("-i"));
    args.push(video.as_os_str().to_owned());
    args.push(OsString::from("-i"));
    args.push(image.as_os_str().to_owned());

    for arg in ["-map", "1", "-map", "0", "-c", "copy", "-disposition:0", "attached_pic"] {
        args.push(OsString::from(arg));
    }

    args.push(output.as_os_str().to_owned());
    args.push(OsString::from("-y"));
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_sits_next_to_the_video() {
        assert_eq!(output_path(Path::new("/films/trip.mp4")), PathBuf::from("/films/trip_thumb.mp4"));
        assert_eq!(output_path(Path::new("/films/archive.v2.mkv")), PathBuf::from("/films/archive.v2_thumb.mkv"));
        assert_eq!(output_path(Path::new("/films/raw")), PathBuf::from("/films/raw_thumb"));
    }

    #[test]
    fn image_is_mapped_first_as_attached_pic() {
        let args = build_cmd(Path::new("/v.mp4"), Path::new("/c.png"), Path::new("/v_thumb.mp4"));
        let expected: Vec<OsString> = [
            "-i", "/v.mp4", "-i", "/c.png",
            "-map", "1", "-map", "0", "-c", "copy", "-disposition:0", "attached_pic",
            "/v_thumb.mp4", "-y"
        ].iter().map(OsString::from).collect();
        assert_eq!(args, expected);
    }
}
