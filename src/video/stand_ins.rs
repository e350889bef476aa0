//! Shell scripts that stand in for ffmpeg and ffprobe in unit tests

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::config::VideoConfig;

/// Write an executable `/bin/sh` script and return its path as a tool name
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.display().to_string()
}

/// Config whose tools are the given scripts
pub(crate) fn scripted_config(ffmpeg: String, ffprobe: String) -> VideoConfig {
    VideoConfig {
        ffmpeg_path: ffmpeg,
        ffprobe_path: ffprobe,
        ..VideoConfig::default()
    }
}
