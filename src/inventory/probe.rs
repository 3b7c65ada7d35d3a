// SYNOID Clip Probe
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Duration extraction via ffprobe and directory scanning for video files.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use walkdir::WalkDir;

pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "mkv", "avi", "webm", "m4v"];

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("ffprobe could not be executed: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffprobe duration check timed out")]
    TimedOut,

    #[error("ffprobe failed: {0}")]
    Failed(String),

    #[error("Failed to parse duration from ffprobe output: {0:?}")]
    Unparseable(String),
}

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read the container duration of a video in seconds.
pub async fn probe_duration(path: &Path) -> Result<f64, ProbeError> {
    // Getting duration from the header is usually instant
    let output = tokio::time::timeout(
        tokio::time::Duration::from_secs(10),
        Command::new("ffprobe")
            .kill_on_drop(true)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output(),
    )
    .await
    .map_err(|_| ProbeError::TimedOut)??;

    if !output.status.success() {
        return Err(ProbeError::Failed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

pub(crate) fn parse_duration(raw: &str) -> Result<f64, ProbeError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .ok_or_else(|| ProbeError::Unparseable(trimmed.to_string()))
}

/// Collect every video file under `dir`, sorted by path.
pub fn scan_directory_for_videos(dir: &Path) -> Vec<PathBuf> {
    let mut videos: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_video_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    videos.sort();
    videos
}
