//! Frame extraction for visual episode confirmation.
//!
//! Shells out to ffmpeg/ffprobe: given a file path and a timestamp,
//! return one PNG image or an error. Nothing here knows about episodes.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("video file missing: {0}")]
    SourceMissing(std::path::PathBuf),
    #[error("frame extraction failed: {0}")]
    ExtractFailed(String),
    #[error("probe failed: {0}")]
    ProbeFailed(String),
}

/// Extract a single frame as PNG bytes at `timestamp_secs`.
pub async fn extract_frame(
    ffmpeg_path: &Path,
    file: &Path,
    timestamp_secs: f64,
) -> Result<Vec<u8>, FrameError> {
    if !file.exists() {
        return Err(FrameError::SourceMissing(file.to_path_buf()));
    }

    debug!(file = %file.display(), timestamp_secs, "extracting frame");

    let output = tokio::process::Command::new(ffmpeg_path)
        .args(["-ss", &format!("{timestamp_secs}")])
        .arg("-i")
        .arg(file)
        .args(["-vframes", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
        .output()
        .await
        .map_err(|e| FrameError::ExtractFailed(format!("spawn failed: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FrameError::ExtractFailed(stderr.into_owned()));
    }
    if output.stdout.is_empty() {
        return Err(FrameError::ExtractFailed(format!(
            "no frame at {timestamp_secs}s"
        )));
    }

    Ok(output.stdout)
}

/// Video duration in seconds, via ffprobe.
pub async fn probe_duration(ffprobe_path: &Path, file: &Path) -> Result<f64, FrameError> {
    if !file.exists() {
        return Err(FrameError::SourceMissing(file.to_path_buf()));
    }

    let output = tokio::process::Command::new(ffprobe_path)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
        ])
        .arg(file)
        .output()
        .await
        .map_err(|e| FrameError::ProbeFailed(format!("spawn failed: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FrameError::ProbeFailed(stderr.into_owned()));
    }

    let raw: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| FrameError::ProbeFailed(format!("parse JSON: {e}")))?;

    parse_duration(&raw)
}

fn parse_duration(raw: &serde_json::Value) -> Result<f64, FrameError> {
    raw["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse().ok())
        .ok_or_else(|| FrameError::ProbeFailed("missing format.duration".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_from_probe_json() {
        let json = serde_json::json!({
            "format": { "duration": "1325.462000" }
        });
        let d = parse_duration(&json).unwrap();
        assert!((d - 1325.462).abs() < 0.001);
    }

    #[test]
    fn missing_duration_is_an_error() {
        let json = serde_json::json!({ "format": {} });
        assert!(matches!(
            parse_duration(&json),
            Err(FrameError::ProbeFailed(_))
        ));
    }

    #[tokio::test]
    async fn extract_from_missing_file_fails_fast() {
        let err = extract_frame(
            Path::new("ffmpeg"),
            Path::new("/nonexistent/ep.mkv"),
            30.0,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FrameError::SourceMissing(_)));
    }
}
