// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ffprobe`-backed media probe.

use super::{ProbeAdapter, ProbeError};
use async_trait::async_trait;
use compressarr_core::MediaInfo;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Probes files by shelling out to `ffprobe` with JSON output.
///
/// Non-zero exits are "not a media file", not errors: ffprobe refuses
/// anything it cannot demux.
pub struct FfprobeAdapter {
    binary: PathBuf,
    timeout: Duration,
}

impl FfprobeAdapter {
    pub fn new() -> Self {
        Self { binary: PathBuf::from("ffprobe"), timeout: Duration::from_secs(10) }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for FfprobeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProbeAdapter for FfprobeAdapter {
    async fn probe(&self, path: &Path) -> Result<Option<MediaInfo>, ProbeError> {
        let mut command = Command::new(&self.binary);
        command
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ProbeError::Timeout)??;

        if !output.status.success() {
            return Ok(None);
        }
        parse_output(&output.stdout)
    }
}

fn parse_output(stdout: &[u8]) -> Result<Option<MediaInfo>, ProbeError> {
    let value: serde_json::Value =
        serde_json::from_slice(stdout).map_err(|e| ProbeError::Parse(e.to_string()))?;

    let Some(format) = value["format"]["format_name"].as_str() else {
        return Ok(None);
    };

    let duration_secs =
        value["format"]["duration"].as_str().and_then(|d| d.parse::<f64>().ok());
    let video_codec = value["streams"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|stream| stream["codec_type"] == "video")
        .and_then(|stream| stream["codec_name"].as_str())
        .map(str::to_string);

    let mut info = MediaInfo::new(format);
    info.duration_secs = duration_secs;
    info.video_codec = video_codec;
    Ok(Some(info))
}

#[cfg(test)]
#[path = "ffprobe_tests.rs"]
mod tests;
