// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_ffprobe_json() {
    let stdout = br#"{
        "streams": [
            { "codec_type": "audio", "codec_name": "aac" },
            { "codec_type": "video", "codec_name": "h264" }
        ],
        "format": { "format_name": "mov,mp4,m4a", "duration": "4213.600000" }
    }"#;
    let info = parse_output(stdout).unwrap().unwrap();
    assert_eq!(info.format, "mov,mp4,m4a");
    assert_eq!(info.video_codec.as_deref(), Some("h264"));
    assert_eq!(info.duration_secs, Some(4213.6));
}

#[test]
fn missing_format_is_not_media() {
    assert_eq!(parse_output(b"{}").unwrap(), None);
}

#[test]
fn garbage_output_is_a_parse_error() {
    assert!(matches!(parse_output(b"not json"), Err(ProbeError::Parse(_))));
}
