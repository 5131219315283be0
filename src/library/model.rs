use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Placeholder used for artist/album when no tag supplies one.
pub const UNKNOWN: &str = "Unknown";

/// One playable audio file as it appeared during the scan that produced it.
///
/// Songs are built once per rebuild and never mutated afterwards; a later scan
/// replaces them wholesale. `id` is the only handle collaborators should keep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub genre: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub year: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub track: u32,
    #[serde(rename = "duration")]
    pub duration_secs: u64,
    pub duration_formatted: String,
    pub file_path: PathBuf,
    pub file_name: String,
    pub file_size: u64,
    pub format: String,
    pub has_cover: bool,
    /// File modification time, serialized as RFC 3339.
    pub added_at: DateTime<Utc>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl Song {
    /// MIME type used when streaming this file.
    pub fn mime_type(&self) -> &'static str {
        match self.format.as_str() {
            ".mp3" => "audio/mpeg",
            ".flac" => "audio/flac",
            ".wav" => "audio/wav",
            ".m4a" => "audio/mp4",
            ".aac" => "audio/aac",
            ".ogg" => "audio/ogg",
            _ => "application/octet-stream",
        }
    }
}
