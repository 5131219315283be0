use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use lofty::config::ParseOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;

use super::duration::{duration_secs, format_duration};
use super::id::song_id;
use super::model::{Song, UNKNOWN};

/// Fields an embedded tag actually supplied. Absent fields stay `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u32>,
    pub track: Option<u32>,
    pub has_cover: bool,
}

impl TagInfo {
    /// Overlay the supplied fields onto `song`, leaving the rest untouched.
    pub fn apply_to(self, song: &mut Song) {
        if let Some(v) = self.title {
            song.title = v;
        }
        if let Some(v) = self.artist {
            song.artist = v;
        }
        if let Some(v) = self.album {
            song.album = v;
        }
        if let Some(v) = self.genre {
            song.genre = v;
        }
        if let Some(v) = self.year {
            song.year = v;
        }
        if let Some(v) = self.track {
            song.track = v;
        }
        if self.has_cover {
            song.has_cover = true;
        }
    }
}

fn non_empty(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Leading four-digit year of a date string such as `2001` or `2001-05-12`.
fn parse_year(raw: &str) -> Option<u32> {
    let digits: String = raw.trim().chars().take(4).collect();
    if digits.len() != 4 {
        return None;
    }
    digits.parse::<u32>().ok().filter(|y| *y > 0)
}

/// Read embedded tags. Any failure (unknown format, corrupt tag, I/O) is
/// reported as `None` so the caller keeps its defaults.
///
/// Audio properties are not parsed, so a damaged audio stream does not hide
/// an intact tag.
pub fn read_tags(path: &Path) -> Option<TagInfo> {
    let tagged = Probe::open(path)
        .ok()?
        .options(ParseOptions::new().read_properties(false))
        .read()
        .ok()?;
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;

    Some(TagInfo {
        title: non_empty(tag.title()),
        artist: non_empty(tag.artist()),
        album: non_empty(tag.album()),
        genre: non_empty(tag.genre()),
        year: tag
            .get_string(ItemKey::RecordingDate)
            .and_then(parse_year),
        track: tag.track().filter(|t| *t > 0),
        has_cover: !tag.pictures().is_empty(),
    })
}

/// Build the catalog entry for the file at `path`.
///
/// Always yields a song: tag and duration problems only leave defaults in
/// place.
pub fn extract_song(path: &Path, file_size: u64) -> Song {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());
    let format = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    let added_at: DateTime<Utc> = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or_else(|_| SystemTime::now())
        .into();

    let mut song = Song {
        id: song_id(path),
        title,
        artist: UNKNOWN.to_string(),
        album: UNKNOWN.to_string(),
        genre: String::new(),
        year: 0,
        track: 0,
        duration_secs: 0,
        duration_formatted: format_duration(0),
        file_path: path.to_path_buf(),
        file_name,
        file_size,
        format,
        has_cover: false,
        added_at,
    };

    if let Some(tags) = read_tags(path) {
        tags.apply_to(&mut song);
    }

    song.duration_secs = duration_secs(path, &song.format, file_size);
    song.duration_formatted = format_duration(song.duration_secs as i64);
    song
}
