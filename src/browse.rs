//! Read-only views over a catalog snapshot: search, artist and album
//! listings, and library statistics.
//!
//! Everything here works on the `Vec<Song>` returned by
//! [`LibraryIndex::catalog`](crate::library::LibraryIndex::catalog) and never
//! touches the index itself.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::library::Song;

pub const DEFAULT_SEARCH_LIMIT: usize = 50;
pub const MAX_SEARCH_LIMIT: usize = 200;

/// Which text fields a search looks at.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum SearchField {
    #[default]
    All,
    Title,
    Artist,
    Album,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub field: SearchField,
    /// Page size; 0 or anything above [`MAX_SEARCH_LIMIT`] means
    /// [`DEFAULT_SEARCH_LIMIT`].
    pub limit: usize,
    pub offset: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn page_size(&self) -> usize {
        match self.limit {
            1..=MAX_SEARCH_LIMIT => self.limit,
            _ => DEFAULT_SEARCH_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    /// The requested page of matches.
    pub songs: Vec<Song>,
    /// Number of matches before paging.
    pub total: usize,
    /// Distinct artists among all matches, sorted.
    pub artists: Vec<String>,
    /// Distinct albums among all matches, sorted.
    pub albums: Vec<String>,
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Case-insensitive substring search. Title matches rank ahead of matches on
/// other fields; ties are ordered by title.
pub fn search(songs: &[Song], query: &SearchQuery) -> SearchResults {
    let needle = query.text.trim().to_lowercase();
    if needle.is_empty() {
        return SearchResults::default();
    }

    let mut matched: Vec<&Song> = songs
        .iter()
        .filter(|s| match query.field {
            SearchField::Title => contains_ignore_case(&s.title, &needle),
            SearchField::Artist => contains_ignore_case(&s.artist, &needle),
            SearchField::Album => contains_ignore_case(&s.album, &needle),
            SearchField::All => {
                contains_ignore_case(&s.title, &needle)
                    || contains_ignore_case(&s.artist, &needle)
                    || contains_ignore_case(&s.album, &needle)
            }
        })
        .collect();

    let artists: BTreeSet<&str> = matched
        .iter()
        .map(|s| s.artist.as_str())
        .filter(|a| !a.is_empty())
        .collect();
    let albums: BTreeSet<&str> = matched
        .iter()
        .map(|s| s.album.as_str())
        .filter(|a| !a.is_empty())
        .collect();

    matched.sort_by(|a, b| {
        let a_title = contains_ignore_case(&a.title, &needle);
        let b_title = contains_ignore_case(&b.title, &needle);
        b_title.cmp(&a_title).then_with(|| a.title.cmp(&b.title))
    });

    let total = matched.len();
    let page = matched
        .into_iter()
        .skip(query.offset)
        .take(query.page_size())
        .cloned()
        .collect();

    SearchResults {
        songs: page,
        total,
        artists: artists.into_iter().map(str::to_string).collect(),
        albums: albums.into_iter().map(str::to_string).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistSummary {
    pub name: String,
    pub song_count: usize,
}

/// Distinct artists, most songs first, then by name.
pub fn artists(songs: &[Song]) -> Vec<ArtistSummary> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for song in songs.iter().filter(|s| !s.artist.is_empty()) {
        *counts.entry(song.artist.as_str()).or_default() += 1;
    }

    let mut out: Vec<ArtistSummary> = counts
        .into_iter()
        .map(|(name, song_count)| ArtistSummary {
            name: name.to_string(),
            song_count,
        })
        .collect();
    out.sort_by(|a, b| b.song_count.cmp(&a.song_count).then_with(|| a.name.cmp(&b.name)));
    out
}

/// Songs by `artist` (case-insensitive), ordered by album then title.
pub fn songs_by_artist(songs: &[Song], artist: &str) -> Vec<Song> {
    let artist = artist.to_lowercase();
    let mut out: Vec<Song> = songs
        .iter()
        .filter(|s| s.artist.to_lowercase() == artist)
        .cloned()
        .collect();
    out.sort_by(|a, b| a.album.cmp(&b.album).then_with(|| a.title.cmp(&b.title)));
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumSummary {
    pub name: String,
    pub artist: String,
    pub song_count: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub year: u32,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Distinct (album, artist) pairs, ordered by album name.
pub fn albums(songs: &[Song]) -> Vec<AlbumSummary> {
    let mut by_key: BTreeMap<(&str, &str), AlbumSummary> = BTreeMap::new();
    for song in songs.iter().filter(|s| !s.album.is_empty()) {
        by_key
            .entry((song.album.as_str(), song.artist.as_str()))
            .and_modify(|a| {
                a.song_count += 1;
                if a.year == 0 {
                    a.year = song.year;
                }
            })
            .or_insert_with(|| AlbumSummary {
                name: song.album.clone(),
                artist: song.artist.clone(),
                song_count: 1,
                year: song.year,
            });
    }
    by_key.into_values().collect()
}

/// Songs on `album` (case-insensitive), ordered by track number then title.
pub fn songs_by_album(songs: &[Song], album: &str) -> Vec<Song> {
    let album = album.to_lowercase();
    let mut out: Vec<Song> = songs
        .iter()
        .filter(|s| s.album.to_lowercase() == album)
        .cloned()
        .collect();
    out.sort_by(|a, b| a.track.cmp(&b.track).then_with(|| a.title.cmp(&b.title)));
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub songs: usize,
    pub artists: usize,
    pub albums: usize,
    pub total_duration_secs: u64,
    pub total_bytes: u64,
    /// Song count per format (e.g. `.mp3`).
    pub formats: BTreeMap<String, usize>,
}

pub fn stats(songs: &[Song]) -> LibraryStats {
    let mut stats = LibraryStats {
        songs: songs.len(),
        ..LibraryStats::default()
    };
    let mut artists = BTreeSet::new();
    let mut albums = BTreeSet::new();

    for song in songs {
        artists.insert(song.artist.as_str());
        albums.insert((song.album.as_str(), song.artist.as_str()));
        stats.total_duration_secs += song.duration_secs;
        stats.total_bytes += song.file_size;
        *stats.formats.entry(song.format.clone()).or_default() += 1;
    }

    stats.artists = artists.len();
    stats.albums = albums.len();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn song(title: &str, artist: &str, album: &str, track: u32) -> Song {
        Song {
            id: crate::library::song_id(&PathBuf::from(format!("/m/{artist}/{album}/{title}.mp3"))),
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            genre: String::new(),
            year: 0,
            track,
            duration_secs: 100,
            duration_formatted: "1:40".to_string(),
            file_path: PathBuf::from(format!("/m/{title}.mp3")),
            file_name: format!("{title}.mp3"),
            file_size: 1000,
            format: ".mp3".to_string(),
            has_cover: false,
            added_at: DateTime::<Utc>::from(SystemTime::UNIX_EPOCH),
        }
    }

    fn library() -> Vec<Song> {
        vec![
            song("Blue Monday", "New Order", "Substance", 1),
            song("Temptation", "New Order", "Substance", 2),
            song("Love Will Tear Us Apart", "Joy Division", "Substance", 1),
            song("Blue", "Joni Mitchell", "Blue", 10),
            song("River", "Joni Mitchell", "Blue", 7),
        ]
    }

    #[test]
    fn search_ranks_title_matches_first() {
        let res = search(&library(), &SearchQuery::new("blue"));
        let titles: Vec<&str> = res.songs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Blue", "Blue Monday", "River"]);
        assert_eq!(res.total, 3);
        assert_eq!(res.artists, vec!["Joni Mitchell", "New Order"]);
        assert_eq!(res.albums, vec!["Blue", "Substance"]);
    }

    #[test]
    fn search_can_target_one_field() {
        let query = SearchQuery {
            field: SearchField::Artist,
            ..SearchQuery::new("order")
        };
        let res = search(&library(), &query);
        assert_eq!(res.total, 2);
        assert!(res.songs.iter().all(|s| s.artist == "New Order"));
    }

    #[test]
    fn search_pages_after_counting() {
        let query = SearchQuery {
            limit: 1,
            offset: 1,
            ..SearchQuery::new("substance")
        };
        let res = search(&library(), &query);
        assert_eq!(res.total, 3);
        assert_eq!(res.songs.len(), 1);

        let query = SearchQuery {
            offset: 10,
            ..SearchQuery::new("substance")
        };
        assert!(search(&library(), &query).songs.is_empty());
    }

    #[test]
    fn out_of_range_limit_resets_to_default() {
        let with_limit = |limit| SearchQuery {
            limit,
            ..SearchQuery::new("x")
        };
        assert_eq!(with_limit(0).page_size(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(with_limit(1000).page_size(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(with_limit(MAX_SEARCH_LIMIT).page_size(), MAX_SEARCH_LIMIT);
        assert_eq!(with_limit(7).page_size(), 7);
    }

    #[test]
    fn blank_query_matches_nothing() {
        assert_eq!(search(&library(), &SearchQuery::new("   ")), SearchResults::default());
    }

    #[test]
    fn artists_sorted_by_count_then_name() {
        let list = artists(&library());
        let names: Vec<(&str, usize)> = list.iter().map(|a| (a.name.as_str(), a.song_count)).collect();
        assert_eq!(
            names,
            vec![("Joni Mitchell", 2), ("New Order", 2), ("Joy Division", 1)]
        );
    }

    #[test]
    fn albums_are_keyed_by_album_and_artist() {
        let list = albums(&library());
        let keys: Vec<(&str, &str, usize)> = list
            .iter()
            .map(|a| (a.name.as_str(), a.artist.as_str(), a.song_count))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Blue", "Joni Mitchell", 2),
                ("Substance", "Joy Division", 1),
                ("Substance", "New Order", 2),
            ]
        );
    }

    #[test]
    fn album_tracks_follow_track_number() {
        let tracks = songs_by_album(&library(), "BLUE");
        let titles: Vec<&str> = tracks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["River", "Blue"]);
    }

    #[test]
    fn artist_songs_follow_album_then_title() {
        let tracks = songs_by_artist(&library(), "new order");
        let titles: Vec<&str> = tracks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Blue Monday", "Temptation"]);
    }

    #[test]
    fn stats_sum_the_library() {
        let s = stats(&library());
        assert_eq!(s.songs, 5);
        assert_eq!(s.artists, 3);
        assert_eq!(s.albums, 3);
        assert_eq!(s.total_duration_secs, 500);
        assert_eq!(s.total_bytes, 5000);
        assert_eq!(s.formats.get(".mp3"), Some(&5));
    }
}
