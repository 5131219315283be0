use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Number of digest bytes kept in a song id.
pub const SONG_ID_BYTES: usize = 16;
/// Length of a song id in hex characters.
pub const SONG_ID_HEX_LEN: usize = SONG_ID_BYTES * 2;

static VALID_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^[a-f0-9]{{{SONG_ID_HEX_LEN}}}$")).expect("song id pattern is valid")
});

/// Derive the stable id of the file at `path`.
///
/// The id depends only on the path bytes, so rescanning an unchanged tree
/// (or restarting the process) yields the same ids. Paths that are not valid
/// UTF-8 are hashed as their raw bytes and never collide with each other.
pub fn song_id(path: &Path) -> String {
    let digest = Sha256::digest(path.as_os_str().as_encoded_bytes());
    digest[..SONG_ID_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Whether `id` has the shape of a song id (`^[a-f0-9]{32}$`).
///
/// Callers must run untrusted ids through this before using them to look up
/// files.
pub fn is_valid_song_id(id: &str) -> bool {
    VALID_ID.is_match(id)
}
