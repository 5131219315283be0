//! Music library indexing.
//!
//! `extract` turns one audio file into a [`Song`]; `index` keeps the whole
//! catalog cached and decides when the directory tree has to be walked again.

mod duration;
mod error;
mod extract;
mod id;
mod index;
mod model;
mod walk;

pub use duration::{DurationStrategy, format_duration, strategy_for};
pub use error::LibraryError;
pub use extract::{TagInfo, extract_song, read_tags};
pub use id::{SONG_ID_HEX_LEN, is_valid_song_id, song_id};
pub use index::{Clock, DEFAULT_CACHE_TTL_MINUTES, IndexStatus, LibraryIndex, SystemClock};
pub use model::{Song, UNKNOWN};
pub use walk::{DEFAULT_EXTENSION, FileCandidate, FsWalker, ScanOptions, TreeWalker};
