use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Rebuild-level failures. Problems with a single file never surface here.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The root directory is missing or cannot be stat'd.
    #[error("music directory unavailable: {}: {source}", path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The traversal hit a structural error; the previous catalog is kept.
    #[error("scan of {} failed: {source}", path.display())]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("scan cancelled")]
    Cancelled,
}

impl LibraryError {
    /// Whether the root directory does not exist at all (as opposed to being
    /// unreadable).
    pub fn is_missing_directory(&self) -> bool {
        matches!(
            self,
            LibraryError::DirectoryUnavailable { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }
}
