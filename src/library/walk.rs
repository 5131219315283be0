use std::path::{Path, PathBuf};

use tracing::warn;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::error::LibraryError;

/// Which files a traversal reports and how it descends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Lowercased extensions without the leading dot.
    pub extensions: Vec<String>,
    pub follow_links: bool,
    pub include_hidden: bool,
    pub max_depth: Option<usize>,
}

/// Extension indexed when the configured set is empty.
pub const DEFAULT_EXTENSION: &str = "mp3";

impl ScanOptions {
    pub fn from_settings(settings: &LibrarySettings) -> Self {
        let mut extensions: Vec<String> = settings
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if extensions.is_empty() {
            extensions.push(DEFAULT_EXTENSION.to_string());
        }

        Self {
            extensions,
            follow_links: settings.follow_links,
            include_hidden: settings.include_hidden,
            max_depth: settings.max_depth,
        }
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| e == &ext)
            })
            .unwrap_or(false)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// A regular file with a supported extension, found during a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub size: u64,
}

/// Directory traversal used by a rebuild.
///
/// Implementations report candidates in traversal order, check `cancel`
/// before every visit, skip (and log) files whose metadata cannot be read,
/// and stop with [`LibraryError::ScanFailed`] on structural errors.
pub trait TreeWalker: Send + Sync {
    fn walk(
        &self,
        root: &Path,
        options: &ScanOptions,
        cancel: &CancellationToken,
        visit: &mut dyn FnMut(FileCandidate),
    ) -> Result<(), LibraryError>;
}

/// [`TreeWalker`] over the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWalker;

impl TreeWalker for FsWalker {
    fn walk(
        &self,
        root: &Path,
        options: &ScanOptions,
        cancel: &CancellationToken,
        visit: &mut dyn FnMut(FileCandidate),
    ) -> Result<(), LibraryError> {
        let mut walker = WalkDir::new(root).follow_links(options.follow_links);
        if let Some(d) = options.max_depth {
            walker = walker.max_depth(d);
        }

        for entry in walker
            .into_iter()
            .filter_entry(|e| options.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        {
            if cancel.is_cancelled() {
                return Err(LibraryError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if is_file_level(&err, options) => {
                    warn!(error = %err, "skipping unreadable file");
                    continue;
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    return Err(LibraryError::ScanFailed { path, source: err });
                }
            };

            if !entry.file_type().is_file() || !options.is_supported(entry.path()) {
                continue;
            }

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "failed to read file metadata");
                    continue;
                }
            };

            visit(FileCandidate {
                path: entry.path().to_path_buf(),
                size,
            });
        }

        Ok(())
    }
}

/// Whether a walk error concerns a single audio file rather than the tree.
///
/// Symlink loops are skipped too: they only arise with `follow_links` and do
/// not make the rest of the tree unreadable.
fn is_file_level(err: &walkdir::Error, options: &ScanOptions) -> bool {
    if err.loop_ancestor().is_some() {
        return true;
    }
    let Some(path) = err.path() else {
        return false;
    };
    if err.depth() == 0 || !options.is_supported(path) {
        return false;
    }
    std::fs::symlink_metadata(path)
        .map(|m| !m.is_dir())
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn collect(root: &Path, options: &ScanOptions) -> Vec<String> {
        let mut names = Vec::new();
        FsWalker
            .walk(root, options, &CancellationToken::new(), &mut |c| {
                names.push(c.path.file_name().unwrap().to_string_lossy().into_owned())
            })
            .unwrap();
        names.sort();
        names
    }

    fn options() -> ScanOptions {
        ScanOptions::from_settings(&LibrarySettings::default())
    }

    #[test]
    fn is_supported_matches_configured_extensions_case_insensitive() {
        let options = options();
        assert!(options.is_supported(Path::new("/tmp/a.mp3")));
        assert!(options.is_supported(Path::new("/tmp/a.MP3")));
        assert!(options.is_supported(Path::new("/tmp/a.flac")));
        assert!(options.is_supported(Path::new("/tmp/a.wav")));
        assert!(options.is_supported(Path::new("/tmp/a.ogg")));
        assert!(options.is_supported(Path::new("/tmp/a.m4a")));
        assert!(!options.is_supported(Path::new("/tmp/a.txt")));
        assert!(!options.is_supported(Path::new("/tmp/a")));
    }

    #[test]
    fn empty_extension_list_falls_back_to_mp3() {
        let settings = LibrarySettings {
            extensions: vec![" ".into()],
            ..LibrarySettings::default()
        };
        let options = ScanOptions::from_settings(&settings);
        assert_eq!(options.extensions, vec!["mp3".to_string()]);
    }

    #[test]
    fn extensions_are_normalized() {
        let settings = LibrarySettings {
            extensions: vec![".FLAC".into(), "Ogg".into()],
            ..LibrarySettings::default()
        };
        let options = ScanOptions::from_settings(&settings);
        assert_eq!(options.extensions, vec!["flac".to_string(), "ogg".to_string()]);
    }

    #[test]
    fn walk_skips_directories_and_unsupported_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
        fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();
        fs::create_dir_all(dir.path().join("folder.mp3")).unwrap();

        assert_eq!(collect(dir.path(), &options()), vec!["b.MP3".to_string()]);
    }

    #[test]
    fn walk_respects_include_hidden_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
        fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();
        let hidden_dir = dir.path().join(".cache");
        fs::create_dir_all(&hidden_dir).unwrap();
        fs::write(hidden_dir.join("inner.mp3"), b"not real").unwrap();

        let options = ScanOptions {
            include_hidden: false,
            ..options()
        };
        assert_eq!(collect(dir.path(), &options), vec!["visible.mp3".to_string()]);
    }

    #[test]
    fn walk_respects_max_depth() {
        let dir = tempdir().unwrap();
        let d1 = dir.path().join("d1");
        let d2 = d1.join("d2");
        fs::create_dir_all(&d2).unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        fs::write(d1.join("one.mp3"), b"not real").unwrap();
        fs::write(d2.join("two.mp3"), b"not real").unwrap();

        // WalkDir depth counts root as 0, children as 1, grandchildren as 2...
        let options = ScanOptions {
            max_depth: Some(2),
            ..options()
        };
        assert_eq!(
            collect(dir.path(), &options),
            vec!["one.mp3".to_string(), "root.mp3".to_string()]
        );
    }

    #[test]
    fn walk_stops_when_cancelled() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.mp3"), b"x").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut visited = 0;
        let res = FsWalker.walk(dir.path(), &options(), &cancel, &mut |_| visited += 1);
        assert!(matches!(res, Err(LibraryError::Cancelled)));
        assert_eq!(visited, 0);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped_when_following_links() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ok.mp3"), b"x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere.mp3"), dir.path().join("broken.mp3"))
            .unwrap();

        let options = ScanOptions {
            follow_links: true,
            ..options()
        };
        assert_eq!(collect(dir.path(), &options), vec!["ok.mp3".to_string()]);
    }
}
