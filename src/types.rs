/*!
 * Core types and data structures for cliptree
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::ClipTreeError;
use crate::utils::display_name;

/// What a resolved root points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// A regular file
    File,
    /// A directory
    Directory,
}

/// A user-supplied path, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPath {
    /// The path as the user wrote it
    pub requested: String,
    /// Absolute, canonical path
    pub path: PathBuf,
    /// File or directory
    pub kind: RootKind,
}

impl RootPath {
    /// Name shown for this root in the tree
    pub fn name(&self) -> String {
        display_name(&self.path)
    }
}

/// The roots of one run, in the order they were given
#[derive(Debug, Default)]
pub struct RootSet {
    roots: Vec<RootPath>,
    missing: Vec<ClipTreeError>,
}

impl RootSet {
    /// Resolve every requested path. Missing paths and paths that are
    /// neither files nor directories are reported and dropped.
    pub fn resolve<S: AsRef<str>>(paths: &[S]) -> Self {
        let mut set = Self::default();

        for requested in paths {
            let requested = requested.as_ref();
            let path = Path::new(requested);

            let canonical = match path.canonicalize() {
                Ok(p) => p,
                Err(_) => {
                    warn!("{} does not exist and will be skipped.", requested);
                    set.missing
                        .push(ClipTreeError::PathNotFound(path.to_path_buf()));
                    continue;
                }
            };

            let kind = match fs::metadata(&canonical) {
                Ok(m) if m.is_dir() => RootKind::Directory,
                Ok(m) if m.is_file() => RootKind::File,
                _ => {
                    warn!(
                        "{} is neither a file nor a directory and will be skipped.",
                        requested
                    );
                    set.missing.push(ClipTreeError::Io(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("{} is neither a file nor a directory", requested),
                    )));
                    continue;
                }
            };

            set.roots.push(RootPath {
                requested: requested.to_string(),
                path: canonical,
                kind,
            });
        }

        set
    }

    pub fn iter(&self) -> impl Iterator<Item = &RootPath> {
        self.roots.iter()
    }

    /// Canonical paths of the resolved roots
    pub fn paths(&self) -> Vec<PathBuf> {
        self.roots.iter().map(|r| r.path.clone()).collect()
    }

    /// Consume the set, keeping only the errors for dropped paths
    pub fn into_missing(self) -> Vec<ClipTreeError> {
        self.missing
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Result of sniffing the head of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// UTF-8 text
    Text,
    /// Binary data
    Binary,
    /// Neither clearly text nor binary (another encoding, or unreadable)
    Undetermined,
}

/// A collected file, ready for content assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute, canonical path
    pub path: PathBuf,
    /// How the content was classified
    pub content: ContentKind,
}
