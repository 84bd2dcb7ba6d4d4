/*!
 * File collection
 */

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str;

use clap::ValueEnum;
use content_inspector::ContentType;
use tracing::{debug, warn};

use crate::error::ClipTreeError;
use crate::ignore_index::IgnoreIndex;
use crate::types::{ContentKind, FileEntry, RootKind, RootPath, RootSet};
use crate::utils::resolve_path;
use crate::walker::{walk, Node, Visitor};

/// Number of bytes sniffed to classify a file
const SNIFF_LEN: usize = 1024;

/// What to do with files whose content cannot be classified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum UndetectedPolicy {
    /// Keep them; unreadable content is dropped during assembly (default)
    #[default]
    Include,
    /// Leave them out of the file list
    Exclude,
}

/// Everything a collection pass found
#[derive(Debug, Default)]
pub struct Collection {
    /// Collected files, in walk order
    pub files: Vec<FileEntry>,
    /// Files left out because their content is binary
    pub skipped_binary: Vec<PathBuf>,
    /// Directories whose children could not be listed
    pub unreadable_dirs: Vec<ClipTreeError>,
}

/// Collects the non-ignored, text-like regular files under a set of roots
pub struct FileCollector<'a> {
    index: &'a IgnoreIndex,
    policy: UndetectedPolicy,
    seen: HashSet<PathBuf>,
    found: Collection,
}

impl<'a> FileCollector<'a> {
    /// Create a new collector
    pub fn new(index: &'a IgnoreIndex, policy: UndetectedPolicy) -> Self {
        Self {
            index,
            policy,
            seen: HashSet::new(),
            found: Collection::default(),
        }
    }

    /// Walk `roots` and return the collected files, deduplicated by
    /// canonical path, in walk order.
    pub fn collect(mut self, roots: &RootSet, recursive: bool) -> Vec<FileEntry> {
        walk(roots, self.index, recursive, &mut self);
        self.found.files
    }

    /// Consume the collector, returning everything it found
    pub fn finish(self) -> Collection {
        self.found
    }

    fn consider(&mut self, path: &Path) {
        let canonical = resolve_path(path);
        if !self.seen.insert(canonical.clone()) {
            debug!("Already collected {}", canonical.display());
            return;
        }

        let content = classify_content(&canonical);
        match content {
            ContentKind::Binary => {
                warn!("Skipping binary file {}", canonical.display());
                self.found.skipped_binary.push(canonical);
                return;
            }
            ContentKind::Undetermined if self.policy == UndetectedPolicy::Exclude => {
                warn!(
                    "Skipping {}: content type could not be determined",
                    canonical.display()
                );
                return;
            }
            ContentKind::Undetermined => {
                debug!(
                    "Content type of {} is undetermined, treating it as text",
                    canonical.display()
                );
            }
            ContentKind::Text => {}
        }

        self.found.files.push(FileEntry {
            path: canonical,
            content,
        });
    }
}

impl Visitor for FileCollector<'_> {
    fn visit_root(&mut self, root: &RootPath) {
        if root.kind == RootKind::File {
            self.consider(&root.path);
        }
    }

    fn visit_entry(&mut self, node: &Node<'_>) {
        if !node.is_dir {
            self.consider(node.path);
        }
    }

    fn unreadable_dir(&mut self, dir: &Path, error: &io::Error) {
        let error = if error.kind() == io::ErrorKind::PermissionDenied {
            ClipTreeError::PermissionDenied(dir.to_path_buf())
        } else {
            ClipTreeError::Io(io::Error::new(
                error.kind(),
                format!("{}: {}", dir.display(), error),
            ))
        };
        self.found.unreadable_dirs.push(error);
    }
}

/// Classify a file by sniffing its first bytes
pub fn classify_content(path: &Path) -> ContentKind {
    let mut buffer = [0u8; SNIFF_LEN];
    let read = File::open(path).and_then(|mut file| file.read(&mut buffer));
    match read {
        Ok(n) => classify_buffer(&buffer[..n]),
        Err(e) => {
            debug!("Could not sniff {}: {}", path.display(), e);
            ContentKind::Undetermined
        }
    }
}

/// Classify a sample of file content
pub fn classify_buffer(sample: &[u8]) -> ContentKind {
    match content_inspector::inspect(sample) {
        ContentType::BINARY => ContentKind::Binary,
        ContentType::UTF_8_BOM => ContentKind::Text,
        ContentType::UTF_8 => match str::from_utf8(sample) {
            Ok(_) => ContentKind::Text,
            // A multibyte sequence cut off by the end of the sample
            Err(e) if e.error_len().is_none() => ContentKind::Text,
            Err(_) => ContentKind::Undetermined,
        },
        _ => ContentKind::Undetermined,
    }
}
