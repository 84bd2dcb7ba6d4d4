/*!
 * Shared directory traversal
 *
 * Both the file list and the tree are produced by the same walk, so an entry
 * is listed in one exactly when it is visited for the other.
 */

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

use crate::ignore_index::IgnoreIndex;
use crate::types::{RootKind, RootPath, RootSet};
use crate::utils::display_name;

/// A non-ignored child entry, as seen by a [`Visitor`]
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    /// Path of the entry as listed (not canonicalized)
    pub path: &'a Path,
    /// File name
    pub name: &'a str,
    /// Whether the entry is a directory (symlinks are followed)
    pub is_dir: bool,
    /// 1 for the direct children of a root
    pub depth: usize,
    /// Whether this is the last entry among its siblings
    pub is_last: bool,
}

/// Callbacks driven by [`walk`]
pub trait Visitor {
    /// A resolved, non-ignored root
    fn visit_root(&mut self, _root: &RootPath) {}

    /// A non-ignored child, in sibling order
    fn visit_entry(&mut self, node: &Node<'_>);

    /// About to walk the children of `node` (recursive mode only)
    fn enter_dir(&mut self, _node: &Node<'_>) {}

    /// Done with the children of `node`
    fn leave_dir(&mut self, _node: &Node<'_>) {}

    /// The children of `dir` could not be listed
    fn unreadable_dir(&mut self, _dir: &Path, _error: &io::Error) {}
}

impl<A: Visitor + ?Sized, B: Visitor + ?Sized> Visitor for (&mut A, &mut B) {
    fn visit_root(&mut self, root: &RootPath) {
        self.0.visit_root(root);
        self.1.visit_root(root);
    }

    fn visit_entry(&mut self, node: &Node<'_>) {
        self.0.visit_entry(node);
        self.1.visit_entry(node);
    }

    fn enter_dir(&mut self, node: &Node<'_>) {
        self.0.enter_dir(node);
        self.1.enter_dir(node);
    }

    fn leave_dir(&mut self, node: &Node<'_>) {
        self.0.leave_dir(node);
        self.1.leave_dir(node);
    }

    fn unreadable_dir(&mut self, dir: &Path, error: &io::Error) {
        self.0.unreadable_dir(dir, error);
        self.1.unreadable_dir(dir, error);
    }
}

/// Walk every root, visiting non-ignored entries.
///
/// Directory roots are always entered; their children are listed and, when
/// `recursive` is set, child directories are descended into. Siblings are
/// ordered by case-insensitive name.
pub fn walk<V: Visitor + ?Sized>(
    roots: &RootSet,
    index: &IgnoreIndex,
    recursive: bool,
    visitor: &mut V,
) {
    for root in roots.iter() {
        match root.kind {
            RootKind::File => {
                if index.is_ignored_entry(&root.path, false) {
                    debug!("Root {} is ignored", root.requested);
                    continue;
                }
                visitor.visit_root(root);
            }
            RootKind::Directory => {
                debug!("Walking {} ({})", root.requested, root.path.display());
                visitor.visit_root(root);
                let steps = collect_steps(&root.path, index, recursive);
                emit(&steps, visitor);
            }
        }
    }
}

/// One position in a root's walk, in depth-first order
enum Step {
    Entry {
        path: PathBuf,
        name: String,
        is_dir: bool,
        depth: usize,
        expand: bool,
    },
    /// The children of `dir` could not be listed; `depth` is theirs
    Unreadable {
        dir: PathBuf,
        depth: usize,
        error: io::Error,
    },
}

impl Step {
    fn depth(&self) -> usize {
        match self {
            Self::Entry { depth, .. } | Self::Unreadable { depth, .. } => *depth,
        }
    }
}

fn collect_steps(root: &Path, index: &IgnoreIndex, recursive: bool) -> Vec<Step> {
    let mut walker = WalkDir::new(root).follow_links(true).sort_by(compare_names);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut steps = Vec::new();
    let entries = walker
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || keep(entry, index));

    for result in entries {
        match result {
            Ok(entry) if entry.depth() == 0 => {}
            Ok(entry) => {
                let is_dir = entry.file_type().is_dir();
                steps.push(Step::Entry {
                    path: entry.path().to_path_buf(),
                    name: entry.file_name().to_string_lossy().to_string(),
                    is_dir,
                    depth: entry.depth(),
                    expand: is_dir && recursive,
                });
            }
            Err(err) => {
                if let Some(step) = error_step(err, root, &steps, index) {
                    steps.push(step);
                }
            }
        }
    }

    steps
}

/// Entries that are regular files or directories and not ignored
fn keep(entry: &DirEntry, index: &IgnoreIndex) -> bool {
    let file_type = entry.file_type();
    if !file_type.is_dir() && !file_type.is_file() {
        warn!(
            "{} is neither a file nor a directory and will be skipped.",
            entry.path().display()
        );
        return false;
    }
    if index.is_ignored_entry(entry.path(), file_type.is_dir()) {
        trace!("Ignoring {}", entry.path().display());
        return false;
    }
    true
}

/// Turn a walk error into a step: a symlink loop is still listed, an
/// unreadable directory gets a marker, anything else is skipped.
fn error_step(err: walkdir::Error, root: &Path, steps: &[Step], index: &IgnoreIndex) -> Option<Step> {
    let Some(path) = err.path().map(Path::to_path_buf) else {
        warn!("Skipping an entry: {}", err);
        return None;
    };
    let depth = err.depth();

    if let Some(ancestor) = err.loop_ancestor() {
        if index.is_ignored_entry(&path, true) {
            return None;
        }
        warn!(
            "Not descending into {}: it links back to {}",
            path.display(),
            ancestor.display()
        );
        let name = display_name(&path);
        return Some(Step::Entry {
            path,
            name,
            is_dir: true,
            depth,
            expand: false,
        });
    }

    let listed_dir = match steps.last() {
        Some(Step::Entry {
            path: last,
            is_dir: true,
            ..
        }) => *last == path,
        _ => depth == 0 && path == root,
    };
    let error = err.into_io_error()?;

    if listed_dir {
        warn!("Cannot list {}: {}", path.display(), error);
        Some(Step::Unreadable {
            dir: path,
            depth: depth + 1,
            error,
        })
    } else if index.is_ignored_entry(&path, false) {
        trace!("Ignoring {}", path.display());
        None
    } else {
        warn!("Skipping {}: {}", path.display(), error);
        None
    }
}

/// Replay the steps as visitor callbacks
fn emit<V: Visitor + ?Sized>(steps: &[Step], visitor: &mut V) {
    let last = last_flags(steps);
    let mut open: Vec<Node<'_>> = Vec::new();

    for (step, is_last) in steps.iter().zip(last) {
        while open.len() >= step.depth() {
            match open.pop() {
                Some(node) => visitor.leave_dir(&node),
                None => break,
            }
        }

        match step {
            Step::Entry {
                path,
                name,
                is_dir,
                depth,
                expand,
            } => {
                let node = Node {
                    path,
                    name,
                    is_dir: *is_dir,
                    depth: *depth,
                    is_last,
                };
                visitor.visit_entry(&node);
                if *expand {
                    visitor.enter_dir(&node);
                    open.push(node);
                }
            }
            Step::Unreadable { dir, error, .. } => visitor.unreadable_dir(dir, error),
        }
    }

    while let Some(node) = open.pop() {
        visitor.leave_dir(&node);
    }
}

/// For each entry, whether no later sibling follows it
fn last_flags(steps: &[Step]) -> Vec<bool> {
    let mut flags = vec![false; steps.len()];
    // later[d]: an entry at depth d was already seen further down the same parent
    let mut later: Vec<bool> = Vec::new();

    for (i, step) in steps.iter().enumerate().rev() {
        if let Step::Entry { depth, .. } = step {
            let depth = *depth;
            if later.len() <= depth {
                later.resize(depth + 1, false);
            }
            flags[i] = !later[depth];
            later[depth] = true;
            later.truncate(depth + 1);
        }
    }

    flags
}

fn compare_names(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a = a.file_name().to_string_lossy();
    let b = b.file_name().to_string_lossy();
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(&b))
}
