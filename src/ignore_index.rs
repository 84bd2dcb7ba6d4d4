/*!
 * Ignore rule discovery and path queries
 *
 * Every directory root gets one matcher built from the default ignores, the
 * manual excludes and every `.gitignore` found beneath it, anchored at that
 * root. A path is answered by the matcher of the root that contains it, so
 * rules behave the same wherever the root sits relative to the base
 * directory.
 */

use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::error::ClipTreeError;
use crate::pattern::{screen, Pattern, PatternMatcher, PatternOrigin};
use crate::utils::{resolve_path, slash_path, DEFAULT_IGNORES};

const GITIGNORE: &str = ".gitignore";

/// A directory and the matcher whose patterns are relative to it
#[derive(Debug)]
struct Scope {
    root: PathBuf,
    matcher: PatternMatcher,
}

/// Immutable ignore decisions shared by the collector and the tree renderer
#[derive(Debug)]
pub struct IgnoreIndex {
    /// Directory roots; none lies inside another
    trees: Vec<Scope>,
    /// Parent directories of file roots outside every tree, deepest first
    parents: Vec<Scope>,
    /// Manual excludes for paths outside every root, relative to the base
    fallback: PatternMatcher,
    base_dir: PathBuf,
    rejected: Vec<ClipTreeError>,
}

impl IgnoreIndex {
    /// Build an index using [`DEFAULT_IGNORES`].
    ///
    /// `base_dir` is only consulted for paths that lie under no root; those
    /// are matched against the manual excludes relative to it.
    pub fn new<P: AsRef<Path>>(roots: &[P], manual_excludes: &[String], base_dir: &Path) -> Self {
        Self::with_defaults(DEFAULT_IGNORES, roots, manual_excludes, base_dir)
    }

    /// Build an index with an explicit default table
    pub fn with_defaults<P: AsRef<Path>>(
        defaults: &[&str],
        roots: &[P],
        manual_excludes: &[String],
        base_dir: &Path,
    ) -> Self {
        let mut rejected = Vec::new();

        let manual = manual_excludes
            .iter()
            .map(|p| Pattern::new(p.clone(), PatternOrigin::Manual))
            .collect();
        let (manual, bad) = screen(manual);
        rejected.extend(bad);

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for root in roots {
            let root = resolve_path(root.as_ref());
            if root.is_dir() {
                dirs.push(root);
            } else if root.is_file() {
                files.push(root);
            }
        }
        dirs.sort();
        dirs.dedup();
        dirs.sort_by_key(|dir| dir.components().count());

        // Outermost roots, each with the prefixes of the roots nested in it
        let mut tops: Vec<(PathBuf, Vec<String>)> = Vec::new();
        for dir in dirs {
            match tops.iter().position(|(top, _)| dir.starts_with(top)) {
                Some(i) => {
                    let (top, nested) = &mut tops[i];
                    debug!("{} is covered by {}", dir.display(), top.display());
                    if let Ok(relative) = dir.strip_prefix(&*top) {
                        nested.push(slash_path(relative));
                    }
                }
                None => tops.push((dir, vec![String::new()])),
            }
        }

        let mut trees = Vec::with_capacity(tops.len());
        for (root, prefixes) in tops {
            let (found, bad) = screen(gitignore_patterns_under(&root));
            rejected.extend(bad);

            let mut patterns = anchored_defaults(defaults, &prefixes);
            patterns.extend(manual.iter().cloned());
            patterns.extend(found);
            trees.push(Scope::new(root, &patterns));
        }

        let mut parent_dirs: Vec<PathBuf> = files
            .iter()
            .filter_map(|file| file.parent())
            .filter(|dir| !trees.iter().any(|tree| dir.starts_with(&tree.root)))
            .map(Path::to_path_buf)
            .collect();
        parent_dirs.sort();
        parent_dirs.dedup();
        parent_dirs.sort_by_key(|dir| Reverse(dir.components().count()));

        let mut parents = Vec::with_capacity(parent_dirs.len());
        for dir in parent_dirs {
            let file = dir.join(GITIGNORE);
            let found = if file.is_file() {
                load_gitignore(&file)
                    .into_iter()
                    .map(|line| Pattern::new(line, PatternOrigin::Gitignore(file.clone())))
                    .collect()
            } else {
                Vec::new()
            };
            let (found, bad) = screen(found);
            rejected.extend(bad);

            let mut patterns = anchored_defaults(defaults, &[String::new()]);
            patterns.extend(manual.iter().cloned());
            patterns.extend(found);
            parents.push(Scope::new(dir, &patterns));
        }

        debug!(
            "Built ignore index: {} directory roots, {} file-root parents",
            trees.len(),
            parents.len()
        );

        Self {
            trees,
            parents,
            fallback: PatternMatcher::compile(&manual),
            base_dir: resolve_path(base_dir),
            rejected,
        }
    }

    /// Returns true if `path` is ignored. Never fails; a path that cannot be
    /// inspected is treated as a file.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let is_dir = fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false);
        self.is_ignored_entry(path, is_dir)
    }

    /// Same as [`IgnoreIndex::is_ignored`] when the caller already knows
    /// whether the path is a directory.
    pub fn is_ignored_entry(&self, path: &Path, is_dir: bool) -> bool {
        let resolved = resolve_path(path);
        let (matcher, candidate) = self.scope_for(&resolved);
        if candidate.as_os_str().is_empty() {
            return false;
        }
        let ignored = matcher.matches(candidate, is_dir);
        trace!("{} ignored={}", slash_path(candidate), ignored);
        ignored
    }

    /// Patterns that failed to compile, each reported once
    pub fn rejected_patterns(&self) -> &[ClipTreeError] {
        &self.rejected
    }

    fn scope_for<'s, 'p>(&'s self, resolved: &'p Path) -> (&'s PatternMatcher, &'p Path) {
        for scope in self.trees.iter().chain(&self.parents) {
            if let Ok(relative) = resolved.strip_prefix(&scope.root) {
                return (&scope.matcher, relative);
            }
        }
        let relative = resolved.strip_prefix(&self.base_dir).unwrap_or(resolved);
        (&self.fallback, relative)
    }
}

impl Scope {
    fn new(root: PathBuf, patterns: &[Pattern]) -> Self {
        Self {
            root,
            matcher: PatternMatcher::compile(patterns),
        }
    }
}

/// Default names anchored at the top level of every given root prefix
fn anchored_defaults(defaults: &[&str], prefixes: &[String]) -> Vec<Pattern> {
    prefixes
        .iter()
        .flat_map(|prefix| {
            defaults.iter().map(move |name| {
                let text = if prefix.is_empty() {
                    format!("/{}/", name)
                } else {
                    format!("/{}/{}/", prefix, name)
                };
                Pattern::new(text, PatternOrigin::Default)
            })
        })
        .collect()
}

/// Every pattern from every `.gitignore` under `root`, rewritten so that a
/// single matcher rooted at `root` evaluates it correctly.
fn gitignore_patterns_under(root: &Path) -> Vec<Pattern> {
    let mut patterns = Vec::new();

    let walker = WalkDir::new(root).sort_by_file_name().into_iter();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable path while looking for .gitignore: {}", e);
                continue;
            }
        };
        if entry.file_name() != GITIGNORE || !entry.file_type().is_file() {
            continue;
        }

        let file = entry.path();
        let prefix = file
            .parent()
            .and_then(|dir| dir.strip_prefix(root).ok())
            .map(slash_path)
            .unwrap_or_default();

        debug!("Loading {}", file.display());
        for line in load_gitignore(file) {
            patterns.push(Pattern::new(
                rebase_pattern(&prefix, &line),
                PatternOrigin::Gitignore(file.to_path_buf()),
            ));
        }
    }

    patterns
}

/// Non-blank, non-comment lines of a `.gitignore` file, trimmed
fn load_gitignore(file: &Path) -> Vec<String> {
    match fs::read_to_string(file) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect(),
        Err(e) => {
            warn!("Failed to read {}: {}", file.display(), e);
            Vec::new()
        }
    }
}

/// Prefix a pattern with the directory its `.gitignore` lives in, relative
/// to the processing root. Patterns from the root itself are unchanged.
fn rebase_pattern(prefix: &str, pattern: &str) -> String {
    if prefix.is_empty() {
        return pattern.to_string();
    }
    let (negation, body) = match pattern.strip_prefix('!') {
        Some(rest) => ("!", rest),
        None => ("", pattern),
    };
    format!("{}{}/{}", negation, prefix, body.trim_start_matches('/'))
}
