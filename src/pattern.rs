/*!
 * Gitignore-style pattern compilation and matching
 */

use std::fmt;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;
use tracing::{debug, warn};

use crate::error::ClipTreeError;

/// Where an ignore pattern came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternOrigin {
    /// Built-in default ignore
    Default,
    /// Supplied on the command line
    Manual,
    /// Read from a `.gitignore` file
    Gitignore(PathBuf),
}

impl fmt::Display for PatternOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Manual => write!(f, "manual exclude"),
            Self::Gitignore(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A single ignore rule, already rewritten relative to its processing root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Pattern text in gitignore syntax
    pub text: String,
    /// Source of the pattern
    pub origin: PatternOrigin,
}

impl Pattern {
    pub fn new(text: impl Into<String>, origin: PatternOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }
}

/// The compiled union of a list of patterns.
///
/// Later patterns override earlier ones, so a `!negation` that follows the
/// pattern it negates wins.
#[derive(Debug)]
pub struct PatternMatcher {
    gitignore: Gitignore,
    rejected: Vec<ClipTreeError>,
}

impl PatternMatcher {
    /// Compile patterns in order. Patterns that are not valid globs are
    /// reported, kept in [`PatternMatcher::rejected`] and skipped.
    pub fn compile(patterns: &[Pattern]) -> Self {
        // Candidates are already relative (or deliberately absolute), so
        // the builder root must not strip anything from them.
        let mut builder = GitignoreBuilder::new(".");
        let mut rejected = Vec::new();

        for pattern in patterns {
            if let Err(e) = add_pattern(&mut builder, pattern) {
                rejected.push(e);
            }
        }

        let gitignore = builder.build().unwrap_or_else(|e| {
            warn!("Failed to build ignore set, ignoring nothing: {}", e);
            Gitignore::empty()
        });
        debug!(
            "Compiled {} ignore patterns ({} rejected)",
            gitignore.num_ignores() + gitignore.num_whitelists(),
            rejected.len()
        );

        Self {
            gitignore,
            rejected,
        }
    }

    /// Returns true if `path` is ignored.
    ///
    /// The path itself is checked first; when no pattern speaks about it,
    /// each parent directory is checked from the nearest one upwards, so a
    /// file inside an ignored directory is ignored too.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        match self.gitignore.matched(path, is_dir) {
            Match::Ignore(_) => return true,
            Match::Whitelist(_) => return false,
            Match::None => {}
        }

        let mut current = path;
        while let Some(parent) = current.parent() {
            if parent.as_os_str().is_empty() || parent.parent().is_none() {
                break;
            }
            match self.gitignore.matched(parent, true) {
                Match::Ignore(_) => return true,
                Match::Whitelist(_) => return false,
                Match::None => current = parent,
            }
        }
        false
    }

    /// Patterns that failed to compile
    pub fn rejected(&self) -> &[ClipTreeError] {
        &self.rejected
    }

    /// Number of patterns that compiled
    pub fn len(&self) -> usize {
        (self.gitignore.num_ignores() + self.gitignore.num_whitelists()) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `patterns` into the ones that compile and errors for the rest.
///
/// Each rejected pattern is warned about here, so callers that compile the
/// accepted patterns into several matchers report it only once.
pub fn screen(patterns: Vec<Pattern>) -> (Vec<Pattern>, Vec<ClipTreeError>) {
    let mut builder = GitignoreBuilder::new(".");
    let mut rejected = Vec::new();
    let accepted = patterns
        .into_iter()
        .filter(|pattern| match add_pattern(&mut builder, pattern) {
            Ok(()) => true,
            Err(e) => {
                rejected.push(e);
                false
            }
        })
        .collect();
    (accepted, rejected)
}

fn add_pattern(builder: &mut GitignoreBuilder, pattern: &Pattern) -> Result<(), ClipTreeError> {
    let from = match &pattern.origin {
        PatternOrigin::Gitignore(path) => Some(path.clone()),
        _ => None,
    };
    match builder.add_line(from, &pattern.text) {
        Ok(_) => Ok(()),
        Err(e) => {
            warn!(
                "Skipping invalid ignore pattern '{}' from {}: {}",
                pattern.text, pattern.origin, e
            );
            Err(ClipTreeError::InvalidPattern {
                pattern: pattern.text.clone(),
                origin: pattern.origin.to_string(),
                reason: e.to_string(),
            })
        }
    }
}
