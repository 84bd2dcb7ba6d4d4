/*!
 * Utility functions for cliptree
 */

use std::io;
use std::path::{Component, Path, PathBuf};

/// Directory names that are always ignored at the top level of a root.
///
/// Each name is anchored as `/<name>/`, matching a directory directly under
/// the relativization base, not nested occurrences.
pub const DEFAULT_IGNORES: &[&str] = &[".git", ".idea", "__pycache__"];

/// Resolve a path to an absolute, symlink-free form.
///
/// Falls back to a lexically normalized absolute path when the path cannot be
/// canonicalized (for example a dangling symlink).
pub fn resolve_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| absolutize(path))
}

/// Join a relative path onto the current directory and fold `.`/`..`
/// components without touching the filesystem.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// The current working directory, canonicalized
pub fn current_dir() -> io::Result<PathBuf> {
    std::env::current_dir()?.canonicalize()
}

/// Render a path with `/` separators
pub fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// File name of a path as a display string, or the full path for roots like `/`
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| slash_path(path))
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
