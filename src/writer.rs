/*!
 * Content assembly and payload composition
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{debug, warn};

use crate::error::ClipTreeError;
use crate::report::FileReportInfo;
use crate::types::FileEntry;
use crate::utils::{display_name, slash_path};

/// One successfully read file
#[derive(Debug, Clone)]
pub struct AssembledFile {
    /// Tag the content was wrapped in
    pub tag: String,
    /// Size information for the report
    pub info: FileReportInfo,
}

/// Result of assembling file contents
#[derive(Debug, Default)]
pub struct Assembly {
    /// Tagged blocks joined by blank lines
    pub text: String,
    /// Files that made it into `text`, in order
    pub included: Vec<AssembledFile>,
    /// Files that could not be read
    pub failed: Vec<ClipTreeError>,
}

/// Reads collected files and wraps each in a path-tagged block
pub struct ContentAssembler {
    base_path: PathBuf,
    progress: Arc<ProgressBar>,
}

impl ContentAssembler {
    /// Create a new assembler tagging files relative to `base_path`
    pub fn new(base_path: impl Into<PathBuf>, progress: Arc<ProgressBar>) -> Self {
        Self {
            base_path: base_path.into(),
            progress,
        }
    }

    /// Read every file as UTF-8 and join the tagged blocks.
    ///
    /// Unreadable files are reported and left out; they never abort the
    /// assembly.
    pub fn assemble(&self, files: &[FileEntry]) -> Assembly {
        let mut blocks = Vec::with_capacity(files.len());
        let mut assembly = Assembly::default();

        self.progress.set_length(files.len() as u64);
        for file in files {
            self.progress.inc(1);
            self.progress.set_message(display_name(&file.path));

            let tag = self.tag_for(&file.path);
            match fs::read_to_string(&file.path) {
                Ok(content) => {
                    debug!("Read {} ({} bytes)", tag, content.len());
                    let info = FileReportInfo {
                        lines: content.lines().count(),
                        chars: content.chars().count(),
                    };
                    blocks.push(format!("<{tag}>\n{content}\n</{tag}>"));
                    assembly.included.push(AssembledFile { tag, info });
                }
                Err(e) => {
                    warn!("Error reading {}: {}", file.path.display(), e);
                    assembly.failed.push(ClipTreeError::ReadDecode {
                        path: file.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        assembly.text = blocks.join("\n\n");
        assembly
    }

    /// Path relative to the base with `/` separators, or the absolute path
    /// when the file lives elsewhere
    pub fn tag_for(&self, path: &Path) -> String {
        match path.strip_prefix(&self.base_path) {
            Ok(relative) => slash_path(relative),
            Err(_) => slash_path(path),
        }
    }
}

/// Compose the final clipboard payload
pub fn compose_payload(instruction: Option<&str>, tree: &str, content: &str) -> String {
    let mut payload = String::new();

    if let Some(instruction) = instruction.filter(|i| !i.is_empty()) {
        payload.push_str(&format!("<instruction>{}</instruction>\n\n", instruction));
    }
    if !tree.is_empty() {
        payload.push_str(&format!("<fileTree>\n{}\n</fileTree>\n\n", tree));
    }
    payload.push_str(content);

    payload
}
