/*!
 * End-to-end run: roots in, payload out
 */

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::error::{ClipTreeError, Result};
use crate::ignore_index::IgnoreIndex;
use crate::report::CopyReport;
use crate::scanner::{Collection, FileCollector};
use crate::tree::TreeRenderer;
use crate::types::{FileEntry, RootSet};
use crate::walker::walk;
use crate::writer::{compose_payload, Assembly, ContentAssembler};

/// Everything one run produced
#[derive(Debug)]
pub struct Bundle {
    /// The text destined for the clipboard
    pub payload: String,
    /// The rendered tree
    pub tree: String,
    /// Collected files, in walk order
    pub files: Vec<FileEntry>,
    /// Files left out as binary
    pub skipped_binary: Vec<PathBuf>,
    /// Directories whose children could not be listed
    pub unreadable_dirs: Vec<ClipTreeError>,
    /// Requested paths that were missing or not files or directories
    pub missing_roots: Vec<ClipTreeError>,
    /// Read results
    pub assembly: Assembly,
    /// Messages for ignore patterns that failed to compile
    pub rejected_patterns: Vec<String>,
    started: Instant,
}

impl Bundle {
    /// Summarize the run for the reporter
    pub fn report(&self, destination: impl Into<String>) -> CopyReport {
        let included = &self.assembly.included;
        CopyReport {
            destination: destination.into(),
            duration: self.started.elapsed(),
            files_copied: included.len(),
            skipped_binary: self.skipped_binary.len(),
            unreadable: self.assembly.failed.len(),
            unreadable_dirs: self.unreadable_dirs.len(),
            missing_roots: self.missing_roots.len(),
            rejected_patterns: self.rejected_patterns.len(),
            total_lines: included.iter().map(|f| f.info.lines).sum(),
            total_chars: included.iter().map(|f| f.info.chars).sum(),
            payload_bytes: self.payload.len(),
            file_details: included
                .iter()
                .map(|f| (f.tag.clone(), f.info.clone()))
                .collect(),
        }
    }
}

/// Resolve roots, build the ignore index once, walk once for both the file
/// list and the tree, then read the files and compose the payload.
///
/// Fails with [`ClipTreeError::NoContent`] when no file qualifies.
pub fn build_bundle(config: &Config, progress: Arc<ProgressBar>) -> Result<Bundle> {
    let started = Instant::now();
    let base_dir = config.resolve_base_dir()?;
    debug!("Base directory: {}", base_dir.display());

    let roots = RootSet::resolve(&config.paths);
    let index = IgnoreIndex::new(&roots.paths(), &config.exclude, &base_dir);

    let mut collector = FileCollector::new(&index, config.undetected);
    let mut renderer = TreeRenderer::new(&index);
    walk(&roots, &index, config.recursive, &mut (&mut collector, &mut renderer));

    let tree = renderer.finish();
    let Collection {
        files,
        skipped_binary,
        unreadable_dirs,
    } = collector.finish();
    info!("Collected {} files from {} roots", files.len(), roots.len());

    if files.is_empty() {
        return Err(ClipTreeError::NoContent);
    }

    let assembly = ContentAssembler::new(&base_dir, progress).assemble(&files);
    let payload = compose_payload(config.instruction.as_deref(), &tree, &assembly.text);

    let missing_roots = roots.into_missing();
    let rejected_patterns = index
        .rejected_patterns()
        .iter()
        .map(ToString::to_string)
        .collect();

    Ok(Bundle {
        payload,
        tree,
        files,
        skipped_binary,
        unreadable_dirs,
        missing_roots,
        assembly,
        rejected_patterns,
        started,
    })
}

/// Send the payload to the configured destinations. Returns a description
/// of where it went.
pub fn deliver(bundle: &Bundle, config: &Config, clipboard: &dyn Clipboard) -> Result<String> {
    let mut destinations = Vec::new();

    if let Some(path) = &config.output_file {
        fs::write(path, &bundle.payload)?;
        destinations.push(path.display().to_string());
    }

    if config.print {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bundle.payload.as_bytes())?;
        stdout.flush()?;
        destinations.push("stdout".to_string());
    }

    if config.clip {
        clipboard.copy_to_clipboard(&bundle.payload)?;
        destinations.push("clipboard".to_string());
    }

    Ok(destinations.join(", "))
}
