/*!
 * ClipTree - Copy a directory tree and its text files to the clipboard
 *
 * Renders the structure of a set of files and directories as a tree,
 * gathers every non-ignored text file beneath them and composes a single
 * payload suitable for pasting into an LLM conversation.
 */

pub mod clipboard;
pub mod config;
pub mod error;
pub mod ignore_index;
pub mod logger;
pub mod pattern;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod tree;
pub mod types;
pub mod utils;
pub mod walker;
pub mod writer;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard, SystemClipboard};
pub use config::Config;
pub use error::{ClipTreeError, Result};
pub use ignore_index::IgnoreIndex;
pub use pipeline::{build_bundle, deliver, Bundle};
pub use report::{CopyReport, FileReportInfo, ReportFormat, Reporter};
pub use scanner::{Collection, FileCollector, UndetectedPolicy};
pub use tree::TreeRenderer;
pub use types::{ContentKind, FileEntry, RootSet};
pub use writer::{compose_payload, ContentAssembler};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
