/*!
 * Configuration handling for cliptree
 */

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::ensure;
use crate::error::{ClipTreeError, Result};
use crate::scanner::UndetectedPolicy;
use crate::utils::current_dir;

/// Command-line arguments for cliptree
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "cliptree",
    version = env!("CARGO_PKG_VERSION"),
    about = "Copy folder and file structures to your clipboard for easy pasting",
    long_about = "Renders a tree of the given files and directories and copies it, together with the content of every non-ignored text file, to the system clipboard. Ignore rules come from .gitignore files, built-in defaults and --exclude patterns."
)]
pub struct Args {
    /// Files or directories to copy contents from
    #[clap(value_name = "PATH", required_unless_present = "generate")]
    pub paths: Vec<String>,

    /// Recursively process directories
    #[clap(short, long)]
    pub recursive: bool,

    /// Custom instruction to include in the clipboard content
    #[clap(short, long)]
    pub instruction: Option<String>,

    /// Patterns to exclude in addition to .gitignore patterns
    #[clap(short, long, value_name = "PATTERN", num_args = 0..)]
    pub exclude: Vec<String>,

    /// Directory that ignore patterns and file tags are resolved against
    /// (defaults to the current directory)
    #[clap(long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// What to do with files whose content type cannot be determined
    #[clap(long, value_enum, default_value_t = UndetectedPolicy::default())]
    pub undetected: UndetectedPolicy,

    /// Also write the payload to this file
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not copy to the system clipboard
    #[clap(long)]
    pub no_clip: bool,

    /// Print the payload to stdout
    #[clap(long)]
    pub print: bool,

    /// Suppress the summary report and non-error logging
    #[clap(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Root paths as given by the user
    pub paths: Vec<String>,

    /// Whether to descend into subdirectories
    pub recursive: bool,

    /// Instruction placed before the tree
    pub instruction: Option<String>,

    /// Manual exclude patterns
    pub exclude: Vec<String>,

    /// Base directory for ignore matching and tags; current directory if unset
    pub base_dir: Option<PathBuf>,

    /// Handling of files with undetermined content
    pub undetected: UndetectedPolicy,

    /// Optional file to write the payload to
    pub output_file: Option<PathBuf>,

    /// Copy to the system clipboard
    pub clip: bool,

    /// Print the payload to stdout
    pub print: bool,

    /// Suppress the report
    pub quiet: bool,
}

impl Config {
    /// Configuration with defaults for the given roots
    pub fn new<S: Into<String>>(paths: impl IntoIterator<Item = S>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            recursive: false,
            instruction: None,
            exclude: Vec::new(),
            base_dir: None,
            undetected: UndetectedPolicy::default(),
            output_file: None,
            clip: true,
            print: false,
            quiet: false,
        }
    }

    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        Self {
            paths: args.paths,
            recursive: args.recursive,
            instruction: args.instruction,
            exclude: args.exclude,
            base_dir: args.base,
            undetected: args.undetected,
            output_file: args.output,
            clip: !args.no_clip,
            print: args.print,
            quiet: args.quiet,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.paths.is_empty(), Config, "at least one path is required");

        if let Some(base) = &self.base_dir {
            ensure!(
                base.is_dir(),
                Config,
                "base directory not found: {}",
                base.display()
            );
        }

        if let Some(parent) = self.output_file.as_ref().and_then(|p| p.parent()) {
            ensure!(
                parent.as_os_str().is_empty() || parent.is_dir(),
                Config,
                "output directory not found: {}",
                parent.display()
            );
        }

        Ok(())
    }

    /// The canonical base directory
    pub fn resolve_base_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(base) => base.canonicalize().map_err(|e| {
                ClipTreeError::Config(format!("cannot resolve {}: {}", base.display(), e))
            }),
            None => Ok(current_dir()?),
        }
    }
}
