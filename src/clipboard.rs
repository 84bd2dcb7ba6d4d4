/*!
 * Clipboard support for cliptree
 *
 * Copies the payload by piping it into whichever command-line clipboard
 * tool the platform provides.
 */

use std::cell::RefCell;
use std::env;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::debug;

/// Error type for clipboard operations
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// Failed to execute the command
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// No suitable clipboard mechanism was found
    #[error("No suitable clipboard mechanism found")]
    NoClipboardFound,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for clipboard operations
pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Anything that can take the payload
pub trait Clipboard {
    /// Copy text to the clipboard
    fn copy_to_clipboard(&self, text: &str) -> Result<()>;
}

/// Command-line clipboard tools, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardProvider {
    Tmux,
    Wayland,
    Xsel,
    Xclip,
    MacOS,
    Wsl,
    Termux,
}

impl ClipboardProvider {
    fn command(&self) -> (&'static str, Vec<&'static str>) {
        match self {
            Self::Tmux => ("tmux", vec!["load-buffer", "-w", "-"]),
            Self::Wayland => ("wl-copy", vec![]),
            Self::Xsel => ("xsel", vec!["-b", "-i"]),
            Self::Xclip => ("xclip", vec!["-selection", "clipboard", "-in"]),
            Self::MacOS => ("pbcopy", vec![]),
            Self::Wsl => ("clip.exe", vec![]),
            Self::Termux => ("termux-clipboard-set", vec![]),
        }
    }

    /// Providers usable on this system, most preferred first
    pub fn detect() -> Vec<ClipboardProvider> {
        let mut candidates = Vec::with_capacity(3);

        if command_exists("tmux") && is_tmux_running() {
            candidates.push(Self::Tmux);
        }

        match get_platform() {
            "macos" => candidates.push(Self::MacOS),
            "windows" | "wsl" => candidates.push(Self::Wsl),
            "linux" => candidates.extend([Self::Wayland, Self::Xsel, Self::Xclip]),
            "android" => candidates.push(Self::Termux),
            _ => {}
        }

        candidates.retain(|p| command_exists(p.command().0));
        candidates
    }
}

impl Clipboard for ClipboardProvider {
    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        let (cmd, args) = self.command();
        execute_clipboard_command(cmd, &args, text)
    }
}

/// The system clipboard, backed by the first detected provider
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        copy_to_clipboard(text)
    }
}

/// Keeps copies in memory; for tests and library callers that want the
/// payload without touching the system clipboard
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    copies: RefCell<Vec<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent copy
    pub fn contents(&self) -> Option<String> {
        self.copies.borrow().last().cloned()
    }

    /// Number of copies made
    pub fn copies(&self) -> usize {
        self.copies.borrow().len()
    }
}

impl Clipboard for MemoryClipboard {
    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        self.copies.borrow_mut().push(text.to_string());
        Ok(())
    }
}

/// Copy text to the system clipboard using the most appropriate provider
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let provider = ClipboardProvider::detect()
        .into_iter()
        .next()
        .ok_or(ClipboardError::NoClipboardFound)?;
    debug!("Copying {} bytes with {:?}", text.len(), provider);
    provider.copy_to_clipboard(text)
}

/// Check if a command exists on the system
pub fn command_exists(command: &str) -> bool {
    if let Some(paths) = env::var_os("PATH") {
        if env::split_paths(&paths).any(|dir| dir.join(command).is_file()) {
            return true;
        }
    }

    Command::new(command)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

fn execute_clipboard_command(cmd: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .map_err(|e| ClipboardError::CommandFailed(format!("Failed to spawn {}: {}", cmd, e)))?;

    {
        let stdin = child.stdin.as_mut().ok_or_else(|| {
            ClipboardError::CommandFailed(format!("Failed to open stdin for {}", cmd))
        })?;
        stdin.write_all(text.as_bytes())?;
    }
    // Close stdin so the tool sees end of input
    drop(child.stdin.take());

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(ClipboardError::CommandFailed(format!(
            "{} exited with status: {}",
            cmd, status
        )))
    }
}

static PLATFORM: OnceLock<&'static str> = OnceLock::new();

fn get_platform() -> &'static str {
    PLATFORM.get_or_init(|| {
        if cfg!(target_os = "macos") {
            "macos"
        } else if cfg!(target_os = "windows") {
            "windows"
        } else if cfg!(target_os = "android") {
            "android"
        } else if cfg!(target_os = "linux") {
            if env::var("WSL_DISTRO_NAME").is_ok() {
                "wsl"
            } else {
                "linux"
            }
        } else {
            "unknown"
        }
    })
}

fn is_tmux_running() -> bool {
    if env::var("TMUX").is_ok() {
        return true;
    }

    Command::new("tmux")
        .args(["list-buffers"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
