//! Platform side effects needed by downloads and shares.
//!
//! The generation client never touches the file system, the clipboard
//! or a browser directly; it goes through a [`Host`]. [`DesktopHost`]
//! is the implementation used by the command-line studio.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Structured data handed to a native share sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Errors from host side effects.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The capability does not exist on this host.
    #[error("{0} is not supported on this host")]
    Unsupported(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An external helper command ran but reported failure.
    #[error("Command '{command}' failed: {detail}")]
    Command { command: String, detail: String },
}

/// Side effects a surface's runtime can perform on the client's behalf.
#[async_trait]
pub trait Host: Send + Sync {
    /// Save `bytes` under `filename` and return where they landed.
    async fn save_file(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, HostError>;

    /// Open `url` in an external viewer (browser, player).
    async fn open_external(&self, url: &str) -> Result<(), HostError>;

    /// Whether a native share of `payload` is available.
    fn can_share(&self, payload: &SharePayload) -> bool;

    /// Run the native share interaction.
    async fn share(&self, payload: &SharePayload) -> Result<(), HostError>;

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), HostError>;

    /// Show a short-lived acknowledgement to the user.
    fn notify(&self, message: &str);
}

// ---------------------------------------------------------------------------
// DesktopHost
// ---------------------------------------------------------------------------

/// Host for a terminal session on a desktop OS.
///
/// Files go to a download directory, URLs open with the platform opener,
/// the clipboard is reached through the usual helper binaries, and there
/// is no native share sheet.
pub struct DesktopHost {
    download_dir: PathBuf,
}

impl DesktopHost {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }
}

/// Program and leading arguments that open a URL with the default app.
#[cfg(target_os = "macos")]
const OPENER: (&str, &[&str]) = ("open", &[]);
#[cfg(target_os = "windows")]
const OPENER: (&str, &[&str]) = ("cmd", &["/C", "start", ""]);
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const OPENER: (&str, &[&str]) = ("xdg-open", &[]);

/// Clipboard helpers to try, in order.
#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];
#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("clip", &[])];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

async fn pipe_to_command(program: &str, args: &[&str], input: &str) -> Result<(), HostError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).await?;
    }

    let status = child.wait().await?;
    if status.success() {
        Ok(())
    } else {
        Err(HostError::Command {
            command: program.to_string(),
            detail: status.to_string(),
        })
    }
}

#[async_trait]
impl Host for DesktopHost {
    async fn save_file(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, HostError> {
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let path = self.download_dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved download");
        Ok(path)
    }

    async fn open_external(&self, url: &str) -> Result<(), HostError> {
        let (program, args) = OPENER;
        let status = Command::new(program)
            .args(args)
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if status.success() {
            tracing::info!(url, "Opened externally");
            Ok(())
        } else {
            Err(HostError::Command {
                command: program.to_string(),
                detail: status.to_string(),
            })
        }
    }

    fn can_share(&self, _payload: &SharePayload) -> bool {
        false
    }

    async fn share(&self, _payload: &SharePayload) -> Result<(), HostError> {
        Err(HostError::Unsupported("native share"))
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), HostError> {
        let mut last_err = HostError::Unsupported("clipboard");
        for (program, args) in CLIPBOARD_COMMANDS {
            match pipe_to_command(program, args, text).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(program, error = %e, "Clipboard helper unavailable");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    fn notify(&self, message: &str) {
        println!("{message}");
    }
}
