//! Loading and saving buffers.
//!
//! A save that fails with "permission denied" is reported as its own error
//! variant so the action layer can offer the elevated retry, which pipes the
//! content through `sudo tee <path>`.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use core_text::{BufferSettings, TextBuffer};
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("{}: permission denied", .0.display())]
    PermissionDenied(PathBuf),
    #[error("no file name")]
    NoPath,
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("elevated save failed: {0}")]
    Elevated(String),
}

impl PersistError {
    fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == ErrorKind::PermissionDenied {
            PersistError::PermissionDenied(path.to_path_buf())
        } else {
            PersistError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

pub trait Persistence: Send {
    /// Read a file. A missing file is `Ok(None)` (a new buffer).
    fn load(&mut self, path: &Path) -> Result<Option<String>, PersistError>;
    fn save(&mut self, path: &Path, contents: &str) -> Result<(), PersistError>;
    fn save_elevated(&mut self, path: &Path, contents: &str) -> Result<(), PersistError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FsPersistence;

impl Persistence for FsPersistence {
    fn load(&mut self, path: &Path) -> Result<Option<String>, PersistError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!(target: "io", file = %path.display(), size_bytes = content.len(), "file_read_ok");
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!(target: "io", file = %path.display(), ?e, "file_open_error");
                Err(PersistError::from_io(path, e))
            }
        }
    }

    fn save(&mut self, path: &Path, contents: &str) -> Result<(), PersistError> {
        std::fs::write(path, contents).map_err(|e| PersistError::from_io(path, e))?;
        info!(target: "io", file = %path.display(), size_bytes = contents.len(), "file_write_ok");
        Ok(())
    }

    fn save_elevated(&mut self, path: &Path, contents: &str) -> Result<(), PersistError> {
        let mut child = Command::new("sudo")
            .arg("tee")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PersistError::Elevated(e.to_string()))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(contents.as_bytes())
                .map_err(|e| PersistError::Elevated(e.to_string()))?;
        }
        let out = child
            .wait_with_output()
            .map_err(|e| PersistError::Elevated(e.to_string()))?;
        if !out.status.success() {
            return Err(PersistError::Elevated(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }
        info!(target: "io", file = %path.display(), "file_write_elevated_ok");
        Ok(())
    }
}

/// Open `path` as a buffer. A missing file gives an empty buffer bound to
/// the path.
pub fn open_buffer(
    persistence: &mut dyn Persistence,
    path: &Path,
    settings: &BufferSettings,
) -> Result<TextBuffer, PersistError> {
    let content = persistence.load(path)?.unwrap_or_default();
    let mut buffer = TextBuffer::for_path(path, &content);
    buffer.settings = settings.clone();
    Ok(buffer)
}
