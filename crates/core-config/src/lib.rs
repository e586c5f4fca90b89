//! Configuration loading and parsing.
//!
//! Parses `quill.toml` (or an override path provided by the binary). Every
//! section and field is optional; unknown fields are ignored so older binaries
//! tolerate newer files. A file that fails to parse is logged and replaced by
//! defaults: startup never fails because of configuration.
//!
//! ```toml
//! [buffer]
//! tabsize = 4
//! tabstospaces = true
//!
//! [editor]
//! cut_line_window_ms = 10000
//!
//! [keys]
//! "Ctrl-k" = "CutLine"
//!
//! [tools]
//! format = ["rustfmt", "--emit=stdout"]
//! ```

use anyhow::Result;
use core_text::BufferSettings;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "quill.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EditorConfig {
    /// Consecutive `CutLine` calls within this window append to the clipboard.
    pub cut_line_window_ms: u64,
    /// Capacity of the cross-file jump history.
    pub jump_history_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            cut_line_window_ms: 10_000,
            jump_history_capacity: 100,
        }
    }
}

impl EditorConfig {
    pub fn cut_line_window(&self) -> Duration {
        Duration::from_millis(self.cut_line_window_ms)
    }
}

/// External commands used by the format / lint actions. `{file}` in an
/// argument is replaced by the buffer path.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsConfig {
    pub format: Vec<String>,
    pub lint: Vec<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ConfigFile {
    pub buffer: BufferSettings,
    pub editor: EditorConfig,
    /// Key chord (`"Ctrl-k"`) to action name overrides.
    pub keys: BTreeMap<String, String>,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,     // original file string (optional)
    pub source: Option<PathBuf>, // where `raw` came from
    pub file: ConfigFile,        // parsed (or default) data
}

/// Best-effort config path: working directory first, then the platform
/// config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("quill").join(CONFIG_FILE_NAME);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), key_overrides = file.keys.len(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                source: Some(path),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}
