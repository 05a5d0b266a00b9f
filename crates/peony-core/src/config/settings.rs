use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::duration::SettleDuration;
use crate::error::CoreError;

const CONFIG_DIR: &str = "peony";
const CONFIG_FILE: &str = "config.json";

/// User settings stored as JSON under the XDG config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeonyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(default)]
    pub settle_duration: String,
}

impl Default for PeonyConfig {
    fn default() -> Self {
        Self {
            editor: None,
            settle_duration: SettleDuration::default().to_string(),
        }
    }
}

impl PeonyConfig {
    /// `$XDG_CONFIG_HOME/peony/config.json`, else `~/.config/peony/config.json`.
    pub fn path() -> Result<PathBuf, CoreError> {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            if !xdg.is_empty() {
                return Ok(PathBuf::from(xdg).join(CONFIG_DIR).join(CONFIG_FILE));
            }
        }
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Config("Could not determine home directory".into()))?;
        Ok(home.join(".config").join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(CoreError::Io(e)),
        };
        let cfg: Self = serde_json::from_str(&data)
            .map_err(|e| CoreError::Config(format!("Failed to parse {}: {e}", path.display())))?;
        Ok(cfg.normalize())
    }

    /// Write to the default location.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    /// Normalize and write with an exclusive file lock.
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let cfg = self.clone().normalize();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&cfg)?;
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        fs2::FileExt::lock_exclusive(&file).map_err(CoreError::Io)?;
        (&file).write_all(json.as_bytes())?;
        (&file).write_all(b"\n")?;
        fs2::FileExt::unlock(&file).map_err(CoreError::Io)?;
        Ok(())
    }

    /// Trim fields, drop a blank editor, and replace an empty or malformed
    /// settle duration with the default.
    pub fn normalize(mut self) -> Self {
        self.editor = self
            .editor
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self.settle_duration = SettleDuration::parse_or_default(&self.settle_duration).to_string();
        self
    }

    pub fn settle_duration(&self) -> SettleDuration {
        SettleDuration::parse_or_default(&self.settle_duration)
    }
}
