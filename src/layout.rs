//! Window layout preferences persisted on close.
//!
//! Exactly two values survive a window close: the splitter pane position and
//! the tree's per-column widths. The core hands these to the storage
//! collaborator through `AppContext::persist_layout`; this module also ships
//! a default JSON store (~/.phrasekit/window.json) for hosts that have no
//! settings backend of their own.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Splitter position used before the user has ever resized the panes.
pub const DEFAULT_PANE_POSITION: i32 = 150;

/// The tree shows three columns (name, abbreviation, hotkey).
pub const TREE_COLUMN_COUNT: usize = 3;

/// Layout values captured from the presentation layer at close time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPrefs {
    /// Left pane width of the tree/editor splitter, in pixels.
    pub pane_position: i32,
    /// Width of each tree column, in pixels.
    pub column_widths: Vec<i32>,
}

impl Default for LayoutPrefs {
    fn default() -> Self {
        Self {
            pane_position: DEFAULT_PANE_POSITION,
            column_widths: vec![150; TREE_COLUMN_COUNT],
        }
    }
}

impl LayoutPrefs {
    /// Load preferences from a JSON file. Missing file yields defaults;
    /// a malformed file is an error so the caller can decide to warn.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(ConfigError::LayoutRead)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save preferences as pretty-printed JSON, creating parent directories
    /// as needed. Writes through a sibling temp file and renames it into
    /// place so a crash mid-write never leaves a truncated file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::LayoutWrite)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(ConfigError::LayoutWrite)?;
        fs::rename(&tmp, path).map_err(ConfigError::LayoutWrite)
    }

    /// Default on-disk location (~/.phrasekit/window.json).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".phrasekit").join("window.json"))
            .unwrap_or_else(|| std::env::temp_dir().join("phrasekit-window.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window.json");
        let prefs = LayoutPrefs::load(&path).unwrap();
        assert_eq!(prefs, LayoutPrefs::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("window.json");
        let prefs = LayoutPrefs {
            pane_position: 237,
            column_widths: vec![120, 80, 64],
        };
        prefs.save(&path).unwrap();
        assert_eq!(LayoutPrefs::load(&path).unwrap(), prefs);
    }

    #[test]
    fn save_replaces_existing_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window.json");
        LayoutPrefs::default().save(&path).unwrap();

        let prefs = LayoutPrefs {
            pane_position: 90,
            column_widths: vec![60, 60, 60],
        };
        prefs.save(&path).unwrap();
        assert_eq!(LayoutPrefs::load(&path).unwrap(), prefs);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            LayoutPrefs::load(&path),
            Err(ConfigError::LayoutParse(_))
        ));
    }
}
