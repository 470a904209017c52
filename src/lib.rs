//! PhraseKit configuration window core
//!
//! The logic behind the configuration window of a desktop automation tool:
//! a tree of folders, text phrases, and executable scripts, with toolbar
//! actions whose enablement follows the selection, the dirty flag, and any
//! in-flight background work (script execution, input recording).
//!
//! The visual shell, the item-tree storage, and the script interpreter are
//! collaborators behind traits (`ConfigView`, `AppContext`, `ScriptRunner`,
//! `InputRecorder`); this crate owns the state machines between them.

pub mod actions;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod items;
pub mod layout;
pub mod logging;
pub mod selection;

pub use actions::{resolve, ActionAvailability};
pub use controller::{AppContext, ConfigView, ConfigWindowController};
pub use coordinator::{
    BackgroundTaskCoordinator, InputRecorder, RecordOptions, ScriptRunner, ScriptRunStatus,
    ScriptTaskHandle, TaskEvent, SCRIPT_SETTLE_DELAY,
};
pub use error::{ConfigError, ErrorSeverity, Result};
pub use items::{Folder, Item, ItemKind, Phrase, Script};
pub use layout::LayoutPrefs;
pub use selection::SelectionState;
