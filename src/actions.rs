//! Action availability - Which toolbar/menu operations are permitted right now
//!
//! `resolve` is a pure function from a selection snapshot plus the two
//! background-task flags to a set of enabled/disabled booleans. It has no
//! side effects and can be called with any consistent snapshot, so the
//! controller recomputes it on every selection change and task event.
//!
//! Undo/redo are NOT derived here: they follow the central widget's
//! undo-stack signals. The resolver leaves them false and the controller
//! overlays its stored flags (and the destructive-change override) before
//! pushing the result to the view.

use crate::selection::SelectionState;

/// Enabled/disabled flag per user-visible action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionAvailability {
    /// Creating a top-level folder never requires a selection.
    pub new_top_folder: bool,
    pub new_sub_folder: bool,
    pub new_phrase: bool,
    pub new_script: bool,
    pub copy: bool,
    pub clone: bool,
    pub paste: bool,
    pub record: bool,
    pub run: bool,
    pub save: bool,
    pub undo: bool,
    pub redo: bool,
}

impl ActionAvailability {
    /// Availability with everything off except the selection-independent
    /// top-folder creation. Used for an empty selection.
    pub fn none_selected(dirty: bool) -> Self {
        Self {
            new_top_folder: true,
            save: dirty,
            ..Self::default()
        }
    }
}

/// Compute action availability from a selection snapshot and the current
/// background-task flags.
pub fn resolve(
    selection: &SelectionState,
    recording_active: bool,
    script_running: bool,
) -> ActionAvailability {
    if selection.is_empty() {
        return ActionAvailability::none_selected(selection.dirty);
    }

    // Child creation needs exactly one selected Folder.
    let can_create_child = selection.single_folder_selected();

    // Copying folders is disallowed as policy: one Folder anywhere in the
    // selection vetoes copy and clone for the whole selection.
    let can_copy = !selection.contains_folder();

    let single_script = selection.single_script().is_some();

    ActionAvailability {
        new_top_folder: true,
        new_sub_folder: can_create_child,
        new_phrase: can_create_child,
        new_script: can_create_child,
        copy: can_copy,
        clone: can_copy,
        paste: can_create_child && selection.clipboard_count > 0,
        record: single_script && !recording_active && !script_running,
        run: single_script && !script_running,
        save: selection.dirty,
        undo: false,
        redo: false,
    }
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;
