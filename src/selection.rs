//! Selection state - What the user currently has highlighted in the tree
//!
//! Pure data, mutated only on the event thread by the controller. The
//! availability resolver reads a consistent snapshot of this struct; nothing
//! else holds references into it.

use crate::items::{Item, ItemKind, Script};

/// Snapshot of the tree selection plus the two flags that drive action
/// enablement alongside it.
#[derive(Clone, Debug, Default)]
pub struct SelectionState {
    /// Selected items in tree order. Empty means no selection.
    pub items: Vec<Item>,
    /// Unsaved edits exist since the last save.
    pub dirty: bool,
    /// Items sitting in the cut/copy buffer, available to paste.
    pub clipboard_count: usize,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Exactly one item selected. Single-item-only actions (record, run,
    /// create-child) require this; empty and multi-selection both fail it.
    pub fn single_selected(&self) -> bool {
        self.items.len() == 1
    }

    /// Any folder anywhere in the selection vetoes copy/clone.
    pub fn contains_folder(&self) -> bool {
        self.items.iter().any(|item| item.kind() == ItemKind::Folder)
    }

    /// The selected script, when the selection is exactly one Script item.
    pub fn single_script(&self) -> Option<&Script> {
        match self.items.as_slice() {
            [item] => item.as_script(),
            _ => None,
        }
    }

    /// The selected folder, when the selection is exactly one Folder item.
    pub fn single_folder_selected(&self) -> bool {
        self.single_selected() && self.items[0].kind() == ItemKind::Folder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Folder, Phrase};

    fn folder(id: u64) -> Item {
        Item::Folder(Folder {
            id,
            name: format!("folder-{id}"),
        })
    }

    fn phrase(id: u64) -> Item {
        Item::Phrase(Phrase {
            id,
            name: format!("phrase-{id}"),
            contents: String::new(),
        })
    }

    fn script(id: u64) -> Item {
        Item::Script(Script {
            id,
            name: format!("script-{id}"),
            body: String::new(),
        })
    }

    #[test]
    fn empty_selection_is_neither_single_nor_folder() {
        let state = SelectionState::new();
        assert!(state.is_empty());
        assert!(!state.single_selected());
        assert!(!state.contains_folder());
        assert!(state.single_script().is_none());
    }

    #[test]
    fn single_selected_requires_exactly_one() {
        let mut state = SelectionState::new();
        state.items = vec![script(1)];
        assert!(state.single_selected());
        state.items.push(phrase(2));
        assert!(!state.single_selected());
    }

    #[test]
    fn any_folder_in_selection_is_detected() {
        let mut state = SelectionState::new();
        state.items = vec![phrase(1), script(2)];
        assert!(!state.contains_folder());
        state.items.push(folder(3));
        assert!(state.contains_folder());
    }

    #[test]
    fn single_script_ignores_multi_selection() {
        let mut state = SelectionState::new();
        state.items = vec![script(1)];
        assert_eq!(state.single_script().map(|s| s.id), Some(1));
        state.items.push(script(2));
        assert!(state.single_script().is_none());
    }
}
