//! Item model - The automation tree's node types
//!
//! The configuration window operates on a tree of automation items:
//! - `Folder` - container for other items
//! - `Phrase` - static text snippet expanded on trigger
//! - `Script` - executable automation with an owned source body
//!
//! The tree itself (storage, ordering, undo stack) lives in the central
//! widget collaborator; this crate only needs the variant tag and, for
//! scripts, the payload that a run task clones at schedule time.

use serde::{Deserialize, Serialize};

/// Discriminant for the three item variants. Used by the availability
/// resolver where the original UI did runtime type tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Folder,
    Phrase,
    Script,
}

/// A folder node. Folders are the only items that can hold children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: u64,
    pub name: String,
}

/// A static text snippet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub id: u64,
    pub name: String,
    pub contents: String,
}

/// An executable script. `body` is the full source; run tasks clone the
/// whole struct so the tree is free to mutate or delete the node while
/// the task is in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub id: u64,
    pub name: String,
    pub body: String,
}

/// A node in the automation tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Item {
    Folder(Folder),
    Phrase(Phrase),
    Script(Script),
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Folder(_) => ItemKind::Folder,
            Item::Phrase(_) => ItemKind::Phrase,
            Item::Script(_) => ItemKind::Script,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Item::Folder(f) => f.id,
            Item::Phrase(p) => p.id,
            Item::Script(s) => s.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Folder(f) => &f.name,
            Item::Phrase(p) => &p.name,
            Item::Script(s) => &s.name,
        }
    }

    /// Returns the script payload when this item is a Script.
    pub fn as_script(&self) -> Option<&Script> {
        match self {
            Item::Script(s) => Some(s),
            _ => None,
        }
    }
}
