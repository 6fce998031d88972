use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, LivingId, LocationId};

/// What sort of item this is. Determines the qualified type tag a save
/// record carries, which the load path checks references against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// An ordinary possession.
    Plain,
    /// A key correlated with a door by key code.
    Key,
    /// A readable note.
    Note,
}

impl ItemKind {
    /// Qualified type name used as the serialization reference tag.
    pub fn qual_type(&self) -> &'static str {
        match self {
            Self::Plain => "spindle_world.Item",
            Self::Key => "spindle_world.Key",
            Self::Note => "spindle_world.Note",
        }
    }
}

/// Where an item currently is. Ownership is exclusive: an item has at most
/// one container at a time and moves between them, never duplicating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Lying in a location.
    InLocation(LocationId),
    /// Carried in a living's inventory.
    Carried(LivingId),
}

/// A possessable, placeable thing.
#[derive(Debug, Clone)]
pub struct Item {
    /// This item's vnum.
    pub id: ItemId,
    /// Short name used for matching, e.g. "brass key".
    pub name: String,
    /// Display title, e.g. "a small brass key".
    pub title: String,
    /// Descriptive text shown when examined.
    pub description: String,
    /// The item's kind.
    pub kind: ItemKind,
    /// For keys: the door code this key operates.
    pub key_code: Option<String>,
    /// Current container, maintained by [`crate::World`].
    pub contained_in: Option<Container>,
}

impl Item {
    pub(crate) fn new(id: ItemId, name: impl Into<String>, kind: ItemKind) -> Self {
        let name = name.into();
        Self {
            id,
            title: format!("a {name}"),
            name,
            description: String::new(),
            kind,
            key_code: None,
            contained_in: None,
        }
    }

    /// Qualified type name used as the serialization reference tag.
    pub fn qual_type(&self) -> &'static str {
        self.kind.qual_type()
    }
}
