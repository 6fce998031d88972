use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, LivingId, LocationId};

/// A compass or vertical direction an exit can lead in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// North.
    North,
    /// East.
    East,
    /// South.
    South,
    /// West.
    West,
    /// Northeast.
    Northeast,
    /// Northwest.
    Northwest,
    /// Southeast.
    Southeast,
    /// Southwest.
    Southwest,
    /// Up.
    Up,
    /// Down.
    Down,
}

impl Direction {
    /// All directions, in display order.
    pub const ALL: [Direction; 10] = [
        Self::North,
        Self::East,
        Self::South,
        Self::West,
        Self::Northeast,
        Self::Northwest,
        Self::Southeast,
        Self::Southwest,
        Self::Up,
        Self::Down,
    ];

    /// Parse a direction from its full name or common abbreviation.
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_lowercase().as_str() {
            "north" | "n" => Some(Self::North),
            "east" | "e" => Some(Self::East),
            "south" | "s" => Some(Self::South),
            "west" | "w" => Some(Self::West),
            "northeast" | "ne" => Some(Self::Northeast),
            "northwest" | "nw" => Some(Self::Northwest),
            "southeast" | "se" => Some(Self::Southeast),
            "southwest" | "sw" => Some(Self::Southwest),
            "up" | "u" => Some(Self::Up),
            "down" | "d" => Some(Self::Down),
            _ => None,
        }
    }

    /// The lowercase name of this direction.
    pub fn name(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
            Self::Northeast => "northeast",
            Self::Northwest => "northwest",
            Self::Southeast => "southeast",
            Self::Southwest => "southwest",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// The direction leading back the way this one came.
    pub fn opposite(&self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::Northeast => Self::Southwest,
            Self::Northwest => Self::Southeast,
            Self::Southeast => Self::Northwest,
            Self::Southwest => Self::Northeast,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Lock state carried by a door exit. A locked door with a key code can be
/// unlocked by a key item bearing the same code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    /// Whether the door is currently locked.
    pub locked: bool,
    /// Whether the door stands open.
    pub opened: bool,
    /// Code matching the key item that operates this door, if any.
    pub key_code: Option<String>,
}

impl Door {
    /// A locked, closed door operated by the given key code.
    pub fn locked_with_key(key_code: impl Into<String>) -> Self {
        Self {
            locked: true,
            opened: false,
            key_code: Some(key_code.into()),
        }
    }
}

/// A directed connection from one location to another.
///
/// Exits are part of static topology: saves never capture their content,
/// only a reference for consistency checking against the re-derived world.
#[derive(Debug, Clone)]
pub struct Exit {
    /// The location this exit leads to.
    pub target: LocationId,
    /// Short description shown when examining the exit.
    pub description: String,
    /// Door state, when the exit is a door rather than an open passage.
    pub door: Option<Door>,
}

impl Exit {
    /// An open passage to `target`.
    pub fn new(target: LocationId, description: impl Into<String>) -> Self {
        Self {
            target,
            description: description.into(),
            door: None,
        }
    }

    /// A doored passage to `target`.
    pub fn with_door(target: LocationId, description: impl Into<String>, door: Door) -> Self {
        Self {
            target,
            description: description.into(),
            door: Some(door),
        }
    }

    /// Whether the exit can be passed through right now.
    pub fn passable(&self) -> bool {
        match &self.door {
            Some(door) => !door.locked,
            None => true,
        }
    }

    /// Qualified type name used as the serialization reference tag.
    pub fn qual_type(&self) -> &'static str {
        if self.door.is_some() {
            "spindle_world.Door"
        } else {
            "spindle_world.Exit"
        }
    }
}

/// A named, described place owning its exits and its current contents.
///
/// Items and livings are *contained* here exclusively; moving one elsewhere
/// removes it from this location. Locations themselves are re-derivable from
/// story definitions and are matched by (vnum, name, type) on load.
#[derive(Debug, Clone)]
pub struct Location {
    /// This location's vnum.
    pub id: LocationId,
    /// Short name, e.g. "Market square".
    pub name: String,
    /// Longer descriptive text.
    pub description: String,
    /// Exits by direction.
    pub exits: BTreeMap<Direction, Exit>,
    /// Items lying here.
    pub items: BTreeSet<ItemId>,
    /// Livings present here.
    pub livings: BTreeSet<LivingId>,
}

impl Location {
    pub(crate) fn new(id: LocationId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            exits: BTreeMap::new(),
            items: BTreeSet::new(),
            livings: BTreeSet::new(),
        }
    }

    /// Qualified type name used as the serialization reference tag.
    pub fn qual_type(&self) -> &'static str {
        "spindle_world.Location"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parse_abbreviations() {
        assert_eq!(Direction::parse("n"), Some(Direction::North));
        assert_eq!(Direction::parse("SW"), Some(Direction::Southwest));
        assert_eq!(Direction::parse("down"), Some(Direction::Down));
        assert_eq!(Direction::parse("sideways"), None);
    }

    #[test]
    fn direction_opposites() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn locked_door_blocks_passage() {
        let open = Exit::new(LocationId(1), "an archway");
        assert!(open.passable());

        let door = Exit::with_door(LocationId(1), "an oak door", Door::locked_with_key("iron"));
        assert!(!door.passable());
        assert_eq!(door.qual_type(), "spindle_world.Door");
    }
}
