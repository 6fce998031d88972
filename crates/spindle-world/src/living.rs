use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, LivingId, LocationId};

/// Grammatical gender of a living, as chosen at character creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// He/him.
    Male,
    /// She/her.
    Female,
    /// It/its.
    Neutral,
}

impl Gender {
    /// Parse from the single-letter form used in prompts (m/f/n).
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "m" | "male" => Some(Self::Male),
            "f" | "female" => Some(Self::Female),
            "n" | "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// The single-letter form (m/f/n).
    pub fn letter(&self) -> &'static str {
        match self {
            Self::Male => "m",
            Self::Female => "f",
            Self::Neutral => "n",
        }
    }
}

/// Whether a living is an NPC or the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivingKind {
    /// A story-controlled entity.
    Npc,
    /// The entity bound to the active session.
    Player,
}

/// A living entity: position, inventory, and behavioral state.
///
/// The player is a `Living` with [`LivingKind::Player`]; the known-locations
/// set and turn counter are only meaningful for the player but live here so
/// persistence can treat all livings uniformly.
#[derive(Debug, Clone)]
pub struct Living {
    /// This living's vnum.
    pub id: LivingId,
    /// NPC or player.
    pub kind: LivingKind,
    /// Short name, e.g. "rat".
    pub name: String,
    /// Display title, e.g. "the old caretaker".
    pub title: String,
    /// Descriptive text shown when examined.
    pub description: String,
    /// Grammatical gender.
    pub gender: Gender,
    /// Race name; attributes beyond the name are story concerns.
    pub race: String,
    /// Privilege tags, e.g. "wizard".
    pub privileges: BTreeSet<String>,
    /// Current location, maintained by [`crate::World`].
    pub location: LocationId,
    /// Items carried, maintained by [`crate::World`].
    pub inventory: BTreeSet<ItemId>,
    /// Locations this living has visited (player only in practice).
    pub known_locations: BTreeSet<LocationId>,
    /// Number of commands this living has entered (player only).
    pub turns: u64,
}

impl Living {
    pub(crate) fn new(
        id: LivingId,
        kind: LivingKind,
        name: impl Into<String>,
        gender: Gender,
        race: impl Into<String>,
        location: LocationId,
    ) -> Self {
        let name = name.into();
        let mut title: Vec<char> = name.chars().collect();
        if let Some(first) = title.first_mut() {
            *first = first.to_ascii_uppercase();
        }
        Self {
            id,
            kind,
            title: title.into_iter().collect(),
            name,
            description: String::new(),
            gender,
            race: race.into(),
            privileges: BTreeSet::new(),
            location,
            inventory: BTreeSet::new(),
            known_locations: BTreeSet::new(),
            turns: 0,
        }
    }

    /// Whether this living is the player.
    pub fn is_player(&self) -> bool {
        self.kind == LivingKind::Player
    }

    /// Whether this living carries the given privilege tag.
    pub fn has_privilege(&self, tag: &str) -> bool {
        self.privileges.contains(tag)
    }

    /// Qualified type name used as the serialization reference tag.
    pub fn qual_type(&self) -> &'static str {
        match self.kind {
            LivingKind::Npc => "spindle_world.Living",
            LivingKind::Player => "spindle_world.Player",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parse() {
        assert_eq!(Gender::parse("m"), Some(Gender::Male));
        assert_eq!(Gender::parse(" Female "), Some(Gender::Female));
        assert_eq!(Gender::parse("x"), None);
    }

    #[test]
    fn title_is_capitalized_name() {
        let living = Living::new(
            LivingId(7),
            LivingKind::Npc,
            "rat",
            Gender::Neutral,
            "rodent",
            LocationId(0),
        );
        assert_eq!(living.title, "Rat");
        assert_eq!(living.qual_type(), "spindle_world.Living");
    }
}
