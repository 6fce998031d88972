//! Savegame capture, encoding, and restoration.
//!
//! A save never contains the static world; it contains the *dynamic* state
//! (player, item placement, NPC positions, door locks, clock, pending
//! deferred actions) plus `(vnum, name, type)` references into the static
//! world. On load the story rebuilds its world from scratch and every
//! reference is resolved against that rebuilt world; a reference that does
//! not line up means the save belongs to a different story or version.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use spindle_world::{Container, Gender, ItemId, ItemKind, LivingId, LocationId, World};

use crate::clock::ClockState;
use crate::config::StoryConfig;
use crate::error::{EngineError, EngineResult};
use crate::scheduler::{Deferred, Scheduler};

/// First line of every savegame file, before the JSON body.
pub const SAVE_MAGIC: &str = "SPINDLE SAVEGAME";
/// Format version written next to the magic. Bumped on incompatible
/// changes to the record layout.
pub const SAVE_FORMAT: u32 = 1;

/// A `(vnum, name, type)` reference to an entity of the static world.
///
/// The vnum locates the entity; name and type guard against a vnum that
/// happens to exist but means something else in a changed story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjRef {
    /// The entity's vnum within its category.
    pub vnum: u32,
    /// The entity's short name at save time.
    pub name: String,
    /// The qualified type tag, e.g. `spindle_world.Location`.
    #[serde(rename = "type")]
    pub typ: String,
}

impl ObjRef {
    fn for_location(world: &World, id: LocationId) -> EngineResult<Self> {
        let location = world.location(id)?;
        Ok(Self {
            vnum: id.0,
            name: location.name.clone(),
            typ: location.qual_type().to_string(),
        })
    }

    fn for_item(world: &World, id: ItemId) -> EngineResult<Self> {
        let item = world.item(id)?;
        Ok(Self {
            vnum: id.0,
            name: item.name.clone(),
            typ: item.qual_type().to_string(),
        })
    }

    fn for_living(world: &World, id: LivingId) -> EngineResult<Self> {
        let living = world.living(id)?;
        Ok(Self {
            vnum: id.0,
            name: living.name.clone(),
            typ: living.qual_type().to_string(),
        })
    }
}

/// Where an item was contained at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRef {
    /// Lying in a location.
    Location(ObjRef),
    /// Carried by a living (possibly the player).
    Carried(ObjRef),
}

/// Dynamic state of one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemState {
    /// The item's vnum at save time.
    pub vnum: u32,
    /// Short name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Description text.
    pub description: String,
    /// The item's kind.
    pub kind: ItemKind,
    /// Key code, for keys.
    pub key_code: Option<String>,
    /// Containment at save time.
    pub contained_in: Option<ContainerRef>,
}

/// Dynamic state of one NPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivingState {
    /// The living's vnum at save time.
    pub vnum: u32,
    /// Short name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Description text.
    pub description: String,
    /// Grammatical gender.
    pub gender: Gender,
    /// Race name.
    pub race: String,
    /// Privilege tags.
    pub privileges: Vec<String>,
    /// Where the living stood at save time.
    pub location: ObjRef,
}

/// Dynamic state of the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    /// The player's living state.
    #[serde(flatten)]
    pub living: LivingState,
    /// Items carried at save time.
    pub inventory: Vec<ObjRef>,
    /// Locations the player had visited.
    pub known_locations: Vec<ObjRef>,
    /// Commands entered so far.
    pub turns: u64,
}

/// Lock state of one doored exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitState {
    /// The location the exit leads out of.
    pub from: ObjRef,
    /// The exit's direction.
    pub direction: spindle_world::Direction,
    /// The door state at save time.
    pub door: spindle_world::Door,
}

/// One pending deferred action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredState {
    /// Game time the action is due.
    pub due: DateTime<Utc>,
    /// The owning living.
    pub owner: ObjRef,
    /// The action name.
    pub action: String,
    /// Periodic range in game seconds, if repeating.
    pub periodic: Option<(f64, f64)>,
}

/// The complete dynamic state of a game in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGame {
    /// Story name the save belongs to.
    pub story: String,
    /// Story version at save time. A mismatch on load is a warning, not
    /// an error.
    pub story_version: String,
    /// Wall-clock time the save was written.
    pub saved_at: DateTime<Utc>,
    /// Game clock snapshot.
    pub clock: ClockState,
    /// The player.
    pub player: PlayerState,
    /// Every item's dynamic state.
    pub items: Vec<ItemState>,
    /// Every NPC's dynamic state.
    pub livings: Vec<LivingState>,
    /// References to every static location, for consistency checking.
    pub locations: Vec<ObjRef>,
    /// Lock state of every doored exit.
    pub exits: Vec<ExitState>,
    /// Pending deferred actions.
    pub deferreds: Vec<DeferredState>,
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Snapshot the dynamic state of a running game.
pub fn capture(
    world: &World,
    player: LivingId,
    clock: ClockState,
    scheduler: &Scheduler,
    config: &StoryConfig,
) -> EngineResult<SavedGame> {
    let player_living = world.living(player)?;

    let player_state = PlayerState {
        living: LivingState {
            vnum: player.0,
            name: player_living.name.clone(),
            title: player_living.title.clone(),
            description: player_living.description.clone(),
            gender: player_living.gender,
            race: player_living.race.clone(),
            privileges: player_living.privileges.iter().cloned().collect(),
            location: ObjRef::for_location(world, player_living.location)?,
        },
        inventory: player_living
            .inventory
            .iter()
            .map(|id| ObjRef::for_item(world, *id))
            .collect::<EngineResult<_>>()?,
        known_locations: player_living
            .known_locations
            .iter()
            .map(|id| ObjRef::for_location(world, *id))
            .collect::<EngineResult<_>>()?,
        turns: player_living.turns,
    };

    let mut items = Vec::new();
    for item in world.items() {
        let contained_in = match item.contained_in {
            Some(Container::InLocation(loc)) => {
                Some(ContainerRef::Location(ObjRef::for_location(world, loc)?))
            }
            Some(Container::Carried(living)) => {
                Some(ContainerRef::Carried(ObjRef::for_living(world, living)?))
            }
            None => None,
        };
        items.push(ItemState {
            vnum: item.id.0,
            name: item.name.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            kind: item.kind,
            key_code: item.key_code.clone(),
            contained_in,
        });
    }

    let mut livings = Vec::new();
    for living in world.livings().filter(|l| !l.is_player()) {
        livings.push(LivingState {
            vnum: living.id.0,
            name: living.name.clone(),
            title: living.title.clone(),
            description: living.description.clone(),
            gender: living.gender,
            race: living.race.clone(),
            privileges: living.privileges.iter().cloned().collect(),
            location: ObjRef::for_location(world, living.location)?,
        });
    }

    let locations = world
        .locations()
        .map(|l| ObjRef::for_location(world, l.id))
        .collect::<EngineResult<Vec<_>>>()?;

    let mut exits = Vec::new();
    for location in world.locations() {
        for (direction, exit) in &location.exits {
            if let Some(door) = &exit.door {
                exits.push(ExitState {
                    from: ObjRef::for_location(world, location.id)?,
                    direction: *direction,
                    door: door.clone(),
                });
            }
        }
    }

    let deferreds = scheduler
        .state()
        .into_iter()
        .map(|d| {
            Ok(DeferredState {
                due: d.due,
                owner: ObjRef::for_living(world, d.owner)?,
                action: d.action,
                periodic: d.periodic,
            })
        })
        .collect::<EngineResult<Vec<_>>>()?;

    Ok(SavedGame {
        story: config.name.clone(),
        story_version: config.version.clone(),
        saved_at: Utc::now(),
        clock,
        player: player_state,
        items,
        livings,
        locations,
        exits,
        deferreds,
    })
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a save as a magic header line followed by a JSON body.
pub fn encode(save: &SavedGame) -> EngineResult<Vec<u8>> {
    let mut bytes = format!("{SAVE_MAGIC} {SAVE_FORMAT}\n").into_bytes();
    bytes.extend(serde_json::to_vec_pretty(save)?);
    Ok(bytes)
}

/// Decode a savegame file. Anything that stops the file being read as a
/// save of this format at all (wrong magic, wrong format version, broken
/// JSON) is a [`EngineError::SaveFormat`].
pub fn decode(bytes: &[u8]) -> EngineResult<SavedGame> {
    let text = std::str::from_utf8(bytes).map_err(|_| EngineError::SaveFormat {
        reason: "not a text file".into(),
    })?;
    let (header, body) = text.split_once('\n').ok_or_else(|| EngineError::SaveFormat {
        reason: "missing header line".into(),
    })?;
    let Some(version_text) = header.strip_prefix(SAVE_MAGIC) else {
        return Err(EngineError::SaveFormat {
            reason: "not a spindle savegame".into(),
        });
    };
    let version: u32 = version_text
        .trim()
        .parse()
        .map_err(|_| EngineError::SaveFormat {
            reason: "unreadable format version".into(),
        })?;
    if version != SAVE_FORMAT {
        return Err(EngineError::SaveFormat {
            reason: format!("unsupported format version {version}"),
        });
    }
    serde_json::from_str(body).map_err(|e| EngineError::SaveFormat {
        reason: format!("malformed save data: {e}"),
    })
}

/// Write an encoded save to disk.
pub fn write_savegame(path: &Path, save: &SavedGame) -> EngineResult<()> {
    std::fs::write(path, encode(save)?)?;
    Ok(())
}

/// Read and decode a save from disk.
pub fn read_savegame(path: &Path) -> EngineResult<SavedGame> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolves saved references against a freshly rebuilt static world.
///
/// The default [`WorldResolver`] matches on vnum and verifies name and
/// type; a test double can substitute laxer or stricter rules.
pub trait Resolver {
    /// Resolve a location reference. Locations are static, so failure is
    /// a hard inconsistency.
    fn resolve_location_ref(&self, world: &World, r: &ObjRef) -> EngineResult<LocationId>;

    /// Resolve an item reference, consulting the old-to-new vnum map built
    /// while restoring items.
    fn resolve_item_ref(
        &self,
        world: &World,
        map: &HashMap<u32, ItemId>,
        r: &ObjRef,
    ) -> EngineResult<ItemId>;

    /// Resolve a living reference, consulting the old-to-new vnum map
    /// built while restoring livings.
    fn resolve_living_ref(
        &self,
        world: &World,
        map: &HashMap<u32, LivingId>,
        r: &ObjRef,
    ) -> EngineResult<LivingId>;
}

/// The standard resolver: vnum lookup guarded by name and type checks.
#[derive(Debug, Default)]
pub struct WorldResolver;

impl Resolver for WorldResolver {
    fn resolve_location_ref(&self, world: &World, r: &ObjRef) -> EngineResult<LocationId> {
        let id = LocationId(r.vnum);
        let location = world.location(id).map_err(|_| EngineError::SaveInconsistent {
            reason: format!("location {} ({}) no longer exists", r.vnum, r.name),
        })?;
        if location.name != r.name || location.qual_type() != r.typ {
            return Err(EngineError::SaveInconsistent {
                reason: format!(
                    "location {} is now '{}', save expected '{}' ({})",
                    r.vnum, location.name, r.name, r.typ
                ),
            });
        }
        Ok(id)
    }

    fn resolve_item_ref(
        &self,
        world: &World,
        map: &HashMap<u32, ItemId>,
        r: &ObjRef,
    ) -> EngineResult<ItemId> {
        let id = map.get(&r.vnum).copied().unwrap_or(ItemId(r.vnum));
        let item = world.item(id).map_err(|_| EngineError::SaveInconsistent {
            reason: format!("item {} ({}) could not be restored", r.vnum, r.name),
        })?;
        if item.name != r.name || item.qual_type() != r.typ {
            return Err(EngineError::SaveInconsistent {
                reason: format!(
                    "item {} is now '{}', save expected '{}' ({})",
                    r.vnum, item.name, r.name, r.typ
                ),
            });
        }
        Ok(id)
    }

    fn resolve_living_ref(
        &self,
        world: &World,
        map: &HashMap<u32, LivingId>,
        r: &ObjRef,
    ) -> EngineResult<LivingId> {
        let id = map.get(&r.vnum).copied().unwrap_or(LivingId(r.vnum));
        let living = world.living(id).map_err(|_| EngineError::SaveInconsistent {
            reason: format!("living {} ({}) could not be restored", r.vnum, r.name),
        })?;
        if living.name != r.name || living.qual_type() != r.typ {
            return Err(EngineError::SaveInconsistent {
                reason: format!(
                    "living {} is now '{}', save expected '{}' ({})",
                    r.vnum, living.name, r.name, r.typ
                ),
            });
        }
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

/// What a successful restore produced.
#[derive(Debug)]
pub struct RestoreReport {
    /// The re-created player living.
    pub player: LivingId,
    /// Deferred actions with owners re-attached, ready for the scheduler.
    pub deferreds: Vec<Deferred>,
    /// Action names of deferreds dropped because their owner is gone.
    pub dropped_actions: Vec<String>,
    /// Non-fatal oddities (dropped deferreds, forgotten locations).
    pub warnings: Vec<String>,
}

/// Restore a save into a world the story has just rebuilt.
///
/// Runs in phases: locations are verified first (any mismatch aborts the
/// whole restore), then door locks, the player, items, NPCs, containment,
/// and finally deferred actions. Unresolvable deferred owners and
/// forgotten known-locations degrade to warnings; everything else that
/// fails to line up is a [`EngineError::SaveInconsistent`]. A failed
/// restore leaves `world` exactly as the story built it.
pub fn restore<R: Resolver>(
    world: &mut World,
    save: &SavedGame,
    resolver: &R,
) -> EngineResult<RestoreReport> {
    // All phases mutate a scratch copy; it only replaces the caller's
    // world once every reference has resolved.
    let mut scratch = world.clone();
    let report = restore_into(&mut scratch, save, resolver)?;
    *world = scratch;
    Ok(report)
}

fn restore_into<R: Resolver>(
    world: &mut World,
    save: &SavedGame,
    resolver: &R,
) -> EngineResult<RestoreReport> {
    let mut warnings = Vec::new();

    // Phase 1: the static world must still contain what the save points at.
    for r in &save.locations {
        resolver.resolve_location_ref(world, r)?;
    }

    // Phase 2: door locks.
    for exit_state in &save.exits {
        let from = resolver.resolve_location_ref(world, &exit_state.from)?;
        let exit = world
            .exit_mut(from, exit_state.direction)
            .map_err(|_| EngineError::SaveInconsistent {
                reason: format!(
                    "exit {} from '{}' no longer exists",
                    exit_state.direction, exit_state.from.name
                ),
            })?;
        if exit.door.is_none() {
            return Err(EngineError::SaveInconsistent {
                reason: format!(
                    "exit {} from '{}' is no longer a door",
                    exit_state.direction, exit_state.from.name
                ),
            });
        }
        exit.door = Some(exit_state.door.clone());
    }

    // Phase 3: re-create the player. The saved vnum is not reused; the
    // living map carries old vnum to new id for every later reference.
    let mut living_map: HashMap<u32, LivingId> = HashMap::new();
    let player = world.add_player(
        save.player.living.name.clone(),
        save.player.living.gender,
        save.player.living.race.clone(),
    );
    {
        let living = world.living_mut(player)?;
        living.title = save.player.living.title.clone();
        living.description = save.player.living.description.clone();
        living.privileges = save.player.living.privileges.iter().cloned().collect();
        living.turns = save.player.turns;
    }
    living_map.insert(save.player.living.vnum, player);

    // Phase 4: items. An existing item with matching identity is
    // overwritten in place; anything else gets a fresh vnum.
    let mut item_map: HashMap<u32, ItemId> = HashMap::new();
    for state in &save.items {
        let existing = ItemId(state.vnum);
        let matches = world
            .item(existing)
            .map(|i| i.name == state.name && i.kind == state.kind)
            .unwrap_or(false);
        let id = if matches {
            existing
        } else {
            let id = world.add_item(state.name.clone(), state.kind);
            warnings.push(format!(
                "item '{}' was re-created with a new vnum ({} -> {})",
                state.name, state.vnum, id.0
            ));
            id
        };
        let item = world.item_mut(id)?;
        item.title = state.title.clone();
        item.description = state.description.clone();
        item.key_code = state.key_code.clone();
        item_map.insert(state.vnum, id);
    }

    // Items the save never mentions are out of play for this game.
    let unmentioned: Vec<ItemId> = world
        .items()
        .map(|i| i.id)
        .filter(|id| !item_map.values().any(|mapped| mapped == id))
        .collect();
    for id in unmentioned {
        let name = world.item(id)?.name.clone();
        world.detach_item(id)?;
        warnings.push(format!("item '{name}' is not part of the saved game"));
    }

    // Phase 5: NPCs.
    for state in &save.livings {
        let location = resolver.resolve_location_ref(world, &state.location)?;
        let existing = LivingId(state.vnum);
        let matches = world
            .living(existing)
            .map(|l| l.name == state.name && !l.is_player())
            .unwrap_or(false);
        let id = if matches {
            world.move_living(existing, location)?;
            existing
        } else {
            let id = world.add_living(state.name.clone(), state.gender, state.race.clone(), location)?;
            warnings.push(format!(
                "living '{}' was re-created with a new vnum ({} -> {})",
                state.name, state.vnum, id.0
            ));
            id
        };
        let living = world.living_mut(id)?;
        living.title = state.title.clone();
        living.description = state.description.clone();
        living.gender = state.gender;
        living.race = state.race.clone();
        living.privileges = state.privileges.iter().cloned().collect();
        living_map.insert(state.vnum, id);
    }

    // Phase 6: containment, now that every container exists.
    for state in &save.items {
        let id = resolver.resolve_item_ref(world, &item_map, &obj_ref_of(state))?;
        match &state.contained_in {
            Some(ContainerRef::Location(r)) => {
                let location = resolver.resolve_location_ref(world, r)?;
                world.move_item(id, Container::InLocation(location))?;
            }
            Some(ContainerRef::Carried(r)) => {
                let living = resolver.resolve_living_ref(world, &living_map, r)?;
                world.move_item(id, Container::Carried(living))?;
            }
            None => world.detach_item(id)?,
        }
    }

    // Phase 7: hook up the player's position and memory.
    let location = resolver.resolve_location_ref(world, &save.player.living.location)?;
    world.move_living(player, location)?;
    for r in &save.player.known_locations {
        match resolver.resolve_location_ref(world, r) {
            Ok(id) => {
                world.living_mut(player)?.known_locations.insert(id);
            }
            Err(_) => warnings.push(format!("known location '{}' no longer exists", r.name)),
        }
    }
    for r in &save.player.inventory {
        let id = resolver.resolve_item_ref(world, &item_map, r)?;
        world.move_item(id, Container::Carried(player))?;
    }

    // Phase 8: deferred actions. A dangling owner drops the action with
    // a warning rather than poisoning the whole restore.
    let mut deferreds = Vec::new();
    let mut dropped_actions = Vec::new();
    for state in &save.deferreds {
        match resolver.resolve_living_ref(world, &living_map, &state.owner) {
            Ok(owner) => deferreds.push(Deferred::restored(
                state.due,
                owner,
                state.action.clone(),
                state.periodic,
            )),
            Err(_) => {
                warnings.push(format!(
                    "dropped scheduled action '{}' (owner '{}' not found)",
                    state.action, state.owner.name
                ));
                dropped_actions.push(state.action.clone());
            }
        }
    }

    Ok(RestoreReport {
        player,
        deferreds,
        dropped_actions,
        warnings,
    })
}

fn obj_ref_of(state: &ItemState) -> ObjRef {
    ObjRef {
        vnum: state.vnum,
        name: state.name.clone(),
        typ: state.kind.qual_type().to_string(),
    }
}
