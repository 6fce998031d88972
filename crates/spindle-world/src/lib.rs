//! World graph for the Spindle interactive-fiction engine.
//!
//! Everything the story operates on lives in a [`World`]: locations connected
//! by exits and doors, items with exclusive movable ownership, and living
//! entities (including the player). Every entity carries a stable integer
//! identifier (a *vnum*) assigned at creation and never reused within a run;
//! vnums are the join keys the persistence layer serializes references by.

/// Error types for world manipulation.
pub mod error;
/// Vnum identifier newtypes, one per entity category.
pub mod ids;
/// Items and their exclusive containment.
pub mod item;
/// Living entities: NPCs and the player.
pub mod living;
/// Locations, directions, exits, and doors.
pub mod location;
/// The arena-style world context object.
pub mod world;

pub use error::{WorldError, WorldResult};
pub use ids::{ItemId, LivingId, LocationId};
pub use item::{Container, Item, ItemKind};
pub use living::{Gender, Living, LivingKind};
pub use location::{Direction, Door, Exit, Location};
pub use world::World;
