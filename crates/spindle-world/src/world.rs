use std::collections::BTreeMap;

use crate::error::{WorldError, WorldResult};
use crate::ids::{ItemId, LivingId, LocationId};
use crate::item::{Container, Item, ItemKind};
use crate::living::{Gender, Living, LivingKind};
use crate::location::{Direction, Door, Exit, Location};

/// The world context object: owns every location, item, and living, and the
/// per-category vnum counters. Passed explicitly to the loop, scheduler, and
/// persistence engine; there are no global registries.
///
/// Containment is maintained here as an invariant: an item appears in exactly
/// the container its `contained_in` names, and a living appears in exactly
/// the location its `location` names.
#[derive(Debug, Clone)]
pub struct World {
    locations: BTreeMap<LocationId, Location>,
    items: BTreeMap<ItemId, Item>,
    livings: BTreeMap<LivingId, Living>,
    limbo: LocationId,
    // Monotonic; vnums are never reused, even after destruction.
    next_location: u32,
    next_item: u32,
    next_living: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world containing only the limbo location, where
    /// not-yet-placed livings (such as a connecting player) wait.
    pub fn new() -> Self {
        let mut world = Self {
            locations: BTreeMap::new(),
            items: BTreeMap::new(),
            livings: BTreeMap::new(),
            limbo: LocationId(0),
            next_location: 0,
            next_item: 0,
            next_living: 0,
        };
        world.limbo = world.add_location("Limbo", "The mist-filled nothingness between worlds.");
        world
    }

    /// The limbo location.
    pub fn limbo(&self) -> LocationId {
        self.limbo
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Add a location. Returns its freshly assigned vnum.
    pub fn add_location(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> LocationId {
        let id = LocationId(self.next_location);
        self.next_location += 1;
        self.locations.insert(id, Location::new(id, name, description));
        id
    }

    /// Add an item, initially contained nowhere.
    pub fn add_item(&mut self, name: impl Into<String>, kind: ItemKind) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item += 1;
        self.items.insert(id, Item::new(id, name, kind));
        id
    }

    /// Add an NPC living at the given location.
    pub fn add_living(
        &mut self,
        name: impl Into<String>,
        gender: Gender,
        race: impl Into<String>,
        location: LocationId,
    ) -> WorldResult<LivingId> {
        self.spawn_living(LivingKind::Npc, name, gender, race, location)
    }

    /// Add a player living, initially waiting in limbo.
    pub fn add_player(
        &mut self,
        name: impl Into<String>,
        gender: Gender,
        race: impl Into<String>,
    ) -> LivingId {
        let limbo = self.limbo;
        self.spawn_living(LivingKind::Player, name, gender, race, limbo)
            .unwrap_or_else(|_| unreachable!("limbo always exists"))
    }

    fn spawn_living(
        &mut self,
        kind: LivingKind,
        name: impl Into<String>,
        gender: Gender,
        race: impl Into<String>,
        location: LocationId,
    ) -> WorldResult<LivingId> {
        if !self.locations.contains_key(&location) {
            return Err(WorldError::LocationNotFound(location));
        }
        let id = LivingId(self.next_living);
        self.next_living += 1;
        self.livings
            .insert(id, Living::new(id, kind, name, gender, race, location));
        if let Some(loc) = self.locations.get_mut(&location) {
            loc.livings.insert(id);
        }
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    /// Get a location by vnum.
    pub fn location(&self, id: LocationId) -> WorldResult<&Location> {
        self.locations.get(&id).ok_or(WorldError::LocationNotFound(id))
    }

    /// Get a location mutably by vnum.
    pub fn location_mut(&mut self, id: LocationId) -> WorldResult<&mut Location> {
        self.locations
            .get_mut(&id)
            .ok_or(WorldError::LocationNotFound(id))
    }

    /// Get an item by vnum.
    pub fn item(&self, id: ItemId) -> WorldResult<&Item> {
        self.items.get(&id).ok_or(WorldError::ItemNotFound(id))
    }

    /// Get an item mutably by vnum.
    pub fn item_mut(&mut self, id: ItemId) -> WorldResult<&mut Item> {
        self.items.get_mut(&id).ok_or(WorldError::ItemNotFound(id))
    }

    /// Get a living by vnum.
    pub fn living(&self, id: LivingId) -> WorldResult<&Living> {
        self.livings.get(&id).ok_or(WorldError::LivingNotFound(id))
    }

    /// Get a living mutably by vnum.
    pub fn living_mut(&mut self, id: LivingId) -> WorldResult<&mut Living> {
        self.livings.get_mut(&id).ok_or(WorldError::LivingNotFound(id))
    }

    /// Whether an item with this vnum exists.
    pub fn has_item(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Iterate over all locations.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    /// Iterate over all items.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Iterate over all livings.
    pub fn livings(&self) -> impl Iterator<Item = &Living> {
        self.livings.values()
    }

    /// Find a location by case-insensitive name.
    pub fn find_location_by_name(&self, name: &str) -> Option<&Location> {
        let lower = name.to_lowercase();
        self.locations.values().find(|l| l.name.to_lowercase() == lower)
    }

    /// Find an item by case-insensitive name among the given candidates.
    pub fn find_item_among<'a, I>(&'a self, candidates: I, name: &str) -> Option<&'a Item>
    where
        I: IntoIterator<Item = ItemId>,
    {
        let lower = name.to_lowercase();
        candidates
            .into_iter()
            .filter_map(|id| self.items.get(&id))
            .find(|item| item.name.to_lowercase() == lower)
    }

    // -----------------------------------------------------------------------
    // Topology
    // -----------------------------------------------------------------------

    /// Connect `from` to `to` with an open exit in `direction`.
    pub fn connect(
        &mut self,
        from: LocationId,
        direction: Direction,
        to: LocationId,
        description: impl Into<String>,
    ) -> WorldResult<()> {
        self.add_exit(from, direction, Exit::new(to, description))
    }

    /// Connect `from` to `to` with a doored exit in `direction`.
    pub fn connect_with_door(
        &mut self,
        from: LocationId,
        direction: Direction,
        to: LocationId,
        description: impl Into<String>,
        door: Door,
    ) -> WorldResult<()> {
        self.add_exit(from, direction, Exit::with_door(to, description, door))
    }

    fn add_exit(&mut self, from: LocationId, direction: Direction, exit: Exit) -> WorldResult<()> {
        if !self.locations.contains_key(&exit.target) {
            return Err(WorldError::LocationNotFound(exit.target));
        }
        let loc = self.location_mut(from)?;
        if loc.exits.contains_key(&direction) {
            return Err(WorldError::DuplicateExit { from, direction });
        }
        loc.exits.insert(direction, exit);
        Ok(())
    }

    /// Get the exit leading in `direction` from a location.
    pub fn exit(&self, from: LocationId, direction: Direction) -> WorldResult<&Exit> {
        self.location(from)?
            .exits
            .get(&direction)
            .ok_or(WorldError::NoExit { from, direction })
    }

    /// Get an exit mutably, for lock/unlock state changes.
    pub fn exit_mut(&mut self, from: LocationId, direction: Direction) -> WorldResult<&mut Exit> {
        self.location_mut(from)?
            .exits
            .get_mut(&direction)
            .ok_or(WorldError::NoExit { from, direction })
    }

    // -----------------------------------------------------------------------
    // Containment
    // -----------------------------------------------------------------------

    /// Move an item into a container, detaching it from wherever it was.
    /// Ownership stays exclusive: after this, exactly one container holds it.
    pub fn move_item(&mut self, item: ItemId, to: Container) -> WorldResult<()> {
        match to {
            Container::InLocation(loc) if !self.locations.contains_key(&loc) => {
                return Err(WorldError::LocationNotFound(loc));
            }
            Container::Carried(living) if !self.livings.contains_key(&living) => {
                return Err(WorldError::LivingNotFound(living));
            }
            _ => {}
        }
        self.detach_item(item)?;
        match to {
            Container::InLocation(loc) => {
                if let Some(location) = self.locations.get_mut(&loc) {
                    location.items.insert(item);
                }
            }
            Container::Carried(living) => {
                if let Some(living) = self.livings.get_mut(&living) {
                    living.inventory.insert(item);
                }
            }
        }
        if let Some(item) = self.items.get_mut(&item) {
            item.contained_in = Some(to);
        }
        Ok(())
    }

    /// Detach an item from its current container, if any. Idempotent: an
    /// already-detached item is left as is.
    pub fn detach_item(&mut self, item: ItemId) -> WorldResult<()> {
        let previous = self
            .items
            .get(&item)
            .ok_or(WorldError::ItemNotFound(item))?
            .contained_in;
        match previous {
            Some(Container::InLocation(loc)) => {
                if let Some(location) = self.locations.get_mut(&loc) {
                    location.items.remove(&item);
                }
            }
            Some(Container::Carried(living)) => {
                if let Some(living) = self.livings.get_mut(&living) {
                    living.inventory.remove(&item);
                }
            }
            None => {}
        }
        if let Some(item) = self.items.get_mut(&item) {
            item.contained_in = None;
        }
        Ok(())
    }

    /// Move a living to another location.
    pub fn move_living(&mut self, living: LivingId, to: LocationId) -> WorldResult<()> {
        if !self.locations.contains_key(&to) {
            return Err(WorldError::LocationNotFound(to));
        }
        let from = self
            .livings
            .get(&living)
            .ok_or(WorldError::LivingNotFound(living))?
            .location;
        if let Some(old) = self.locations.get_mut(&from) {
            old.livings.remove(&living);
        }
        if let Some(new) = self.locations.get_mut(&to) {
            new.livings.insert(living);
        }
        if let Some(living) = self.livings.get_mut(&living) {
            living.location = to;
        }
        Ok(())
    }

    /// Remove a living from the world entirely (e.g. a discarded connection
    /// placeholder). Carried items are dropped where the living stood.
    /// Its vnum is not reused.
    pub fn remove_living(&mut self, living: LivingId) -> WorldResult<Living> {
        let removed = self
            .livings
            .remove(&living)
            .ok_or(WorldError::LivingNotFound(living))?;
        if let Some(loc) = self.locations.get_mut(&removed.location) {
            loc.livings.remove(&living);
        }
        for item in removed.inventory.iter().copied() {
            if let Some(loc) = self.locations.get_mut(&removed.location) {
                loc.items.insert(item);
            }
            if let Some(item) = self.items.get_mut(&item) {
                item.contained_in = Some(Container::InLocation(removed.location));
            }
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Describe a location as the paragraphs a player sees when looking
    /// around. `exclude` omits the onlooker from the livings listed.
    pub fn look(&self, at: LocationId, exclude: Option<LivingId>) -> WorldResult<Vec<String>> {
        let location = self.location(at)?;
        let mut paragraphs = vec![format!("[{}]", location.name)];
        if !location.description.is_empty() {
            paragraphs.push(location.description.clone());
        }

        let livings: Vec<&str> = location
            .livings
            .iter()
            .filter(|id| Some(**id) != exclude)
            .filter_map(|id| self.livings.get(id))
            .map(|l| l.title.as_str())
            .collect();
        if !livings.is_empty() {
            paragraphs.push(format!("Also here: {}.", livings.join(", ")));
        }

        let items: Vec<&str> = location
            .items
            .iter()
            .filter_map(|id| self.items.get(id))
            .map(|i| i.title.as_str())
            .collect();
        if !items.is_empty() {
            paragraphs.push(format!("You see: {}.", items.join(", ")));
        }

        let exits: Vec<&str> = location.exits.keys().map(|d| d.name()).collect();
        if !exits.is_empty() {
            paragraphs.push(format!("Exits: {}.", exits.join(", ")));
        }
        Ok(paragraphs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rooms() -> (World, LocationId, LocationId) {
        let mut world = World::new();
        let square = world.add_location("Market square", "A bustling square.");
        let alley = world.add_location("Dark alley", "Narrow and damp.");
        world
            .connect(square, Direction::North, alley, "a narrow opening")
            .unwrap();
        world
            .connect(alley, Direction::South, square, "back to the square")
            .unwrap();
        (world, square, alley)
    }

    #[test]
    fn vnums_are_assigned_per_category() {
        let mut world = World::new();
        let loc = world.add_location("A", "");
        let item = world.add_item("rock", ItemKind::Plain);
        // Limbo took location vnum 0.
        assert_eq!(loc, LocationId(1));
        assert_eq!(item, ItemId(0));
    }

    #[test]
    fn vnums_not_reused_after_removal() {
        let mut world = World::new();
        let loc = world.add_location("A", "");
        let rat = world
            .add_living("rat", Gender::Neutral, "rodent", loc)
            .unwrap();
        world.remove_living(rat).unwrap();
        let bat = world
            .add_living("bat", Gender::Neutral, "rodent", loc)
            .unwrap();
        assert!(bat.0 > rat.0);
    }

    #[test]
    fn connect_and_traverse() {
        let (world, square, alley) = two_rooms();
        let exit = world.exit(square, Direction::North).unwrap();
        assert_eq!(exit.target, alley);
        assert!(world.exit(square, Direction::East).is_err());
    }

    #[test]
    fn duplicate_exit_rejected() {
        let (mut world, square, alley) = two_rooms();
        let result = world.connect(square, Direction::North, alley, "again");
        assert!(matches!(result, Err(WorldError::DuplicateExit { .. })));
    }

    #[test]
    fn item_ownership_is_exclusive() {
        let (mut world, square, alley) = two_rooms();
        let coin = world.add_item("coin", ItemKind::Plain);
        world.move_item(coin, Container::InLocation(square)).unwrap();
        assert!(world.location(square).unwrap().items.contains(&coin));

        world.move_item(coin, Container::InLocation(alley)).unwrap();
        assert!(!world.location(square).unwrap().items.contains(&coin));
        assert!(world.location(alley).unwrap().items.contains(&coin));
        assert_eq!(
            world.item(coin).unwrap().contained_in,
            Some(Container::InLocation(alley))
        );
    }

    #[test]
    fn detach_is_idempotent() {
        let (mut world, square, _) = two_rooms();
        let coin = world.add_item("coin", ItemKind::Plain);
        world.move_item(coin, Container::InLocation(square)).unwrap();
        world.detach_item(coin).unwrap();
        world.detach_item(coin).unwrap();
        assert_eq!(world.item(coin).unwrap().contained_in, None);
        assert!(!world.location(square).unwrap().items.contains(&coin));
    }

    #[test]
    fn living_moves_between_locations() {
        let (mut world, square, alley) = two_rooms();
        let rat = world
            .add_living("rat", Gender::Neutral, "rodent", square)
            .unwrap();
        world.move_living(rat, alley).unwrap();
        assert!(!world.location(square).unwrap().livings.contains(&rat));
        assert!(world.location(alley).unwrap().livings.contains(&rat));
        assert_eq!(world.living(rat).unwrap().location, alley);
    }

    #[test]
    fn player_spawns_in_limbo() {
        let mut world = World::new();
        let player = world.add_player("julie", Gender::Female, "human");
        assert_eq!(world.living(player).unwrap().location, world.limbo());
        assert!(world.living(player).unwrap().is_player());
    }

    #[test]
    fn removed_living_drops_inventory() {
        let (mut world, square, _) = two_rooms();
        let rat = world
            .add_living("rat", Gender::Neutral, "rodent", square)
            .unwrap();
        let cheese = world.add_item("cheese", ItemKind::Plain);
        world.move_item(cheese, Container::Carried(rat)).unwrap();

        world.remove_living(rat).unwrap();
        assert!(world.location(square).unwrap().items.contains(&cheese));
        assert_eq!(
            world.item(cheese).unwrap().contained_in,
            Some(Container::InLocation(square))
        );
    }

    #[test]
    fn look_lists_contents_and_exits() {
        let (mut world, square, _) = two_rooms();
        let coin = world.add_item("coin", ItemKind::Plain);
        world.move_item(coin, Container::InLocation(square)).unwrap();
        world
            .add_living("rat", Gender::Neutral, "rodent", square)
            .unwrap();
        let player = world.add_player("julie", Gender::Female, "human");
        world.move_living(player, square).unwrap();

        let paragraphs = world.look(square, Some(player)).unwrap();
        let text = paragraphs.join("\n");
        assert!(text.contains("Market square"));
        assert!(text.contains("Rat"));
        assert!(!text.contains("Julie"));
        assert!(text.contains("a coin"));
        assert!(text.contains("north"));
    }
}
