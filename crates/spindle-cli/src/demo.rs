//! The bundled demo story: a small lockhouse by the sea.
//!
//! Four locations, one locked door, one wandering caretaker. Reaching the
//! lamp room completes the story. Deliberately small; it exists to show
//! every engine feature (ticks, deferreds, dialogs, saves) in play.

use spindle_engine::{EngineResult, Session, Story, StoryConfig, StoryContext, TickMethod};
use spindle_world::{
    Container, Direction, Door, Gender, ItemId, ItemKind, LivingId, LocationId, WorldError,
};

const BRASS_CODE: &str = "brass";
const WANDER_MIN_SECS: f64 = 20.0;
const WANDER_MAX_SECS: f64 = 45.0;

/// "The Lockhouse", the story shipped with the `spindle` binary.
pub struct LockhouseStory {
    timer_mode: bool,
    caretaker: Option<LivingId>,
    lamp_room: Option<LocationId>,
}

impl LockhouseStory {
    /// The demo story; `timer_mode` switches it from command-driven to
    /// real-time ticks.
    pub fn new(timer_mode: bool) -> Self {
        Self {
            timer_mode,
            caretaker: None,
            lamp_room: None,
        }
    }

    fn find_carried(
        ctx: &StoryContext<'_>,
        player: LivingId,
        name: &str,
    ) -> EngineResult<Option<ItemId>> {
        let inventory: Vec<ItemId> = ctx
            .world
            .living(player)?
            .inventory
            .iter()
            .copied()
            .collect();
        Ok(ctx.world.find_item_among(inventory, name).map(|i| i.id))
    }

    fn find_here(
        ctx: &StoryContext<'_>,
        player: LivingId,
        name: &str,
    ) -> EngineResult<Option<ItemId>> {
        let here = ctx.world.living(player)?.location;
        let items: Vec<ItemId> = ctx.world.location(here)?.items.iter().copied().collect();
        Ok(ctx.world.find_item_among(items, name).map(|i| i.id))
    }

    fn look_around(ctx: &mut StoryContext<'_>, player: LivingId) -> EngineResult<()> {
        let here = ctx.world.living(player)?.location;
        let paragraphs = ctx.world.look(here, Some(player))?;
        ctx.session.print_all(paragraphs);
        Ok(())
    }

    fn do_go(
        &self,
        ctx: &mut StoryContext<'_>,
        player: LivingId,
        direction: Direction,
    ) -> EngineResult<()> {
        let here = ctx.world.living(player)?.location;
        let exit = match ctx.world.exit(here, direction) {
            Ok(exit) => exit,
            Err(WorldError::NoExit { .. }) => {
                ctx.session.print(format!("You can't go {direction}."));
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        if !exit.passable() {
            ctx.session.print("The door is locked.");
            return Ok(());
        }
        let target = exit.target;
        ctx.world.move_living(player, target)?;
        ctx.world.living_mut(player)?.known_locations.insert(target);
        Self::look_around(ctx, player)?;

        if Some(target) == self.lamp_room {
            ctx.session
                .print("The great lamp flares to life above you, sweeping the bay.");
            ctx.complete();
        }
        Ok(())
    }

    fn do_take(ctx: &mut StoryContext<'_>, player: LivingId, name: &str) -> EngineResult<()> {
        match Self::find_here(ctx, player, name)? {
            Some(item) => {
                ctx.world.move_item(item, Container::Carried(player))?;
                let title = ctx.world.item(item)?.title.clone();
                ctx.session.print(format!("You take {title}."));
            }
            None => ctx.session.print(format!("There is no {name} here.")),
        }
        Ok(())
    }

    fn do_drop(ctx: &mut StoryContext<'_>, player: LivingId, name: &str) -> EngineResult<()> {
        match Self::find_carried(ctx, player, name)? {
            Some(item) => {
                let here = ctx.world.living(player)?.location;
                ctx.world.move_item(item, Container::InLocation(here))?;
                let title = ctx.world.item(item)?.title.clone();
                ctx.session.print(format!("You drop {title}."));
            }
            None => ctx.session.print(format!("You aren't carrying a {name}.")),
        }
        Ok(())
    }

    fn do_examine(ctx: &mut StoryContext<'_>, player: LivingId, name: &str) -> EngineResult<()> {
        let item = match Self::find_carried(ctx, player, name)? {
            Some(item) => Some(item),
            None => Self::find_here(ctx, player, name)?,
        };
        match item {
            Some(item) => {
                let item = ctx.world.item(item)?;
                let text = if item.description.is_empty() {
                    format!("You see nothing special about {}.", item.title)
                } else {
                    item.description.clone()
                };
                ctx.session.print(text);
            }
            None => ctx.session.print(format!("You see no {name} here.")),
        }
        Ok(())
    }

    fn do_read(ctx: &mut StoryContext<'_>, player: LivingId, name: &str) -> EngineResult<()> {
        let item = match Self::find_carried(ctx, player, name)? {
            Some(item) => Some(item),
            None => Self::find_here(ctx, player, name)?,
        };
        match item {
            Some(item) => {
                let item = ctx.world.item(item)?;
                if item.kind == ItemKind::Note {
                    ctx.session.print(format!("It reads: {}", item.description));
                } else {
                    ctx.session
                        .print(format!("There is nothing to read on {}.", item.title));
                }
            }
            None => ctx.session.print(format!("You see no {name} here.")),
        }
        Ok(())
    }

    fn do_unlock(
        ctx: &mut StoryContext<'_>,
        player: LivingId,
        direction: Direction,
    ) -> EngineResult<()> {
        let here = ctx.world.living(player)?.location;
        let key_code = match ctx.world.exit(here, direction) {
            Ok(exit) => match &exit.door {
                Some(door) if door.locked => door.key_code.clone(),
                Some(_) => {
                    ctx.session.print("That door isn't locked.");
                    return Ok(());
                }
                None => {
                    ctx.session.print("There is no door there.");
                    return Ok(());
                }
            },
            Err(_) => {
                ctx.session.print("There is no door there.");
                return Ok(());
            }
        };

        let inventory: Vec<ItemId> = ctx
            .world
            .living(player)?
            .inventory
            .iter()
            .copied()
            .collect();
        let has_key = inventory.iter().any(|id| {
            ctx.world
                .item(*id)
                .map(|i| i.kind == ItemKind::Key && i.key_code == key_code)
                .unwrap_or(false)
        });
        if !has_key {
            ctx.session.print("You don't have the right key.");
            return Ok(());
        }

        let exit = ctx.world.exit_mut(here, direction)?;
        if let Some(door) = &mut exit.door {
            door.locked = false;
            door.opened = true;
        }
        ctx.session
            .print("The key turns with a satisfying clunk. The door swings open.");
        Ok(())
    }

    fn do_inventory(ctx: &mut StoryContext<'_>, player: LivingId) -> EngineResult<()> {
        let titles: Vec<String> = ctx
            .world
            .living(player)?
            .inventory
            .iter()
            .filter_map(|id| ctx.world.item(*id).ok())
            .map(|i| i.title.clone())
            .collect();
        if titles.is_empty() {
            ctx.session.print("You are carrying nothing.");
        } else {
            ctx.session
                .print(format!("You are carrying: {}.", titles.join(", ")));
        }
        Ok(())
    }

    fn do_help(ctx: &mut StoryContext<'_>) {
        ctx.session.print(
            "Commands: look, go <direction> (or just n/s/e/w...), take <item>, \
             drop <item>, examine <item>, read <item>, unlock <direction>, \
             inventory, time, save, quit.",
        );
    }

    fn wander(&self, ctx: &mut StoryContext<'_>, caretaker: LivingId) -> EngineResult<()> {
        use rand::Rng;

        let here = ctx.world.living(caretaker)?.location;
        let passable: Vec<(Direction, LocationId)> = ctx
            .world
            .location(here)?
            .exits
            .iter()
            .filter(|(_, exit)| exit.passable())
            .map(|(dir, exit)| (*dir, exit.target))
            .collect();
        if passable.is_empty() {
            return Ok(());
        }
        let (direction, target) = passable[ctx.rng.random_range(0..passable.len())];

        let player_location = ctx
            .world
            .livings()
            .find(|l| l.is_player())
            .map(|l| l.location);
        let title = ctx.world.living(caretaker)?.title.clone();
        if player_location == Some(here) {
            ctx.session
                .print(format!("{title} shuffles off to the {direction}."));
        }
        ctx.world.move_living(caretaker, target)?;
        if player_location == Some(target) {
            ctx.session.print(format!("{title} shuffles in."));
        }
        Ok(())
    }
}

impl Story for LockhouseStory {
    fn config(&self) -> StoryConfig {
        let config = StoryConfig::new("The Lockhouse")
            .with_author("the Spindle authors")
            .with_version("1.2")
            .with_start_location("Gatehouse")
            .with_display_gametime(true);
        if self.timer_mode {
            config
                .with_ticks(TickMethod::Timer, 1.0)
                .with_gametime_rate(60)
        } else {
            config
        }
    }

    fn init(&mut self, ctx: &mut StoryContext<'_>) -> EngineResult<()> {
        let world = &mut *ctx.world;
        let gatehouse = world.add_location(
            "Gatehouse",
            "A cramped stone gatehouse. Salt wind whistles through the arrow slits.",
        );
        let courtyard = world.add_location(
            "Courtyard",
            "A walled courtyard slick with spray. The lighthouse tower rises to the north.",
        );
        let storeroom = world.add_location(
            "Storeroom",
            "Coils of rope, barrels of lamp oil, and a workbench buried in tools.",
        );
        let lamp_room = world.add_location(
            "Lamp Room",
            "The top of the tower. An enormous unlit lamp dominates the room.",
        );

        world.connect(gatehouse, Direction::East, courtyard, "the courtyard gate")?;
        world.connect(courtyard, Direction::West, gatehouse, "the courtyard gate")?;
        world.connect(courtyard, Direction::East, storeroom, "a low doorway")?;
        world.connect(storeroom, Direction::West, courtyard, "a low doorway")?;
        world.connect_with_door(
            courtyard,
            Direction::North,
            lamp_room,
            "the tower door",
            Door::locked_with_key(BRASS_CODE),
        )?;
        world.connect(lamp_room, Direction::South, courtyard, "the tower stairs")?;

        let key = world.add_item("key", ItemKind::Key);
        {
            let key = world.item_mut(key)?;
            key.title = "a brass key".into();
            key.description = "A heavy brass key, green with verdigris.".into();
            key.key_code = Some(BRASS_CODE.into());
        }
        world.move_item(key, Container::InLocation(storeroom))?;

        let note = world.add_item("note", ItemKind::Note);
        {
            let note = world.item_mut(note)?;
            note.title = "a weathered note".into();
            note.description =
                "\"Gone to town. Lamp key is on the workbench. Light it before dusk! -- W.\""
                    .into();
        }
        world.move_item(note, Container::InLocation(gatehouse))?;

        let caretaker = world.add_living("caretaker", Gender::Male, "human", courtyard)?;
        {
            let caretaker = world.living_mut(caretaker)?;
            caretaker.title = "The old caretaker".into();
            caretaker.description = "He mutters constantly about the weather.".into();
        }

        ctx.scheduler.defer_periodic(
            ctx.clock.now(),
            caretaker,
            "wander",
            WANDER_MIN_SECS,
            WANDER_MAX_SECS,
            ctx.rng,
        );

        self.caretaker = Some(caretaker);
        self.lamp_room = Some(lamp_room);
        Ok(())
    }

    fn init_player(&mut self, _ctx: &mut StoryContext<'_>, _player: LivingId) -> EngineResult<()> {
        Ok(())
    }

    fn welcome(&self, session: &mut Session) {
        session.print("The Lockhouse");
        session.print(
            "The ferry dropped you at the lighthouse jetty an hour ago and the keeper \
             is nowhere to be found. Dusk is coming. Someone has to light the lamp.",
        );
        session.print("(Type 'help' for a list of commands.)");
    }

    fn welcome_savegame(&self, session: &mut Session) {
        session.print("The wind still howls around the lockhouse. Your game has been restored.");
    }

    fn goodbye(&self, session: &mut Session) {
        session.print("You row back toward the mainland. Goodbye.");
    }

    fn completion(&self, session: &mut Session) {
        session.print("The lamp is lit and the ships are safe. Congratulations, keeper.");
    }

    fn process_command(
        &mut self,
        ctx: &mut StoryContext<'_>,
        player: LivingId,
        input: &str,
    ) -> EngineResult<()> {
        let lower = input.to_lowercase();
        let mut words = lower.split_whitespace();
        let verb = words.next().unwrap_or("");
        let rest = words.collect::<Vec<_>>().join(" ");

        // A bare direction works as a movement command.
        if let Some(direction) = Direction::parse(verb) {
            return self.do_go(ctx, player, direction);
        }

        match verb {
            "look" | "l" => Self::look_around(ctx, player)?,
            "go" => match Direction::parse(&rest) {
                Some(direction) => self.do_go(ctx, player, direction)?,
                None => ctx.session.print("Go where?"),
            },
            "take" | "get" => {
                if rest.is_empty() {
                    ctx.session.print("Take what?");
                } else {
                    Self::do_take(ctx, player, &rest)?;
                }
            }
            "drop" => {
                if rest.is_empty() {
                    ctx.session.print("Drop what?");
                } else {
                    Self::do_drop(ctx, player, &rest)?;
                }
            }
            "examine" | "x" => {
                if rest.is_empty() {
                    ctx.session.print("Examine what?");
                } else {
                    Self::do_examine(ctx, player, &rest)?;
                }
            }
            "read" => {
                if rest.is_empty() {
                    ctx.session.print("Read what?");
                } else {
                    Self::do_read(ctx, player, &rest)?;
                }
            }
            "unlock" => match Direction::parse(&rest) {
                Some(direction) => Self::do_unlock(ctx, player, direction)?,
                None => ctx.session.print("Unlock which direction?"),
            },
            "inventory" | "i" => Self::do_inventory(ctx, player)?,
            "time" => {
                if ctx.config.display_gametime {
                    ctx.session
                        .print(format!("It is {}.", ctx.clock.display()));
                } else {
                    ctx.session.print("You have no way to tell the time.");
                }
            }
            "save" => ctx.save_game(),
            "help" => Self::do_help(ctx),
            "quit" => ctx.quit(),
            _ => ctx
                .session
                .print(format!("I don't understand '{input}'. Try 'help'.")),
        }
        Ok(())
    }

    fn run_deferred(
        &mut self,
        ctx: &mut StoryContext<'_>,
        owner: LivingId,
        action: &str,
    ) -> EngineResult<()> {
        match action {
            "wander" if Some(owner) == self.caretaker => self.wander(ctx, owner),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_engine::{CaptureIo, Driver, RunOutcome};

    fn play(inputs: &[&str]) -> (CaptureIo, RunOutcome) {
        let capture = CaptureIo::new();
        let mut driver = Driver::new(
            Box::new(LockhouseStory::new(false)),
            Box::new(capture.clone()),
        )
        .with_seed(11);
        let input = driver.input_handle();
        for line in inputs {
            input.push(*line);
        }
        let outcome = driver.run().unwrap();
        (capture, outcome)
    }

    #[test]
    fn locked_door_blocks_until_unlocked() {
        let (capture, outcome) = play(&[
            "keeper", "m", "", "east", "north", "east", "take key", "west", "unlock north",
            "north", "",
        ]);
        assert_eq!(outcome, RunOutcome::Completed);
        let transcript = capture.transcript();
        assert!(transcript.contains("The door is locked."));
        assert!(transcript.contains("The door swings open."));
        assert!(transcript.contains("Congratulations, keeper."));
    }

    #[test]
    fn unlock_without_key_fails() {
        let (capture, _) = play(&["keeper", "m", "", "east", "unlock north", "quit"]);
        assert!(
            capture
                .transcript()
                .contains("You don't have the right key.")
        );
    }

    #[test]
    fn note_gives_the_hint() {
        let (capture, _) = play(&["keeper", "m", "", "read note", "quit"]);
        assert!(capture.transcript().contains("Lamp key is on the workbench"));
    }

    #[test]
    fn unknown_command_suggests_help() {
        let (capture, _) = play(&["keeper", "m", "", "dance", "quit"]);
        assert!(capture.transcript().contains("I don't understand 'dance'"));
    }
}
