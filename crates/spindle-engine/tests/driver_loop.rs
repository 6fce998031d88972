//! End-to-end tests of the driver loop in both tick modes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use spindle_engine::{
    CaptureIo, Driver, EngineError, EngineEventKind, EngineResult, RunOutcome, Session, Story,
    StoryConfig, StoryContext, TickMethod,
};
use spindle_world::{Container, Direction, Gender, ItemKind, LivingId};

/// A minimal story: two rooms, a coin, and a caretaker who mutters on a
/// schedule. Commands are just enough to drive the tests.
struct TinyStory {
    config: StoryConfig,
    mutter_count: Arc<AtomicU64>,
    schedule_mutter: bool,
}

impl TinyStory {
    fn new(config: StoryConfig) -> Self {
        Self {
            config,
            mutter_count: Arc::new(AtomicU64::new(0)),
            schedule_mutter: false,
        }
    }

    fn with_mutter(mut self) -> Self {
        self.schedule_mutter = true;
        self
    }

    fn mutter_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.mutter_count)
    }
}

impl Story for TinyStory {
    fn config(&self) -> StoryConfig {
        self.config.clone()
    }

    fn init(&mut self, ctx: &mut StoryContext<'_>) -> EngineResult<()> {
        let hall = ctx.world.add_location("Hall", "A dusty hall.");
        let study = ctx.world.add_location("Study", "Books everywhere.");
        ctx.world.connect(hall, Direction::North, study, "a doorway")?;
        ctx.world.connect(study, Direction::South, hall, "a doorway")?;

        let coin = ctx.world.add_item("coin", ItemKind::Plain);
        ctx.world.move_item(coin, Container::InLocation(hall))?;

        let caretaker = ctx
            .world
            .add_living("caretaker", Gender::Male, "human", hall)?;
        if self.schedule_mutter {
            ctx.scheduler
                .defer_periodic(ctx.clock.now(), caretaker, "mutter", 0.01, 0.01, ctx.rng);
        }
        Ok(())
    }

    fn init_player(&mut self, _ctx: &mut StoryContext<'_>, _player: LivingId) -> EngineResult<()> {
        Ok(())
    }

    fn welcome(&self, session: &mut Session) {
        session.print("Welcome to the Tiny House.");
    }

    fn process_command(
        &mut self,
        ctx: &mut StoryContext<'_>,
        player: LivingId,
        input: &str,
    ) -> EngineResult<()> {
        match input {
            "look" => {
                let here = ctx.world.living(player)?.location;
                let paragraphs = ctx.world.look(here, Some(player))?;
                ctx.session.print_all(paragraphs);
            }
            "take coin" => {
                let here = ctx.world.living(player)?.location;
                let items: Vec<_> = ctx.world.location(here)?.items.iter().copied().collect();
                match ctx.world.find_item_among(items, "coin").map(|i| i.id) {
                    Some(coin) => {
                        ctx.world.move_item(coin, Container::Carried(player))?;
                        ctx.session.print("You take the coin.");
                    }
                    None => ctx.session.print("There is no coin here."),
                }
            }
            "explode" => {
                return Err(EngineError::Config {
                    reason: "deliberate story bug".into(),
                });
            }
            "win" => ctx.complete(),
            "quit" => ctx.quit(),
            other => ctx.session.print(format!("I don't understand '{other}'.")),
        }
        Ok(())
    }

    fn run_deferred(
        &mut self,
        ctx: &mut StoryContext<'_>,
        _owner: LivingId,
        action: &str,
    ) -> EngineResult<()> {
        if action == "mutter" {
            self.mutter_count.fetch_add(1, Ordering::SeqCst);
            ctx.session.print("The caretaker mutters to himself.");
        }
        Ok(())
    }
}

fn command_config() -> StoryConfig {
    StoryConfig::new("Tiny House")
        .with_start_location("Hall")
        .with_savegames(false)
}

#[test]
fn command_mode_plays_a_session_to_quit() {
    let story = TinyStory::new(command_config());
    let capture = CaptureIo::new();
    let mut driver = Driver::new(Box::new(story), Box::new(capture.clone()));

    let input = driver.input_handle();
    for line in ["julie", "f", "", "look", "take coin", "quit"] {
        input.push(line);
    }

    let outcome = driver.run().unwrap();
    assert_eq!(outcome, RunOutcome::Quit);

    let transcript = capture.transcript();
    assert!(transcript.contains("Welcome to the Tiny House."));
    assert!(transcript.contains("Let's create your character."));
    assert!(transcript.contains("[Hall]"));
    assert!(transcript.contains("You take the coin."));
    assert!(transcript.contains("Goodbye"));
}

#[test]
fn command_mode_ticks_once_per_command() {
    let story = TinyStory::new(command_config());
    let capture = CaptureIo::new();
    let mut driver = Driver::new(Box::new(story), Box::new(capture));

    let input = driver.input_handle();
    for line in ["julie", "f", "", "look", "look", "look", "quit"] {
        input.push(line);
    }
    driver.run().unwrap();

    // Three looks and the quit command itself; quit ends the loop before
    // its tick.
    assert_eq!(driver.ticks(), 3);
    let commands = driver
        .events()
        .events()
        .iter()
        .filter(|e| matches!(e.kind, EngineEventKind::CommandProcessed { .. }))
        .count();
    assert_eq!(commands, 4);
}

#[test]
fn story_error_in_a_command_does_not_end_the_session() {
    let story = TinyStory::new(command_config());
    let capture = CaptureIo::new();
    let mut driver = Driver::new(Box::new(story), Box::new(capture.clone()));

    let input = driver.input_handle();
    for line in ["julie", "f", "", "explode", "take coin", "quit"] {
        input.push(line);
    }
    let outcome = driver.run().unwrap();
    assert_eq!(outcome, RunOutcome::Quit);

    let transcript = capture.transcript();
    assert!(transcript.contains("An internal error occurred"));
    // The commands queued after the failing one were still processed.
    assert!(transcript.contains("You take the coin."));
    assert!(transcript.contains("Goodbye"));
    assert!(driver.events().events().iter().any(|e| matches!(
        &e.kind,
        EngineEventKind::CommandFailed { input, .. } if input == "explode"
    )));
}

#[test]
fn invalid_dialog_answer_reasks_without_advancing() {
    let story = TinyStory::new(command_config());
    let capture = CaptureIo::new();
    let mut driver = Driver::new(Box::new(story), Box::new(capture.clone()));

    let input = driver.input_handle();
    // Two bad names, then a good one.
    for line in ["x!", "ab", "julie", "f", "", "quit"] {
        input.push(line);
    }
    let outcome = driver.run().unwrap();
    assert_eq!(outcome, RunOutcome::Quit);

    let transcript = capture.transcript();
    assert!(transcript.contains("Names are 3 to 20 letters"));
    assert!(transcript.contains("Welcome, julie."));
    // The name question was asked three times in total.
    let name_prompts = capture
        .prompts()
        .iter()
        .filter(|p| p.contains("What shall you be called"))
        .count();
    assert_eq!(name_prompts, 3);
}

#[test]
fn story_completion_ends_the_run() {
    let story = TinyStory::new(command_config());
    let capture = CaptureIo::new();
    let mut driver = Driver::new(Box::new(story), Box::new(capture.clone()));

    let input = driver.input_handle();
    // The final empty line acknowledges the completion message.
    for line in ["julie", "f", "", "win", ""] {
        input.push(line);
    }
    let outcome = driver.run().unwrap();
    assert_eq!(outcome, RunOutcome::Completed);
    assert!(capture.transcript().contains("Congratulations"));
    assert!(
        capture
            .prompts()
            .iter()
            .any(|p| p.contains("Press enter to continue"))
    );
}

#[test]
fn preset_player_skips_character_creation() {
    let config = command_config().with_player("merlin", Gender::Male, "wizard");
    let story = TinyStory::new(config);
    let capture = CaptureIo::new();
    let mut driver = Driver::new(Box::new(story), Box::new(capture.clone()));

    let input = driver.input_handle();
    input.push("look");
    input.push("quit");
    let outcome = driver.run().unwrap();
    assert_eq!(outcome, RunOutcome::Quit);

    let transcript = capture.transcript();
    assert!(!transcript.contains("Let's create your character."));
    assert!(transcript.contains("[Hall]"));
}

#[test]
fn disconnect_ends_the_run() {
    let story = TinyStory::new(command_config());
    let mut driver = Driver::new(Box::new(story), Box::new(CaptureIo::new()));

    let input = driver.input_handle();
    input.push("julie");
    input.push("f");
    input.push("");
    input.disconnect();

    let outcome = driver.run().unwrap();
    assert_eq!(outcome, RunOutcome::Quit);
}

#[test]
fn timer_mode_ticks_while_the_player_is_silent() {
    let config = StoryConfig::new("Tiny House")
        .with_start_location("Hall")
        .with_savegames(false)
        .with_ticks(TickMethod::Timer, 0.05)
        .with_gametime_rate(10);
    let story = TinyStory::new(config).with_mutter();
    let mutters = story.mutter_counter();

    let capture = CaptureIo::new();
    let mut driver = Driver::new(Box::new(story), Box::new(capture));
    let input = driver.input_handle();
    for line in ["julie", "f", ""] {
        input.push(line);
    }

    let worker = thread::spawn(move || {
        let outcome = driver.run().unwrap();
        (driver, outcome)
    });

    // Stay silent long enough for at least two 50ms ticks.
    thread::sleep(Duration::from_millis(200));
    input.push("quit");
    let (driver, outcome) = worker.join().unwrap();

    assert_eq!(outcome, RunOutcome::Quit);
    assert!(driver.ticks() >= 2, "expected >= 2 ticks, got {}", driver.ticks());
    // The periodic deferred fires every tick at this interval.
    assert!(mutters.load(Ordering::SeqCst) >= 2);
}
