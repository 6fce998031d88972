use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;

use spindle_world::{LivingId, World};

use crate::charbuilder::{CharacterBuilder, PlayerNaming};
use crate::clock::GameClock;
use crate::config::{StoryConfig, TickMethod};
use crate::dialog::{Dialog, DialogOutcome, DialogStep, LoginDialog, Validator};
use crate::error::{EngineError, EngineResult};
use crate::event::{EngineEventKind, EventLog};
use crate::io::IoAdapter;
use crate::savegame::{self, WorldResolver};
use crate::scheduler::Scheduler;
use crate::session::{InputHandle, InputWait, Session};
use crate::story::{Story, StoryAction, StoryContext};

/// Floor on how long the loop sleeps waiting for input in timer mode,
/// so a tiny tick interval cannot spin the thread.
const MIN_WAIT: Duration = Duration::from_millis(10);

/// The prompt shown during regular play.
const PLAY_PROMPT: &str = "> ";

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The player quit, or the input side disconnected.
    Quit,
    /// The story was played to completion.
    Completed,
}

struct ActiveDialog {
    dialog: Box<dyn Dialog>,
    prompt: String,
    validator: Validator,
}

/// The engine driver.
///
/// Owns the world, the clock, the scheduler, the player's session, and
/// the story, and runs the single main loop that multiplexes player
/// input, suspendable dialogs, and server ticks. Typically run on its own
/// thread while the process's main thread feeds the [`InputHandle`].
pub struct Driver {
    story: Box<dyn Story>,
    config: StoryConfig,
    world: World,
    session: Session,
    scheduler: Scheduler,
    clock: GameClock,
    events: EventLog,
    io: Box<dyn IoAdapter>,
    rng: StdRng,
    save_path: Option<PathBuf>,
    player: Option<LivingId>,
    dialog: Option<ActiveDialog>,
    actions: Vec<StoryAction>,
    tick: u64,
    last_tick: Instant,
    outcome: Option<RunOutcome>,
}

impl Driver {
    /// A driver for the given story, writing output through `io`.
    pub fn new(story: Box<dyn Story>, io: Box<dyn IoAdapter>) -> Self {
        let config = story.config();
        let epoch = config.epoch.unwrap_or_else(Utc::now);
        let clock = GameClock::new(epoch, config.effective_gametime_rate());
        let seed = config
            .seed
            .unwrap_or_else(|| Utc::now().timestamp_millis() as u64);
        Self {
            story,
            config,
            world: World::new(),
            session: Session::new(),
            scheduler: Scheduler::new(),
            clock,
            events: EventLog::new(1000),
            io,
            rng: StdRng::seed_from_u64(seed),
            save_path: None,
            player: None,
            dialog: None,
            actions: Vec::new(),
            tick: 0,
            last_tick: Instant::now(),
            outcome: None,
        }
    }

    /// Enable savegames at the given path. Without one, saving and
    /// restoring are unavailable even if the story allows them.
    pub fn with_save_path(mut self, path: PathBuf) -> Self {
        self.save_path = Some(path);
        self
    }

    /// Seed the driver's random number generator, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// A handle for the thread that produces player input.
    pub fn input_handle(&self) -> InputHandle {
        self.session.input_handle()
    }

    /// The engine event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The number of server ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// The game clock.
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// The world graph.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Run the game to its end.
    ///
    /// Builds the static world, runs the login sequence (offering a
    /// restore when a save exists), then loops until the player quits,
    /// the story completes, or the input side disconnects. A savegame in
    /// an unreadable format is the one fatal login error; a save that
    /// merely fails to resolve falls back to a new game.
    pub fn run(&mut self) -> EngineResult<RunOutcome> {
        let mut ctx = StoryContext::new(
            &mut self.world,
            &mut self.session,
            &mut self.scheduler,
            &self.clock,
            &self.config,
            &mut self.events,
            &mut self.rng,
            &mut self.actions,
        );
        self.story.init(&mut ctx)?;
        self.drain_actions()?;

        self.story.welcome(&mut self.session);
        if self.save_available() {
            self.start_dialog(Box::new(LoginDialog))?;
        } else {
            self.begin_new_game()?;
        }
        self.session.flush(self.io.as_mut());
        self.last_tick = Instant::now();

        loop {
            if let Some(outcome) = self.outcome {
                self.session.flush(self.io.as_mut());
                return Ok(outcome);
            }

            match self.session.wait_input(self.wait_timeout()) {
                InputWait::Ready(line) => self.handle_line(&line)?,
                InputWait::TimedOut => {}
                InputWait::Disconnected => {
                    self.story.goodbye(&mut self.session);
                    self.outcome = Some(RunOutcome::Quit);
                }
            }

            if self.config.tick_method == TickMethod::Timer
                && self.last_tick.elapsed() >= self.tick_interval()
            {
                self.server_tick()?;
            }

            self.session.flush(self.io.as_mut());
        }
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.config.tick_interval_secs.max(0.001))
    }

    fn wait_timeout(&self) -> Option<Duration> {
        match self.config.tick_method {
            // Nothing happens between commands; block until one arrives.
            TickMethod::Command => None,
            TickMethod::Timer => {
                let remaining = self
                    .tick_interval()
                    .saturating_sub(self.last_tick.elapsed());
                Some(remaining.max(MIN_WAIT))
            }
        }
    }

    fn save_available(&self) -> bool {
        self.config.savegames_enabled
            && self
                .save_path
                .as_deref()
                .is_some_and(|path| path.is_file())
    }

    fn handle_line(&mut self, line: &str) -> EngineResult<()> {
        if self.dialog.is_some() {
            self.handle_dialog_line(line)
        } else if let Some(player) = self.player {
            self.handle_command(player, line)
        } else {
            Ok(())
        }
    }

    fn handle_command(&mut self, player: LivingId, line: &str) -> EngineResult<()> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.session.request_prompt(PLAY_PROMPT);
            return Ok(());
        }

        let turns = {
            let living = self.world.living_mut(player)?;
            living.turns += 1;
            living.turns
        };
        self.events.push(
            self.tick,
            EngineEventKind::CommandProcessed {
                turn: turns,
                input: trimmed.to_string(),
            },
        );

        let mut ctx = StoryContext::new(
            &mut self.world,
            &mut self.session,
            &mut self.scheduler,
            &self.clock,
            &self.config,
            &mut self.events,
            &mut self.rng,
            &mut self.actions,
        );
        // A command that errors is reported and contained; the session
        // keeps going.
        if let Err(err) = self.story.process_command(&mut ctx, player, trimmed) {
            self.session
                .print("An internal error occurred. Please report this.");
            self.events.push(
                self.tick,
                EngineEventKind::CommandFailed {
                    input: trimmed.to_string(),
                    reason: err.to_string(),
                },
            );
        }
        self.drain_actions()?;

        // In command mode the world only moves when the player does.
        if self.config.tick_method == TickMethod::Command && self.outcome.is_none() {
            self.server_tick()?;
        }

        if self.dialog.is_none() && self.outcome.is_none() {
            self.session.request_prompt(PLAY_PROMPT);
        }
        Ok(())
    }

    fn handle_dialog_line(&mut self, line: &str) -> EngineResult<()> {
        let Some(active) = self.dialog.take() else {
            return Ok(());
        };
        match active.validator.check(line) {
            Err(rejection) => {
                // Ask the same question again; the dialog does not advance.
                self.session.print(rejection.to_string());
                self.session.request_prompt(active.prompt.clone());
                self.dialog = Some(active);
                Ok(())
            }
            Ok(answer) => {
                let mut dialog = active.dialog;
                let step = dialog.resume(&mut self.session, &answer);
                self.apply_step(dialog, step)
            }
        }
    }

    fn start_dialog(&mut self, mut dialog: Box<dyn Dialog>) -> EngineResult<()> {
        self.events.push(
            self.tick,
            EngineEventKind::DialogStarted {
                name: dialog.name().to_string(),
            },
        );
        let step = dialog.begin(&mut self.session);
        self.apply_step(dialog, step)
    }

    fn apply_step(&mut self, dialog: Box<dyn Dialog>, step: DialogStep) -> EngineResult<()> {
        match step {
            DialogStep::Await { prompt, validator } => {
                self.session.request_prompt(prompt.clone());
                self.dialog = Some(ActiveDialog {
                    dialog,
                    prompt,
                    validator,
                });
                Ok(())
            }
            DialogStep::Done(outcome) => {
                self.events.push(
                    self.tick,
                    EngineEventKind::DialogCompleted {
                        name: dialog.name().to_string(),
                    },
                );
                self.handle_outcome(outcome)
            }
        }
    }

    fn handle_outcome(&mut self, outcome: DialogOutcome) -> EngineResult<()> {
        match outcome {
            DialogOutcome::LoadSavedGame => match self.load_savegame() {
                Ok(()) => Ok(()),
                Err(err @ EngineError::SaveFormat { .. }) => Err(err),
                Err(err) => {
                    self.session.print(format!(
                        "The saved game could not be restored ({err}). Starting a new game instead."
                    ));
                    self.begin_new_game()
                }
            },
            DialogOutcome::StartNewGame => self.begin_new_game(),
            DialogOutcome::Character(naming) => self.create_player(naming),
        }
    }

    /// Start a fresh game: either apply the config's pre-made character or
    /// run the interactive character creation dialog.
    fn begin_new_game(&mut self) -> EngineResult<()> {
        match self.config.player.clone() {
            Some(preset) => self.create_player(PlayerNaming {
                name: preset.name,
                gender: preset.gender,
                race: preset.race,
                wizard: false,
            }),
            None => self.start_dialog(Box::new(CharacterBuilder::new("human", false))),
        }
    }

    fn create_player(&mut self, naming: PlayerNaming) -> EngineResult<()> {
        let player = self
            .world
            .add_player(naming.name.clone(), naming.gender, naming.race.clone());
        if naming.wizard {
            self.world
                .living_mut(player)?
                .privileges
                .insert("wizard".to_string());
        }

        let mut ctx = StoryContext::new(
            &mut self.world,
            &mut self.session,
            &mut self.scheduler,
            &self.clock,
            &self.config,
            &mut self.events,
            &mut self.rng,
            &mut self.actions,
        );
        self.story.init_player(&mut ctx, player)?;
        self.drain_actions()?;

        let start = self
            .world
            .find_location_by_name(&self.config.start_location)
            .map(|l| l.id)
            .ok_or_else(|| EngineError::Config {
                reason: format!("unknown start location '{}'", self.config.start_location),
            })?;
        self.world.move_living(player, start)?;
        self.world.living_mut(player)?.known_locations.insert(start);
        self.player = Some(player);

        let paragraphs = self.world.look(start, Some(player))?;
        self.session.print_all(paragraphs);
        self.session.request_prompt(PLAY_PROMPT);
        Ok(())
    }

    fn load_savegame(&mut self) -> EngineResult<()> {
        let path = self.save_path.clone().ok_or_else(|| EngineError::Config {
            reason: "no savegame path configured".into(),
        })?;
        let save = savegame::read_savegame(&path)?;

        if save.story != self.config.name {
            return Err(EngineError::SaveInconsistent {
                reason: format!("save belongs to story '{}'", save.story),
            });
        }
        if save.story_version != self.config.version {
            self.session.print(format!(
                "Note: this save was written by story version {}, you are playing version {}.",
                save.story_version, self.config.version
            ));
            self.events.push(
                self.tick,
                EngineEventKind::VersionMismatch {
                    saved: save.story_version.clone(),
                    current: self.config.version.clone(),
                },
            );
        }

        let report = savegame::restore(&mut self.world, &save, &WorldResolver)?;
        self.clock.restore(save.clock);
        for action in &report.dropped_actions {
            self.events.push(
                self.tick,
                EngineEventKind::DeferredDropped {
                    action: action.clone(),
                },
            );
        }
        for warning in &report.warnings {
            self.session.print(format!("Note: {warning}."));
        }
        self.scheduler.restore(report.deferreds);
        self.player = Some(report.player);
        self.events.push(
            self.tick,
            EngineEventKind::SavegameLoaded {
                version: save.story_version.clone(),
            },
        );

        self.story.welcome_savegame(&mut self.session);
        let location = self.world.living(report.player)?.location;
        let paragraphs = self.world.look(location, Some(report.player))?;
        self.session.print_all(paragraphs);
        self.session.request_prompt(PLAY_PROMPT);
        Ok(())
    }

    fn server_tick(&mut self) -> EngineResult<()> {
        self.tick += 1;
        self.clock
            .add_realtime(Duration::from_secs_f64(self.config.tick_interval_secs));

        let fired = self.scheduler.advance(self.clock.now(), &mut self.rng);
        for deferred in fired {
            let mut ctx = StoryContext::new(
                &mut self.world,
                &mut self.session,
                &mut self.scheduler,
                &self.clock,
                &self.config,
                &mut self.events,
                &mut self.rng,
                &mut self.actions,
            );
            // An action that errors is logged and skipped; the world
            // keeps turning.
            match self
                .story
                .run_deferred(&mut ctx, deferred.owner, &deferred.action)
            {
                Ok(()) => self.events.push(
                    self.tick,
                    EngineEventKind::DeferredFired {
                        owner: deferred.owner,
                        action: deferred.action.clone(),
                    },
                ),
                Err(err) => self.events.push(
                    self.tick,
                    EngineEventKind::DeferredFailed {
                        owner: deferred.owner,
                        action: deferred.action.clone(),
                        reason: err.to_string(),
                    },
                ),
            }
            self.drain_actions()?;
        }

        self.events.push(self.tick, EngineEventKind::TickCompleted);
        self.last_tick = Instant::now();
        Ok(())
    }

    fn drain_actions(&mut self) -> EngineResult<()> {
        for action in std::mem::take(&mut self.actions) {
            match action {
                StoryAction::StartDialog(dialog) => self.start_dialog(dialog)?,
                StoryAction::SaveGame => self.write_savegame()?,
                StoryAction::Quit => {
                    self.story.goodbye(&mut self.session);
                    self.outcome = Some(RunOutcome::Quit);
                }
                StoryAction::Complete => {
                    self.story.completion(&mut self.session);
                    self.events.push(self.tick, EngineEventKind::StoryCompleted);
                    // A dedicated blocking read, so the final text is seen
                    // before the program goes away.
                    self.session.request_prompt("Press enter to continue. ");
                    self.session.flush(self.io.as_mut());
                    let _ = self.session.wait_input(None);
                    self.outcome = Some(RunOutcome::Completed);
                }
            }
        }
        Ok(())
    }

    fn write_savegame(&mut self) -> EngineResult<()> {
        let (Some(path), Some(player)) = (self.save_path.clone(), self.player) else {
            self.session.print("Saving is not available.");
            return Ok(());
        };
        if !self.config.savegames_enabled {
            self.session.print("This story does not allow saving.");
            return Ok(());
        }
        let save = savegame::capture(
            &self.world,
            player,
            self.clock.state(),
            &self.scheduler,
            &self.config,
        )?;
        savegame::write_savegame(&path, &save)?;
        self.events.push(self.tick, EngineEventKind::SavegameWritten);
        self.session.print("Game saved.");
        Ok(())
    }
}
