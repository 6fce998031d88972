use rand::rngs::StdRng;
use spindle_world::{LivingId, World};

use crate::clock::GameClock;
use crate::config::StoryConfig;
use crate::dialog::Dialog;
use crate::error::EngineResult;
use crate::event::EventLog;
use crate::scheduler::Scheduler;
use crate::session::Session;

/// Something a story asks the driver to do after the current callback
/// returns. Requests are queued on the context and drained by the driver;
/// a story never performs them itself.
pub enum StoryAction {
    /// Hand the input stream to a dialog.
    StartDialog(Box<dyn Dialog>),
    /// Write a savegame.
    SaveGame,
    /// End the session at the player's request.
    Quit,
    /// The story has been completed.
    Complete,
}

/// Everything a story callback may touch, borrowed for the duration of
/// the call.
pub struct StoryContext<'a> {
    /// The world graph.
    pub world: &'a mut World,
    /// The player's session, for output.
    pub session: &'a mut Session,
    /// The deferred-action scheduler.
    pub scheduler: &'a mut Scheduler,
    /// The game clock (read-only; only the driver advances it).
    pub clock: &'a GameClock,
    /// The story configuration.
    pub config: &'a StoryConfig,
    /// The engine event log.
    pub events: &'a mut EventLog,
    /// The driver's random number generator, shared so seeded runs stay
    /// reproducible.
    pub rng: &'a mut StdRng,
    actions: &'a mut Vec<StoryAction>,
}

impl<'a> StoryContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        world: &'a mut World,
        session: &'a mut Session,
        scheduler: &'a mut Scheduler,
        clock: &'a GameClock,
        config: &'a StoryConfig,
        events: &'a mut EventLog,
        rng: &'a mut StdRng,
        actions: &'a mut Vec<StoryAction>,
    ) -> Self {
        Self {
            world,
            session,
            scheduler,
            clock,
            config,
            events,
            rng,
            actions,
        }
    }

    /// Queue a request for the driver.
    pub fn request(&mut self, action: StoryAction) {
        self.actions.push(action);
    }

    /// Ask the driver to start a dialog once this callback returns.
    pub fn start_dialog(&mut self, dialog: Box<dyn Dialog>) {
        self.request(StoryAction::StartDialog(dialog));
    }

    /// Ask the driver to write a savegame.
    pub fn save_game(&mut self) {
        self.request(StoryAction::SaveGame);
    }

    /// Ask the driver to end the session.
    pub fn quit(&mut self) {
        self.request(StoryAction::Quit);
    }

    /// Tell the driver the story has been completed.
    pub fn complete(&mut self) {
        self.request(StoryAction::Complete);
    }
}

/// A story: the content the engine drives.
///
/// The driver owns the loop, clock, and scheduler; the story builds the
/// world, reacts to commands, and runs deferred actions by name.
pub trait Story: Send {
    /// The story's static configuration. Called once at startup.
    fn config(&self) -> StoryConfig;

    /// Build the static world: locations, exits, items, NPCs. Runs before
    /// login, for both new games and restores; a savegame is resolved
    /// against exactly this world.
    fn init(&mut self, ctx: &mut StoryContext<'_>) -> EngineResult<()>;

    /// A new player was created (not called on restore). Equip and place
    /// story-specific state here.
    fn init_player(&mut self, ctx: &mut StoryContext<'_>, player: LivingId) -> EngineResult<()>;

    /// Banner text for a fresh game.
    fn welcome(&self, session: &mut Session) {
        session.print("Welcome.");
    }

    /// Banner text after a successful restore.
    fn welcome_savegame(&self, session: &mut Session) {
        session.print("Welcome back. Your game has been restored.");
    }

    /// Farewell text when the player quits.
    fn goodbye(&self, session: &mut Session) {
        session.print("Goodbye, we hope you enjoyed playing.");
    }

    /// Text shown when the story is completed.
    fn completion(&self, session: &mut Session) {
        session.print("Congratulations! You beat the game!");
    }

    /// Handle one player command. Runs only while no dialog is active.
    fn process_command(
        &mut self,
        ctx: &mut StoryContext<'_>,
        player: LivingId,
        input: &str,
    ) -> EngineResult<()>;

    /// Run a deferred action that came due. An error here is logged and
    /// contained; the loop carries on.
    fn run_deferred(
        &mut self,
        ctx: &mut StoryContext<'_>,
        owner: LivingId,
        action: &str,
    ) -> EngineResult<()>;
}
