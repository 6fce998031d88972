//! Runtime core of the Spindle interactive-fiction engine.
//!
//! One [`Driver`] owns everything a running game needs: the world graph,
//! the game clock, the deferred-action scheduler, the player's session,
//! and the [`Story`] being played. The driver runs a single main loop
//! that multiplexes player input, suspendable dialogs (login, character
//! creation), and server ticks; stories never see a thread.
//!
//! Persistence is reference-based: a savegame carries only dynamic state
//! plus `(vnum, name, type)` references, and is resolved on load against
//! the static world the story rebuilds from scratch.

/// Character creation conversation.
pub mod charbuilder;
/// The in-game clock.
pub mod clock;
/// Story configuration.
pub mod config;
/// Suspendable dialogs and answer validation.
pub mod dialog;
/// The driver and its main loop.
pub mod driver;
/// Engine error types.
pub mod error;
/// The engine event log.
pub mod event;
/// Output adapters.
pub mod io;
/// Savegame capture, encoding, and restoration.
pub mod savegame;
/// The deferred-action scheduler.
pub mod scheduler;
/// The player session: input queue and buffered output.
pub mod session;
/// The story trait and its callback context.
pub mod story;

pub use charbuilder::{CharacterBuilder, PlayerNaming};
pub use clock::{ClockState, GameClock};
pub use config::{PresetPlayer, StoryConfig, TickMethod};
pub use dialog::{Dialog, DialogOutcome, DialogStep, LoginDialog, ValidationError, Validator};
pub use driver::{Driver, RunOutcome};
pub use error::{EngineError, EngineResult};
pub use event::{EngineEvent, EngineEventKind, EventLog};
pub use io::{CaptureIo, IoAdapter};
pub use savegame::{
    ObjRef, Resolver, RestoreReport, SavedGame, WorldResolver, capture, decode, encode,
    read_savegame, restore, write_savegame,
};
pub use scheduler::{Deferred, Scheduler};
pub use session::{InputHandle, InputWait, Session};
pub use story::{Story, StoryAction, StoryContext};
