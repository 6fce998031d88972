use spindle_world::LivingId;

/// What kind of engine event occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEventKind {
    /// A player command was handed to the story.
    CommandProcessed {
        /// The player's turn counter after this command.
        turn: u64,
        /// The raw input line.
        input: String,
    },
    /// A command handler returned an error; the loop carried on.
    CommandFailed {
        /// The raw input line.
        input: String,
        /// The error text.
        reason: String,
    },
    /// A server tick ran to completion.
    TickCompleted,
    /// A scheduled action came due and was dispatched.
    DeferredFired {
        /// The living the action belongs to.
        owner: LivingId,
        /// The action name dispatched to the story.
        action: String,
    },
    /// A dispatched action returned an error; the loop carried on.
    DeferredFailed {
        /// The living the action belongs to.
        owner: LivingId,
        /// The action name that failed.
        action: String,
        /// The error text.
        reason: String,
    },
    /// A persisted action could not be re-attached on load and was dropped.
    DeferredDropped {
        /// The action name that was dropped.
        action: String,
    },
    /// A dialog took over the input stream.
    DialogStarted {
        /// The dialog's name.
        name: String,
    },
    /// A dialog finished and released the input stream.
    DialogCompleted {
        /// The dialog's name.
        name: String,
    },
    /// The world state was written to disk.
    SavegameWritten,
    /// A savegame was restored into the world.
    SavegameLoaded {
        /// The story version recorded in the save.
        version: String,
    },
    /// A save carried a different story version than the running story.
    VersionMismatch {
        /// Version recorded in the save.
        saved: String,
        /// Version of the running story.
        current: String,
    },
    /// The story signalled completion.
    StoryCompleted,
}

/// A record of something the engine did, for operator inspection.
#[derive(Debug, Clone)]
pub struct EngineEvent {
    /// The server tick during which this happened.
    pub tick: u64,
    /// What happened.
    pub kind: EngineEventKind,
}

/// Accumulates engine events during a run, oldest dropped beyond capacity.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<EngineEvent>,
    max_events: usize,
}

impl EventLog {
    /// A log holding at most `max_events` entries (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, trimming the oldest past capacity.
    pub fn push(&mut self, tick: u64, kind: EngineEventKind) {
        self.events.push(EngineEvent { tick, kind });
        if self.max_events > 0 && self.events.len() > self.max_events {
            let excess = self.events.len() - self.max_events;
            self.events.drain(..excess);
        }
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    /// The number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_query() {
        let mut log = EventLog::new(0);
        log.push(1, EngineEventKind::TickCompleted);
        log.push(
            1,
            EngineEventKind::CommandProcessed {
                turn: 1,
                input: "look".into(),
            },
        );
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].tick, 1);
    }

    #[test]
    fn capacity_trims_oldest() {
        let mut log = EventLog::new(2);
        for tick in 0..5 {
            log.push(tick, EngineEventKind::TickCompleted);
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].tick, 3);
        assert_eq!(log.events()[1].tick, 4);
    }
}
