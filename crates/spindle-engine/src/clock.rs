use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// The in-game clock.
///
/// Game time advances in multiples of real time: one real second moves the
/// clock forward `rate` game seconds. The driver feeds it elapsed real time
/// per server tick; nothing else touches it.
#[derive(Debug, Clone)]
pub struct GameClock {
    time: DateTime<Utc>,
    rate: u32,
}

impl GameClock {
    /// A clock starting at `epoch`, running `rate` times faster than
    /// real time. A rate of 0 is treated as 1.
    pub fn new(epoch: DateTime<Utc>, rate: u32) -> Self {
        Self {
            time: epoch,
            rate: rate.max(1),
        }
    }

    /// The current game time.
    pub fn now(&self) -> DateTime<Utc> {
        self.time
    }

    /// The game-seconds-per-real-second rate.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Advance the clock by an amount of real time, scaled by the rate.
    pub fn add_realtime(&mut self, elapsed: Duration) {
        let game_secs = elapsed.as_secs_f64() * f64::from(self.rate);
        self.add_gametime_secs(game_secs);
    }

    /// Advance the clock by an amount of game time directly.
    pub fn add_gametime_secs(&mut self, secs: f64) {
        let millis = (secs * 1000.0).round() as i64;
        self.time += TimeDelta::milliseconds(millis);
    }

    /// Snapshot for persistence.
    pub fn state(&self) -> ClockState {
        ClockState {
            time: self.time,
            rate: self.rate,
        }
    }

    /// Restore a persisted snapshot, replacing the current time and rate.
    pub fn restore(&mut self, state: ClockState) {
        self.time = state.time;
        self.rate = state.rate.max(1);
    }

    /// The clock formatted for player-facing display.
    pub fn display(&self) -> String {
        self.time.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Serializable snapshot of a [`GameClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    /// The game time at the moment of the snapshot.
    pub time: DateTime<Utc>,
    /// The game-seconds-per-real-second rate in effect.
    pub rate: u32,
}
