use chrono::{DateTime, Utc};

use spindle_world::Gender;

/// What drives the passage of game time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMethod {
    /// A server tick happens after every player command. Nothing moves
    /// while the player thinks; game time advances per command entered.
    Command,
    /// Server ticks happen on a real-time interval whether or not the
    /// player types anything.
    Timer,
}

/// A pre-made player character. When a story config carries one, the
/// interactive character creation dialog is skipped entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetPlayer {
    /// Character name.
    pub name: String,
    /// Grammatical gender.
    pub gender: Gender,
    /// Race name.
    pub race: String,
}

/// Static configuration a story hands to the driver before the loop starts.
#[derive(Debug, Clone)]
pub struct StoryConfig {
    /// Story title, shown in the welcome banner and stamped into saves.
    pub name: String,
    /// Author credit.
    pub author: String,
    /// Story version string, checked (warning only) against saves.
    pub version: String,
    /// How ticks are driven.
    pub tick_method: TickMethod,
    /// Seconds of real time per server tick (timer mode), or the amount of
    /// real time one command is worth (command mode).
    pub tick_interval_secs: f64,
    /// How much faster game time runs than real time. Forced to 1 in
    /// command mode, where real time only passes when commands do.
    pub gametime_rate: u32,
    /// In-game date and time at which a fresh game begins. `None` means
    /// the wall clock at startup.
    pub epoch: Option<DateTime<Utc>>,
    /// Whether the current game time is shown to the player.
    pub display_gametime: bool,
    /// Name of the location a new player starts in.
    pub start_location: String,
    /// Whether `save` is available and saves are offered at login.
    pub savegames_enabled: bool,
    /// Pre-made player character; `None` runs character creation.
    pub player: Option<PresetPlayer>,
    /// Seed for the driver's random number generator. `None` seeds from
    /// the wall clock.
    pub seed: Option<u64>,
}

impl StoryConfig {
    /// A command-driven configuration with sensible defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author: String::new(),
            version: "1.0".to_string(),
            tick_method: TickMethod::Command,
            tick_interval_secs: 1.0,
            gametime_rate: 1,
            epoch: None,
            display_gametime: false,
            start_location: String::new(),
            savegames_enabled: true,
            player: None,
            seed: None,
        }
    }

    /// Set the author credit.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the story version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the tick method and interval.
    pub fn with_ticks(mut self, method: TickMethod, interval_secs: f64) -> Self {
        self.tick_method = method;
        self.tick_interval_secs = interval_secs;
        self
    }

    /// Set the game-time speedup factor.
    pub fn with_gametime_rate(mut self, rate: u32) -> Self {
        self.gametime_rate = rate;
        self
    }

    /// Set the in-game starting date and time.
    pub fn with_epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Show or hide the game time in player-facing output.
    pub fn with_display_gametime(mut self, display: bool) -> Self {
        self.display_gametime = display;
        self
    }

    /// Set the name of the starting location.
    pub fn with_start_location(mut self, name: impl Into<String>) -> Self {
        self.start_location = name.into();
        self
    }

    /// Enable or disable savegames.
    pub fn with_savegames(mut self, enabled: bool) -> Self {
        self.savegames_enabled = enabled;
        self
    }

    /// Provide a pre-made player character, skipping character creation.
    pub fn with_player(
        mut self,
        name: impl Into<String>,
        gender: Gender,
        race: impl Into<String>,
    ) -> Self {
        self.player = Some(PresetPlayer {
            name: name.into(),
            gender,
            race: race.into(),
        });
        self
    }

    /// Seed the driver's random number generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The game-time rate actually in effect: command mode pins it to 1
    /// so a thinking player does not starve the world of time.
    pub fn effective_gametime_rate(&self) -> u32 {
        match self.tick_method {
            TickMethod::Command => 1,
            TickMethod::Timer => self.gametime_rate.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_command_driven() {
        let config = StoryConfig::new("Test");
        assert_eq!(config.tick_method, TickMethod::Command);
        assert!(config.savegames_enabled);
    }

    #[test]
    fn preset_player_is_carried() {
        let config = StoryConfig::new("Test").with_player("merlin", Gender::Male, "wizard");
        let preset = config.player.expect("preset player");
        assert_eq!(preset.name, "merlin");
        assert_eq!(preset.race, "wizard");
    }

    #[test]
    fn command_mode_pins_gametime_rate() {
        let config = StoryConfig::new("Test").with_gametime_rate(60);
        assert_eq!(config.effective_gametime_rate(), 1);

        let config = config.with_ticks(TickMethod::Timer, 0.5);
        assert_eq!(config.effective_gametime_rate(), 60);
    }
}
