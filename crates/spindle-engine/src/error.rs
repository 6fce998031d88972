use spindle_world::WorldError;

/// Alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the driver, persistence, and dialog machinery.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A world graph operation failed.
    #[error("world error: {0}")]
    World(#[from] WorldError),

    /// An I/O operation on a savegame file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Savegame JSON could not be serialized or parsed.
    #[error("savegame serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The savegame file is not in a format this engine can read at all.
    /// Distinct from [`EngineError::SaveInconsistent`]: a format error at
    /// login aborts the program rather than falling back to a new game.
    #[error("unrecognized savegame format: {reason}")]
    SaveFormat {
        /// What about the format was unrecognizable.
        reason: String,
    },

    /// A savegame reference did not line up with the re-derived static world.
    #[error("savegame does not match this story: {reason}")]
    SaveInconsistent {
        /// Which reference failed to resolve, and how.
        reason: String,
    },

    /// The story configuration is unusable, e.g. an unknown start location.
    #[error("story configuration error: {reason}")]
    Config {
        /// What was wrong with the configuration.
        reason: String,
    },
}
