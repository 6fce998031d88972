use crate::ids::{ItemId, LivingId, LocationId};
use crate::location::Direction;

/// Alias for `Result<T, WorldError>`.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors that can occur when manipulating the world graph.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The requested location vnum does not exist.
    #[error("location not found: {0}")]
    LocationNotFound(LocationId),

    /// The requested item vnum does not exist.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// The requested living vnum does not exist.
    #[error("living not found: {0}")]
    LivingNotFound(LivingId),

    /// No exit leads in that direction from the given location.
    #[error("no exit {direction} from {from}")]
    NoExit {
        /// Location the exit was looked up on.
        from: LocationId,
        /// Direction that has no exit.
        direction: Direction,
    },

    /// An exit in that direction already exists.
    #[error("exit {direction} from {from} already exists")]
    DuplicateExit {
        /// Location the exit was being added to.
        from: LocationId,
        /// Direction already occupied.
        direction: Direction,
    },
}
