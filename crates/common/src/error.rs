use crate::EntityId;

/// Errors shared by the scrollkit crates.
///
/// Absence is not an error: lookups of unknown cells, tiles or entities
/// return `None` or an empty collection instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("stale reference to entity {0:?}")]
    StaleReference(EntityId),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
