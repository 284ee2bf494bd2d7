use crate::selector::Selector;
use thiserror::Error;

/// Failures of the dispatching subscripts.
///
/// Batch operations validate every key before touching the map, so an
/// `Err` always means nothing was changed.
#[derive(Debug, Clone, Error)]
pub enum Error<K> {
    /// At least one addressed key is absent. Carries the whole argument.
    #[error("key not found: {0:?}")]
    KeyNotFound(Selector<K>),
    /// The argument, or its pairing with the assigned value, has no dispatch.
    #[error("invalid key: argument shape cannot be dispatched")]
    InvalidKey,
}

impl<K> Error<K> {
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound(_))
    }

    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Error::InvalidKey)
    }
}
