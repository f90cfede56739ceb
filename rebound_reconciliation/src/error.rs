use rebound_core::prelude::{Sequence, SenderTag};
use rebound_utils::sequence_buffer::DuplicateSequence;

/// Reasons an incoming update was not buffered.
///
/// None of these are fatal: duplicate and late deliveries are expected from an
/// unreliable transport, and the update is simply dropped.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ReconciliationError {
    #[error(transparent)]
    DuplicateSequence(#[from] DuplicateSequence<Sequence>),
    /// The update is older than the next sequence we expect, so it was already applied or superseded
    #[error("sequence {sequence} was already consumed (next expected is {cursor})")]
    StaleSequence { sequence: Sequence, cursor: Sequence },
    #[error("update with tag {0:?} is not a remote velocity update")]
    UnexpectedTag(SenderTag),
}
