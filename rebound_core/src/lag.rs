//! Estimate the one-way transport delay of an update
use crate::time::Timestamp;
use crate::update::PositionUpdate;
use core::time::Duration;

/// Computes how long ago an update was sent, from its send timestamp.
///
/// The estimate is never negative: if the sender's clock is ahead of ours the
/// result is clamped to zero instead of being propagated.
#[derive(Debug, Default, Clone, Copy)]
pub struct LagEstimator;

impl LagEstimator {
    pub fn estimate(update: &PositionUpdate, now: Timestamp) -> Duration {
        Self::since(update.send_timestamp, now)
    }

    pub fn since(sent: Timestamp, now: Timestamp) -> Duration {
        (now - sent).to_std().unwrap_or(Duration::ZERO)
    }
}
