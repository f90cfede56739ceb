//! Detect and correct drift between the simulated remote entity and the position its owner reported.
//!
//! Comparing as soon as an update is applied gives false positives: the position the sender
//! reported is only valid once the update has had time to travel. So every check goes through
//! these steps, one call to [`DriftCorrector::advance`] per fixed tick:
//! - Waiting: wait until the estimated lag of the update has elapsed in simulation time
//! - Comparing: measure the distance between the simulated and the reported position.
//!   Below the threshold nothing is touched and the check ends.
//! - Correcting: blend the position from where it was when the correction started towards
//!   the reported position, over a fixed window of simulation time.
//!
//! Only one check can be in flight at a time. It is cancelled synchronously when the entity is reset.
use bevy_math::Vec3;
use core::time::Duration;
use rebound_core::prelude::{PositionUpdate, Sequence};
use rebound_utils::easings::Easing;
use tracing::{debug, trace};

/// Position blend in progress
#[derive(Debug, Clone, PartialEq)]
pub struct DriftCheck {
    pub sequence: Sequence,
    /// Simulated position when the correction started
    pub baseline_position: Vec3,
    pub target_position: Vec3,
    /// Simulation time at which the correction started
    pub start_time: Duration,
    pub duration: Duration,
}

impl DriftCheck {
    /// Normalized progress of the blend at simulation time `now`, in `[0, 1]`
    pub fn progress(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start_time);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DriftState {
    #[default]
    Idle,
    Waiting {
        sequence: Sequence,
        target_position: Vec3,
        /// Simulation time at which the comparison happens
        compare_at: Duration,
    },
    Correcting(DriftCheck),
}

/// What happened during one call to [`DriftCorrector::advance`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriftStep {
    /// No check in flight
    Idle,
    Waiting,
    /// The comparison found the entity close enough; nothing was moved
    WithinThreshold { drift: f32 },
    /// The comparison found too much drift and the blend started
    CorrectionStarted { drift: f32 },
    Correcting { progress: f32 },
    /// The blend reached the reported position
    CorrectionFinished,
}

/// Single slot holding the drift check currently in flight, if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriftCorrector {
    state: DriftState,
}

impl DriftCorrector {
    pub fn state(&self) -> &DriftState {
        &self.state
    }

    /// True if a check is waiting or correcting
    pub fn is_active(&self) -> bool {
        !matches!(self.state, DriftState::Idle)
    }

    pub fn is_correcting(&self) -> bool {
        matches!(self.state, DriftState::Correcting(_))
    }

    /// Start a check for `update`, compared once `lag` has elapsed after `now`.
    ///
    /// Returns false and does nothing if a check is already in flight.
    pub fn schedule(&mut self, update: &PositionUpdate, lag: Duration, now: Duration) -> bool {
        if self.is_active() {
            trace!(sequence = ?update.sequence, "drift check already in flight, not scheduling");
            return false;
        }
        trace!(sequence = ?update.sequence, ?lag, "scheduling drift check");
        self.state = DriftState::Waiting {
            sequence: update.sequence,
            target_position: update.authoritative_position,
            compare_at: now + lag,
        };
        true
    }

    /// Drop the check in flight, discarding any partial correction
    pub fn cancel(&mut self) {
        if self.is_active() {
            debug!(state = ?self.state, "cancelling drift check");
        }
        self.state = DriftState::Idle;
    }

    /// Advance the check in flight to simulation time `now`.
    ///
    /// `position` is the current simulated position; it is only written while correcting.
    pub fn advance(
        &mut self,
        position: &mut Vec3,
        now: Duration,
        threshold: f32,
        window: Duration,
        easing: Easing,
    ) -> DriftStep {
        match &self.state {
            DriftState::Idle => DriftStep::Idle,
            DriftState::Waiting {
                sequence,
                target_position,
                compare_at,
            } => {
                if now < *compare_at {
                    return DriftStep::Waiting;
                }
                let sequence = *sequence;
                let target_position = *target_position;
                let drift = position.distance(target_position);
                if drift < threshold {
                    trace!(?sequence, ?drift, "drift within threshold");
                    self.state = DriftState::Idle;
                    return DriftStep::WithinThreshold { drift };
                }
                debug!(?sequence, ?drift, from = ?*position, to = ?target_position, "drift above threshold, starting correction");
                self.state = DriftState::Correcting(DriftCheck {
                    sequence,
                    baseline_position: *position,
                    target_position,
                    start_time: now,
                    duration: window,
                });
                match self.blend(position, now, easing) {
                    DriftStep::CorrectionFinished => DriftStep::CorrectionFinished,
                    _ => DriftStep::CorrectionStarted { drift },
                }
            }
            DriftState::Correcting(_) => self.blend(position, now, easing),
        }
    }

    fn blend(&mut self, position: &mut Vec3, now: Duration, easing: Easing) -> DriftStep {
        let DriftState::Correcting(check) = &self.state else {
            return DriftStep::Idle;
        };
        let progress = check.progress(now);
        if progress >= 1.0 {
            *position = check.target_position;
            trace!(sequence = ?check.sequence, "correction finished");
            self.state = DriftState::Idle;
            return DriftStep::CorrectionFinished;
        }
        *position = check
            .baseline_position
            .lerp(check.target_position, easing.apply(progress));
        trace!(sequence = ?check.sequence, ?progress, ?position, "applying correction");
        DriftStep::Correcting { progress }
    }
}
