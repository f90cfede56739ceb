//! The [`RemoteEntityController`] owns every piece of reconciliation state for one remote entity.
use crate::config::{CatchUpPolicy, ReconciliationConfig};
use crate::drift::{DriftCorrector, DriftStep};
use crate::error::ReconciliationError;
use crate::physics::LinearVelocity;
use bevy_ecs::component::Component;
use bevy_math::Vec3;
use bevy_transform::components::Transform;
use core::time::Duration;
use rebound_core::prelude::{LagEstimator, PositionUpdate, Sequence, Timestamp};
use rebound_sync::prelude::LagStats;
use rebound_utils::sequence_buffer::SequenceBuffer;
use tracing::{debug, trace, warn};

/// Result of one pass of the update application loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The entity is inactive or no match is running
    Inactive,
    /// Nothing is buffered
    Empty,
    /// The update for the cursor has not arrived yet
    Waiting(Sequence),
    /// The update is ready but the entity is moving too fast; it stays buffered
    Deferred(Sequence),
    /// A drift correction is blending the position; no impulse is applied until it finishes
    Correcting,
    Applied(Sequence),
}

/// An update waiting in the buffer
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedUpdate {
    pub update: PositionUpdate,
    /// Transport lag measured when the update was received.
    /// Time spent in the buffer afterwards is not part of it.
    pub lag: Duration,
}

/// Counters describing what happened to the updates of the current match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationStats {
    pub buffered: u32,
    pub applied: u32,
    pub deferred: u32,
    pub duplicates: u32,
    pub stale: u32,
    pub rejected: u32,
    /// Sequences declared lost by the catch-up policy
    pub skipped: u32,
    pub checks_within_threshold: u32,
    pub corrections_started: u32,
    pub corrections_finished: u32,
    /// Drift measured by the most recent comparison
    pub last_drift: Option<f32>,
}

/// Reconciles a simulated remote entity with the updates its owner sends.
///
/// The controller buffers incoming updates by sequence number, applies them strictly
/// in sequence order (one per fixed tick) and drives the drift check.
/// It is only touched from the simulation thread.
#[derive(Component, Debug, Default)]
#[require(Transform, LinearVelocity, LagStats)]
pub struct RemoteEntityController {
    buffer: SequenceBuffer<Sequence, BufferedUpdate>,
    /// Next sequence to apply
    cursor: Sequence,
    /// Last sequence applied in this match. The cursor saturates at `u32::MAX`,
    /// so the cursor alone cannot tell whether `u32::MAX` was consumed.
    last_applied: Option<Sequence>,
    drift: DriftCorrector,
    /// Whether the entity participates in the simulation
    active: bool,
    /// Whether a match is running; set by `reset`, cleared by `end_match`
    match_initialized: bool,
    /// Overrides the global [`ReconciliationConfig`]
    config: Option<ReconciliationConfig>,
    stats: ReconciliationStats,
}

impl RemoteEntityController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ReconciliationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// The config to use for this entity: its own override, or `global`
    pub fn config<'a>(&'a self, global: &'a ReconciliationConfig) -> &'a ReconciliationConfig {
        self.config.as_ref().unwrap_or(global)
    }

    pub fn cursor(&self) -> Sequence {
        self.cursor
    }

    pub fn buffer(&self) -> &SequenceBuffer<Sequence, BufferedUpdate> {
        &self.buffer
    }

    pub fn drift(&self) -> &DriftCorrector {
        &self.drift
    }

    pub fn stats(&self) -> &ReconciliationStats {
        &self.stats
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_match_initialized(&self) -> bool {
        self.match_initialized
    }

    /// True if updates should be applied this tick
    pub fn is_participating(&self) -> bool {
        self.active && self.match_initialized
    }

    /// Buffer an update received at `received_at`.
    ///
    /// Updates that are not remote-velocity updates, duplicates, and updates that were already
    /// consumed are dropped; the reason is logged and counted but not surfaced.
    /// Returns the transport lag of the update if it was buffered.
    pub fn buffer_state(&mut self, update: PositionUpdate, received_at: Timestamp) -> Option<Duration> {
        let e = match self.try_buffer_state(update, received_at) {
            Ok(lag) => return Some(lag),
            Err(e) => e,
        };
        match &e {
            ReconciliationError::DuplicateSequence(_) => {
                self.stats.duplicates += 1;
                #[cfg(feature = "metrics")]
                metrics::counter!("reconciliation::duplicates").increment(1);
            }
            ReconciliationError::StaleSequence { .. } => self.stats.stale += 1,
            ReconciliationError::UnexpectedTag(_) => self.stats.rejected += 1,
        }
        debug!(error = %e, "dropping update");
        None
    }

    /// Buffer an update received at `received_at`, reporting why it was dropped
    pub fn try_buffer_state(
        &mut self,
        update: PositionUpdate,
        received_at: Timestamp,
    ) -> Result<Duration, ReconciliationError> {
        if !update.is_remote_velocity() {
            return Err(ReconciliationError::UnexpectedTag(update.sender_tag));
        }
        if self.is_consumed(update.sequence) {
            return Err(ReconciliationError::StaleSequence {
                sequence: update.sequence,
                cursor: self.cursor,
            });
        }
        let lag = LagEstimator::estimate(&update, received_at);
        trace!(sequence = ?update.sequence, ?lag, "buffering update");
        self.buffer.insert(update.sequence, BufferedUpdate { update, lag })?;
        self.stats.buffered += 1;
        Ok(lag)
    }

    /// True if `sequence` was applied or skipped in this match
    fn is_consumed(&self, sequence: Sequence) -> bool {
        sequence < self.cursor || Some(sequence) <= self.last_applied
    }

    /// Start a new match: snap the entity to `spawn_position` and forget every update,
    /// drift check and counter from the previous match.
    pub fn reset(
        &mut self,
        spawn_position: Vec3,
        transform: &mut Transform,
        velocity: &mut LinearVelocity,
    ) {
        self.reset_state();
        transform.translation = spawn_position;
        velocity.0 = Vec3::ZERO;
    }

    /// The part of [`Self::reset`] that does not touch the entity's transform
    pub(crate) fn reset_state(&mut self) {
        debug!(cursor = ?self.cursor, buffered = self.buffer.len(), "resetting remote entity");
        self.drift.cancel();
        self.buffer.clear();
        self.cursor = Sequence::ZERO;
        self.last_applied = None;
        self.stats = ReconciliationStats::default();
        self.match_initialized = true;
    }

    /// Toggle whether the entity takes part in the simulation. Buffered updates are kept.
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            debug!(?active, "remote entity activation changed");
        }
        self.active = active;
    }

    /// The match is over: stop applying updates and drop the drift check in flight.
    /// Buffered updates are kept until the next reset.
    pub fn end_match(&mut self) {
        self.match_initialized = false;
        self.drift.cancel();
    }

    /// Run one pass of the update application loop.
    ///
    /// Applies at most one update: the one for the cursor, if it has arrived.
    /// A missing update is not an error; the loop simply retries on the next tick.
    pub fn apply_next_update(
        &mut self,
        velocity: &mut Vec3,
        sim_now: Duration,
        config: &ReconciliationConfig,
    ) -> ApplyOutcome {
        if !self.is_participating() {
            return ApplyOutcome::Inactive;
        }
        if self.buffer.is_empty() {
            return ApplyOutcome::Empty;
        }
        if self.drift.is_correcting() {
            return ApplyOutcome::Correcting;
        }
        if !self.buffer.contains(self.cursor) && !self.try_catch_up(config.catch_up) {
            trace!(cursor = ?self.cursor, "waiting for missing update");
            return ApplyOutcome::Waiting(self.cursor);
        }

        let horizontal_speed = Vec3::new(velocity.x, 0.0, velocity.z).length();
        if horizontal_speed > config.max_horizontal_speed_for_apply {
            trace!(cursor = ?self.cursor, ?horizontal_speed, "deferring update");
            self.stats.deferred += 1;
            #[cfg(feature = "metrics")]
            metrics::counter!("reconciliation::deferred").increment(1);
            return ApplyOutcome::Deferred(self.cursor);
        }

        let Some(BufferedUpdate { update, lag }) = self.buffer.try_take(self.cursor) else {
            return ApplyOutcome::Waiting(self.cursor);
        };
        let sequence = update.sequence;
        *velocity += update.velocity;
        self.cursor = sequence.next();
        self.last_applied = Some(sequence);
        self.stats.applied += 1;
        #[cfg(feature = "metrics")]
        metrics::counter!("reconciliation::applied").increment(1);
        trace!(?sequence, impulse = ?update.velocity, "applied update");

        if !self.drift.is_active() {
            self.drift.schedule(&update, lag.min(config.max_lag_wait), sim_now);
        }
        ApplyOutcome::Applied(sequence)
    }

    /// If the policy allows it, move the cursor past missing updates. Returns true if it moved.
    fn try_catch_up(&mut self, policy: CatchUpPolicy) -> bool {
        let CatchUpPolicy::SkipAfter { backlog } = policy else {
            return false;
        };
        let Some(highest) = self.buffer.highest_sequence() else {
            return false;
        };
        if self.cursor.distance_to(highest) < backlog {
            return false;
        }
        let Some(next) = self.buffer.next_after(self.cursor) else {
            return false;
        };
        let skipped = self.cursor.distance_to(next);
        warn!(from = ?self.cursor, to = ?next, ?skipped, "updates lost, skipping ahead");
        self.stats.skipped = self.stats.skipped.saturating_add(skipped);
        self.cursor = next;
        true
    }

    /// Advance the drift check in flight, possibly writing `position`
    pub fn correct_drift(
        &mut self,
        position: &mut Vec3,
        sim_now: Duration,
        config: &ReconciliationConfig,
    ) -> DriftStep {
        if !self.is_participating() {
            return DriftStep::Idle;
        }
        let step = self.drift.advance(
            position,
            sim_now,
            config.drift_threshold,
            config.correction_window,
            config.correction_easing,
        );
        match step {
            DriftStep::WithinThreshold { drift } => {
                self.stats.checks_within_threshold += 1;
                self.stats.last_drift = Some(drift);
            }
            DriftStep::CorrectionStarted { drift } => {
                self.stats.corrections_started += 1;
                self.stats.last_drift = Some(drift);
                #[cfg(feature = "metrics")]
                metrics::counter!("reconciliation::corrections").increment(1);
            }
            DriftStep::CorrectionFinished => {
                self.stats.corrections_finished += 1;
            }
            _ => {}
        }
        step
    }
}
