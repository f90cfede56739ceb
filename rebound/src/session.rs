/*! Match lifecycle.

A [`MatchSession`] entity stands for the connection to the game service. Frames pushed into its
[`InboundQueue`] are decoded once per fixed tick and dispatched:
- a match start resets the remote entity to its spawn point and activates it
- opponent movement is buffered on the remote entity's [`RemoteEntityController`]
- a match outcome stops the reconciliation and deactivates the remote entity

Frames for the service are encoded by the session and pushed into its [`OutboundQueue`].
Our own velocity updates are numbered from 0 at the start of every match.
*/
use alloc::string::String;
use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_transform::components::Transform;
use rebound_core::prelude::{Sequence, Timestamp, WallClock};
use rebound_messages::prelude::{
    InboundMessage, InboundQueue, MatchOutcome, MessageError, OutboundQueue, OutboundVelocity,
    PlayerSlot, encode_block_hit, encode_request_start, encode_velocity,
};
use rebound_reconciliation::prelude::{LinearVelocity, RemoteEntityController};
use rebound_sync::prelude::LagStats;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPhase {
    /// Connected, no match yet
    #[default]
    Searching,
    /// We created a match and wait for an opponent to join it
    WaitingForOpponent,
    Playing,
    Finished(MatchOutcome),
}

/// A frame could not be sent to the service
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("cannot send gameplay messages while {0:?}")]
    NotPlaying(MatchPhase),
    /// Every sequence number of the match was used
    #[error("outbound sequence numbers are exhausted")]
    SequenceExhausted,
    #[error(transparent)]
    Message(#[from] MessageError),
}

/// State of the match we take part in
#[derive(Component, Debug)]
#[require(InboundQueue, OutboundQueue)]
pub struct MatchSession {
    /// Identifier assigned by the service
    pub match_id: Option<String>,
    /// Our player slot, known once the match starts
    pub slot: Option<PlayerSlot>,
    /// The entity simulating the opponent
    pub remote: Entity,
    /// The entity of the local player, moved to its spawn point when the match starts
    pub local: Option<Entity>,
    phase: MatchPhase,
    /// Sequence of our next velocity update, `None` once `u32::MAX` was sent
    outbound_sequence: Option<Sequence>,
}

impl MatchSession {
    pub fn new(remote: Entity) -> Self {
        Self {
            match_id: None,
            slot: None,
            remote,
            local: None,
            phase: MatchPhase::default(),
            outbound_sequence: Some(Sequence::ZERO),
        }
    }

    pub fn with_local(mut self, local: Entity) -> Self {
        self.local = Some(local);
        self
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == MatchPhase::Playing
    }

    pub fn opponent_slot(&self) -> Option<PlayerSlot> {
        self.slot.map(PlayerSlot::opponent)
    }

    pub fn next_outbound_sequence(&self) -> Option<Sequence> {
        self.outbound_sequence
    }

    /// Ask the service to create or join a match, as done once the connection is open.
    /// Anything known about a previous match is forgotten.
    pub fn request_match(&mut self, outbound: &OutboundQueue) -> Result<(), SessionError> {
        let frame = encode_request_start()?;
        self.match_id = None;
        self.slot = None;
        self.phase = MatchPhase::Searching;
        outbound.push(frame);
        Ok(())
    }

    /// Send a velocity change of the local player, returning the sequence it was given.
    ///
    /// Only allowed while playing; nothing is sent and no sequence is used otherwise.
    pub fn send_velocity(
        &mut self,
        outbound: &OutboundQueue,
        velocity: Vec3,
        current_position: Vec3,
        sent_at: Timestamp,
    ) -> Result<Sequence, SessionError> {
        if !self.is_playing() {
            return Err(SessionError::NotPlaying(self.phase));
        }
        let sequence = self.outbound_sequence.ok_or(SessionError::SequenceExhausted)?;
        let frame = encode_velocity(&OutboundVelocity {
            match_id: self.match_id.clone(),
            sequence,
            velocity,
            current_position,
            sent_at,
        })?;
        outbound.push(frame);
        self.outbound_sequence = sequence.0.checked_add(1).map(Sequence);
        trace!(?sequence, ?velocity, "sent local velocity");
        Ok(sequence)
    }

    /// Tell the opponent that their throw hit our block
    pub fn send_block_hit(&self, outbound: &OutboundQueue) -> Result<(), SessionError> {
        if !self.is_playing() {
            return Err(SessionError::NotPlaying(self.phase));
        }
        outbound.push(encode_block_hit(self.match_id.as_deref())?);
        Ok(())
    }
}

type RemoteData = (
    &'static mut RemoteEntityController,
    &'static mut LagStats,
    &'static mut Transform,
    &'static mut LinearVelocity,
);

/// Drain every session's inbound queue and dispatch the decoded messages
pub(crate) fn ingest_system(
    wall_clock: Res<WallClock>,
    mut sessions: Query<(Entity, &mut MatchSession, &InboundQueue)>,
    mut remotes: Query<RemoteData>,
    mut locals: Query<&mut Transform, Without<RemoteEntityController>>,
) {
    let now = wall_clock.now();
    sessions
        .iter_mut()
        .for_each(|(session_entity, mut session, queue)| {
            for message in queue.drain(now) {
                match message {
                    InboundMessage::FirstToJoin { match_id } => {
                        info!(?session_entity, ?match_id, "created match, waiting for an opponent");
                        session.match_id = match_id;
                        session.phase = MatchPhase::WaitingForOpponent;
                    }
                    InboundMessage::MatchStarted {
                        match_id,
                        player,
                        local_spawn,
                        remote_spawn,
                    } => {
                        info!(?session_entity, ?match_id, ?player, "match started");
                        if match_id.is_some() {
                            session.match_id = match_id;
                        }
                        session.slot = Some(player);
                        session.phase = MatchPhase::Playing;
                        session.outbound_sequence = Some(Sequence::ZERO);
                        match remotes.get_mut(session.remote) {
                            Ok((mut controller, mut lag_stats, mut transform, mut velocity)) => {
                                controller.reset(remote_spawn, &mut transform, &mut velocity);
                                controller.set_active(true);
                                lag_stats.reset();
                            }
                            Err(e) => warn!(remote = ?session.remote, ?e, "remote entity is missing its controller"),
                        }
                        if let Some(local) = session.local {
                            if let Ok(mut transform) = locals.get_mut(local) {
                                transform.translation = local_spawn;
                            }
                        }
                    }
                    InboundMessage::OpponentVelocity(update) => {
                        if !session.is_playing() {
                            debug!(sequence = ?update.sequence, phase = ?session.phase, "dropping update received outside of a match");
                            continue;
                        }
                        let Ok((mut controller, mut lag_stats, _, _)) = remotes.get_mut(session.remote) else {
                            continue;
                        };
                        if let Some(lag) = controller.buffer_state(update, now) {
                            lag_stats.update_with_new_sample(lag);
                        }
                    }
                    InboundMessage::Throw { message } => {
                        debug!(?session_entity, ?message, "opponent threw");
                    }
                    InboundMessage::Outcome(outcome) => {
                        info!(?session_entity, ?outcome, "match over");
                        session.phase = MatchPhase::Finished(outcome);
                        if let Ok((mut controller, ..)) = remotes.get_mut(session.remote) {
                            controller.end_match();
                            controller.set_active(false);
                        }
                    }
                    InboundMessage::Other(opcode) => {
                        trace!(?opcode, "ignoring message");
                    }
                }
            }
        });
}
