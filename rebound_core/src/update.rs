use crate::sequence::Sequence;
use crate::time::Timestamp;
use alloc::string::String;
use bevy_math::Vec3;

/// Identifies which kind of message produced an update.
///
/// Only [`SenderTag::RemoteVelocity`] updates describe the remote entity's motion;
/// anything else is rejected by the reconciliation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SenderTag {
    #[default]
    RemoteVelocity,
    /// Any other message kind, identified by its opcode
    Other(String),
}

/// One authoritative sample describing the remote entity at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub sequence: Sequence,
    /// Velocity change to apply to the simulated body to reach the next state
    pub velocity: Vec3,
    /// Position the sender believed it was at when it sent the update.
    /// Only used for drift comparison.
    pub authoritative_position: Vec3,
    pub send_timestamp: Timestamp,
    pub sender_tag: SenderTag,
}

impl PositionUpdate {
    /// A remote-velocity update
    pub fn new(
        sequence: impl Into<Sequence>,
        velocity: Vec3,
        authoritative_position: Vec3,
        send_timestamp: Timestamp,
    ) -> Self {
        Self {
            sequence: sequence.into(),
            velocity,
            authoritative_position,
            send_timestamp,
            sender_tag: SenderTag::RemoteVelocity,
        }
    }

    pub fn with_tag(mut self, sender_tag: SenderTag) -> Self {
        self.sender_tag = sender_tag;
        self
    }

    pub fn is_remote_velocity(&self) -> bool {
        self.sender_tag == SenderTag::RemoteVelocity
    }
}
