//! Typed view of the messages exchanged with the game service
use crate::error::MessageError;
use crate::wire::{GameMessage, WireVec3};
use alloc::string::{String, ToString};
use bevy_math::Vec3;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use rebound_core::prelude::{PositionUpdate, Sequence, SenderTag, Timestamp};
use rebound_core::time::timestamp_from_millis;

/// Message kinds, encoded on the wire as numeric strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// We are the first player in a new match
    FirstToJoin,
    /// Ask the service to create or join a match
    RequestStart,
    /// Both players joined; carries the spawn positions
    Playing,
    Throw,
    BlockHit,
    YouWon,
    YouLost,
    /// Movement update of the opponent
    OpponentVelocity,
}

impl Opcode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Opcode::FirstToJoin => "0",
            Opcode::RequestStart => "1",
            Opcode::Playing => "11",
            Opcode::Throw => "5",
            Opcode::BlockHit => "9",
            Opcode::YouWon => "91",
            Opcode::YouLost => "92",
            Opcode::OpponentVelocity => "21",
        }
    }
}

impl FromStr for Opcode {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" => Opcode::FirstToJoin,
            "1" => Opcode::RequestStart,
            "11" => Opcode::Playing,
            "5" => Opcode::Throw,
            "9" => Opcode::BlockHit,
            "91" => Opcode::YouWon,
            "92" => Opcode::YouLost,
            "21" => Opcode::OpponentVelocity,
            other => return Err(MessageError::UnknownOpcode(other.into())),
        })
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two players of a match we are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub fn opponent(self) -> Self {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PlayerSlot::One => "1",
            PlayerSlot::Two => "2",
        }
    }
}

impl FromStr for PlayerSlot {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(PlayerSlot::One),
            "2" => Ok(PlayerSlot::Two),
            other => Err(MessageError::InvalidPlayer(other.into())),
        }
    }
}

impl Display for PlayerSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Won,
    Lost,
}

/// A decoded inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    FirstToJoin {
        match_id: Option<String>,
    },
    MatchStarted {
        match_id: Option<String>,
        player: PlayerSlot,
        local_spawn: Vec3,
        remote_spawn: Vec3,
    },
    OpponentVelocity(PositionUpdate),
    Throw {
        message: Option<String>,
    },
    Outcome(MatchOutcome),
    /// A valid message that the client has no handling for
    Other(Opcode),
}

fn require<T>(value: Option<T>, field: &'static str, opcode: Opcode) -> Result<T, MessageError> {
    value.ok_or(MessageError::MissingField {
        field,
        opcode: opcode.as_str(),
    })
}

fn vector(value: Option<&WireVec3>, field: &'static str, opcode: Opcode) -> Result<Vec3, MessageError> {
    Vec3::try_from(require(value, field, opcode)?)
}

/// Decode a text frame received at `received_at`.
///
/// Movement messages without a timestamp are considered sent at `received_at`.
pub fn decode(text: &str, received_at: Timestamp) -> Result<InboundMessage, MessageError> {
    let message: GameMessage = serde_json::from_str(text)?;
    let opcode = message.opcode.parse::<Opcode>()?;
    Ok(match opcode {
        Opcode::FirstToJoin => InboundMessage::FirstToJoin {
            match_id: message.uuid,
        },
        Opcode::Playing => {
            let player = require(message.player.as_deref(), "player", opcode)?.parse::<PlayerSlot>()?;
            InboundMessage::MatchStarted {
                local_spawn: vector(message.velocity.as_ref(), "velocity", opcode)?,
                remote_spawn: vector(message.enemy_velocity.as_ref(), "enemyVelocity", opcode)?,
                match_id: message.uuid,
                player,
            }
        }
        Opcode::OpponentVelocity => {
            let seq = require(message.seq, "seq", opcode)?;
            let sequence = u32::try_from(seq).map_err(|_| MessageError::InvalidSequence(seq))?;
            let send_timestamp = match message.timestamp {
                Some(millis) => {
                    timestamp_from_millis(millis).ok_or(MessageError::InvalidTimestamp(millis))?
                }
                None => received_at,
            };
            InboundMessage::OpponentVelocity(PositionUpdate {
                sequence: Sequence(sequence),
                velocity: vector(message.velocity.as_ref(), "velocity", opcode)?,
                authoritative_position: vector(message.current_pos.as_ref(), "currentPos", opcode)?,
                send_timestamp,
                sender_tag: SenderTag::RemoteVelocity,
            })
        }
        Opcode::Throw => InboundMessage::Throw {
            message: message.message,
        },
        Opcode::YouWon => InboundMessage::Outcome(MatchOutcome::Won),
        Opcode::YouLost => InboundMessage::Outcome(MatchOutcome::Lost),
        Opcode::RequestStart | Opcode::BlockHit => InboundMessage::Other(opcode),
    })
}

/// Movement update sent by the local player
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundVelocity {
    pub match_id: Option<String>,
    pub sequence: Sequence,
    pub velocity: Vec3,
    pub current_position: Vec3,
    pub sent_at: Timestamp,
}

pub fn encode_velocity(update: &OutboundVelocity) -> Result<String, MessageError> {
    let mut message = GameMessage::new(Opcode::OpponentVelocity.as_str());
    message.uuid = update.match_id.clone();
    message.velocity = Some(update.velocity.into());
    message.current_pos = Some(update.current_position.into());
    message.seq = Some(i64::from(update.sequence.0));
    message.timestamp = Some(update.sent_at.timestamp_millis());
    Ok(serde_json::to_string(&message)?)
}

pub fn encode_request_start() -> Result<String, MessageError> {
    Ok(serde_json::to_string(&GameMessage::new(
        Opcode::RequestStart.as_str(),
    ))?)
}

pub fn encode_block_hit(match_id: Option<&str>) -> Result<String, MessageError> {
    let mut message = GameMessage::new(Opcode::BlockHit.as_str());
    message.uuid = match_id.map(ToString::to_string);
    Ok(serde_json::to_string(&message)?)
}
