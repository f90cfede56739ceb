//! JSON shape of the messages exchanged with the game service.
//!
//! Every message shares one flat envelope. Vectors are sent as objects of decimal strings
//! so that the server relays them untouched, without any float re-encoding.
use crate::error::MessageError;
use alloc::format;
use alloc::string::String;
use bevy_math::Vec3;
use serde::{Deserialize, Serialize};

/// Action name expected by the service's routing layer
pub const ACTION: &str = "OnMessage";

/// A 3D vector whose components are encoded as strings with three decimals
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct WireVec3 {
    #[serde(default)]
    pub x: String,
    #[serde(default)]
    pub y: String,
    #[serde(default)]
    pub z: String,
}

impl From<Vec3> for WireVec3 {
    fn from(value: Vec3) -> Self {
        Self {
            x: format!("{:.3}", value.x),
            y: format!("{:.3}", value.y),
            z: format!("{:.3}", value.z),
        }
    }
}

impl TryFrom<&WireVec3> for Vec3 {
    type Error = MessageError;

    fn try_from(value: &WireVec3) -> Result<Self, Self::Error> {
        Ok(Vec3::new(
            parse_component("x", &value.x)?,
            parse_component("y", &value.y)?,
            parse_component("z", &value.z)?,
        ))
    }
}

fn parse_component(component: &'static str, value: &str) -> Result<f32, MessageError> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| MessageError::InvalidVector {
            component,
            value: value.into(),
        })
}

/// The envelope of every message.
///
/// Which fields are present depends on the opcode; see [`crate::protocol::decode`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameMessage {
    #[serde(default)]
    pub action: String,
    pub opcode: String,
    /// Match identifier assigned by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Free-form text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Velocity change for movement messages; the local spawn position for the match start message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<WireVec3>,
    /// The remote spawn position for the match start message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enemy_velocity: Option<WireVec3>,
    /// Sender's position at send time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_pos: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<i64>,
    /// Player slot ("1" or "2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    /// Milliseconds since the unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl GameMessage {
    pub fn new(opcode: impl Into<String>) -> Self {
        Self {
            action: ACTION.into(),
            opcode: opcode.into(),
            ..Default::default()
        }
    }
}
