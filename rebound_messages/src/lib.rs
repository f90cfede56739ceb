/*! # Rebound Messages

The message layer sitting between the transport and the reconciliation core.

Frames arrive as JSON text from the game service. They are pushed into an [`InboundQueue`](queue::InboundQueue)
from whatever thread the transport runs on, and decoded on the simulation thread into [`InboundMessage`](protocol::InboundMessage)s.
Frames that fail to decode are logged and dropped here; they never reach the reconciliation core.
*/
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod error;
pub mod protocol;
pub mod queue;
pub mod wire;

pub mod prelude {
    pub use crate::error::MessageError;
    pub use crate::protocol::{
        InboundMessage, MatchOutcome, Opcode, OutboundVelocity, PlayerSlot, decode,
        encode_block_hit, encode_request_start, encode_velocity,
    };
    pub use crate::queue::{InboundQueue, InboundSender, OutboundQueue};
    pub use crate::wire::{GameMessage, WireVec3};
}
