/*! # Rebound

Rebound keeps a locally simulated copy of a remote player in step with the velocity updates
that player streams over an unreliable transport.

Updates carry a sequence number, the velocity change to apply and the position the sender
believed it was at. They can arrive out of order, late, twice or never. Rebound:
- buffers them and applies them strictly in sequence order, one per fixed tick
- clamps the resulting speed
- once the estimated lag of an update has elapsed, compares the simulated position with the
  reported one and blends the entity back if they drifted apart

Add [`ReboundPlugins`](plugin::ReboundPlugins), spawn the remote entity with a
[`RemoteEntityController`](prelude::RemoteEntityController), and a [`MatchSession`](session::MatchSession)
pointing at it. Hand the session's [`InboundSender`](prelude::InboundSender) and a clone of its
[`OutboundQueue`](prelude::OutboundQueue) to the transport.
*/
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod plugin;
pub mod session;
pub mod status;

/// Types shared by every crate: sequences, updates, time
pub mod shared {
    pub use rebound_core::*;
}

pub mod messages {
    pub use rebound_messages::*;
}

pub mod reconciliation {
    pub use rebound_reconciliation::*;
}

pub mod sync {
    pub use rebound_sync::*;
}

pub mod utils {
    pub use rebound_utils::*;
}

/// Prelude containing commonly used types
pub mod prelude {
    pub use rebound_core::prelude::*;
    pub use rebound_messages::prelude::*;
    pub use rebound_reconciliation::prelude::*;
    pub use rebound_sync::prelude::*;
    pub use rebound_utils::easings::Easing;

    pub use crate::plugin::{ReboundPlugins, SessionPlugin};
    pub use crate::session::{MatchPhase, MatchSession, SessionError};
    pub use crate::status::StatusLine;
}
