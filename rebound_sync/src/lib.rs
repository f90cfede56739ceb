/*! # Rebound Sync

Network statistics derived from the updates received from the remote peer.

The reconciliation layer uses the raw per-update lag estimate to time its drift checks;
the smoothed statistics in this crate are for telemetry and tuning.
*/
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod stats;

pub mod prelude {
    pub use crate::stats::{LagStats, LagStatsConfig};
}
