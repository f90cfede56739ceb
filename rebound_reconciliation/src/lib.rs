/*! # Rebound Reconciliation

Client-side reconciliation of a remote entity.

The remote peer streams velocity updates tagged with a sequence number. They arrive
out of order, late, duplicated, or not at all. The [`RemoteEntityController`](controller::RemoteEntityController)
buffers them and, once per fixed tick:
- applies the next update in sequence order as a velocity change
- clamps the resulting speed
- after the update's estimated lag has elapsed, compares the simulated position with the
  position the sender reported, and blends the entity towards it if they drifted apart
*/
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod commands;
pub mod config;
pub mod controller;
pub mod drift;
pub mod error;
pub mod governor;
pub mod physics;
pub mod plugin;

pub mod prelude {
    pub use crate::commands::RemoteEntityCommandsExt;
    pub use crate::config::{CatchUpPolicy, ReconciliationConfig};
    pub use crate::controller::{ApplyOutcome, ReconciliationStats, RemoteEntityController};
    pub use crate::drift::{DriftCheck, DriftCorrector, DriftState, DriftStep};
    pub use crate::error::ReconciliationError;
    pub use crate::physics::{KinematicIntegrationPlugin, LinearVelocity};
    pub use crate::plugin::{ReconciliationPlugin, ReconciliationSystems};
}
