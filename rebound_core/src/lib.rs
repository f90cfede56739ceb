//! Contains a set of shared types

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod lag;
pub mod plugin;
pub mod sequence;
pub mod time;
pub mod update;

pub mod prelude {
    pub use crate::lag::LagEstimator;
    pub use crate::plugin::CorePlugins;
    pub use crate::sequence::Sequence;
    pub use crate::time::{Timestamp, WallClock};
    pub use crate::update::{PositionUpdate, SenderTag};
}
