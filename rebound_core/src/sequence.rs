use bevy_derive::{Deref, DerefMut};
use bevy_reflect::Reflect;
use core::fmt::{Display, Formatter};
use core::ops::{Add, AddAssign, Sub};
use serde::{Deserialize, Serialize};

/// Sender-assigned identifier of a remote entity update.
///
/// Sequences start at 0 at the beginning of every match and increase by one for each
/// update the sender emits. They are unique within a match, but they can be received
/// out of order or not at all.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Reflect,
    Deref,
    DerefMut,
)]
pub struct Sequence(pub u32);

impl Sequence {
    pub const ZERO: Sequence = Sequence(0);

    /// The sequence that directly follows this one
    pub fn next(self) -> Self {
        Sequence(self.0.saturating_add(1))
    }

    /// Number of sequences between `self` and a later sequence `other` (0 if `other` is not later)
    pub fn distance_to(self, other: Sequence) -> u32 {
        other.0.saturating_sub(self.0)
    }
}

impl From<u32> for Sequence {
    fn from(value: u32) -> Self {
        Sequence(value)
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Add<u32> for Sequence {
    type Output = Sequence;

    fn add(self, rhs: u32) -> Self::Output {
        Sequence(self.0.saturating_add(rhs))
    }
}

impl AddAssign<u32> for Sequence {
    fn add_assign(&mut self, rhs: u32) {
        *self = *self + rhs;
    }
}

impl Sub<Sequence> for Sequence {
    type Output = i64;

    fn sub(self, rhs: Sequence) -> Self::Output {
        i64::from(self.0) - i64::from(rhs.0)
    }
}
