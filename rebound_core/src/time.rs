/*!
Wall-clock time used to timestamp updates.

Simulation time is Bevy's [`Time<Fixed>`](bevy_time::Fixed); the wall clock is only
used to compare a sender's timestamp against the local time of reception.
*/
use bevy_ecs::resource::Resource;
use chrono::{DateTime, TimeDelta, Utc};

/// Absolute send/receive time of an update, in UTC.
///
/// On the wire this is encoded as milliseconds since the unix epoch.
pub type Timestamp = DateTime<Utc>;

/// Convert milliseconds since the unix epoch into a [`Timestamp`]
///
/// Returns `None` if the value is out of the representable range.
pub fn timestamp_from_millis(millis: i64) -> Option<Timestamp> {
    DateTime::from_timestamp_millis(millis)
}

/// Source of wall-clock time.
///
/// Defaults to the system clock; tests can freeze it and advance it manually.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Default)]
pub enum WallClock {
    #[default]
    System,
    /// A frozen clock that only moves when [`WallClock::advance`] is called
    Manual(Timestamp),
}

impl WallClock {
    /// A manual clock frozen at `millis` since the unix epoch
    pub fn manual_from_millis(millis: i64) -> Self {
        WallClock::Manual(timestamp_from_millis(millis).unwrap_or_default())
    }

    pub fn now(&self) -> Timestamp {
        match self {
            WallClock::System => Utc::now(),
            WallClock::Manual(now) => *now,
        }
    }

    /// Move a manual clock forward. Has no effect on the system clock.
    pub fn advance(&mut self, delta: core::time::Duration) {
        if let WallClock::Manual(now) = self {
            if let Ok(delta) = TimeDelta::from_std(delta) {
                *now += delta;
            }
        }
    }
}
