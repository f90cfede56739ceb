use crate::time::WallClock;
use bevy_app::{App, Plugin};
use bevy_time::{Fixed, Time, TimePlugin};
use core::time::Duration;

/// Default duration of a simulation tick (50Hz)
pub const DEFAULT_TICK_DURATION: Duration = Duration::from_millis(20);

pub struct CorePlugins {
    pub tick_duration: Duration,
}

impl Default for CorePlugins {
    fn default() -> Self {
        Self {
            tick_duration: DEFAULT_TICK_DURATION,
        }
    }
}

impl Plugin for CorePlugins {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<TimePlugin>() {
            app.add_plugins(TimePlugin);
        }
        app.insert_resource(Time::<Fixed>::from_duration(self.tick_duration));
        app.init_resource::<WallClock>();
    }
}
