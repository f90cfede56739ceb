use bevy_ecs::resource::Resource;
use bevy_reflect::Reflect;
use core::time::Duration;
use rebound_utils::easings::Easing;

/// What to do when the next expected update is missing but later ones are buffered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum CatchUpPolicy {
    /// Wait for the missing update for as long as it takes
    #[default]
    Wait,
    /// Declare the missing updates lost once the buffered backlog is `backlog` sequences ahead
    /// of the cursor, and resume from the lowest buffered sequence.
    SkipAfter { backlog: u32 },
}

/// Tuning of the reconciliation of remote entities.
///
/// Inserted as a resource by the [`ReconciliationPlugin`](crate::plugin::ReconciliationPlugin);
/// a [`RemoteEntityController`](crate::controller::RemoteEntityController) can carry its own copy to override it.
#[derive(Resource, Clone, Debug, PartialEq, Reflect)]
pub struct ReconciliationConfig {
    /// Distance between the simulated and the reported position above which the entity is corrected
    pub drift_threshold: f32,
    /// Simulation time over which a correction is blended in
    pub correction_window: Duration,
    /// Maximum speed of the entity, enforced every tick
    pub max_speed: f32,
    /// Updates are held back while the entity's horizontal speed is above this value
    pub max_horizontal_speed_for_apply: f32,
    /// Upper bound on how long a drift check waits for the estimated lag
    pub max_lag_wait: Duration,
    pub correction_easing: Easing,
    pub catch_up: CatchUpPolicy,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            drift_threshold: 0.5,
            correction_window: Duration::from_millis(200),
            max_speed: 10.0,
            max_horizontal_speed_for_apply: 10.0,
            max_lag_wait: Duration::from_secs(1),
            correction_easing: Easing::Linear,
            catch_up: CatchUpPolicy::Wait,
        }
    }
}

impl ReconciliationConfig {
    pub fn with_drift_threshold(mut self, drift_threshold: f32) -> Self {
        self.drift_threshold = drift_threshold;
        self
    }

    pub fn with_correction_window(mut self, correction_window: Duration) -> Self {
        self.correction_window = correction_window;
        self
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    pub fn with_catch_up(mut self, catch_up: CatchUpPolicy) -> Self {
        self.catch_up = catch_up;
        self
    }
}
