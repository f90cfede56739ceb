//! Clamp the speed of remote entities.
//!
//! Applying a velocity change every tick can accumulate into speed spikes; the governor
//! caps the magnitude of the velocity while preserving its direction. It runs unconditionally,
//! whatever the state of the reconciliation.
use crate::config::ReconciliationConfig;
use crate::controller::RemoteEntityController;
use crate::physics::LinearVelocity;
use bevy_ecs::prelude::{Query, Res};
use bevy_math::Vec3;
use tracing::trace;

/// Clamp `velocity` to a magnitude of at most `max_speed`. Returns true if it was clamped.
pub fn govern_speed(velocity: &mut Vec3, max_speed: f32) -> bool {
    let max_speed = max_speed.max(0.0);
    if velocity.length_squared() <= max_speed * max_speed {
        return false;
    }
    *velocity = velocity.clamp_length_max(max_speed);
    true
}

pub(crate) fn speed_governor_system(
    global: Res<ReconciliationConfig>,
    mut query: Query<(&RemoteEntityController, &mut LinearVelocity)>,
) {
    query.iter_mut().for_each(|(controller, mut velocity)| {
        let max_speed = controller.config(&global).max_speed;
        // only trigger change detection when the velocity actually changes
        if velocity.length_squared() > max_speed * max_speed {
            let before = velocity.0;
            govern_speed(&mut velocity.0, max_speed);
            trace!(?before, after = ?velocity.0, "clamped remote entity speed");
        }
    });
}
