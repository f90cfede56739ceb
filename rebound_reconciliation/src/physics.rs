//! Minimal kinematic integrator for remote entities.
//!
//! Games with their own physics engine can skip [`KinematicIntegrationPlugin`] and integrate
//! [`LinearVelocity`] themselves in [`ReconciliationSystems::Integrate`].
use crate::controller::RemoteEntityController;
use crate::plugin::ReconciliationSystems;
use bevy_app::{App, FixedUpdate, Plugin};
use bevy_derive::{Deref, DerefMut};
use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_reflect::Reflect;
use bevy_time::{Fixed, Time};
use bevy_transform::components::Transform;

/// Velocity of a simulated body, in units per second
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Reflect, Deref, DerefMut)]
pub struct LinearVelocity(pub Vec3);

/// Move every body with a [`LinearVelocity`] once per fixed tick.
///
/// Remote entities that are not participating in a match stay frozen.
pub struct KinematicIntegrationPlugin;

pub(crate) fn integrate(
    time: Res<Time<Fixed>>,
    mut query: Query<(&mut Transform, &LinearVelocity, Option<&RemoteEntityController>)>,
) {
    let dt = time.delta_secs();
    query
        .iter_mut()
        .filter(|(_, _, controller)| controller.is_none_or(|c| c.is_participating()))
        .for_each(|(mut transform, velocity, _)| {
            transform.translation += velocity.0 * dt;
        });
}

impl Plugin for KinematicIntegrationPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<LinearVelocity>();
        app.add_systems(
            FixedUpdate,
            integrate.in_set(ReconciliationSystems::Integrate),
        );
    }
}
