use crate::controller::RemoteEntityController;
use crate::physics::LinearVelocity;
use bevy_ecs::prelude::*;
use bevy_ecs::system::EntityCommands;
use bevy_math::Vec3;
use bevy_transform::components::Transform;
use rebound_core::prelude::{PositionUpdate, WallClock};
use rebound_sync::prelude::LagStats;
use tracing::error;

/// Drive a remote entity's [`RemoteEntityController`] from [`Commands`].
///
/// Like every command, these are applied on the simulation thread at the next sync point,
/// so they can be issued from any system.
pub trait RemoteEntityCommandsExt {
    /// Start a new match with the entity at `spawn_position` and activate it.
    ///
    /// Buffered updates, the drift check in flight and the lag statistics are discarded.
    fn reset_remote(&mut self, spawn_position: Vec3);

    fn set_remote_active(&mut self, active: bool);

    /// Buffer `update`, measuring its lag against the [`WallClock`] when the command is applied
    fn buffer_remote_state(&mut self, update: PositionUpdate);

    fn end_remote_match(&mut self);
}

impl RemoteEntityCommandsExt for EntityCommands<'_> {
    fn reset_remote(&mut self, spawn_position: Vec3) {
        self.queue(move |mut entity_mut: EntityWorldMut| {
            let Some(mut controller) = entity_mut.get_mut::<RemoteEntityController>() else {
                error!(entity = ?entity_mut.id(), "reset_remote called on an entity without a RemoteEntityController");
                return;
            };
            controller.reset_state();
            controller.set_active(true);
            if let Some(mut transform) = entity_mut.get_mut::<Transform>() {
                transform.translation = spawn_position;
            }
            if let Some(mut velocity) = entity_mut.get_mut::<LinearVelocity>() {
                velocity.0 = Vec3::ZERO;
            }
            if let Some(mut lag_stats) = entity_mut.get_mut::<LagStats>() {
                lag_stats.reset();
            }
        });
    }

    fn set_remote_active(&mut self, active: bool) {
        self.queue(move |mut entity_mut: EntityWorldMut| {
            if let Some(mut controller) = entity_mut.get_mut::<RemoteEntityController>() {
                controller.set_active(active);
            }
        });
    }

    fn buffer_remote_state(&mut self, update: PositionUpdate) {
        self.queue(move |mut entity_mut: EntityWorldMut| {
            let Some(now) = entity_mut.world().get_resource::<WallClock>().map(WallClock::now) else {
                error!("buffer_remote_state needs the WallClock resource");
                return;
            };
            let Some(mut controller) = entity_mut.get_mut::<RemoteEntityController>() else {
                return;
            };
            let Some(lag) = controller.buffer_state(update, now) else {
                return;
            };
            if let Some(mut lag_stats) = entity_mut.get_mut::<LagStats>() {
                lag_stats.update_with_new_sample(lag);
            }
        });
    }

    fn end_remote_match(&mut self) {
        self.queue(move |mut entity_mut: EntityWorldMut| {
            if let Some(mut controller) = entity_mut.get_mut::<RemoteEntityController>() {
                controller.end_match();
                controller.set_active(false);
            }
        });
    }
}
