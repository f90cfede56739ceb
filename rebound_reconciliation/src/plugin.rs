use crate::config::ReconciliationConfig;
use crate::controller::{ApplyOutcome, RemoteEntityController};
use crate::drift::DriftStep;
use crate::governor::speed_governor_system;
use crate::physics::LinearVelocity;
use bevy_app::{App, FixedUpdate, Plugin, Update};
use bevy_ecs::prelude::*;
use bevy_time::{Fixed, Time};
use bevy_transform::components::Transform;
use tracing::trace;

/// Plugin that reconciles every entity carrying a [`RemoteEntityController`]
#[derive(Default)]
pub struct ReconciliationPlugin {
    pub config: ReconciliationConfig,
}

/// Order of the reconciliation systems within a fixed tick
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum ReconciliationSystems {
    /// Move received updates into the controllers' buffers
    Ingest,
    /// Apply at most one buffered update per entity
    ApplyUpdates,
    /// Clamp the speed of remote entities. Also runs in `Update`.
    GovernSpeed,
    /// Integrate velocities into positions
    Integrate,
    /// Advance drift checks; corrections overwrite the integrated position
    CorrectDrift,
}

pub(crate) fn apply_updates_system(
    global: Res<ReconciliationConfig>,
    time: Res<Time<Fixed>>,
    mut query: Query<(Entity, &mut RemoteEntityController, &mut LinearVelocity)>,
) {
    let sim_now = time.elapsed();
    query
        .iter_mut()
        .for_each(|(entity, mut controller, mut velocity)| {
            let config = controller.config(&global).clone();
            let mut new_velocity = velocity.0;
            let outcome = controller.apply_next_update(&mut new_velocity, sim_now, &config);
            if let ApplyOutcome::Applied(sequence) = outcome {
                trace!(?entity, ?sequence, velocity = ?new_velocity, "applied remote update");
                velocity.0 = new_velocity;
            }
        });
}

pub(crate) fn correct_drift_system(
    global: Res<ReconciliationConfig>,
    time: Res<Time<Fixed>>,
    mut query: Query<(Entity, &mut RemoteEntityController, &mut Transform)>,
) {
    let sim_now = time.elapsed();
    query
        .iter_mut()
        .filter(|(_, controller, _)| controller.drift().is_active())
        .for_each(|(entity, mut controller, mut transform)| {
            let config = controller.config(&global).clone();
            let mut position = transform.translation;
            let step = controller.correct_drift(&mut position, sim_now, &config);
            if matches!(
                step,
                DriftStep::CorrectionStarted { .. }
                    | DriftStep::Correcting { .. }
                    | DriftStep::CorrectionFinished
            ) {
                trace!(?entity, ?step, ?position, "correcting remote entity drift");
                transform.translation = position;
            }
        });
}

impl Plugin for ReconciliationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone());
        app.register_type::<ReconciliationConfig>();

        // FixedUpdate systems
        // 1. Drain inbound updates into the buffers
        // 2. Apply the next update of each entity as a velocity change
        // 3. Clamp the resulting speed
        // 4. Integrate
        // 5. Compare with the reported position once the lag has elapsed, and blend towards it
        app.configure_sets(
            FixedUpdate,
            (
                ReconciliationSystems::Ingest,
                ReconciliationSystems::ApplyUpdates,
                ReconciliationSystems::GovernSpeed,
                ReconciliationSystems::Integrate,
                ReconciliationSystems::CorrectDrift,
            )
                .chain(),
        );
        app.add_systems(
            FixedUpdate,
            (
                apply_updates_system.in_set(ReconciliationSystems::ApplyUpdates),
                speed_governor_system.in_set(ReconciliationSystems::GovernSpeed),
                correct_drift_system.in_set(ReconciliationSystems::CorrectDrift),
            ),
        );
        // the governor also runs every frame, to catch velocity changes made outside the fixed loop
        app.add_systems(
            Update,
            speed_governor_system.in_set(ReconciliationSystems::GovernSpeed),
        );
    }
}
