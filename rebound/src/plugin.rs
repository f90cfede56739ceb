use crate::session::ingest_system;
use crate::status::{StatusLine, status_line_system};
use bevy_app::{App, FixedUpdate, Plugin, PluginGroup, PluginGroupBuilder, Update};
use bevy_ecs::prelude::*;
use core::time::Duration;
use rebound_core::plugin::{CorePlugins, DEFAULT_TICK_DURATION};
use rebound_reconciliation::prelude::{
    KinematicIntegrationPlugin, ReconciliationConfig, ReconciliationPlugin, ReconciliationSystems,
};

/// All the plugins needed to reconcile remote entities
pub struct ReboundPlugins {
    /// Duration of a simulation tick. The default value is 20ms.
    pub tick_duration: Duration,
    pub config: ReconciliationConfig,
    /// Move entities with the built-in kinematic integrator. Disable it if a physics engine
    /// integrates [`LinearVelocity`](rebound_reconciliation::prelude::LinearVelocity) instead.
    pub integrate: bool,
}

impl Default for ReboundPlugins {
    fn default() -> Self {
        Self {
            tick_duration: DEFAULT_TICK_DURATION,
            config: ReconciliationConfig::default(),
            integrate: true,
        }
    }
}

impl PluginGroup for ReboundPlugins {
    #[allow(clippy::let_and_return)]
    fn build(self) -> PluginGroupBuilder {
        let builder = PluginGroupBuilder::start::<Self>()
            .add(CorePlugins {
                tick_duration: self.tick_duration,
            })
            .add(ReconciliationPlugin {
                config: self.config,
            })
            .add(SessionPlugin);

        let builder = if self.integrate {
            builder.add(KinematicIntegrationPlugin)
        } else {
            builder
        };

        builder
    }
}

/// Decodes inbound frames and drives the match lifecycle of every [`MatchSession`](crate::session::MatchSession)
pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StatusLine>();
        app.add_systems(
            FixedUpdate,
            ingest_system.in_set(ReconciliationSystems::Ingest),
        );
        app.add_systems(Update, status_line_system);
    }
}
