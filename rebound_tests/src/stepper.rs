use bevy::MinimalPlugins;
use bevy::platform::time::Instant;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use core::time::Duration;
use rebound::prelude::*;
use rebound_core::time::timestamp_from_millis;

/// Wall-clock time at which every stepper starts, in milliseconds since the unix epoch
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// Stepper with one App containing:
/// - a remote entity with a [`RemoteEntityController`]
/// - a local player entity
/// - a [`MatchSession`] whose [`InboundQueue`] and [`OutboundQueue`] play the role of the transport
///
/// Both the simulation time and the [`WallClock`] advance by `frame_duration` every frame.
pub struct Stepper {
    pub app: App,
    pub session: Entity,
    pub remote: Entity,
    pub local: Entity,
    pub sender: InboundSender,
    pub outbound: OutboundQueue,
    pub frame_duration: Duration,
    pub tick_duration: Duration,
    pub current_time: Instant,
}

impl Default for Stepper {
    fn default() -> Self {
        Self::with_config(ReconciliationConfig::default())
    }
}

impl Stepper {
    pub fn with_config(config: ReconciliationConfig) -> Self {
        let tick_duration = Duration::from_millis(20);
        let mut stepper = Self::new(tick_duration, tick_duration, config);
        stepper.init();
        stepper
    }

    pub fn new(tick_duration: Duration, frame_duration: Duration, config: ReconciliationConfig) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(ReboundPlugins {
            tick_duration,
            config,
            ..default()
        });
        app.insert_resource(WallClock::manual_from_millis(START_MILLIS));
        app.finish();
        app.cleanup();

        let remote = app.world_mut().spawn(RemoteEntityController::new()).id();
        let local = app.world_mut().spawn(Transform::default()).id();
        let session = app
            .world_mut()
            .spawn(MatchSession::new(remote).with_local(local))
            .id();
        let sender = app
            .world()
            .get::<InboundQueue>(session)
            .map(InboundQueue::sender)
            .expect("the session requires an InboundQueue");
        let outbound = app
            .world()
            .get::<OutboundQueue>(session)
            .cloned()
            .expect("the session requires an OutboundQueue");

        Self {
            app,
            session,
            remote,
            local,
            sender,
            outbound,
            frame_duration,
            tick_duration,
            current_time: Instant::now(),
        }
    }

    pub(crate) fn init(&mut self) {
        // Initialize Real time (needed only for the first TimeSystem run)
        let now = Instant::now();
        self.current_time = now;
        self.app
            .world_mut()
            .get_resource_mut::<Time<Real>>()
            .unwrap()
            .update_with_instant(now);
    }

    pub fn advance_time(&mut self, duration: Duration) {
        self.current_time += duration;
        self.app
            .insert_resource(TimeUpdateStrategy::ManualInstant(self.current_time));
        self.app.world_mut().resource_mut::<WallClock>().advance(duration);
    }

    /// Advance the world by `n` frames
    pub fn frame_step(&mut self, n: usize) {
        for _ in 0..n {
            self.advance_time(self.frame_duration);
            let elapsed = self.fixed_elapsed() + self.frame_duration;
            info!(?elapsed, "Frame step");
            self.app.update();
        }
    }

    pub fn fixed_elapsed(&self) -> Duration {
        self.app.world().resource::<Time<Fixed>>().elapsed()
    }

    pub fn wall_now(&self) -> Timestamp {
        self.app.world().resource::<WallClock>().now()
    }

    pub fn controller(&self) -> &RemoteEntityController {
        self.app
            .world()
            .get::<RemoteEntityController>(self.remote)
            .unwrap()
    }

    pub fn remote_position(&self) -> Vec3 {
        self.app.world().get::<Transform>(self.remote).unwrap().translation
    }

    pub fn remote_velocity(&self) -> Vec3 {
        self.app.world().get::<LinearVelocity>(self.remote).unwrap().0
    }

    pub fn local_position(&self) -> Vec3 {
        self.app.world().get::<Transform>(self.local).unwrap().translation
    }

    pub fn lag_stats(&self) -> &LagStats {
        self.app.world().get::<LagStats>(self.remote).unwrap()
    }

    pub fn session(&self) -> &MatchSession {
        self.app.world().get::<MatchSession>(self.session).unwrap()
    }

    pub fn status_line(&self) -> &StatusLine {
        self.app.world().resource::<StatusLine>()
    }

    /// Push a raw frame, as the transport would
    pub fn push_frame(&self, frame: impl Into<String>) {
        assert!(self.sender.push(frame));
    }

    /// Push the message announcing that the match started
    pub fn start_match(&self, player: PlayerSlot, local_spawn: Vec3, remote_spawn: Vec3) {
        let mut message = GameMessage::new(Opcode::Playing.as_str());
        message.uuid = Some("test-match".into());
        message.player = Some(player.as_str().into());
        message.velocity = Some(local_spawn.into());
        message.enemy_velocity = Some(remote_spawn.into());
        self.push_frame(serde_json::to_string(&message).unwrap());
    }

    /// Push an opponent velocity update whose lag, measured when the next frame ingests it, is `lag`
    pub fn send_velocity(&self, sequence: u32, velocity: Vec3, position: Vec3, lag: Duration) {
        let ingested_at = self.wall_now().timestamp_millis() + self.frame_duration.as_millis() as i64;
        let sent_at = timestamp_from_millis(ingested_at - lag.as_millis() as i64).unwrap();
        let frame = encode_velocity(&OutboundVelocity {
            match_id: self.session().match_id.clone(),
            sequence: Sequence(sequence),
            velocity,
            current_position: position,
            sent_at,
        })
        .unwrap();
        self.push_frame(frame);
    }

    /// Send the local player's velocity through the session, as the input handling would
    pub fn send_local_velocity(&mut self, velocity: Vec3) -> Result<Sequence, SessionError> {
        let now = self.wall_now();
        let position = self.local_position();
        let outbound = self.outbound.clone();
        self.app
            .world_mut()
            .get_mut::<MatchSession>(self.session)
            .unwrap()
            .send_velocity(&outbound, velocity, position, now)
    }

    pub fn send_outcome(&self, outcome: MatchOutcome) {
        let opcode = match outcome {
            MatchOutcome::Won => Opcode::YouWon,
            MatchOutcome::Lost => Opcode::YouLost,
        };
        self.push_frame(serde_json::to_string(&GameMessage::new(opcode.as_str())).unwrap());
    }
}
