use crate::stepper::Stepper;
use approx::assert_relative_eq;
use bevy::prelude::*;
use core::time::Duration;
use rebound::prelude::*;
use rebound_core::time::timestamp_from_millis;
use test_log::test;

/// Config where the drift check never corrects, to observe the application loop alone
fn no_correction() -> ReconciliationConfig {
    ReconciliationConfig::default().with_drift_threshold(f32::MAX)
}

fn started(config: ReconciliationConfig) -> Stepper {
    let mut stepper = Stepper::with_config(config);
    stepper.start_match(PlayerSlot::One, Vec3::new(0.0, 1.0, -5.0), Vec3::ZERO);
    stepper.frame_step(1);
    assert!(stepper.controller().is_participating());
    stepper
}

#[test]
fn test_out_of_order_updates_are_applied_in_order() {
    let mut stepper = started(no_correction());
    for seq in [1, 0, 2] {
        stepper.send_velocity(seq, Vec3::X * (seq + 1) as f32, Vec3::ZERO, Duration::ZERO);
    }

    // one update per tick, in sequence order
    let mut velocities = Vec::new();
    for expected_cursor in 1..=3 {
        stepper.frame_step(1);
        assert_eq!(stepper.controller().cursor(), Sequence(expected_cursor));
        velocities.push(stepper.remote_velocity().x);
    }
    assert_eq!(velocities, vec![1.0, 3.0, 6.0]);
    assert!(stepper.controller().buffer().is_empty());
    assert_eq!(stepper.controller().stats().applied, 3);

    // the entity moved with the accumulated velocity over the 3 ticks
    assert_relative_eq!(stepper.remote_position().x, (1.0 + 3.0 + 6.0) * 0.02, epsilon = 1e-5);
}

#[test]
fn test_missing_update_stalls_until_it_arrives() {
    let mut stepper = started(no_correction());
    for seq in (0..=10).filter(|s| *s != 5) {
        stepper.send_velocity(seq, Vec3::ZERO, Vec3::ZERO, Duration::ZERO);
    }
    stepper.frame_step(20);
    assert_eq!(stepper.controller().cursor(), Sequence(5));
    assert_eq!(stepper.controller().buffer().len(), 5);
    assert_eq!(stepper.controller().buffer().highest_sequence(), Some(Sequence(10)));

    stepper.send_velocity(5, Vec3::ZERO, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(6);
    assert_eq!(stepper.controller().cursor(), Sequence(11));
    assert!(stepper.controller().buffer().is_empty());
}

#[test]
fn test_skip_after_backlog_recovers_from_lost_update() {
    let mut stepper =
        started(no_correction().with_catch_up(CatchUpPolicy::SkipAfter { backlog: 3 }));
    for seq in [0, 2, 3, 4] {
        stepper.send_velocity(seq, Vec3::ZERO, Vec3::ZERO, Duration::ZERO);
    }
    stepper.frame_step(5);
    assert_eq!(stepper.controller().cursor(), Sequence(5));
    assert_eq!(stepper.controller().stats().skipped, 1);
}

#[test]
fn test_duplicate_delivery_is_ignored() {
    let mut stepper = started(no_correction());
    stepper.send_velocity(0, Vec3::X, Vec3::ZERO, Duration::ZERO);
    stepper.send_velocity(0, Vec3::X, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(2);
    assert_eq!(stepper.controller().stats().duplicates, 1);
    assert_eq!(stepper.controller().stats().applied, 1);
    assert_eq!(stepper.remote_velocity(), Vec3::X);

    // a late copy of an applied update is stale
    stepper.send_velocity(0, Vec3::X, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(1);
    assert_eq!(stepper.controller().stats().stale, 1);
    assert_eq!(stepper.remote_velocity(), Vec3::X);
}

#[test]
fn test_speed_is_clamped() {
    let mut stepper = started(no_correction());
    stepper.send_velocity(0, Vec3::new(30.0, 0.0, 40.0), Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(1);
    let velocity = stepper.remote_velocity();
    assert_relative_eq!(velocity.length(), 10.0, epsilon = 1e-4);
    assert_relative_eq!(velocity.x, 6.0, epsilon = 1e-4);
    assert_relative_eq!(velocity.z, 8.0, epsilon = 1e-4);
    // the clamped velocity is the one integrated
    assert_relative_eq!(stepper.remote_position().z, 8.0 * 0.02, epsilon = 1e-4);
}

#[test]
fn test_fast_entity_defers_updates() {
    let mut config = no_correction();
    config.max_horizontal_speed_for_apply = 2.0;
    let mut stepper = started(config);
    stepper.send_velocity(0, Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO, Duration::ZERO);
    stepper.send_velocity(1, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(3);

    assert_eq!(stepper.controller().cursor(), Sequence(1));
    assert_eq!(stepper.controller().buffer().len(), 1);
    assert!(stepper.controller().stats().deferred >= 2);
    assert_eq!(stepper.remote_velocity(), Vec3::new(3.0, 0.0, 0.0));
}

#[test]
fn test_drift_within_threshold_is_left_alone() {
    let mut stepper = started(ReconciliationConfig::default());
    // the reported position is 0.3 away from the simulated one
    stepper.send_velocity(0, Vec3::ZERO, Vec3::new(0.3, 0.0, 0.0), Duration::ZERO);
    stepper.frame_step(3);
    assert_eq!(stepper.remote_position(), Vec3::ZERO);
    let stats = stepper.controller().stats();
    assert_eq!(stats.checks_within_threshold, 1);
    assert_eq!(stats.corrections_started, 0);
}

#[test]
fn test_drift_is_corrected_after_lag_over_window() {
    let mut stepper = started(ReconciliationConfig::default());
    let start = stepper.fixed_elapsed();
    let target = Vec3::new(2.0, 0.0, 0.0);
    stepper.send_velocity(0, Vec3::ZERO, target, Duration::from_millis(60));

    // applied on the first tick, compared 60ms later
    stepper.frame_step(3);
    assert_eq!(stepper.fixed_elapsed() - start, Duration::from_millis(60));
    assert!(matches!(stepper.controller().drift().state(), DriftState::Waiting { .. }));
    assert_eq!(stepper.remote_position(), Vec3::ZERO);

    // comparison: the correction starts from the current position
    stepper.frame_step(1);
    assert!(stepper.controller().drift().is_correcting());
    assert_eq!(stepper.remote_position(), Vec3::ZERO);
    assert_eq!(stepper.controller().stats().last_drift, Some(2.0));

    // halfway through the 200ms window
    stepper.frame_step(5);
    assert_relative_eq!(stepper.remote_position().x, 1.0, epsilon = 1e-4);

    // end of the window: exactly on target
    stepper.frame_step(5);
    assert_eq!(stepper.remote_position(), target);
    assert!(!stepper.controller().drift().is_active());
    assert_eq!(stepper.controller().stats().corrections_finished, 1);
}

#[test]
fn test_lag_wait_is_capped() {
    let mut stepper = started(
        ReconciliationConfig {
            max_lag_wait: Duration::from_millis(40),
            ..Default::default()
        }
        .with_drift_threshold(0.5),
    );
    // clock skew makes the update look 10s old
    stepper.send_velocity(0, Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Duration::from_secs(10));
    stepper.frame_step(3);
    assert!(stepper.controller().drift().is_correcting());
}

#[test]
fn test_updates_from_the_future_are_compared_immediately() {
    let mut stepper = started(ReconciliationConfig::default());
    // a sender clock ahead of ours gives a negative lag, which counts as zero
    let ahead = stepper.wall_now().timestamp_millis() + 5_000;
    let frame = encode_velocity(&OutboundVelocity {
        match_id: None,
        sequence: Sequence(0),
        velocity: Vec3::ZERO,
        current_position: Vec3::new(0.0, 0.0, 3.0),
        sent_at: timestamp_from_millis(ahead).unwrap(),
    })
    .unwrap();
    stepper.push_frame(frame);
    stepper.frame_step(1);
    assert_eq!(stepper.lag_stats().last_sample(), Duration::ZERO);
    assert!(stepper.controller().drift().is_correcting());
}

#[test]
fn test_reset_cancels_correction_in_flight() {
    let mut stepper = started(ReconciliationConfig::default());
    stepper.send_velocity(0, Vec3::X, Vec3::new(4.0, 0.0, 0.0), Duration::ZERO);
    stepper.send_velocity(2, Vec3::X, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(4);
    assert!(stepper.controller().drift().is_correcting());

    let spawn = Vec3::new(-3.0, 1.0, 0.0);
    stepper.start_match(PlayerSlot::Two, Vec3::ZERO, spawn);
    stepper.frame_step(1);
    assert_eq!(stepper.controller().drift().state(), &DriftState::Idle);
    assert_eq!(stepper.controller().cursor(), Sequence::ZERO);
    assert!(stepper.controller().buffer().is_empty());
    assert_eq!(stepper.remote_velocity(), Vec3::ZERO);
    assert_eq!(stepper.remote_position(), spawn);

    // nothing from the previous match moves the entity afterwards
    stepper.frame_step(20);
    assert_eq!(stepper.remote_position(), spawn);

    // the new match starts from sequence 0
    stepper.send_velocity(0, Vec3::ZERO, spawn, Duration::ZERO);
    stepper.frame_step(1);
    assert_eq!(stepper.controller().cursor(), Sequence(1));
}

#[test]
fn test_deactivated_entity_keeps_buffer() {
    let mut stepper = started(no_correction());
    let remote = stepper.remote;
    stepper.app.world_mut().commands().entity(remote).set_remote_active(false);
    stepper.app.world_mut().flush();
    stepper.send_velocity(0, Vec3::X, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(3);
    assert_eq!(stepper.controller().cursor(), Sequence::ZERO);
    assert_eq!(stepper.controller().buffer().len(), 1);
    assert_eq!(stepper.remote_position(), Vec3::ZERO);

    stepper.app.world_mut().commands().entity(remote).set_remote_active(true);
    stepper.app.world_mut().flush();
    stepper.frame_step(1);
    assert_eq!(stepper.controller().cursor(), Sequence(1));
}

#[test]
fn test_buffered_time_does_not_delay_drift_check() {
    let mut stepper = started(ReconciliationConfig::default());
    // 1 arrives first and waits 800ms in the buffer for 0
    stepper.send_velocity(1, Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Duration::ZERO);
    stepper.frame_step(40);
    assert_eq!(stepper.controller().buffer().len(), 1);

    stepper.send_velocity(0, Vec3::ZERO, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(1);
    assert_eq!(stepper.controller().cursor(), Sequence(1));
    assert_eq!(stepper.controller().stats().checks_within_threshold, 1);

    // 1 had no transport lag, so it is compared on the tick it is applied
    stepper.frame_step(1);
    assert_eq!(stepper.controller().cursor(), Sequence(2));
    assert!(stepper.controller().drift().is_correcting());
    assert_eq!(stepper.controller().stats().last_drift, Some(2.0));
}

#[test]
fn test_commands_drive_the_remote_entity() {
    let mut stepper = Stepper::default();
    let remote = stepper.remote;
    let spawn = Vec3::new(1.0, 0.0, 1.0);
    stepper.app.world_mut().commands().entity(remote).reset_remote(spawn);
    stepper.app.world_mut().flush();
    assert!(stepper.controller().is_participating());
    assert_eq!(stepper.remote_position(), spawn);

    // the lag is measured when the command is applied
    let sent_at = timestamp_from_millis(stepper.wall_now().timestamp_millis() - 60).unwrap();
    let update = PositionUpdate::new(Sequence(0), Vec3::X, spawn, sent_at);
    stepper.app.world_mut().commands().entity(remote).buffer_remote_state(update);
    stepper.app.world_mut().flush();
    assert_eq!(stepper.controller().buffer().len(), 1);
    assert_eq!(stepper.lag_stats().last_sample(), Duration::from_millis(60));

    stepper.frame_step(1);
    assert_eq!(stepper.controller().cursor(), Sequence(1));
    assert_eq!(stepper.remote_velocity(), Vec3::X);

    stepper.app.world_mut().commands().entity(remote).end_remote_match();
    stepper.app.world_mut().flush();
    assert!(!stepper.controller().is_participating());
    let frozen_at = stepper.remote_position();
    stepper.frame_step(3);
    assert_eq!(stepper.remote_position(), frozen_at);

    // a reset clears the same state as a match start
    stepper.app.world_mut().commands().entity(remote).reset_remote(spawn);
    stepper.app.world_mut().flush();
    assert!(stepper.controller().is_active());
    assert_eq!(stepper.controller().cursor(), Sequence::ZERO);
    assert_eq!(stepper.remote_velocity(), Vec3::ZERO);
    assert_eq!(stepper.remote_position(), spawn);
    assert_eq!(stepper.lag_stats().samples(), 0);
}
