use crate::stepper::Stepper;
use bevy::prelude::*;
use core::time::Duration;
use rebound::prelude::*;
use rebound::status::{PLAYING, WAITING_ON_MATCH, YOU_LOST};
use test_log::test;

#[test]
fn test_match_start_spawns_both_players() {
    let mut stepper = Stepper::default();
    stepper.push_frame(r#"{"action": "OnMessage", "opcode": "0", "uuid": "m-1"}"#);
    stepper.frame_step(1);
    assert_eq!(stepper.session().phase(), MatchPhase::WaitingForOpponent);
    assert_eq!(stepper.session().match_id.as_deref(), Some("m-1"));
    assert!(!stepper.controller().is_participating());

    let local_spawn = Vec3::new(0.0, 1.0, -5.0);
    let remote_spawn = Vec3::new(0.0, 1.0, 5.0);
    stepper.start_match(PlayerSlot::Two, local_spawn, remote_spawn);
    stepper.frame_step(1);

    let session = stepper.session();
    assert!(session.is_playing());
    assert_eq!(session.slot, Some(PlayerSlot::Two));
    assert_eq!(session.opponent_slot(), Some(PlayerSlot::One));
    assert_eq!(stepper.local_position(), local_spawn);
    assert_eq!(stepper.remote_position(), remote_spawn);
    assert!(stepper.controller().is_participating());

    let status = stepper.status_line();
    assert_eq!(status.status, PLAYING);
    assert_eq!(status.local, "P2 (You): (0.00, 1.00, -5.00)");
    assert_eq!(status.remote, "P1: (0.00, 1.00, 5.00)");
}

#[test]
fn test_updates_before_match_are_dropped() {
    let mut stepper = Stepper::default();
    assert_eq!(stepper.status_line().status, WAITING_ON_MATCH);
    stepper.send_velocity(0, Vec3::X, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(1);
    assert!(stepper.controller().buffer().is_empty());

    stepper.start_match(PlayerSlot::One, Vec3::ZERO, Vec3::ZERO);
    stepper.send_velocity(0, Vec3::X, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(1);
    assert_eq!(stepper.controller().cursor(), Sequence(1));
}

#[test]
fn test_malformed_frames_never_reach_the_controller() {
    let mut stepper = Stepper::default();
    stepper.start_match(PlayerSlot::One, Vec3::ZERO, Vec3::ZERO);
    stepper.frame_step(1);

    stepper.push_frame("not json");
    stepper.push_frame(r#"{"opcode": "42"}"#);
    // movement without a sequence number
    stepper.push_frame(
        r#"{"opcode": "21", "velocity": {"x": "1", "y": "0", "z": "0"}, "currentPos": {"x": "0", "y": "0", "z": "0"}}"#,
    );
    stepper.push_frame(
        r#"{"opcode": "21", "seq": 0, "velocity": {"x": "abc", "y": "0", "z": "0"}, "currentPos": {"x": "0", "y": "0", "z": "0"}}"#,
    );
    stepper.send_velocity(0, Vec3::X, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(1);

    let stats = stepper.controller().stats();
    assert_eq!(stats.buffered, 1);
    assert_eq!(stats.applied, 1);
    assert_eq!(stepper.remote_velocity(), Vec3::X);
}

#[test]
fn test_outcome_ends_the_match() {
    let mut stepper = Stepper::default();
    stepper.start_match(PlayerSlot::One, Vec3::ZERO, Vec3::ZERO);
    stepper.send_velocity(0, Vec3::X, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(1);
    let frozen_at = stepper.remote_position();

    stepper.send_outcome(MatchOutcome::Lost);
    stepper.send_velocity(1, Vec3::X, Vec3::ZERO, Duration::ZERO);
    stepper.frame_step(5);

    assert_eq!(stepper.session().phase(), MatchPhase::Finished(MatchOutcome::Lost));
    assert_eq!(stepper.status_line().status, YOU_LOST);
    assert!(!stepper.controller().is_participating());
    assert!(!stepper.controller().is_active());
    // updates after the outcome are dropped and the entity no longer moves
    assert_eq!(stepper.controller().cursor(), Sequence(1));
    assert_eq!(stepper.remote_position(), frozen_at);
}

#[test]
fn test_lag_statistics_follow_accepted_updates() {
    let mut stepper = Stepper::default();
    stepper.start_match(PlayerSlot::One, Vec3::ZERO, Vec3::ZERO);
    stepper.frame_step(1);

    stepper.send_velocity(0, Vec3::ZERO, Vec3::ZERO, Duration::from_millis(80));
    stepper.frame_step(1);
    assert_eq!(stepper.lag_stats().samples(), 1);
    assert_eq!(stepper.lag_stats().lag(), Duration::from_millis(80));

    // updates that were already applied are not counted
    stepper.send_velocity(0, Vec3::ZERO, Vec3::ZERO, Duration::from_millis(500));
    stepper.frame_step(1);
    assert_eq!(stepper.lag_stats().samples(), 1);

    stepper.send_velocity(1, Vec3::ZERO, Vec3::ZERO, Duration::from_millis(40));
    stepper.frame_step(1);
    assert_eq!(stepper.lag_stats().samples(), 2);
    assert_eq!(stepper.lag_stats().last_sample(), Duration::from_millis(40));
    assert!(stepper.lag_stats().lag() < Duration::from_millis(80));
    assert!(stepper.lag_stats().lag() > Duration::from_millis(40));
}

#[test]
fn test_transport_pushes_from_another_thread() {
    let mut stepper = Stepper::default();
    stepper.start_match(PlayerSlot::One, Vec3::ZERO, Vec3::ZERO);
    stepper.frame_step(1);

    let frames: Vec<String> = (0..5u32)
        .rev()
        .map(|seq| {
            encode_velocity(&OutboundVelocity {
                match_id: None,
                sequence: Sequence(seq),
                velocity: Vec3::ZERO,
                current_position: Vec3::ZERO,
                sent_at: stepper.wall_now(),
            })
            .unwrap()
        })
        .collect();
    let sender = stepper.sender.clone();
    std::thread::spawn(move || {
        for frame in frames {
            sender.push(frame);
        }
    })
    .join()
    .unwrap();

    stepper.frame_step(5);
    assert_eq!(stepper.controller().cursor(), Sequence(5));
}

#[test]
fn test_outbound_sequence_restarts_with_each_match() {
    let mut stepper = Stepper::default();
    assert!(matches!(
        stepper.send_local_velocity(Vec3::X),
        Err(SessionError::NotPlaying(MatchPhase::Searching))
    ));

    stepper.start_match(PlayerSlot::One, Vec3::ZERO, Vec3::ZERO);
    stepper.frame_step(1);
    for expected in 0..3 {
        assert_eq!(stepper.send_local_velocity(Vec3::X).unwrap(), Sequence(expected));
    }
    let sequences: Vec<Option<i64>> = stepper
        .outbound
        .drain()
        .iter()
        .map(|frame| serde_json::from_str::<GameMessage>(frame).unwrap().seq)
        .collect();
    assert_eq!(sequences, vec![Some(0), Some(1), Some(2)]);

    // a new match numbers its updates from 0 again
    stepper.start_match(PlayerSlot::Two, Vec3::ZERO, Vec3::ZERO);
    stepper.frame_step(1);
    assert_eq!(stepper.send_local_velocity(Vec3::X).unwrap(), Sequence::ZERO);

    stepper.send_outcome(MatchOutcome::Won);
    stepper.frame_step(1);
    assert!(matches!(
        stepper.send_local_velocity(Vec3::X),
        Err(SessionError::NotPlaying(MatchPhase::Finished(MatchOutcome::Won)))
    ));
    assert_eq!(stepper.outbound.len(), 1);
}
