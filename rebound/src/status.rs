//! On-screen debug line showing the match status and both players' positions
use crate::session::{MatchPhase, MatchSession};
use alloc::format;
use alloc::string::String;
use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_transform::components::Transform;
use rebound_messages::prelude::{MatchOutcome, PlayerSlot};

pub const WAITING_ON_MATCH: &str = "Waiting on match...";
pub const PLAYING: &str = "Match found. Playing!";
pub const YOU_WON: &str = "You Won!";
pub const YOU_LOST: &str = "You Lost!";

/// Text shown by the debug overlay, refreshed every frame
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub status: &'static str,
    /// e.g. `P1 (You): (0.00, 1.00, -5.00)`
    pub local: String,
    /// e.g. `P2: (0.00, 1.00, 5.00)`
    pub remote: String,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            status: WAITING_ON_MATCH,
            local: String::from("p1"),
            remote: String::from("p2"),
        }
    }
}

impl StatusLine {
    pub fn status_text(phase: MatchPhase) -> &'static str {
        match phase {
            MatchPhase::Searching | MatchPhase::WaitingForOpponent => WAITING_ON_MATCH,
            MatchPhase::Playing => PLAYING,
            MatchPhase::Finished(MatchOutcome::Won) => YOU_WON,
            MatchPhase::Finished(MatchOutcome::Lost) => YOU_LOST,
        }
    }

    pub fn local_line(slot: PlayerSlot, position: Vec3) -> String {
        format!("P{slot} (You): {}", format_position(position))
    }

    pub fn remote_line(slot: PlayerSlot, position: Vec3) -> String {
        format!("P{slot}: {}", format_position(position))
    }
}

fn format_position(position: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", position.x, position.y, position.z)
}

pub(crate) fn status_line_system(
    mut status_line: ResMut<StatusLine>,
    sessions: Query<&MatchSession>,
    transforms: Query<&Transform>,
) {
    let Ok(session) = sessions.single() else {
        return;
    };
    let slot = session.slot.unwrap_or(PlayerSlot::One);
    let mut next = StatusLine {
        status: StatusLine::status_text(session.phase()),
        ..status_line.clone()
    };
    if let Some(transform) = session.local.and_then(|local| transforms.get(local).ok()) {
        next.local = StatusLine::local_line(slot, transform.translation);
    }
    if let Ok(transform) = transforms.get(session.remote) {
        next.remote = StatusLine::remote_line(slot.opponent(), transform.translation);
    }
    status_line.set_if_neq(next);
}
