//! Match end detection and the final outcome report.

use crate::game::state::WorldState;
use crate::game::types::EntityId;

/// Final report of a completed match.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub winner: Option<EntityId>,
    pub winner_weapon: Option<String>,
    /// Simulated duration in seconds
    pub duration: f32,
    /// Frames recorded
    pub frames: u64,
    pub survivors: usize,
}

/// Reason why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEndReason {
    /// Only one team remains
    LastTeamStanding,
    /// Simulated duration limit reached with several teams alive
    TimeLimit,
}

/// Check whether the match should end.
pub fn check_match_end(state: &WorldState, elapsed: f32, max_seconds: f32) -> Option<MatchEndReason> {
    if state.alive_teams() <= 1 {
        return Some(MatchEndReason::LastTeamStanding);
    }
    if elapsed >= max_seconds {
        return Some(MatchEndReason::TimeLimit);
    }
    None
}
