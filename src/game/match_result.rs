//! Match result and ranking
//!
//! Computes final standings once a match finishes.

use serde::Serialize;

use crate::game::state::{AgentId, ControlKind, GameState, MatchPhase};
use crate::util::clock::TimeMs;

/// Final standings of one match
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub winner_id: Option<AgentId>,
    pub winner_name: Option<String>,
    pub reason: MatchEndReason,
    pub rankings: Vec<AgentRanking>,
    pub duration_ms: u64,
    pub total_kills: u32,
}

/// One agent's place in the standings
#[derive(Debug, Clone, Serialize)]
pub struct AgentRanking {
    pub agent_id: AgentId,
    pub name: String,
    pub rank: u32,
    pub kills: u32,
    pub survived: bool,
    pub eliminated_at: Option<TimeMs>,
    pub is_bot: bool,
}

/// Why a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchEndReason {
    /// Exactly one agent left alive
    LastAgentStanding,
    /// The final agents went down together
    NoSurvivors,
    /// Stopped by the host
    Stopped,
}

/// Check whether an active match should end
pub fn check_match_end(state: &GameState) -> Option<MatchEndReason> {
    if state.match_state.phase != MatchPhase::Active {
        return None;
    }

    match state.alive_count() {
        0 => Some(MatchEndReason::NoSurvivors),
        1 => Some(MatchEndReason::LastAgentStanding),
        _ => None,
    }
}

/// Build standings from the current state
///
/// Survivors first, then by later elimination, then by kills.
pub fn determine_result(state: &GameState, reason: MatchEndReason, now: TimeMs) -> MatchResult {
    let mut rankings: Vec<AgentRanking> = state
        .agents
        .iter()
        .map(|a| AgentRanking {
            agent_id: a.id,
            name: a.name.clone(),
            rank: 0,
            kills: a.kills,
            survived: a.is_alive(),
            eliminated_at: a.eliminated_at,
            is_bot: a.control == ControlKind::Bot,
        })
        .collect();

    rankings.sort_by(|a, b| {
        b.survived
            .cmp(&a.survived)
            .then_with(|| b.eliminated_at.cmp(&a.eliminated_at))
            .then_with(|| b.kills.cmp(&a.kills))
    });

    for (i, ranking) in rankings.iter_mut().enumerate() {
        ranking.rank = (i + 1) as u32;
    }

    let total_kills = rankings.iter().map(|r| r.kills).sum();

    let winner = match reason {
        MatchEndReason::LastAgentStanding => rankings.first().filter(|r| r.survived),
        _ => None,
    };

    MatchResult {
        winner_id: winner.map(|r| r.agent_id),
        winner_name: winner.map(|r| r.name.clone()),
        reason,
        rankings,
        duration_ms: state
            .match_state
            .started_at
            .map_or(0, |start| now.saturating_sub(start)),
        total_kills,
    }
}
