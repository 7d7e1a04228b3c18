// Value Over Next Available: the cost of waiting one more turn.
//
// The naive version compares a candidate against the next-ranked player at
// the position. That overstates the penalty: the next player may well be
// gone by your next turn, and the one after may not. The window version
// computes the *expected* value of the best alternative actually still on
// the board at your next pick, using the availability model.

use std::collections::HashMap;

use crate::player::{Player, PlayerId, PlayerPool};
use crate::valuation::availability::{availability, AvailabilityCurve};
use crate::valuation::normalize::NormalizedPool;

/// Probability mass below which further alternatives cannot matter.
const RESIDUAL_MASS_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Positional rankings
// ---------------------------------------------------------------------------

/// Undrafted players grouped by position code, each list sorted descending
/// by normalized value. Hitters appear under every eligible position;
/// pitchers only under their classified role.
#[derive(Debug, Clone, Default)]
pub struct PositionRankings {
    by_position: HashMap<String, Vec<(PlayerId, f64)>>,
}

impl PositionRankings {
    pub fn build(undrafted: &[&Player], normalized: &NormalizedPool) -> Self {
        let mut by_position: HashMap<String, Vec<(PlayerId, f64)>> = HashMap::new();
        for player in undrafted {
            let value = normalized.value(player.id).unwrap_or(0.0);
            for position in player.positions() {
                by_position
                    .entry(position)
                    .or_default()
                    .push((player.id, value));
            }
        }
        for ranked in by_position.values_mut() {
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        }
        PositionRankings { by_position }
    }

    /// Ranked (player, value) pairs at a position; empty when the position
    /// has no remaining players.
    pub fn at(&self, position: &str) -> &[(PlayerId, f64)] {
        self.by_position
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn positions(&self) -> impl Iterator<Item = &str> {
        self.by_position.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// VONA computation
// ---------------------------------------------------------------------------

/// Everything the VONA walk needs about the current draft moment.
pub struct VonaContext<'a> {
    pub pool: &'a PlayerPool,
    pub rankings: &'a PositionRankings,
    pub curve: &'a dyn AvailabilityCurve,
    pub current_pick: usize,
    pub picks_until_mine: u32,
}

/// Expected normalized value of the best alternative to `candidate` still
/// available at the evaluating team's next pick.
///
/// Alternatives are walked in descending value order; each contributes
/// `value x P(available) x P(every better alternative is gone)`. Once the
/// better-all-gone mass is exhausted, later alternatives cannot be the
/// realized replacement and the walk stops.
pub fn expected_replacement(
    ctx: &VonaContext<'_>,
    candidate_id: PlayerId,
    position: &str,
) -> f64 {
    let mut expected = 0.0;
    let mut p_better_gone = 1.0;

    for (alt_id, alt_value) in ctx.rankings.at(position) {
        if *alt_id == candidate_id {
            continue;
        }
        let Some(alt) = ctx.pool.get(*alt_id) else {
            continue;
        };
        let p_avail = availability(alt, ctx.current_pick, ctx.picks_until_mine, ctx.curve);
        expected += alt_value * p_avail * p_better_gone;
        p_better_gone *= 1.0 - p_avail;
        if p_better_gone < RESIDUAL_MASS_EPSILON {
            break;
        }
    }

    expected
}

/// Window VONA at one position: candidate value minus the expected realized
/// replacement. With no alternatives this degenerates to the candidate's
/// own value (the position empties behind them).
pub fn window_vona(
    ctx: &VonaContext<'_>,
    candidate: &Player,
    candidate_value: f64,
    position: &str,
) -> f64 {
    candidate_value - expected_replacement(ctx, candidate.id, position)
}

/// A player's overall VONA: the maximum window VONA across their eligible
/// positions. Pitchers evaluate only their classified role (their
/// `positions()` is role-only).
pub fn compute_vona(ctx: &VonaContext<'_>, candidate: &Player, candidate_value: f64) -> f64 {
    let mut best = f64::NEG_INFINITY;
    for position in candidate.positions() {
        best = best.max(window_vona(ctx, candidate, candidate_value, &position));
    }
    if best.is_finite() {
        best
    } else {
        candidate_value
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
