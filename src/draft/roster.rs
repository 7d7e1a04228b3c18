// Roster slot assignment under eligibility and capacity constraints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{LeagueConfig, ModelConfig};
use crate::player::{Player, PlayerId};

/// The bench slot name. The only slot name the engine treats specially:
/// bench assignments contribute to category totals at a reduced weight.
pub const BENCH_SLOT: &str = "BE";

// ---------------------------------------------------------------------------
// Assignment output
// ---------------------------------------------------------------------------

/// One (slot, player) pairing produced by the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterAssignment {
    pub slot: String,
    pub player_id: PlayerId,
}

/// The result of assigning a team's drafted players to roster slots.
/// Not persisted; recomputed on every roster change.
#[derive(Debug, Clone, Default)]
pub struct RosterResult {
    pub assignments: Vec<RosterAssignment>,
    /// Remaining capacity per slot after assignment.
    pub remaining: BTreeMap<String, usize>,
    /// Players no eligible slot could hold. Reported, never dropped.
    pub overflow: Vec<PlayerId>,
}

impl RosterResult {
    /// Whether the given player ended up on the bench (or overflowed).
    pub fn is_bench(&self, player_id: PlayerId) -> bool {
        if self.overflow.contains(&player_id) {
            return true;
        }
        self.assignments
            .iter()
            .any(|a| a.player_id == player_id && a.slot == BENCH_SLOT)
    }

    /// Count of filled non-bench slots.
    pub fn starters(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.slot != BENCH_SLOT)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Slot eligibility
// ---------------------------------------------------------------------------

/// A player's eligible slots in most-restrictive-first order, deduplicated.
///
/// Derived from the league's externally authored position -> slots map;
/// positions the league does not map contribute nothing.
pub fn eligible_slots(player: &Player, league: &LeagueConfig) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ordered = Vec::new();
    for position in player.positions() {
        if let Some(slots) = league.position_slots.get(&position) {
            for slot in slots {
                if seen.insert(slot.clone()) {
                    ordered.push(slot.clone());
                }
            }
        }
    }
    ordered
}

/// Whether the player fills a slot other than the bench given the remaining
/// capacities. Bench fit never counts as a starting need.
pub fn has_starting_need(
    player: &Player,
    remaining: &BTreeMap<String, usize>,
    league: &LeagueConfig,
) -> bool {
    eligible_slots(player, league)
        .iter()
        .any(|slot| slot != BENCH_SLOT && remaining.get(slot).copied().unwrap_or(0) > 0)
}

/// Whether any eligible slot (bench included) still has capacity.
pub fn can_fit(
    player: &Player,
    remaining: &BTreeMap<String, usize>,
    league: &LeagueConfig,
) -> bool {
    eligible_slots(player, league)
        .iter()
        .any(|slot| remaining.get(slot).copied().unwrap_or(0) > 0)
}

// ---------------------------------------------------------------------------
// Greedy assignment
// ---------------------------------------------------------------------------

/// Assign a team's drafted players to roster slots.
///
/// Greedy most-constrained-first: players with the fewest eligible slots
/// place first, each into their first eligible slot with remaining capacity
/// (the position map orders slots most restrictive first, bench last).
/// Equal-constraint players keep their input (pick) order, so the result is
/// deterministic and stable. Not globally optimal in every multi-position
/// tangle, but cheap enough to recompute on every change.
pub fn assign_roster(players: &[&Player], league: &LeagueConfig) -> RosterResult {
    let mut remaining: BTreeMap<String, usize> = league
        .roster
        .iter()
        .map(|(slot, &cap)| (slot.clone(), cap))
        .collect();

    let mut ordered: Vec<(&Player, Vec<String>)> = players
        .iter()
        .map(|p| (*p, eligible_slots(p, league)))
        .collect();
    ordered.sort_by_key(|(_, slots)| slots.len());

    let mut assignments = Vec::with_capacity(players.len());
    let mut overflow = Vec::new();

    for (player, slots) in ordered {
        let placed = slots.iter().find(|slot| {
            remaining
                .get(slot.as_str())
                .copied()
                .unwrap_or(0)
                > 0
        });
        match placed {
            Some(slot) => {
                if let Some(cap) = remaining.get_mut(slot.as_str()) {
                    *cap -= 1;
                }
                assignments.push(RosterAssignment {
                    slot: slot.clone(),
                    player_id: player.id,
                });
            }
            None => overflow.push(player.id),
        }
    }

    RosterResult {
        assignments,
        remaining,
        overflow,
    }
}

/// Category-total weight of an assigned slot: starters count fully, bench
/// players at the configured reduced rate. Pitchers keep streaming value on
/// the bench; hitters mostly sit.
pub fn slot_weight(slot: &str, is_pitcher: bool, model: &ModelConfig) -> f64 {
    if slot == BENCH_SLOT {
        if is_pitcher {
            model.pitcher_bench_contribution
        } else {
            model.hitter_bench_contribution
        }
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
