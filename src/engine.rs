// Dependency-ordered recompute pass and the recompute scheduler.
//
// Every derived quantity is a pure function of (config, pool, draft state):
// normalization feeds positional rankings and keeper analysis, roster
// assignment feeds standings, standings feed scores. One pass recomputes
// them in that order with no interior I/O; the host decides when to run it
// via the dirty-flag scheduler below.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::Config;
use crate::draft::roster::{assign_roster, has_starting_need, slot_weight, RosterResult, BENCH_SLOT};
use crate::draft::state::DraftState;
use crate::player::{Player, PlayerId, PlayerPool, TeamId};
use crate::valuation::availability::AvailabilityCurve;
use crate::valuation::normalize::normalize_pool;
use crate::valuation::score::{DraftScorer, PlayerScore};
use crate::valuation::standings::{CategoryTotals, OpponentTotals, StandingsModel};
use crate::valuation::vona::PositionRankings;

// ---------------------------------------------------------------------------
// Output snapshot
// ---------------------------------------------------------------------------

/// One row of the recommendation board.
#[derive(Debug, Clone)]
pub struct BoardEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub positions: Vec<String>,
    pub score: PlayerScore,
}

/// The full derived-valuation snapshot for one draft moment.
#[derive(Debug, Clone)]
pub struct Valuations {
    /// Undrafted players, best overall pick first.
    pub board: Vec<BoardEntry>,
    /// `None` until at least two teams have drafted players.
    pub standings: Option<StandingsModel>,
    /// The evaluating team's current roster assignment.
    pub my_roster: RosterResult,
    pub picks_until_my_turn: u32,
}

// ---------------------------------------------------------------------------
// Recompute pass
// ---------------------------------------------------------------------------

/// Run one full recomputation pass against the current draft state.
pub fn recompute(
    config: &Config,
    pool: &PlayerPool,
    draft: &DraftState,
    curve: &dyn AvailabilityCurve,
) -> Valuations {
    let league = &config.league;
    let model = &config.model;

    // 1. Normalize the undrafted pool over the draftable window.
    let taken = draft.taken();
    let undrafted = pool.undrafted(&taken);
    let (_stats, normalized) = normalize_pool(&undrafted, league.draftable_window());
    let rankings = PositionRankings::build(&undrafted, &normalized);

    // 2. Roster assignment and category totals, team by team.
    let mut rosters: HashMap<TeamId, RosterResult> = HashMap::new();
    let mut totals: HashMap<TeamId, CategoryTotals> = HashMap::new();
    for team_id in league.draft_order.iter() {
        let players: Vec<&Player> = draft
            .team_players(team_id)
            .into_iter()
            .filter_map(|id| pool.get(id))
            .collect();
        let roster = assign_roster(&players, league);

        let mut team_totals = CategoryTotals::new();
        for assignment in &roster.assignments {
            if let Some(player) = pool.get(assignment.player_id) {
                let weight = slot_weight(&assignment.slot, player.is_pitcher(), model);
                team_totals.add_player(player, weight);
            }
        }
        // Overflow players still sit on the roster; they count like bench.
        for &player_id in &roster.overflow {
            if let Some(player) = pool.get(player_id) {
                let weight = slot_weight(BENCH_SLOT, player.is_pitcher(), model);
                team_totals.add_player(player, weight);
            }
        }

        rosters.insert(team_id.clone(), roster);
        totals.insert(team_id.clone(), team_totals);
    }

    let my_team = &league.my_team;
    let my_roster = rosters.remove(my_team).unwrap_or_default();
    let my_totals = totals.get(my_team).cloned().unwrap_or_default();
    let opponent_refs: Vec<&CategoryTotals> = league
        .draft_order
        .iter()
        .filter(|team| *team != my_team)
        .filter_map(|team| totals.get(team))
        .collect();
    let opponent_totals = OpponentTotals::from_teams(&opponent_refs);

    // 3. Standings for the evaluating team.
    let my_pick_count = draft.team_pick_count(my_team);
    let standings = StandingsModel::build(
        &my_totals,
        &opponent_totals,
        draft.teams_with_players(),
        my_pick_count,
        league.num_teams,
        league.playoff_spots,
    );

    // 4. Score every undrafted player against the same snapshot.
    let picks_until_my_turn = draft
        .schedule()
        .picks_until_next_turn(draft.current_pick_index(), my_team);
    let my_bench_pitchers = my_roster
        .assignments
        .iter()
        .filter(|a| a.slot == BENCH_SLOT)
        .map(|a| a.player_id)
        .chain(my_roster.overflow.iter().copied())
        .filter_map(|id| pool.get(id))
        .filter(|p| p.is_pitcher())
        .count();

    let scorer = DraftScorer {
        model,
        curve,
        pool,
        rankings: &rankings,
        standings: standings.as_ref(),
        my_totals: &my_totals,
        opponent_totals: &opponent_totals,
        current_pick: draft.current_pick_index(),
        picks_until_mine: picks_until_my_turn,
        total_picks_made: draft.total_picks_made(),
        my_pick_count,
        num_teams: league.num_teams,
        num_rounds: league.num_rounds,
        my_bench_pitchers,
    };

    let mut board: Vec<BoardEntry> = undrafted
        .iter()
        .map(|player| {
            let value = normalized.value(player.id).unwrap_or(0.0);
            let fills = has_starting_need(player, &my_roster.remaining, league);
            BoardEntry {
                player_id: player.id,
                name: player.name.clone(),
                positions: player.positions(),
                score: scorer.score_player(player, value, fills),
            }
        })
        .collect();
    board.sort_by(|a, b| {
        b.score
            .score
            .partial_cmp(&a.score.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!(
        candidates = board.len(),
        standings = standings.is_some(),
        "recompute pass complete"
    );

    Valuations {
        board,
        standings,
        my_roster,
        picks_until_my_turn,
    }
}

// ---------------------------------------------------------------------------
// Recompute scheduler
// ---------------------------------------------------------------------------

/// Default settle window after a state change before recomputing.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(300);

/// Explicit dirty flag plus a cooldown the host drives; no hidden timers.
///
/// Consecutive picks arrive in bursts; each one re-marks the state dirty
/// and pushes the settle point out, so one pass runs once the burst stops.
/// The final settled state always reflects the latest input: marking dirty
/// after an acknowledge starts a fresh cycle.
#[derive(Debug, Clone)]
pub struct RecomputeScheduler {
    cooldown: Duration,
    dirty_since: Option<Instant>,
}

impl RecomputeScheduler {
    pub fn new(cooldown: Duration) -> Self {
        RecomputeScheduler {
            cooldown,
            dirty_since: None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Record a state change at `now`. Repeated marks extend the settle
    /// window (debounce), they never shorten it.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    /// Whether the dirty state has settled long enough to recompute.
    pub fn should_recompute(&self, now: Instant) -> bool {
        match self.dirty_since {
            Some(since) => now.duration_since(since) >= self.cooldown,
            None => false,
        }
    }

    /// Clear the dirty flag after a completed pass.
    pub fn acknowledge(&mut self) {
        self.dirty_since = None;
    }
}

impl Default for RecomputeScheduler {
    fn default() -> Self {
        RecomputeScheduler::new(DEFAULT_COOLDOWN)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
