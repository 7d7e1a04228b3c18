// Draft score blending: MCW, VONA, urgency, and roster fit into one
// ranking number per undrafted player.

use crate::config::ModelConfig;
use crate::player::{Player, PlayerId, PlayerPool};
use crate::valuation::availability::{availability, AvailabilityCurve};
use crate::valuation::standings::{
    standings_confidence, CategoryTotals, OpponentTotals, StandingsModel,
};
use crate::valuation::vona::{compute_vona, PositionRankings, VonaContext};

/// Urgency saturates here; beyond this the player is simply "gone next
/// turn" and more urgency carries no signal.
const URGENCY_CLAMP: f64 = 15.0;

/// Roster share above which a non-starter pick starts paying the bench
/// discount.
const BENCH_DISCOUNT_MIN_PROGRESS: f64 = 0.15;

/// Floor of the hitter bench discount.
const BENCH_DISCOUNT_FLOOR: f64 = 0.35;

/// Bench pitchers already rostered at which the pitcher discount reaches
/// half of the hitter discount.
const PITCHER_DISCOUNT_HALF_SATURATION: f64 = 3.0;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The full score breakdown for one candidate. The breakdown fields exist
/// for display and debugging; ranking uses `score` alone.
#[derive(Debug, Clone)]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub score: f64,
    pub normalized_value: f64,
    pub vona: f64,
    pub mcw: f64,
    pub urgency: f64,
    pub availability: f64,
    pub fills_starting_slot: bool,
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// One recompute pass's scoring context. Built by the engine after
/// normalization, roster assignment, and standings; scores every undrafted
/// candidate against the same snapshot.
pub struct DraftScorer<'a> {
    pub model: &'a ModelConfig,
    pub curve: &'a dyn AvailabilityCurve,
    pub pool: &'a PlayerPool,
    pub rankings: &'a PositionRankings,
    /// `None` when fewer than two teams have drafted players; the simple
    /// heuristic carries the whole score in that case.
    pub standings: Option<&'a StandingsModel>,
    pub my_totals: &'a CategoryTotals,
    pub opponent_totals: &'a OpponentTotals,
    pub current_pick: usize,
    pub picks_until_mine: u32,
    pub total_picks_made: usize,
    pub my_pick_count: usize,
    pub num_teams: usize,
    pub num_rounds: usize,
    /// Pitchers already sitting on the evaluating team's bench; hardens the
    /// pitcher bench discount.
    pub my_bench_pitchers: usize,
}

impl DraftScorer<'_> {
    /// How soon the player's ADP is overtaken by the manager's own pick
    /// gap: positive once waiting means losing them, clamped to a bounded
    /// range. No ADP, no urgency.
    pub fn urgency(&self, player: &Player) -> f64 {
        match player.adp {
            Some(adp) => {
                let adp_gap = adp - self.current_pick as f64;
                (self.picks_until_mine as f64 - adp_gap).clamp(0.0, URGENCY_CLAMP)
            }
            None => 0.0,
        }
    }

    /// Share of the evaluating team's draft already spent.
    pub fn draft_progress(&self) -> f64 {
        (self.my_pick_count as f64 / self.num_rounds as f64).min(1.0)
    }

    /// Whether enough of the league has drafted for MCW to mean anything.
    fn standings_usable(&self) -> bool {
        self.standings.is_some() && self.total_picks_made >= 2 * self.num_teams
    }

    /// Score one candidate.
    pub fn score_player(
        &self,
        player: &Player,
        normalized_value: f64,
        fills_starting_slot: bool,
    ) -> PlayerScore {
        let vona_ctx = VonaContext {
            pool: self.pool,
            rankings: self.rankings,
            curve: self.curve,
            current_pick: self.current_pick,
            picks_until_mine: self.picks_until_mine,
        };
        let vona = compute_vona(&vona_ctx, player, normalized_value);
        let urgency = self.urgency(player);
        let confidence = standings_confidence(self.total_picks_made, self.model);
        let progress = self.draft_progress();
        let roster_fit = if fills_starting_slot { 1.0 } else { 0.0 };

        // Simple heuristic: best player available, nudged by opportunity
        // cost and urgency. The whole score early on, the fallback blend
        // later.
        let raw_score = normalized_value
            + vona * self.model.vona_weight_bpa
            + urgency * self.model.urgency_weight_bpa;

        let mut mcw = 0.0;
        let mut score = raw_score;
        if confidence > 0.0 {
            if let (true, Some(standings)) = (self.standings_usable(), self.standings) {
                mcw = standings.compute_mcw(
                    player,
                    self.my_totals,
                    self.opponent_totals,
                    self.model,
                );
                let model_score = mcw * self.model.mcw_weight * confidence
                    + vona * self.model.vona_weight_mcw
                    + urgency * self.model.urgency_weight_mcw
                    + roster_fit * progress;
                score = model_score * confidence + raw_score * (1.0 - confidence);
            }
        }

        // A player likely to still be there next turn can wait.
        let avail = availability(player, self.current_pick, self.picks_until_mine, self.curve);
        score *= 1.0 - avail * self.model.availability_discount;

        // Bench discount once the roster is meaningfully full.
        if !fills_starting_slot && progress > BENCH_DISCOUNT_MIN_PROGRESS {
            score *= self.bench_discount(player.is_pitcher(), progress);
        }

        PlayerScore {
            player_id: player.id,
            score,
            normalized_value,
            vona,
            mcw,
            urgency,
            availability: avail,
            fills_starting_slot,
        }
    }

    /// Multiplicative bench discount. Hitters pay the flat discount;
    /// pitchers pay a softer, saturating share of it that approaches the
    /// hitter discount as bench pitchers accumulate (the first bench arm
    /// streams starts every week, the fourth mostly sits).
    fn bench_discount(&self, is_pitcher: bool, progress: f64) -> f64 {
        let hitter_factor =
            (1.0 - progress * self.model.bench_penalty_rate).max(BENCH_DISCOUNT_FLOOR);
        if is_pitcher {
            let bench = self.my_bench_pitchers as f64;
            let saturation = bench / (bench + PITCHER_DISCOUNT_HALF_SATURATION);
            1.0 - (1.0 - hitter_factor) * saturation
        } else {
            hitter_factor
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
