// Category standings: ranks, win probabilities, strategy classification,
// and Marginal Contribution to Wins (MCW).

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::player::{Category, Player};

// ---------------------------------------------------------------------------
// Category totals
// ---------------------------------------------------------------------------

/// A team's accumulated oriented category scores, weighted by roster slot
/// (starters 1.0, bench at the configured reduced rate).
#[derive(Debug, Clone, Default)]
pub struct CategoryTotals {
    values: [f64; Category::COUNT],
}

impl CategoryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> f64 {
        self.values[category.index()]
    }

    pub fn add(&mut self, category: Category, value: f64) {
        self.values[category.index()] += value;
    }

    /// Fold a player's contribution in at the given slot weight. Only the
    /// player's own categories move; the other type's stay untouched.
    pub fn add_player(&mut self, player: &Player, weight: f64) {
        for &category in Category::for_type(player.is_pitcher()) {
            self.values[category.index()] += player.category_score(category) * weight;
        }
    }
}

/// Opponent totals per category, each list sorted descending. Built once
/// per recompute pass and shared across every candidate evaluation.
#[derive(Debug, Clone, Default)]
pub struct OpponentTotals {
    per_category: [Vec<f64>; Category::COUNT],
}

impl OpponentTotals {
    pub fn from_teams(teams: &[&CategoryTotals]) -> Self {
        let mut totals = OpponentTotals::default();
        for category in Category::ALL {
            let mut values: Vec<f64> = teams.iter().map(|t| t.get(category)).collect();
            values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
            totals.per_category[category.index()] = values;
        }
        totals
    }

    pub fn at(&self, category: Category) -> &[f64] {
        &self.per_category[category.index()]
    }
}

// ---------------------------------------------------------------------------
// Rank and win probability
// ---------------------------------------------------------------------------

/// Fractional rank of `my_value` among the opponents: 1 = best. Ties split
/// the difference, so two tied leaders both rank 1.5.
pub fn compute_rank(my_value: f64, other_totals: &[f64]) -> f64 {
    let mut teams_above = 0usize;
    let mut tied = 0usize;
    for &v in other_totals {
        if v > my_value {
            teams_above += 1;
        } else if v == my_value {
            tied += 1;
        }
    }
    teams_above as f64 + 1.0 + tied as f64 / 2.0
}

/// Win probability against a randomly selected opponent, from rank alone:
/// rank 1 of n wins every matchup, rank n wins none.
pub fn win_prob_from_rank(rank: f64, num_teams: usize) -> f64 {
    if num_teams <= 1 {
        return 0.5;
    }
    (num_teams as f64 - rank) / (num_teams as f64 - 1.0)
}

/// Confidence in the standings picture, ramping from 0 to 1 over the
/// configured span of league-wide picks. Early standings are noise.
pub fn standings_confidence(total_picks_made: usize, model: &ModelConfig) -> f64 {
    let span = model.confidence_end as f64 - model.confidence_start as f64;
    if span <= 0.0 {
        return 1.0;
    }
    ((total_picks_made as f64 - model.confidence_start as f64) / span).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Strategy classification
// ---------------------------------------------------------------------------

/// How a category should be played from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryStrategy {
    /// Already dominant; further investment has diminishing return.
    Lock,
    /// Contested; a marginal player meaningfully shifts win probability.
    Target,
    /// Too far behind to catch up economically; stop investing.
    Punt,
    Neutral,
}

impl CategoryStrategy {
    /// MCW credit multiplier for this strategy.
    pub fn mcw_weight(self, model: &ModelConfig) -> f64 {
        match self {
            CategoryStrategy::Lock => model.lock_mcw_weight,
            CategoryStrategy::Target => model.target_mcw_weight,
            CategoryStrategy::Punt => 0.0,
            CategoryStrategy::Neutral => model.neutral_mcw_weight,
        }
    }
}

/// One category's standing for the evaluating team.
#[derive(Debug, Clone)]
pub struct CategoryStanding {
    pub category: Category,
    pub my_total: f64,
    pub rank: f64,
    pub win_prob: f64,
    /// Margin to the nearest team above (0.0 when leading).
    pub gap_above: f64,
    /// Margin over the nearest team below (0.0 when last).
    pub gap_below: f64,
    pub strategy: CategoryStrategy,
}

/// Number of own picks before strategy classification switches on.
/// A six-player roster is the earliest point where lock/punt reads are
/// signal rather than sequencing noise.
const STRATEGY_MIN_PICKS: usize = 6;

/// Maximum simultaneous punts; conceding a third category costs more
/// matchup equity than it frees up.
const MAX_PUNTS: usize = 2;

fn analyze_standings(
    my_totals: &CategoryTotals,
    others: &OpponentTotals,
    num_teams: usize,
) -> Vec<CategoryStanding> {
    Category::ALL
        .iter()
        .map(|&category| {
            let my_value = my_totals.get(category);
            let other_values = others.at(category);
            let rank = compute_rank(my_value, other_values);
            let win_prob = win_prob_from_rank(rank, num_teams);

            let gap_above = other_values
                .iter()
                .filter(|&&v| v > my_value)
                .map(|&v| v - my_value)
                .fold(f64::INFINITY, f64::min);
            let gap_below = other_values
                .iter()
                .filter(|&&v| v < my_value)
                .map(|&v| my_value - v)
                .fold(f64::INFINITY, f64::min);

            CategoryStanding {
                category,
                my_total: my_value,
                rank,
                win_prob,
                gap_above: if gap_above.is_finite() { gap_above } else { 0.0 },
                gap_below: if gap_below.is_finite() { gap_below } else { 0.0 },
                strategy: CategoryStrategy::Neutral,
            }
        })
        .collect()
}

/// Classify each category, scaling thresholds to how much of the league
/// makes the playoffs: the more forgiving the bracket, the earlier a punt
/// is affordable and the wider the contested band.
fn detect_strategies(
    standings: &mut [CategoryStanding],
    my_pick_count: usize,
    num_teams: usize,
    playoff_spots: usize,
) {
    if my_pick_count < STRATEGY_MIN_PICKS {
        return;
    }

    let playoff_ratio = playoff_spots as f64 / num_teams as f64;
    let punt_gap = 3.0 + (playoff_ratio - 0.4) * 7.5;
    let punt_rank_floor = if playoff_ratio >= 0.55 {
        num_teams as f64
    } else {
        num_teams as f64 - 1.0
    };
    let (target_low, target_high) = if playoff_ratio >= 0.55 {
        (3.0, 8.0)
    } else {
        (4.0, 7.0)
    };

    for s in standings.iter_mut() {
        s.strategy = if s.rank <= 2.0 && s.gap_below >= 1.0 {
            CategoryStrategy::Lock
        } else if s.rank >= punt_rank_floor && s.gap_above >= punt_gap {
            CategoryStrategy::Punt
        } else if s.rank >= target_low && s.rank <= target_high {
            CategoryStrategy::Target
        } else {
            CategoryStrategy::Neutral
        };
    }

    // Enforce the punt cap, keeping the worst-ranked categories punted.
    let mut punts: Vec<(usize, f64)> = standings
        .iter()
        .enumerate()
        .filter(|(_, s)| s.strategy == CategoryStrategy::Punt)
        .map(|(i, s)| (i, s.rank))
        .collect();
    if punts.len() > MAX_PUNTS {
        punts.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for &(index, _) in punts.iter().skip(MAX_PUNTS) {
            standings[index].strategy = CategoryStrategy::Neutral;
        }
    }
}

// ---------------------------------------------------------------------------
// Standings model
// ---------------------------------------------------------------------------

/// The full standings picture for the evaluating team.
#[derive(Debug, Clone)]
pub struct StandingsModel {
    pub standings: Vec<CategoryStanding>,
    /// Sum of win probabilities across all categories: the expected number
    /// of category wins in a week against a random opponent.
    pub expected_weekly_wins: f64,
    num_teams: usize,
}

impl StandingsModel {
    /// Build the model, or return `None` when fewer than two teams have
    /// drafted players; a one-team distribution is degenerate, and the
    /// score combiner falls back to the simple heuristic instead.
    pub fn build(
        my_totals: &CategoryTotals,
        others: &OpponentTotals,
        teams_with_players: usize,
        my_pick_count: usize,
        num_teams: usize,
        playoff_spots: usize,
    ) -> Option<StandingsModel> {
        if teams_with_players < 2 {
            return None;
        }
        let mut standings = analyze_standings(my_totals, others, num_teams);
        detect_strategies(&mut standings, my_pick_count, num_teams, playoff_spots);
        let expected_weekly_wins = standings.iter().map(|s| s.win_prob).sum();
        Some(StandingsModel {
            standings,
            expected_weekly_wins,
            num_teams,
        })
    }

    pub fn strategy(&self, category: Category) -> CategoryStrategy {
        self.standings
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.strategy)
            .unwrap_or(CategoryStrategy::Neutral)
    }

    /// Marginal Contribution to Wins for a candidate: simulate adding their
    /// per-category scores to the team totals, recompute each category's
    /// win probability, and accumulate the positive deltas weighted by
    /// strategy. A contribution that closes part of the gap to the next
    /// team without flipping rank earns fractional credit, superlinear in
    /// the share of gap closed.
    pub fn compute_mcw(
        &self,
        player: &Player,
        my_totals: &CategoryTotals,
        others: &OpponentTotals,
        model: &ModelConfig,
    ) -> f64 {
        let mut mcw = 0.0;

        for category in Category::ALL {
            let weight = self.strategy(category).mcw_weight(model);
            if weight == 0.0 {
                continue;
            }
            let player_value = player.category_score(category);
            if player_value == 0.0 {
                continue;
            }

            let my_value = my_totals.get(category);
            let new_value = my_value + player_value;
            let other_values = others.at(category);

            let win_before = win_prob_from_rank(compute_rank(my_value, other_values), self.num_teams);
            let win_after = win_prob_from_rank(compute_rank(new_value, other_values), self.num_teams);
            let mut marginal = win_after - win_before;

            // Fractional credit for closing a gap without flipping rank.
            if marginal == 0.0 && player_value > 0.0 {
                let above_before = other_values.iter().filter(|&&v| v > my_value).count();
                let above_after = other_values.iter().filter(|&&v| v > new_value).count();
                if above_before > 0 && above_after == above_before {
                    let closest_above = other_values
                        .iter()
                        .filter(|&&v| v > my_value)
                        .fold(f64::INFINITY, |acc, &v| acc.min(v));
                    let gap_before = closest_above - my_value;
                    let gap_after = closest_above - new_value;
                    if gap_before > 0.0 {
                        let gap_closed = (gap_before - gap_after) / gap_before;
                        marginal =
                            gap_closed.powf(1.5) * 0.55 / (self.num_teams as f64 - 1.0);
                    }
                }
            }

            if marginal > 0.0 {
                mcw += marginal * weight;
            }
        }

        mcw
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
