// Pool-relative value normalization.
//
// Hitter counting stats and pitcher rate stats arrive on incompatible
// scales; summing them naively biases any cross-type comparison. Each
// category is therefore re-centered (not just rescaled) over the players
// actually still draftable, separately for hitters and pitchers, and a
// player's normalized value is the sum of their per-category standard
// scores.

use std::collections::HashMap;

use crate::player::{Category, Player, PlayerId};

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and standard deviation for a single category across a player pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

/// Compute mean and population standard deviation for a slice of values.
///
/// Returns zeroed stats for an empty slice. Population (N denominator)
/// because the pool is the full relevant universe, not a sample.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Standard score of a value against pool stats; 0.0 when the pool has no
/// spread (guards division by zero).
pub fn standardize(value: f64, stats: &PoolStats) -> f64 {
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

// ---------------------------------------------------------------------------
// Per-category stats over the draftable window
// ---------------------------------------------------------------------------

/// Per-category pool statistics, indexed by [`Category`].
#[derive(Debug, Clone, Default)]
pub struct CategoryStats {
    stats: [PoolStats; Category::COUNT],
}

impl CategoryStats {
    pub fn get(&self, category: Category) -> &PoolStats {
        &self.stats[category.index()]
    }
}

/// Restrict the undrafted pool to the draftable window: the top
/// `window_size` remaining players by overall rank. Keeps replacement-level
/// noise out of the category distributions.
pub fn draftable_window<'a>(undrafted: &[&'a Player], window_size: usize) -> Vec<&'a Player> {
    let mut window: Vec<&Player> = undrafted.to_vec();
    window.sort_by_key(|p| p.overall_rank);
    window.truncate(window_size);
    window
}

/// Compute per-category stats over the window. Each category's distribution
/// comes from the matching player type only: hitting categories from the
/// window's hitters, pitching categories from its pitchers.
pub fn compute_category_stats(window: &[&Player]) -> CategoryStats {
    let mut stats = CategoryStats::default();
    for category in Category::ALL {
        let values: Vec<f64> = window
            .iter()
            .filter(|p| p.is_pitcher() != category.is_hitting())
            .map(|p| p.category_score(category))
            .collect();
        stats.stats[category.index()] = compute_pool_stats(&values);
    }
    stats
}

/// A player's normalized value: the sum of their standard scores over the
/// categories of their own type.
pub fn normalized_value(player: &Player, stats: &CategoryStats) -> f64 {
    Category::for_type(player.is_pitcher())
        .iter()
        .map(|&cat| standardize(player.category_score(cat), stats.get(cat)))
        .sum()
}

// ---------------------------------------------------------------------------
// Normalized pool snapshot
// ---------------------------------------------------------------------------

/// Normalized values for every undrafted player, plus the descending
/// ranking. Recomputed whenever the drafted set changes; callers debounce.
#[derive(Debug, Clone, Default)]
pub struct NormalizedPool {
    values: HashMap<PlayerId, f64>,
    ranked: Vec<(PlayerId, f64)>,
}

impl NormalizedPool {
    pub fn value(&self, player_id: PlayerId) -> Option<f64> {
        self.values.get(&player_id).copied()
    }

    /// All undrafted players, best normalized value first.
    pub fn ranked(&self) -> &[(PlayerId, f64)] {
        &self.ranked
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Normalize the full undrafted pool against the draftable window.
///
/// Window players define the distributions; every undrafted player is then
/// scored against them, so below-window players still get (deeply negative)
/// values rather than dropping out.
pub fn normalize_pool(
    undrafted: &[&Player],
    window_size: usize,
) -> (CategoryStats, NormalizedPool) {
    let window = draftable_window(undrafted, window_size);
    let stats = compute_category_stats(&window);

    let mut values = HashMap::with_capacity(undrafted.len());
    let mut ranked = Vec::with_capacity(undrafted.len());
    for player in undrafted {
        let value = normalized_value(player, &stats);
        values.insert(player.id, value);
        ranked.push((player.id, value));
    }
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    (stats, NormalizedPool { values, ranked })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
