// Availability model: probability a player survives until your next turn.

use crate::player::Player;

// ---------------------------------------------------------------------------
// Curve abstraction
// ---------------------------------------------------------------------------

/// Survival curve mapping (ADP, target pick) to the probability the player
/// is still undrafted at that pick.
///
/// The exact shape is a tunable, not a contract. Implementations must be
/// continuous, bounded in [0, 1], and monotonic non-increasing in the
/// target pick for a fixed ADP. Downstream scores depend on there being no
/// discontinuities.
pub trait AvailabilityCurve {
    fn survival(&self, adp: f64, target_pick: f64) -> f64;
}

/// Default curve: a normal survival function over pick distance.
///
/// Drafters pick around a player's ADP with roughly normal spread, so the
/// chance the player is gone by `target_pick` is `phi((target - adp)/sigma)`
/// and survival is its complement.
#[derive(Debug, Clone, Copy)]
pub struct NormalCdfCurve {
    /// Spread of real draft position around ADP, in picks.
    pub sigma: f64,
}

impl NormalCdfCurve {
    pub fn new(sigma: f64) -> Self {
        NormalCdfCurve { sigma }
    }
}

impl Default for NormalCdfCurve {
    fn default() -> Self {
        NormalCdfCurve { sigma: 18.0 }
    }
}

impl AvailabilityCurve for NormalCdfCurve {
    fn survival(&self, adp: f64, target_pick: f64) -> f64 {
        if self.sigma <= 0.0 {
            // Degenerate spread: a step at ADP.
            return if target_pick <= adp { 1.0 } else { 0.0 };
        }
        let z = (target_pick - adp) / self.sigma;
        (1.0 - normal_cdf(z)).clamp(0.0, 1.0)
    }
}

/// Standard normal CDF, Abramowitz & Stegun polynomial approximation
/// (7.1.26). Accurate to ~1e-7, far inside what the model needs.
fn normal_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let abs_x = x.abs();
    let t = 1.0 / (1.0 + P * abs_x);
    let y = 1.0
        - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-abs_x * abs_x / 2.0).exp();
    0.5 * (1.0 + sign * y)
}

// ---------------------------------------------------------------------------
// Player-level helper
// ---------------------------------------------------------------------------

/// Probability the player is still undrafted when the evaluating team next
/// picks. Missing ADP degrades to the "never available" sentinel (0.0): the
/// model never counts on an unknown player remaining, so they drop out of
/// expected-replacement walks and earn no wait-discount.
pub fn availability(
    player: &Player,
    current_pick: usize,
    picks_until_mine: u32,
    curve: &dyn AvailabilityCurve,
) -> f64 {
    match player.adp {
        Some(adp) => {
            let target = current_pick as f64 + picks_until_mine as f64;
            curve.survival(adp, target)
        }
        None => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
