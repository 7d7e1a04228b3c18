// Keeper entries, cost model, and the resolver data contract.

use serde::{Deserialize, Serialize};

use crate::config::LeagueConfig;
use crate::player::{PlayerId, TeamId};

pub mod analyzer;

// ---------------------------------------------------------------------------
// Keeper entries and cost
// ---------------------------------------------------------------------------

/// A player retained from a prior season at a derived draft-round cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperEntry {
    pub team_id: TeamId,
    pub player_id: PlayerId,
    /// Round the player was originally acquired in. `None` means a
    /// free-agent pickup, which costs as if acquired in the final round.
    pub acquisition_round: Option<u32>,
    /// Which keeper season this is (1..=3).
    pub keeper_season: u8,
}

impl KeeperEntry {
    /// The draft round this keeper costs.
    ///
    /// Season 1 costs the full acquisition round; each later season earns
    /// the configured round discount, bounded below by round 1. Cost is
    /// derived here, never stored.
    pub fn cost_round(&self, league: &LeagueConfig) -> u32 {
        let base = self
            .acquisition_round
            .unwrap_or(league.num_rounds as u32);
        let season = self.keeper_season.max(1) as u32;
        let discount = league.keeper_round_discount * (season - 1);
        base.saturating_sub(discount).max(1)
    }
}

// ---------------------------------------------------------------------------
// Resolver data contract
// ---------------------------------------------------------------------------

/// A free-text keeper row the external resolver could not match against the
/// player database. Reportable data, never an error: the engine proceeds
/// with the resolved subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedKeeper {
    pub name: String,
    pub acquisition_round: Option<u32>,
    pub keeper_season: u8,
}

/// Output of the external keeper-roster resolver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedKeepers {
    pub entries: Vec<KeeperEntry>,
    pub unmatched: Vec<UnmatchedKeeper>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
