// Pick scheduling: snake-order expansion, traded picks, keeper reservations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::player::TeamId;

/// Sentinel for "this team never picks again": effectively never, not an
/// error. Callers compare against it instead of unwrapping.
pub const PICKS_NEVER: u32 = 999;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("pick index {index} out of range (schedule has {len} picks)")]
    PickOutOfRange { index: usize, len: usize },
}

// ---------------------------------------------------------------------------
// Trade record
// ---------------------------------------------------------------------------

/// Audit record of a single traded pick. Trades are never silently dropped:
/// every applied trade appends exactly one record to the ordered trade log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickTrade {
    pub pick_index: usize,
    pub from_team: TeamId,
    pub to_team: TeamId,
}

// ---------------------------------------------------------------------------
// Pick schedule
// ---------------------------------------------------------------------------

/// An ordered mapping of pick index -> owning team for the whole draft.
///
/// Built from a snake expansion of the round-1 order (round *n* forward,
/// round *n+1* reversed) and mutated only through [`PickSchedule::apply_trade`].
/// The schedule's length never shrinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickSchedule {
    slots: Vec<TeamId>,
    num_teams: usize,
    trades: Vec<PickTrade>,
}

impl PickSchedule {
    /// Expand a draft-order permutation into the full snake schedule.
    pub fn snake(order: &[TeamId], num_rounds: usize) -> Self {
        let num_teams = order.len();
        let mut slots = Vec::with_capacity(num_teams * num_rounds);
        for round in 0..num_rounds {
            if round % 2 == 0 {
                slots.extend(order.iter().cloned());
            } else {
                slots.extend(order.iter().rev().cloned());
            }
        }
        PickSchedule {
            slots,
            num_teams,
            trades: Vec::new(),
        }
    }

    /// Rebuild a schedule from persisted parts. Used on state-document load
    /// when a trade log exists and the traded schedule is authoritative.
    pub fn from_parts(slots: Vec<TeamId>, num_teams: usize, trades: Vec<PickTrade>) -> Self {
        PickSchedule {
            slots,
            num_teams,
            trades,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn num_teams(&self) -> usize {
        self.num_teams
    }

    pub fn num_rounds(&self) -> usize {
        if self.num_teams == 0 {
            0
        } else {
            self.slots.len() / self.num_teams
        }
    }

    /// Owner of the given pick index, if in range.
    pub fn team_at(&self, pick_index: usize) -> Option<&TeamId> {
        self.slots.get(pick_index)
    }

    pub fn slots(&self) -> &[TeamId] {
        &self.slots
    }

    /// The ordered trade log.
    pub fn trades(&self) -> &[PickTrade] {
        &self.trades
    }

    /// Reassign one pick to a new owner, appending an audit record.
    ///
    /// Out-of-range indices are rejected; nothing is mutated in that case.
    pub fn apply_trade(
        &mut self,
        pick_index: usize,
        new_team: TeamId,
    ) -> Result<&PickTrade, ScheduleError> {
        if pick_index >= self.slots.len() {
            return Err(ScheduleError::PickOutOfRange {
                index: pick_index,
                len: self.slots.len(),
            });
        }
        let from_team = std::mem::replace(&mut self.slots[pick_index], new_team.clone());
        self.trades.push(PickTrade {
            pick_index,
            from_team,
            to_team: new_team,
        });
        Ok(&self.trades[self.trades.len() - 1])
    }

    /// The pick index a keeper costing `round_cost` occupies for `team`.
    ///
    /// Searches the block of indices belonging to that round under the
    /// current (possibly traded) schedule. `None` when the team has no pick
    /// in that round, in which case the keeper reserves nothing and the caller reports it.
    pub fn keeper_pick_index(&self, team: &str, round_cost: u32) -> Option<usize> {
        if round_cost == 0 {
            return None;
        }
        let start = (round_cost as usize - 1) * self.num_teams;
        let end = (start + self.num_teams).min(self.slots.len());
        if start >= self.slots.len() {
            return None;
        }
        (start..end).find(|&i| self.slots[i] == team)
    }

    /// Picks remaining before `team` is on the clock again, scanning forward
    /// from `current_index + 1`. Returns [`PICKS_NEVER`] when the schedule
    /// is exhausted first.
    pub fn picks_until_next_turn(&self, current_index: usize, team: &str) -> u32 {
        for i in (current_index + 1)..self.slots.len() {
            if self.slots[i] == team {
                return (i - current_index) as u32;
            }
        }
        PICKS_NEVER
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
