// Draft state: committed picks, keeper reservations, undo, persistence
// documents.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::schedule::{PickSchedule, PickTrade, ScheduleError};
use crate::config::LeagueConfig;
use crate::keeper::KeeperEntry;
use crate::player::{PlayerId, TeamId};

// ---------------------------------------------------------------------------
// Picks and audit records
// ---------------------------------------------------------------------------

/// A committed draft pick. Immutable once recorded except through
/// [`DraftState::undo_last_pick`], which removes the most recent non-keeper
/// pick only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPick {
    /// Globally monotonic pick index within one draft (0-based).
    pub pick_index: usize,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    /// True when this pick was auto-committed from a keeper reservation.
    #[serde(default)]
    pub keeper: bool,
}

/// One line of the pick-by-pick audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// A keeper's reserved pick index under the current schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperReservation {
    pub pick_index: usize,
    pub team_id: TeamId,
    pub player_id: PlayerId,
}

// ---------------------------------------------------------------------------
// Draft state
// ---------------------------------------------------------------------------

/// The complete state of one snake draft.
///
/// Invariants maintained here: a player appears in at most one team's picks;
/// `current_pick_index` never rests on a keeper-reserved index (reservations
/// auto-commit the moment the clock reaches them); the schedule never
/// shrinks.
#[derive(Debug, Clone)]
pub struct DraftState {
    schedule: PickSchedule,
    draft_order: Vec<TeamId>,
    picks: Vec<DraftPick>,
    drafted: HashSet<PlayerId>,
    keepers: Vec<KeeperEntry>,
    reserved: BTreeMap<usize, KeeperReservation>,
    reserved_players: HashSet<PlayerId>,
    current_pick_index: usize,
    audit_log: Vec<AuditRecord>,
}

impl DraftState {
    /// Start a fresh draft from a round-1 order.
    pub fn new(draft_order: Vec<TeamId>, num_rounds: usize) -> Self {
        let schedule = PickSchedule::snake(&draft_order, num_rounds);
        DraftState {
            schedule,
            draft_order,
            picks: Vec::new(),
            drafted: HashSet::new(),
            keepers: Vec::new(),
            reserved: BTreeMap::new(),
            reserved_players: HashSet::new(),
            current_pick_index: 0,
            audit_log: Vec::new(),
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn schedule(&self) -> &PickSchedule {
        &self.schedule
    }

    pub fn draft_order(&self) -> &[TeamId] {
        &self.draft_order
    }

    pub fn picks(&self) -> &[DraftPick] {
        &self.picks
    }

    pub fn audit_log(&self) -> &[AuditRecord] {
        &self.audit_log
    }

    pub fn keepers(&self) -> &[KeeperEntry] {
        &self.keepers
    }

    pub fn reservations(&self) -> impl Iterator<Item = &KeeperReservation> + '_ {
        self.reserved.values()
    }

    pub fn current_pick_index(&self) -> usize {
        self.current_pick_index
    }

    pub fn is_complete(&self) -> bool {
        self.current_pick_index >= self.schedule.len()
    }

    /// The team on the clock, or `None` once the draft is complete.
    pub fn on_clock(&self) -> Option<&TeamId> {
        self.schedule.team_at(self.current_pick_index)
    }

    pub fn total_picks_made(&self) -> usize {
        self.picks.len()
    }

    pub fn is_drafted(&self, player_id: PlayerId) -> bool {
        self.drafted.contains(&player_id)
    }

    /// Players off the board: committed picks plus uncommitted keeper
    /// reservations (a reserved player is never available to other teams).
    pub fn taken(&self) -> HashSet<PlayerId> {
        self.drafted
            .iter()
            .chain(self.reserved_players.iter())
            .copied()
            .collect()
    }

    /// Player ids drafted by a team, in pick order (keepers included).
    pub fn team_players(&self, team_id: &str) -> Vec<PlayerId> {
        self.picks
            .iter()
            .filter(|p| p.team_id == team_id)
            .map(|p| p.player_id)
            .collect()
    }

    pub fn team_pick_count(&self, team_id: &str) -> usize {
        self.picks.iter().filter(|p| p.team_id == team_id).count()
    }

    /// Number of distinct teams with at least one committed pick.
    pub fn teams_with_players(&self) -> usize {
        let teams: HashSet<&str> = self.picks.iter().map(|p| p.team_id.as_str()).collect();
        teams.len()
    }

    // -- keeper reservations ------------------------------------------------

    /// Install resolved keeper entries and reserve their pick indices.
    ///
    /// Entries whose team has no pick in the cost round (traded away) are
    /// returned for reporting; they reserve nothing. Reservations the clock
    /// has already reached auto-commit immediately.
    pub fn reserve_keepers(
        &mut self,
        entries: Vec<KeeperEntry>,
        league: &LeagueConfig,
    ) -> Vec<KeeperEntry> {
        self.keepers = entries;
        let unreserved = self.rebuild_reservations(league);
        self.commit_due_reservations();
        unreserved
    }

    /// Recompute keeper reservations against the current schedule. Called
    /// after installation and after every trade, since trades shift which
    /// indices are keeper-reserved.
    fn rebuild_reservations(&mut self, league: &LeagueConfig) -> Vec<KeeperEntry> {
        self.reserved.clear();
        self.reserved_players.clear();
        let mut unreserved = Vec::new();

        for entry in self.keepers.clone() {
            // A keeper already committed as a pick stays committed; its
            // reservation is spent.
            if self.drafted.contains(&entry.player_id) {
                continue;
            }
            let cost = entry.cost_round(league);
            match self.schedule.keeper_pick_index(&entry.team_id, cost) {
                // An index the clock already passed belongs to a committed
                // pick; reserving it would never fire.
                Some(index)
                    if index >= self.current_pick_index
                        && !self.reserved.contains_key(&index) =>
                {
                    self.reserved_players.insert(entry.player_id);
                    self.reserved.insert(
                        index,
                        KeeperReservation {
                            pick_index: index,
                            team_id: entry.team_id.clone(),
                            player_id: entry.player_id,
                        },
                    );
                }
                _ => {
                    warn!(
                        team = %entry.team_id,
                        round = cost,
                        "keeper has no reservable pick in its cost round"
                    );
                    unreserved.push(entry);
                }
            }
        }
        unreserved
    }

    /// Commit every reservation the clock has reached, keeping the
    /// invariant that `current_pick_index` never rests on a reserved index.
    fn commit_due_reservations(&mut self) {
        while let Some(reservation) = self.reserved.get(&self.current_pick_index).cloned() {
            if self.drafted.contains(&reservation.player_id) {
                // Same player reserved twice upstream; skip the index.
                warn!(
                    pick = reservation.pick_index,
                    "keeper reservation references an already-drafted player"
                );
                self.current_pick_index += 1;
                continue;
            }
            self.drafted.insert(reservation.player_id);
            self.picks.push(DraftPick {
                pick_index: reservation.pick_index,
                team_id: reservation.team_id.clone(),
                player_id: reservation.player_id,
                keeper: true,
            });
            self.audit(format!(
                "pick {}: keeper committed for {}",
                reservation.pick_index + 1,
                reservation.team_id
            ));
            self.current_pick_index += 1;
        }
    }

    // -- trades --------------------------------------------------------------

    /// Trade a pick to a new owner and shift keeper reservations with it.
    pub fn apply_trade(
        &mut self,
        pick_index: usize,
        new_team: TeamId,
        league: &LeagueConfig,
    ) -> Result<PickTrade, ScheduleError> {
        let trade = self.schedule.apply_trade(pick_index, new_team)?.clone();
        self.audit(format!(
            "pick {} traded from {} to {}",
            trade.pick_index + 1,
            trade.from_team,
            trade.to_team
        ));
        let unreserved = self.rebuild_reservations(league);
        for entry in unreserved {
            self.audit(format!(
                "keeper for {} lost its reserved pick after trade",
                entry.team_id
            ));
        }
        self.commit_due_reservations();
        Ok(trade)
    }

    // -- picks ---------------------------------------------------------------

    /// Commit the on-clock team's pick of `player_id`.
    ///
    /// Rejected as a no-op (returning `None`) when the draft is complete or
    /// the player is already drafted or keeper-reserved; state is never
    /// partially mutated on rejection.
    pub fn record_pick(&mut self, player_id: PlayerId) -> Option<DraftPick> {
        if self.is_complete() {
            warn!("pick rejected: draft is complete");
            return None;
        }
        if self.drafted.contains(&player_id) || self.reserved_players.contains(&player_id) {
            warn!(player = player_id.0, "pick rejected: player already off the board");
            return None;
        }
        let team_id = match self.schedule.team_at(self.current_pick_index) {
            Some(team) => team.clone(),
            None => return None,
        };

        let pick = DraftPick {
            pick_index: self.current_pick_index,
            team_id: team_id.clone(),
            player_id,
            keeper: false,
        };
        self.drafted.insert(player_id);
        self.picks.push(pick.clone());
        self.audit(format!(
            "pick {}: {} selects player {}",
            pick.pick_index + 1,
            team_id,
            player_id.0
        ));

        self.current_pick_index += 1;
        self.commit_due_reservations();

        Some(pick)
    }

    /// Undo the most recent non-keeper pick.
    ///
    /// Keeper commits made after it are rolled back to reservations and will
    /// re-commit as the clock advances again. With nothing to undo this is a
    /// no-op returning `None`.
    pub fn undo_last_pick(&mut self) -> Option<PlayerId> {
        let position = self.picks.iter().rposition(|p| !p.keeper);
        let position = match position {
            Some(p) => p,
            None => {
                warn!("undo rejected: no non-keeper pick to undo");
                return None;
            }
        };

        let undone = self.picks.remove(position);
        self.drafted.remove(&undone.player_id);

        // Roll back keeper commits above the undone index; they stay
        // reserved and re-commit on advance.
        let rollback_from = undone.pick_index;
        let mut rolled_back = Vec::new();
        self.picks.retain(|p| {
            if p.keeper && p.pick_index > rollback_from {
                rolled_back.push(p.player_id);
                false
            } else {
                true
            }
        });
        for player_id in rolled_back {
            self.drafted.remove(&player_id);
        }

        self.current_pick_index = undone.pick_index;
        self.audit(format!(
            "pick {} undone ({} returns player {})",
            undone.pick_index + 1,
            undone.team_id,
            undone.player_id.0
        ));
        Some(undone.player_id)
    }

    fn audit(&mut self, message: String) {
        self.audit_log.push(AuditRecord {
            timestamp: Utc::now(),
            message,
        });
    }

    // -- persistence ---------------------------------------------------------

    /// Snapshot the full draft state into an opaque persistable document.
    pub fn to_document(&self, season: i32) -> StateDocument {
        StateDocument {
            season,
            draft_order: self.draft_order.clone(),
            current_pick_index: self.current_pick_index,
            on_clock: self.on_clock().cloned(),
            picks: self.picks.clone(),
            keepers: self.keepers.clone(),
            schedule: self.schedule.slots().to_vec(),
            trades: self.schedule.trades().to_vec(),
            audit_log: self.audit_log.clone(),
            saved_at: Utc::now(),
        }
    }

    /// Reconstruct a draft state from a loaded document.
    ///
    /// The schedule is regenerated from the draft order unless the document
    /// carries trades, in which case the persisted (traded) schedule is
    /// authoritative. Keeper reservations are recomputed, never trusted
    /// from disk.
    pub fn from_document(doc: StateDocument, league: &LeagueConfig) -> Self {
        let schedule = if doc.trades.is_empty() {
            PickSchedule::snake(&doc.draft_order, league.num_rounds)
        } else {
            PickSchedule::from_parts(doc.schedule, doc.draft_order.len(), doc.trades)
        };

        let drafted: HashSet<PlayerId> = doc.picks.iter().map(|p| p.player_id).collect();

        let mut state = DraftState {
            schedule,
            draft_order: doc.draft_order,
            picks: doc.picks,
            drafted,
            keepers: Vec::new(),
            reserved: BTreeMap::new(),
            reserved_players: HashSet::new(),
            current_pick_index: doc.current_pick_index,
            audit_log: doc.audit_log,
        };
        state.keepers = doc.keepers;
        let unreserved = state.rebuild_reservations(league);
        if !unreserved.is_empty() {
            info!(
                count = unreserved.len(),
                "restored draft has keepers without reservable picks"
            );
        }
        state.commit_due_reservations();
        state
    }
}

/// The opaque draft-state document exchanged with the persistence
/// collaborator. Any serialization that round-trips these fields is
/// acceptable; the store never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDocument {
    pub season: i32,
    pub draft_order: Vec<TeamId>,
    pub current_pick_index: usize,
    pub on_clock: Option<TeamId>,
    pub picks: Vec<DraftPick>,
    pub keepers: Vec<KeeperEntry>,
    pub schedule: Vec<TeamId>,
    pub trades: Vec<PickTrade>,
    pub audit_log: Vec<AuditRecord>,
    pub saved_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn order(n: usize) -> Vec<TeamId> {
        (1..=n).map(|i| format!("t{i}")).collect()
    }

    fn test_league(num_teams: usize, num_rounds: usize) -> LeagueConfig {
        LeagueConfig {
            name: "Test".into(),
            season: 2026,
            num_teams,
            num_rounds,
            playoff_spots: (num_teams / 2).max(1),
            keeper_limit: 3,
            keeper_round_discount: 5,
            draft_order: order(num_teams),
            teams: (1..=num_teams)
                .map(|i| (format!("t{i}"), format!("Team {i}")))
                .collect(),
            my_team: "t1".into(),
            roster: [("UTIL".to_string(), num_rounds)].into_iter().collect(),
            position_slots: HashMap::new(),
        }
    }

    fn keeper(team: &str, player: u32, round: u32) -> KeeperEntry {
        KeeperEntry {
            team_id: team.into(),
            player_id: PlayerId(player),
            acquisition_round: Some(round),
            keeper_season: 1,
        }
    }

    #[test]
    fn picks_advance_through_snake_order() {
        let mut state = DraftState::new(order(4), 2);
        assert_eq!(state.on_clock().unwrap(), "t1");
        state.record_pick(PlayerId(101)).unwrap();
        assert_eq!(state.on_clock().unwrap(), "t2");
        state.record_pick(PlayerId(102)).unwrap();
        state.record_pick(PlayerId(103)).unwrap();
        state.record_pick(PlayerId(104)).unwrap();
        // Round 2 reverses.
        assert_eq!(state.on_clock().unwrap(), "t4");
        assert_eq!(state.total_picks_made(), 4);
    }

    #[test]
    fn duplicate_pick_is_a_noop() {
        let mut state = DraftState::new(order(4), 2);
        state.record_pick(PlayerId(101)).unwrap();
        let before_index = state.current_pick_index();
        assert!(state.record_pick(PlayerId(101)).is_none());
        assert_eq!(state.current_pick_index(), before_index);
        assert_eq!(state.total_picks_made(), 1);
    }

    #[test]
    fn pick_after_completion_is_a_noop() {
        let mut state = DraftState::new(order(2), 1);
        state.record_pick(PlayerId(1)).unwrap();
        state.record_pick(PlayerId(2)).unwrap();
        assert!(state.is_complete());
        assert!(state.on_clock().is_none());
        assert!(state.record_pick(PlayerId(3)).is_none());
    }

    #[test]
    fn keeper_reservation_commits_when_clock_arrives() {
        let league = test_league(4, 3);
        let mut state = DraftState::new(order(4), 3);
        // t3 keeps player 300 at acquisition round 1: reserved index 2.
        let unreserved = state.reserve_keepers(vec![keeper("t3", 300, 1)], &league);
        assert!(unreserved.is_empty());
        assert_eq!(state.reservations().count(), 1);

        // The reserved player is off the board immediately.
        assert!(state.taken().contains(&PlayerId(300)));
        assert!(state.record_pick(PlayerId(300)).is_none());

        state.record_pick(PlayerId(101)).unwrap(); // t1, index 0
        state.record_pick(PlayerId(102)).unwrap(); // t2, index 1
        // Index 2 was keeper-reserved: it auto-committed and the clock
        // moved to index 3 (t4).
        assert_eq!(state.on_clock().unwrap(), "t4");
        let keeper_pick = &state.picks()[2];
        assert!(keeper_pick.keeper);
        assert_eq!(keeper_pick.team_id, "t3");
        assert_eq!(keeper_pick.player_id, PlayerId(300));
    }

    #[test]
    fn keeper_at_first_pick_commits_immediately() {
        let league = test_league(4, 2);
        let mut state = DraftState::new(order(4), 2);
        state.reserve_keepers(vec![keeper("t1", 500, 1)], &league);
        // Index 0 belonged to t1: committed on reservation, clock at t2.
        assert_eq!(state.on_clock().unwrap(), "t2");
        assert!(state.picks()[0].keeper);
    }

    #[test]
    fn keeper_without_pick_in_round_is_reported() {
        let league = test_league(4, 2);
        let mut state = DraftState::new(order(4), 2);
        // Acquisition round 5 with discount 5, season 1: cost 5, beyond the
        // 2-round schedule.
        let unreserved = state.reserve_keepers(vec![keeper("t2", 300, 5)], &league);
        assert_eq!(unreserved.len(), 1);
        assert_eq!(state.reservations().count(), 0);
        // Unreservable keeper is not off the board.
        assert!(!state.taken().contains(&PlayerId(300)));
    }

    #[test]
    fn trade_shifts_keeper_reservation() {
        let league = test_league(4, 3);
        let mut state = DraftState::new(order(4), 3);
        // t3 keeps at round 2. Round 2 reversed: t3 picks at index 5.
        state.reserve_keepers(vec![keeper("t3", 300, 2)], &league);
        assert_eq!(
            state.reservations().next().unwrap().pick_index,
            5
        );

        // t3 trades that pick away; t3 no longer appears in round 2, so the
        // keeper loses its reservation and the player returns to the board.
        state.apply_trade(5, "t1".into(), &league).unwrap();
        assert_eq!(state.reservations().count(), 0);
        assert!(!state.taken().contains(&PlayerId(300)));
        assert_eq!(state.schedule().trades().len(), 1);
    }

    #[test]
    fn undo_removes_most_recent_non_keeper_pick() {
        let league = test_league(4, 3);
        let mut state = DraftState::new(order(4), 3);
        // Keeper at index 2 (t3, round 1).
        state.reserve_keepers(vec![keeper("t3", 300, 1)], &league);

        state.record_pick(PlayerId(101)).unwrap(); // index 0
        state.record_pick(PlayerId(102)).unwrap(); // index 1; keeper commits at 2
        assert_eq!(state.current_pick_index(), 3);

        // Undo removes pick 102 (index 1) and rolls back the keeper commit.
        assert_eq!(state.undo_last_pick(), Some(PlayerId(102)));
        assert_eq!(state.current_pick_index(), 1);
        assert_eq!(state.total_picks_made(), 1);
        // Keeper player is reserved again, still off the board.
        assert!(state.taken().contains(&PlayerId(300)));

        // Re-picking re-commits the keeper.
        state.record_pick(PlayerId(103)).unwrap();
        assert_eq!(state.current_pick_index(), 3);
        assert!(state.picks().iter().any(|p| p.keeper && p.player_id == PlayerId(300)));
    }

    #[test]
    fn undo_with_nothing_to_undo_is_a_noop() {
        let league = test_league(4, 2);
        let mut state = DraftState::new(order(4), 2);
        assert!(state.undo_last_pick().is_none());

        // Only keeper picks on the board: still nothing to undo.
        state.reserve_keepers(vec![keeper("t1", 500, 1)], &league);
        assert_eq!(state.total_picks_made(), 1);
        assert!(state.undo_last_pick().is_none());
        assert_eq!(state.total_picks_made(), 1);
    }

    #[test]
    fn team_players_and_counts() {
        let mut state = DraftState::new(order(2), 3);
        state.record_pick(PlayerId(1)).unwrap(); // t1
        state.record_pick(PlayerId(2)).unwrap(); // t2
        state.record_pick(PlayerId(3)).unwrap(); // t2 (reversed)
        assert_eq!(state.team_players("t2"), vec![PlayerId(2), PlayerId(3)]);
        assert_eq!(state.team_pick_count("t1"), 1);
        assert_eq!(state.teams_with_players(), 2);
    }

    #[test]
    fn document_round_trip_without_trades() {
        let league = test_league(4, 3);
        let mut state = DraftState::new(order(4), 3);
        state.reserve_keepers(vec![keeper("t3", 300, 2)], &league);
        state.record_pick(PlayerId(101)).unwrap();
        state.record_pick(PlayerId(102)).unwrap();

        let doc = state.to_document(2026);
        assert_eq!(doc.on_clock.as_deref(), Some("t3"));

        let restored = DraftState::from_document(doc, &league);
        assert_eq!(restored.current_pick_index(), state.current_pick_index());
        assert_eq!(restored.picks(), state.picks());
        assert_eq!(restored.on_clock(), state.on_clock());
        assert_eq!(restored.reservations().count(), 1);
        assert!(restored.taken().contains(&PlayerId(300)));
    }

    #[test]
    fn document_round_trip_preserves_traded_schedule() {
        let league = test_league(4, 3);
        let mut state = DraftState::new(order(4), 3);
        state.apply_trade(6, "t2".into(), &league).unwrap();
        let doc = state.to_document(2026);

        let restored = DraftState::from_document(doc, &league);
        // The traded schedule is authoritative on load.
        assert_eq!(restored.schedule().team_at(6).unwrap(), "t2");
        assert_eq!(restored.schedule().trades().len(), 1);
    }

    #[test]
    fn json_document_survives_serde() {
        let league = test_league(4, 2);
        let mut state = DraftState::new(order(4), 2);
        state.record_pick(PlayerId(1)).unwrap();
        let doc = state.to_document(2026);

        let json = serde_json::to_string(&doc).unwrap();
        let parsed: StateDocument = serde_json::from_str(&json).unwrap();
        let restored = DraftState::from_document(parsed, &league);
        assert_eq!(restored.picks(), state.picks());
    }
}
