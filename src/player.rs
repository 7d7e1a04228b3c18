// Player records, category definitions, and the projection feed.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Whether a larger raw value is better or worse for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    HigherIsBetter,
    LowerIsBetter,
}

impl Orientation {
    /// Multiplier that maps a raw stat-space value into "higher is better"
    /// engine space.
    pub fn sign(self) -> f64 {
        match self {
            Orientation::HigherIsBetter => 1.0,
            Orientation::LowerIsBetter => -1.0,
        }
    }
}

/// The ten scored statistical categories.
///
/// Every comparison, sum, or ranking of category values in the engine goes
/// through [`Player::category_score`], which applies the category's
/// orientation exactly once. ERA and WHIP are the only inverted categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    R,
    Tb,
    Rbi,
    Sb,
    Obp,
    K,
    Qs,
    Era,
    Whip,
    Svhd,
}

impl Category {
    pub const COUNT: usize = 10;

    /// All categories, hitting first, in display order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::R,
        Category::Tb,
        Category::Rbi,
        Category::Sb,
        Category::Obp,
        Category::K,
        Category::Qs,
        Category::Era,
        Category::Whip,
        Category::Svhd,
    ];

    pub const HITTING: [Category; 5] = [
        Category::R,
        Category::Tb,
        Category::Rbi,
        Category::Sb,
        Category::Obp,
    ];

    pub const PITCHING: [Category; 5] = [
        Category::K,
        Category::Qs,
        Category::Era,
        Category::Whip,
        Category::Svhd,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::R => "R",
            Category::Tb => "TB",
            Category::Rbi => "RBI",
            Category::Sb => "SB",
            Category::Obp => "OBP",
            Category::K => "K",
            Category::Qs => "QS",
            Category::Era => "ERA",
            Category::Whip => "WHIP",
            Category::Svhd => "SVHD",
        }
    }

    pub fn orientation(self) -> Orientation {
        match self {
            Category::Era | Category::Whip => Orientation::LowerIsBetter,
            _ => Orientation::HigherIsBetter,
        }
    }

    pub fn is_hitting(self) -> bool {
        Category::HITTING.contains(&self)
    }

    /// Stable index into fixed per-category tables.
    pub fn index(self) -> usize {
        Category::ALL
            .iter()
            .position(|c| *c == self)
            .unwrap_or(0)
    }

    /// The categories relevant to the given player type.
    pub fn for_type(is_pitcher: bool) -> &'static [Category] {
        if is_pitcher {
            &Category::PITCHING
        } else {
            &Category::HITTING
        }
    }
}

// ---------------------------------------------------------------------------
// Category scores (tagged by player type)
// ---------------------------------------------------------------------------

/// Per-category projection z-scores for a hitter, in stat space.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HitterScores {
    pub r: f64,
    pub tb: f64,
    pub rbi: f64,
    pub sb: f64,
    pub obp: f64,
}

/// Per-category projection z-scores for a pitcher, in stat space
/// (an above-average ERA/WHIP carries a *positive* raw score here and is
/// inverted by the category orientation on access).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PitcherScores {
    pub k: f64,
    pub qs: f64,
    pub era: f64,
    pub whip: f64,
    pub svhd: f64,
}

/// Tagged category scores: a player is either a hitter or a pitcher, and
/// only the matching category set carries data. Reading a category from the
/// other set yields 0.0: a neutral contribution, not a missing-data signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum CategoryScores {
    Hitter(HitterScores),
    Pitcher(PitcherScores),
}

impl CategoryScores {
    /// Raw (stat-space) score for a category; 0.0 for the other type's
    /// categories.
    pub fn raw(&self, category: Category) -> f64 {
        match (self, category) {
            (CategoryScores::Hitter(h), Category::R) => h.r,
            (CategoryScores::Hitter(h), Category::Tb) => h.tb,
            (CategoryScores::Hitter(h), Category::Rbi) => h.rbi,
            (CategoryScores::Hitter(h), Category::Sb) => h.sb,
            (CategoryScores::Hitter(h), Category::Obp) => h.obp,
            (CategoryScores::Pitcher(p), Category::K) => p.k,
            (CategoryScores::Pitcher(p), Category::Qs) => p.qs,
            (CategoryScores::Pitcher(p), Category::Era) => p.era,
            (CategoryScores::Pitcher(p), Category::Whip) => p.whip,
            (CategoryScores::Pitcher(p), Category::Svhd) => p.svhd,
            _ => 0.0,
        }
    }

    pub fn is_pitcher(&self) -> bool {
        matches!(self, CategoryScores::Pitcher(_))
    }
}

// ---------------------------------------------------------------------------
// Pitcher role
// ---------------------------------------------------------------------------

/// A pitcher's classified role, derived from which counting categories
/// their projection actually populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PitcherRole {
    Starter,
    Reliever,
}

impl PitcherRole {
    /// Raw position code used by roster slot eligibility.
    pub fn position_code(self) -> &'static str {
        match self {
            PitcherRole::Starter => "SP",
            PitcherRole::Reliever => "RP",
        }
    }
}

// ---------------------------------------------------------------------------
// Player record
// ---------------------------------------------------------------------------

/// Team identifier, owned by the league/team collaborator.
pub type TeamId = String;

/// Stable numeric player identifier from the projection feed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PlayerId(pub u32);

/// An immutable projection record for one player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// MLB team abbreviation (display only).
    pub team: String,
    /// Raw position codes the player is eligible at, most specific first.
    /// Empty for pitchers; their classified role is the position.
    pub eligible_positions: Vec<String>,
    pub overall_rank: u32,
    /// Consensus average draft position. `None` means no market data; the
    /// availability model treats such a player as never available.
    pub adp: Option<f64>,
    pub scores: CategoryScores,
    /// Precomputed total value from the projection feed (orientation
    /// already applied by the feed); used only for overall-rank ordering.
    pub total_zscore: f64,
}

impl Player {
    pub fn is_pitcher(&self) -> bool {
        self.scores.is_pitcher()
    }

    /// Oriented score for a category: positive always means "helps."
    pub fn category_score(&self, category: Category) -> f64 {
        self.scores.raw(category) * category.orientation().sign()
    }

    /// Classified role for pitchers. A pitcher projecting quality starts is
    /// a starter; one projecting saves+holds is a reliever; starters by
    /// default.
    pub fn pitcher_role(&self) -> Option<PitcherRole> {
        match &self.scores {
            CategoryScores::Hitter(_) => None,
            CategoryScores::Pitcher(p) => {
                if p.qs != 0.0 {
                    Some(PitcherRole::Starter)
                } else if p.svhd != 0.0 {
                    Some(PitcherRole::Reliever)
                } else {
                    Some(PitcherRole::Starter)
                }
            }
        }
    }

    /// Position codes used for roster eligibility and positional rankings.
    ///
    /// Pitchers report exactly their classified role. Hitters report their
    /// eligible positions, falling back to UTIL when the feed provided none.
    pub fn positions(&self) -> Vec<String> {
        if let Some(role) = self.pitcher_role() {
            return vec![role.position_code().to_string()];
        }
        if self.eligible_positions.is_empty() {
            return vec!["UTIL".to_string()];
        }
        self.eligible_positions.clone()
    }
}

// ---------------------------------------------------------------------------
// Player pool
// ---------------------------------------------------------------------------

/// The full projection pool, indexed by id and ordered by overall rank.
#[derive(Debug, Clone, Default)]
pub struct PlayerPool {
    players: Vec<Player>,
    by_id: HashMap<PlayerId, usize>,
}

impl PlayerPool {
    pub fn new(mut players: Vec<Player>) -> Self {
        players.sort_by_key(|p| p.overall_rank);
        let by_id = players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        PlayerPool { players, by_id }
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.by_id.get(&id).map(|&i| &self.players[i])
    }

    /// All players, ascending by overall rank.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players not in the given drafted/reserved set, rank order preserved.
    pub fn undrafted<'a>(
        &'a self,
        taken: &std::collections::HashSet<PlayerId>,
    ) -> Vec<&'a Player> {
        self.players
            .iter()
            .filter(|p| !taken.contains(&p.id))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Projection feed (CSV)
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to read projection feed {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

/// One row of the projection feed CSV.
///
/// Hitter rows populate r/tb/rbi/sb/obp; pitcher rows populate
/// k/qs/era/whip/svhd. The other type's columns are left empty or zero.
#[derive(Debug, Deserialize)]
struct FeedRow {
    id: u32,
    name: String,
    #[serde(default)]
    team: String,
    player_type: String,
    #[serde(default)]
    positions: String,
    rank: u32,
    #[serde(default)]
    adp: Option<f64>,
    #[serde(default)]
    r: f64,
    #[serde(default)]
    tb: f64,
    #[serde(default)]
    rbi: f64,
    #[serde(default)]
    sb: f64,
    #[serde(default)]
    obp: f64,
    #[serde(default)]
    k: f64,
    #[serde(default)]
    qs: f64,
    #[serde(default)]
    era: f64,
    #[serde(default)]
    whip: f64,
    #[serde(default)]
    svhd: f64,
    total: f64,
}

impl FeedRow {
    fn into_player(self) -> Option<Player> {
        let scores = match self.player_type.as_str() {
            "hitter" => CategoryScores::Hitter(HitterScores {
                r: self.r,
                tb: self.tb,
                rbi: self.rbi,
                sb: self.sb,
                obp: self.obp,
            }),
            "pitcher" => CategoryScores::Pitcher(PitcherScores {
                k: self.k,
                qs: self.qs,
                era: self.era,
                whip: self.whip,
                svhd: self.svhd,
            }),
            _ => return None,
        };

        let eligible_positions: Vec<String> = self
            .positions
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Some(Player {
            id: PlayerId(self.id),
            name: self.name,
            team: self.team,
            eligible_positions,
            overall_rank: self.rank,
            adp: self.adp,
            scores,
            total_zscore: self.total,
        })
    }
}

/// Load the projection feed from a CSV file.
///
/// Malformed rows and rows with an unknown player type are skipped with a
/// warning; they never fail the load. The feed is fully materialized before
/// any engine computation begins.
pub fn load_players(path: &Path) -> Result<Vec<Player>, FeedError> {
    let file = std::fs::File::open(path).map_err(|e| FeedError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut players = Vec::new();
    let mut skipped = 0usize;

    for result in reader.deserialize::<FeedRow>() {
        match result {
            Ok(row) => match row.into_player() {
                Some(player) => players.push(player),
                None => {
                    skipped += 1;
                }
            },
            Err(e) => {
                warn!("skipping malformed projection row: {e}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("projection feed: skipped {skipped} unusable rows");
    }

    Ok(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    fn make_hitter(id: u32, name: &str, rank: u32, scores: HitterScores) -> Player {
        Player {
            id: PlayerId(id),
            name: name.into(),
            team: "TST".into(),
            eligible_positions: vec!["SS".into()],
            overall_rank: rank,
            adp: Some(rank as f64),
            scores: CategoryScores::Hitter(scores),
            total_zscore: 0.0,
        }
    }

    fn make_pitcher(id: u32, name: &str, rank: u32, scores: PitcherScores) -> Player {
        Player {
            id: PlayerId(id),
            name: name.into(),
            team: "TST".into(),
            eligible_positions: vec![],
            overall_rank: rank,
            adp: Some(rank as f64),
            scores: CategoryScores::Pitcher(scores),
            total_zscore: 0.0,
        }
    }

    #[test]
    fn category_tables_are_consistent() {
        assert_eq!(Category::ALL.len(), Category::COUNT);
        assert_eq!(Category::HITTING.len() + Category::PITCHING.len(), Category::COUNT);
        for (i, cat) in Category::ALL.iter().enumerate() {
            assert_eq!(cat.index(), i);
        }
        for cat in Category::HITTING {
            assert!(cat.is_hitting());
        }
        for cat in Category::PITCHING {
            assert!(!cat.is_hitting());
        }
    }

    #[test]
    fn era_and_whip_are_inverted() {
        assert_eq!(Category::Era.orientation(), Orientation::LowerIsBetter);
        assert_eq!(Category::Whip.orientation(), Orientation::LowerIsBetter);
        assert_eq!(Category::K.orientation(), Orientation::HigherIsBetter);
        assert_eq!(Category::Obp.orientation(), Orientation::HigherIsBetter);
    }

    #[test]
    fn oriented_score_flips_era() {
        // A pitcher whose ERA z-score is +1.2 in stat space (bad ERA) must
        // contribute -1.2 in engine space.
        let p = make_pitcher(
            1,
            "High ERA",
            50,
            PitcherScores {
                k: 1.0,
                qs: 0.5,
                era: 1.2,
                whip: -0.3,
                svhd: 0.0,
            },
        );
        assert_eq!(p.category_score(Category::Era), -1.2);
        assert_eq!(p.category_score(Category::Whip), 0.3);
        assert_eq!(p.category_score(Category::K), 1.0);
    }

    #[test]
    fn foreign_category_reads_as_zero() {
        let h = make_hitter(
            1,
            "Hitter",
            10,
            HitterScores {
                r: 1.0,
                ..Default::default()
            },
        );
        assert_eq!(h.category_score(Category::K), 0.0);
        assert_eq!(h.category_score(Category::Era), 0.0);
        assert_eq!(h.category_score(Category::R), 1.0);
    }

    #[test]
    fn pitcher_role_classification() {
        let sp = make_pitcher(
            1,
            "Starter",
            20,
            PitcherScores {
                qs: 1.0,
                ..Default::default()
            },
        );
        assert_eq!(sp.pitcher_role(), Some(PitcherRole::Starter));

        let rp = make_pitcher(
            2,
            "Closer",
            40,
            PitcherScores {
                svhd: 2.0,
                ..Default::default()
            },
        );
        assert_eq!(rp.pitcher_role(), Some(PitcherRole::Reliever));

        // No quality starts and no saves+holds: default to starter.
        let unknown = make_pitcher(3, "Swingman", 200, PitcherScores::default());
        assert_eq!(unknown.pitcher_role(), Some(PitcherRole::Starter));

        let hitter = make_hitter(4, "Hitter", 5, HitterScores::default());
        assert_eq!(hitter.pitcher_role(), None);
    }

    #[test]
    fn pitcher_positions_are_role_only() {
        let rp = make_pitcher(
            1,
            "Closer",
            40,
            PitcherScores {
                svhd: 2.0,
                ..Default::default()
            },
        );
        assert_eq!(rp.positions(), vec!["RP".to_string()]);
    }

    #[test]
    fn hitter_without_positions_falls_back_to_util() {
        let mut h = make_hitter(1, "DH Only", 30, HitterScores::default());
        h.eligible_positions.clear();
        assert_eq!(h.positions(), vec!["UTIL".to_string()]);
    }

    #[test]
    fn pool_orders_by_rank_and_looks_up_by_id() {
        let players = vec![
            make_hitter(3, "Third", 30, HitterScores::default()),
            make_hitter(1, "First", 1, HitterScores::default()),
            make_hitter(2, "Second", 15, HitterScores::default()),
        ];
        let pool = PlayerPool::new(players);
        assert_eq!(pool.players()[0].name, "First");
        assert_eq!(pool.players()[2].name, "Third");
        assert_eq!(pool.get(PlayerId(2)).unwrap().name, "Second");
        assert!(pool.get(PlayerId(99)).is_none());
    }

    #[test]
    fn undrafted_filters_taken_players() {
        let players = vec![
            make_hitter(1, "A", 1, HitterScores::default()),
            make_hitter(2, "B", 2, HitterScores::default()),
            make_hitter(3, "C", 3, HitterScores::default()),
        ];
        let pool = PlayerPool::new(players);
        let taken: HashSet<PlayerId> = [PlayerId(2)].into_iter().collect();
        let undrafted = pool.undrafted(&taken);
        assert_eq!(undrafted.len(), 2);
        assert!(undrafted.iter().all(|p| p.id != PlayerId(2)));
    }

    #[test]
    fn feed_loads_and_skips_bad_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "id,name,team,player_type,positions,rank,adp,r,tb,rbi,sb,obp,k,qs,era,whip,svhd,total"
        )
        .unwrap();
        writeln!(
            file,
            "1,Bobby Witt Jr.,KC,hitter,SS,1,1.5,1.8,2.1,1.2,2.5,0.9,0,0,0,0,0,8.5"
        )
        .unwrap();
        writeln!(
            file,
            "2,Tarik Skubal,DET,pitcher,,2,3.0,0,0,0,0,0,2.4,2.2,-1.9,-1.7,0,8.2"
        )
        .unwrap();
        // Unknown player type: skipped, not fatal.
        writeln!(
            file,
            "3,Mascot,NYM,mascot,,999,,0,0,0,0,0,0,0,0,0,0,0"
        )
        .unwrap();

        let players = load_players(file.path()).unwrap();
        assert_eq!(players.len(), 2);

        let witt = &players[0];
        assert_eq!(witt.id, PlayerId(1));
        assert!(!witt.is_pitcher());
        assert_eq!(witt.eligible_positions, vec!["SS".to_string()]);
        assert_eq!(witt.category_score(Category::R), 1.8);

        let skubal = &players[1];
        assert!(skubal.is_pitcher());
        // Feed stores ERA z in stat space (-1.9 = well below league ERA);
        // oriented access flips it positive.
        assert_eq!(skubal.category_score(Category::Era), 1.9);
        assert_eq!(skubal.pitcher_role(), Some(PitcherRole::Starter));
    }

    #[test]
    fn feed_missing_file_is_an_error() {
        let missing = Path::new("/nonexistent/players.csv");
        assert!(load_players(missing).is_err());
    }
}
