// Configuration loading and parsing (league.toml, model.toml).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub model: ModelConfig,
    pub db_path: String,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub season: i32,
    pub num_teams: usize,
    pub num_rounds: usize,
    /// Teams that make the playoffs; drives strategy thresholds.
    pub playoff_spots: usize,
    /// Maximum keepers a team may retain.
    pub keeper_limit: usize,
    /// Rounds of cost discount earned per keeper season held.
    #[serde(default = "default_keeper_round_discount")]
    pub keeper_round_discount: u32,
    /// Round-1 pick order (team ids).
    pub draft_order: Vec<String>,
    /// Team id -> display name.
    pub teams: HashMap<String, String>,
    /// The id of the team this engine advises.
    pub my_team: String,
    /// Roster slot name -> capacity.
    pub roster: HashMap<String, usize>,
    /// Position code -> eligible slots, most restrictive first, bench last.
    /// League-specific and externally authored; the engine never hard-codes
    /// slot eligibility.
    pub position_slots: HashMap<String, Vec<String>>,
}

fn default_keeper_round_discount() -> u32 {
    5
}

impl LeagueConfig {
    /// Total roster slots per team across all slot names.
    pub fn total_slots(&self) -> usize {
        self.roster.values().sum()
    }

    /// The draftable-window size: top `teams * rounds` remaining players.
    pub fn draftable_window(&self) -> usize {
        self.num_teams * self.num_rounds
    }

    pub fn team_name<'a>(&'a self, team_id: &'a str) -> &'a str {
        self.teams
            .get(team_id)
            .map(String::as_str)
            .unwrap_or(team_id)
    }
}

// ---------------------------------------------------------------------------
// model.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire model.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ModelFile {
    #[serde(default)]
    model: ModelConfig,
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DataPaths {
    /// Projection/ADP feed CSV. When unset, the binary resolves a default
    /// under the platform data directory.
    pub players: Option<String>,
}

/// Scoring-model coefficients. Every field is a tunable with a benchmarked
/// default; model.toml overrides individual values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Weight on MCW in the standings-aware score.
    pub mcw_weight: f64,
    pub vona_weight_mcw: f64,
    pub vona_weight_bpa: f64,
    pub urgency_weight_mcw: f64,
    pub urgency_weight_bpa: f64,
    /// Score discount for players likely to still be there next turn.
    pub availability_discount: f64,
    pub bench_penalty_rate: f64,
    /// How much of a bench player's stats count toward team totals.
    /// Pitchers contribute more in daily leagues (streaming starts,
    /// swapping in relievers).
    pub hitter_bench_contribution: f64,
    pub pitcher_bench_contribution: f64,
    /// Stdev of the ADP survival curve, in picks.
    pub adp_sigma: f64,
    /// Standings-confidence ramp, in total league-wide picks.
    pub confidence_start: usize,
    pub confidence_end: usize,
    /// MCW credit multiplier per category strategy.
    pub target_mcw_weight: f64,
    pub neutral_mcw_weight: f64,
    pub lock_mcw_weight: f64,
    /// Keeper-search category-diversity bonus budget and per-category cap.
    /// Kept small relative to typical surplus magnitudes.
    pub keeper_diversity_budget: f64,
    pub keeper_diversity_cap: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            mcw_weight: 21.0,
            vona_weight_mcw: 0.16,
            vona_weight_bpa: 0.42,
            urgency_weight_mcw: 0.02,
            urgency_weight_bpa: 0.55,
            availability_discount: 0.19,
            bench_penalty_rate: 0.63,
            hitter_bench_contribution: 0.20,
            pitcher_bench_contribution: 0.45,
            adp_sigma: 18.0,
            confidence_start: 40,
            confidence_end: 81,
            target_mcw_weight: 1.0,
            neutral_mcw_weight: 0.8,
            lock_mcw_weight: 0.4,
            keeper_diversity_budget: 1.5,
            keeper_diversity_cap: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// (optionally) `config/model.toml`, relative to the given `base_dir`.
///
/// league.toml is required; model.toml falls back to defaults when absent.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;
    let league = league_file.league;

    // --- model.toml (optional) ---
    let model_path = config_dir.join("model.toml");
    let (model, db_path, data_paths) = if model_path.exists() {
        let model_text = read_file(&model_path)?;
        let model_file: ModelFile =
            toml::from_str(&model_text).map_err(|e| ConfigError::ParseError {
                path: model_path.clone(),
                source: e,
            })?;
        (
            model_file.model,
            model_file.database.path,
            model_file.data_paths,
        )
    } else {
        (ModelConfig::default(), None, DataPaths::default())
    };

    let config = Config {
        league,
        model,
        db_path: db_path.unwrap_or_else(default_db_path),
        data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Load configuration from the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_from(&cwd)
}

fn default_db_path() -> String {
    directories::ProjectDirs::from("", "", "draftboard")
        .map(|dirs| dirs.data_dir().join("draftboard.db").display().to_string())
        .unwrap_or_else(|| "draftboard.db".to_string())
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject structurally invalid configuration before any engine use. These
/// are the only fatal conditions in the system; everything downstream
/// degrades to a documented fallback.
fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;

    if league.num_teams < 2 {
        return Err(ConfigError::ValidationError {
            field: "league.num_teams".into(),
            message: format!("need at least 2 teams, got {}", league.num_teams),
        });
    }

    if league.num_rounds == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.num_rounds".into(),
            message: "need at least 1 round".into(),
        });
    }

    if league.total_slots() == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.roster".into(),
            message: "roster has zero total slots".into(),
        });
    }

    if league.draft_order.len() != league.num_teams {
        return Err(ConfigError::ValidationError {
            field: "league.draft_order".into(),
            message: format!(
                "draft_order has {} entries for {} teams",
                league.draft_order.len(),
                league.num_teams
            ),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for team_id in &league.draft_order {
        if !seen.insert(team_id) {
            return Err(ConfigError::ValidationError {
                field: "league.draft_order".into(),
                message: format!("team `{team_id}` appears more than once"),
            });
        }
        if !league.teams.contains_key(team_id) {
            return Err(ConfigError::ValidationError {
                field: "league.draft_order".into(),
                message: format!("team `{team_id}` is not defined in [league.teams]"),
            });
        }
    }

    if !league.teams.contains_key(&league.my_team) {
        return Err(ConfigError::ValidationError {
            field: "league.my_team".into(),
            message: format!("team `{}` is not defined in [league.teams]", league.my_team),
        });
    }

    if league.keeper_limit > league.num_rounds {
        return Err(ConfigError::ValidationError {
            field: "league.keeper_limit".into(),
            message: format!(
                "keeper_limit {} exceeds num_rounds {}",
                league.keeper_limit, league.num_rounds
            ),
        });
    }

    for (position, slots) in &league.position_slots {
        for slot in slots {
            if !league.roster.contains_key(slot) {
                return Err(ConfigError::ValidationError {
                    field: "league.position_slots".into(),
                    message: format!(
                        "position `{position}` maps to unknown roster slot `{slot}`"
                    ),
                });
            }
        }
    }

    if league.playoff_spots == 0 || league.playoff_spots > league.num_teams {
        return Err(ConfigError::ValidationError {
            field: "league.playoff_spots".into(),
            message: format!(
                "playoff_spots {} must be in 1..={}",
                league.playoff_spots, league.num_teams
            ),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
