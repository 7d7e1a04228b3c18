// Draft board entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr; the report goes to stdout)
// 2. Load config
// 3. Open database
// 4. Load the projection feed
// 5. Restore saved draft/keeper state, or start fresh
// 6. Run one recompute pass
// 7. Print the recommendation board and standings summary

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};

use draftboard::config;
use draftboard::db::Database;
use draftboard::draft::state::DraftState;
use draftboard::engine;
use draftboard::keeper::analyzer::analyze_keepers;
use draftboard::player::{load_players, PlayerPool};
use draftboard::valuation::availability::NormalCdfCurve;

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("draftboard starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "config loaded: league={}, {} teams, {} rounds, season {}",
        config.league.name, config.league.num_teams, config.league.num_rounds, config.league.season
    );

    // 3. Open database
    if let Some(parent) = PathBuf::from(&config.db_path).parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("database opened at {}", config.db_path);

    // 4. Load the projection feed
    let players_path = players_path(&config);
    let players = load_players(&players_path)
        .with_context(|| format!("failed to load projections from {}", players_path.display()))?;
    info!("loaded {} players from projection feed", players.len());
    let pool = PlayerPool::new(players);

    // 5. Restore saved state, or start fresh
    let season = config.league.season;
    let mut draft = match db.load_draft_state(season)? {
        Some(doc) => {
            info!(
                "restored draft state: {} picks made, pick {} on the clock",
                doc.picks.len(),
                doc.current_pick_index + 1
            );
            DraftState::from_document(doc, &config.league)
        }
        None => {
            info!("no saved draft state; starting fresh");
            DraftState::new(config.league.draft_order.clone(), config.league.num_rounds)
        }
    };

    let keepers = db.load_keeper_state(season)?.unwrap_or_default();
    if !keepers.unmatched.is_empty() {
        warn!(
            "{} keeper entries could not be resolved against the player pool:",
            keepers.unmatched.len()
        );
        for unmatched in &keepers.unmatched {
            warn!("  unmatched keeper: {}", unmatched.name);
        }
    }
    if !keepers.entries.is_empty() && draft.keepers().is_empty() {
        let unreserved = draft.reserve_keepers(keepers.entries.clone(), &config.league);
        for entry in &unreserved {
            warn!(
                "keeper for {} has no pick in its cost round; not reserved",
                entry.team_id
            );
        }
    }

    // 6. Recompute
    let curve = NormalCdfCurve::new(config.model.adp_sigma);
    let valuations = engine::recompute(&config, &pool, &draft, &curve);

    // 7. Report
    print_board(&valuations);
    print_standings(&valuations);
    print_keeper_plan(&config, &pool, &draft);

    // Persist the (possibly reconstructed) state so the next session
    // resumes from the same picture.
    db.save_draft_state(season, &draft.to_document(season))?;
    info!("draft state saved");

    Ok(())
}

/// Resolve the projection feed path: explicit config first, then the
/// platform data directory.
fn players_path(config: &config::Config) -> PathBuf {
    if let Some(path) = &config.data_paths.players {
        return PathBuf::from(path);
    }
    directories::ProjectDirs::from("", "", "draftboard")
        .map(|dirs| dirs.data_dir().join("players.csv"))
        .unwrap_or_else(|| PathBuf::from("players.csv"))
}

fn print_board(valuations: &engine::Valuations) {
    match valuations.board.first() {
        Some(_) => {
            let on_clock_gap = valuations.picks_until_my_turn;
            println!("== Recommendation board ({} until your next pick) ==", on_clock_gap);
            println!(
                "{:<4} {:<24} {:<10} {:>7} {:>7} {:>7} {:>6} {:>5}",
                "#", "Player", "Pos", "Score", "Value", "VONA", "MCW", "Fit"
            );
            for (i, entry) in valuations.board.iter().take(15).enumerate() {
                println!(
                    "{:<4} {:<24} {:<10} {:>7.2} {:>7.2} {:>7.2} {:>6.3} {:>5}",
                    i + 1,
                    entry.name,
                    entry.positions.join("/"),
                    entry.score.score,
                    entry.score.normalized_value,
                    entry.score.vona,
                    entry.score.mcw,
                    if entry.score.fills_starting_slot { "yes" } else { "-" }
                );
            }
        }
        None => println!("== Player pool exhausted: no recommendations =="),
    }
    if !valuations.my_roster.overflow.is_empty() {
        println!(
            "note: {} rostered players fit no slot",
            valuations.my_roster.overflow.len()
        );
    }
}

fn print_standings(valuations: &engine::Valuations) {
    let Some(standings) = &valuations.standings else {
        println!("\n(standings model unavailable: fewer than two teams have drafted)");
        return;
    };
    println!(
        "\n== Category standings (expected weekly wins: {:.2}) ==",
        standings.expected_weekly_wins
    );
    for s in &standings.standings {
        println!(
            "{:<5} rank {:>4.1}  win {:>5.2}  {:?}",
            s.category.label(),
            s.rank,
            s.win_prob,
            s.strategy
        );
    }
}

fn print_keeper_plan(
    config: &config::Config,
    pool: &PlayerPool,
    draft: &DraftState,
) {
    let my_team = &config.league.my_team;
    let my_candidates: Vec<_> = draft
        .keepers()
        .iter()
        .filter(|entry| &entry.team_id == my_team)
        .cloned()
        .collect();
    if my_candidates.is_empty() {
        return;
    }
    let plan = analyze_keepers(config, pool, &my_candidates, draft.keepers());
    println!(
        "\n== Keeper plan (score {:.2}: surplus {:.2} + diversity {:.2} - collisions {:.2}) ==",
        plan.score, plan.surplus_total, plan.diversity_bonus, plan.collision_penalty
    );
    for valuation in &plan.chosen {
        let name = pool
            .get(valuation.entry.player_id)
            .map(|p| p.name.as_str())
            .unwrap_or("<unknown>");
        println!(
            "round {:>2}: {:<24} value {:>6.2}  surplus {:>6.2}",
            valuation.cost_round, name, valuation.value, valuation.surplus
        );
    }
}

/// Initialize tracing to stderr so stdout stays clean for the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("draftboard=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
