// SQLite persistence layer for draft and keeper state documents.
//
// The store is deliberately dumb: one JSON document per season per table,
// upserted whole. The engine owns the document shape; the store only
// round-trips it.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::draft::state::StateDocument;
use crate::keeper::ResolvedKeepers;

/// SQLite-backed persistence for draft-state and keeper-state documents.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database
    /// (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS draft_state (
                season     INTEGER PRIMARY KEY,
                state_json TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS keepers_state (
                season     INTEGER PRIMARY KEY,
                state_json TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database mutex poisoned"))
    }

    /// Upsert the draft-state document for a season.
    pub fn save_draft_state(&self, season: i32, doc: &StateDocument) -> Result<()> {
        let json = serde_json::to_string(doc).context("failed to serialize draft state")?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO draft_state (season, state_json) VALUES (?1, ?2)
             ON CONFLICT (season) DO UPDATE SET
               state_json = excluded.state_json,
               updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![season, json],
        )
        .context("failed to save draft state")?;
        Ok(())
    }

    /// Load the draft-state document for a season, if one was saved.
    pub fn load_draft_state(&self, season: i32) -> Result<Option<StateDocument>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT state_json FROM draft_state WHERE season = ?1",
                params![season],
                |row| row.get(0),
            )
            .optional()
            .context("failed to load draft state")?;
        match json {
            Some(json) => {
                let doc = serde_json::from_str(&json)
                    .context("failed to deserialize draft state")?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    /// Upsert the resolved-keepers document for a season.
    pub fn save_keeper_state(&self, season: i32, keepers: &ResolvedKeepers) -> Result<()> {
        let json = serde_json::to_string(keepers).context("failed to serialize keeper state")?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO keepers_state (season, state_json) VALUES (?1, ?2)
             ON CONFLICT (season) DO UPDATE SET
               state_json = excluded.state_json,
               updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![season, json],
        )
        .context("failed to save keeper state")?;
        Ok(())
    }

    /// Load the resolved-keepers document for a season, if one was saved.
    pub fn load_keeper_state(&self, season: i32) -> Result<Option<ResolvedKeepers>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT state_json FROM keepers_state WHERE season = ?1",
                params![season],
                |row| row.get(0),
            )
            .optional()
            .context("failed to load keeper state")?;
        match json {
            Some(json) => {
                let keepers = serde_json::from_str(&json)
                    .context("failed to deserialize keeper state")?;
                Ok(Some(keepers))
            }
            None => Ok(None),
        }
    }

    /// Remove both documents for a season (fresh-draft reset).
    pub fn clear_season(&self, season: i32) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM draft_state WHERE season = ?1", params![season])
            .context("failed to clear draft state")?;
        conn.execute(
            "DELETE FROM keepers_state WHERE season = ?1",
            params![season],
        )
        .context("failed to clear keeper state")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
