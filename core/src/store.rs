//! SQLite persistence for named scenarios and finished run reports.
//!
//! RULE: Only store.rs talks to the database.
//! The simulation core never touches disk; callers persist results here.

use crate::{
    aggregate::AggregateReport,
    config::{ParameterSet, ScenarioConfig},
    error::{SimError, SimResult},
    types::RunId,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

/// Index row for a stored report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub run_id:           RunId,
    pub scenario_name:    String,
    pub seed:             u64,
    pub trials_completed: u64,
    pub trials_failed:    u64,
    pub created_at:       DateTime<Utc>,
}

pub struct ScenarioStore {
    conn: Connection,
}

impl ScenarioStore {
    /// Open (or create) the scenario database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL is best-effort; some filesystems refuse it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_scenarios.sql"))?;
        Ok(())
    }

    // ── Scenarios ──────────────────────────────────────────────

    /// Insert or replace the scenario under its own name.
    pub fn save_scenario(&self, params: &ParameterSet) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO scenario (name, config_json, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                 config_json = excluded.config_json,
                 updated_at  = excluded.updated_at",
            params![
                params.config().name,
                serde_json::to_string(params)?,
                timestamp(),
            ],
        )?;
        Ok(())
    }

    /// Load a scenario by name and validate it again.
    pub fn load_scenario(&self, name: &str) -> SimResult<ParameterSet> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT config_json FROM scenario WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let json = json.ok_or_else(|| SimError::ScenarioNotFound { name: name.to_string() })?;
        let config: ScenarioConfig = serde_json::from_str(&json)?;
        Ok(ParameterSet::new(config)?)
    }

    pub fn scenario_names(&self) -> SimResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM scenario ORDER BY name ASC")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    // ── Reports ────────────────────────────────────────────────

    /// Persist a report under a fresh run id and return the id.
    pub fn save_report(&self, report: &AggregateReport) -> SimResult<RunId> {
        let run_id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO run_report
                 (run_id, scenario_name, seed, trials_completed, trials_failed, report_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                report.scenario_name,
                report.scenario_seed as i64,
                report.trials_completed as i64,
                report.trials_failed as i64,
                serde_json::to_string(report)?,
                timestamp(),
            ],
        )?;
        log::debug!("Saved report {run_id} for '{}'", report.scenario_name);
        Ok(run_id)
    }

    pub fn load_report(&self, run_id: &str) -> SimResult<AggregateReport> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT report_json FROM run_report WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        let json = json.ok_or_else(|| SimError::RunNotFound { run_id: run_id.to_string() })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Reports for one scenario, oldest first.
    pub fn reports_for_scenario(&self, scenario_name: &str) -> SimResult<Vec<ReportSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, scenario_name, seed, trials_completed, trials_failed, created_at
             FROM run_report WHERE scenario_name = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![scenario_name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(run_id, scenario_name, seed, completed, failed, stamp)| -> SimResult<_> {
                let created_at = DateTime::parse_from_rfc3339(&stamp)
                    .map_err(|e| anyhow::anyhow!("bad timestamp on run {run_id}: {e}"))?
                    .with_timezone(&Utc);
                Ok(ReportSummary {
                    run_id,
                    scenario_name,
                    seed: seed as u64,
                    trials_completed: completed as u64,
                    trials_failed: failed as u64,
                    created_at,
                })
            })
            .collect()
    }
}

/// Fixed-width UTC timestamp, so text order is time order.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
