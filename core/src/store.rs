//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The engine never persists anything itself; callers hand finished
//! tables and event logs to the store.

use rusqlite::{Connection, params};
use crate::{
    calibration::{ReferenceRow, ReferenceTable},
    error::SimResult,
    event::EventLogEntry,
    snapshot::{ResultTable, YearSnapshot},
    types::Year,
};

/// A stored run header.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub run_id:     String,
    pub base_year:  Year,
    pub years:      u32,
    pub scenario:   Option<String>,
    pub started_at: String,
}

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the simulation database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // An in-memory database keeps journal_mode=memory.
        if path != ":memory:" {
            let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            log::debug!("store: opened {path} (journal_mode={mode})");
        }
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        base_year: Year,
        years: u32,
        scenario: Option<&str>,
    ) -> SimResult<()> {
        let started_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO run (run_id, base_year, years, scenario, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, base_year, years, scenario, started_at],
        )?;
        Ok(())
    }

    pub fn get_run(&self, run_id: &str) -> SimResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, base_year, years, scenario, started_at
             FROM run WHERE run_id = ?1"
        )?;
        let mut rows = stmt.query_map(params![run_id], |row| {
            Ok(RunRecord {
                run_id:     row.get(0)?,
                base_year:  row.get(1)?,
                years:      row.get(2)?,
                scenario:   row.get(3)?,
                started_at: row.get(4)?,
            })
        })?;
        let record = rows.next().transpose()?;
        Ok(record)
    }

    // ── Year snapshots ─────────────────────────────────────────

    /// Store every row of a finished table in one transaction.
    pub fn save_result_table(&mut self, run_id: &str, table: &ResultTable) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO year_snapshot (run_id, year, row_json) VALUES (?1, ?2, ?3)"
            )?;
            for snapshot in table.iter() {
                let row_json = serde_json::to_string(snapshot)?;
                stmt.execute(params![run_id, snapshot.year(), row_json])?;
            }
        }
        tx.commit()?;
        log::debug!("store: saved {} rows for run {run_id}", table.len());
        Ok(())
    }

    pub fn load_result_table(&self, run_id: &str) -> SimResult<ResultTable> {
        let mut stmt = self.conn.prepare(
            "SELECT row_json FROM year_snapshot WHERE run_id = ?1 ORDER BY year ASC"
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let rows = rows
            .iter()
            .map(|json| serde_json::from_str::<YearSnapshot>(json))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ResultTable { rows })
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, year, subsystem, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                entry.year,
                entry.subsystem,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn append_events(&mut self, entries: &[EventLogEntry]) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO event_log (run_id, year, subsystem, event_type, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            )?;
            for e in entries {
                stmt.execute(params![e.run_id, e.year, e.subsystem, e.event_type, e.payload])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn events_for_year(&self, run_id: &str, year: Year) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, year, subsystem, event_type, payload
             FROM event_log WHERE run_id = ?1 AND year = ?2
             ORDER BY id ASC"
        )?;
        let entries = stmt.query_map(params![run_id, year], |row| {
            Ok(EventLogEntry {
                id:         Some(row.get(0)?),
                run_id:     row.get(1)?,
                year:       row.get(2)?,
                subsystem:  row.get(3)?,
                event_type: row.get(4)?,
                payload:    row.get(5)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Reference series ───────────────────────────────────────

    /// Store a reference table under `name`, replacing any previous copy.
    pub fn insert_reference_table(&mut self, name: &str, table: &ReferenceTable) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM reference_series WHERE name = ?1", params![name])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO reference_series (name, row_index, column_name, value)
                 VALUES (?1, ?2, ?3, ?4)"
            )?;
            for (index, row) in table.rows.iter().enumerate() {
                for (column, value) in row {
                    stmt.execute(params![name, index as i64, column, value])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Rows come back in their original order. An unknown name yields an
    /// empty table.
    pub fn load_reference_table(&self, name: &str) -> SimResult<ReferenceTable> {
        let mut stmt = self.conn.prepare(
            "SELECT row_index, column_name, value FROM reference_series
             WHERE name = ?1 ORDER BY row_index ASC, column_name ASC"
        )?;
        let cells = stmt.query_map(params![name], |row| {
            Ok((
                row.get::<_, i64>(0)? as usize,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?.collect::<Result<Vec<_>, _>>()?;

        let mut rows: Vec<ReferenceRow> = Vec::new();
        for (index, column, value) in cells {
            if rows.len() <= index {
                rows.resize_with(index + 1, ReferenceRow::new);
            }
            rows[index].insert(column, value);
        }
        Ok(ReferenceTable::new(rows))
    }
}
