use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::error::{DatabaseError, Result as RunStatusResult};
use crate::models::{Goal, GoalType, Snapshot};
use crate::source::SnapshotSource;

/// SQLite store for daily snapshots and distance goals
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create or open a database at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, DatabaseError> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::ConnectionFailed {
                reason: format!("{}: {}", parent.display(), e),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed {
            reason: format!("{}: {}", path.display(), e),
        })?;
        tracing::debug!(path = %path.display(), "Opened snapshot database");

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Fresh database that lives only as long as the handle
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|e| DatabaseError::ConnectionFailed {
            reason: e.to_string(),
        })?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;

        // One snapshot per timestamp; the sparse fields live in the JSON payload
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recorded_at TEXT NOT NULL UNIQUE,
                payload TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_snapshots_recorded_at
                ON snapshots(recorded_at DESC);

            CREATE TABLE IF NOT EXISTS goals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                goal_type TEXT NOT NULL,
                target_value REAL NOT NULL,
                period_start DATE,
                is_active INTEGER NOT NULL DEFAULT 1
            );
            "#,
        )?;

        Ok(())
    }

    /// Store a snapshot, replacing any earlier one with the same timestamp
    pub fn insert_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), DatabaseError> {
        let payload = encode_payload(snapshot)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshots (recorded_at, payload) VALUES (?1, ?2)",
            params![snapshot.recorded_at, payload],
        )?;
        Ok(())
    }

    /// Store a batch of snapshots in one transaction
    pub fn insert_snapshots(&mut self, snapshots: &[Snapshot]) -> Result<usize, DatabaseError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO snapshots (recorded_at, payload) VALUES (?1, ?2)",
            )?;
            for snapshot in snapshots {
                stmt.execute(params![snapshot.recorded_at, encode_payload(snapshot)?])?;
            }
        }
        tx.commit()?;

        tracing::info!(count = snapshots.len(), "Stored snapshots");
        Ok(snapshots.len())
    }

    pub fn latest_snapshot(&self) -> Result<Option<Snapshot>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT recorded_at, payload FROM snapshots ORDER BY recorded_at DESC LIMIT 1",
                [],
                raw_snapshot,
            )
            .optional()?;

        row.map(decode_snapshot).transpose()
    }

    /// Up to `limit` snapshots, newest first
    pub fn recent_snapshots(&self, limit: usize) -> Result<Vec<Snapshot>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT recorded_at, payload FROM snapshots ORDER BY recorded_at DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], raw_snapshot)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(decode_snapshot).collect()
    }

    pub fn count_snapshots(&self) -> Result<usize, DatabaseError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn create_goal(
        &mut self,
        goal_type: GoalType,
        target_value: f64,
        period_start: Option<NaiveDate>,
    ) -> Result<Goal, DatabaseError> {
        let created_at = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        self.conn.execute(
            r#"
            INSERT INTO goals (created_at, goal_type, target_value, period_start, is_active)
            VALUES (?1, ?2, ?3, ?4, 1)
            "#,
            params![created_at, goal_type.to_string(), target_value, period_start],
        )?;

        let goal = Goal {
            id: self.conn.last_insert_rowid(),
            created_at,
            goal_type,
            target_value,
            period_start,
            is_active: true,
        };
        tracing::info!(id = goal.id, goal_type = %goal_type, target_value, "Created goal");
        Ok(goal)
    }

    pub fn active_goals(&self) -> Result<Vec<Goal>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, created_at, goal_type, target_value, period_start, is_active
            FROM goals
            WHERE is_active = 1
            ORDER BY id
            "#,
        )?;

        let goals = stmt
            .query_map([], goal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    /// Mark a goal inactive; errors if no goal has that id
    pub fn deactivate_goal(&mut self, id: i64) -> Result<(), DatabaseError> {
        let changed = self
            .conn
            .execute("UPDATE goals SET is_active = 0 WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(DatabaseError::NotFound {
                table: "goals".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

impl SnapshotSource for Database {
    fn fetch_recent(&self, limit: usize) -> RunStatusResult<Vec<Snapshot>> {
        Ok(self.recent_snapshots(limit)?)
    }
}

fn encode_payload(snapshot: &Snapshot) -> Result<String, DatabaseError> {
    serde_json::to_string(snapshot).map_err(|e| DatabaseError::CorruptPayload {
        table: "snapshots".to_string(),
        reason: e.to_string(),
    })
}

fn raw_snapshot(row: &Row) -> rusqlite::Result<(String, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn decode_snapshot((recorded_at, payload): (String, String)) -> Result<Snapshot, DatabaseError> {
    let mut snapshot: Snapshot =
        serde_json::from_str(&payload).map_err(|e| DatabaseError::CorruptPayload {
            table: "snapshots".to_string(),
            reason: format!("{}: {}", recorded_at, e),
        })?;
    snapshot.recorded_at = recorded_at;
    Ok(snapshot)
}

fn goal_from_row(row: &Row) -> rusqlite::Result<Goal> {
    let goal_type: String = row.get("goal_type")?;
    let goal_type = goal_type.parse::<GoalType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Goal {
        id: row.get("id")?,
        created_at: row.get("created_at")?,
        goal_type,
        target_value: row.get("target_value")?,
        period_start: row.get("period_start")?,
        is_active: row.get("is_active")?,
    })
}
