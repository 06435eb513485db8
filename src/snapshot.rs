use crate::canonical::StateSummary;
use crate::dfa::DfaEdge;
use crate::ledger::StatsSnapshot;
use crate::ptg::PageTransitionGraph;
use crate::state::WindowState;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Everything a finished session leaves behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub session_id: String,
    pub stats:      StatsSnapshot,
    pub ptg:        PageTransitionGraph,
    pub dfa:        Vec<DfaEdge>,
    /// Canonical states with visit counts and folded near-duplicates.
    pub states:     Vec<StateSummary>,
    /// Every raw observation, before folding.
    pub all_states: Vec<WindowState>,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Append one periodic snapshot.
    async fn save_stats(&self, snapshot: StatsSnapshot) -> Result<(), String>;

    /// Store the final report of a session, replacing any earlier one.
    async fn save_final(&self, report: FinalReport) -> Result<(), String>;

    /// All periodic snapshots of a session, oldest first.
    async fn load_stats(&self, session_id: &str) -> Result<Vec<StatsSnapshot>, String>;

    async fn load_final(&self, session_id: &str) -> Result<Option<FinalReport>, String>;

    async fn list_sessions(&self) -> Result<Vec<String>, String>;
}

// ── In-memory ────────────────────────────────────────────

/// A simple in-memory store for tests and short-lived sessions.
#[derive(Default)]
pub struct MemorySnapshotStore {
    stats:  Mutex<HashMap<String, Vec<StatsSnapshot>>>, // session_id -> snapshots
    finals: Mutex<HashMap<String, FinalReport>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save_stats(&self, snapshot: StatsSnapshot) -> Result<(), String> {
        self.stats.lock()
            .entry(snapshot.session_id.clone())
            .or_default()
            .push(snapshot);
        Ok(())
    }

    async fn save_final(&self, report: FinalReport) -> Result<(), String> {
        self.finals.lock().insert(report.session_id.clone(), report);
        Ok(())
    }

    async fn load_stats(&self, session_id: &str) -> Result<Vec<StatsSnapshot>, String> {
        Ok(self.stats.lock().get(session_id).cloned().unwrap_or_default())
    }

    async fn load_final(&self, session_id: &str) -> Result<Option<FinalReport>, String> {
        Ok(self.finals.lock().get(session_id).cloned())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, String> {
        let mut sessions: Vec<String> = self.stats.lock().keys().cloned().collect();
        for id in self.finals.lock().keys() {
            if !sessions.contains(id) {
                sessions.push(id.clone());
            }
        }
        sessions.sort();
        Ok(sessions)
    }
}

// ── JSON files ───────────────────────────────────────────

/// Writes one directory per session:
///
/// ```text
/// <base>/<session>/data/<elapsed_secs>.json
/// <base>/<session>/final.json
/// <base>/<session>/ptg.json
/// <base>/<session>/dfa.json
/// <base>/<session>/states.json
/// ```
pub struct FileSnapshotStore {
    base_path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let _ = std::fs::create_dir_all(&path);
        Self { base_path: path }
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.base_path.join(session_id)
    }

    fn write_json<T: Serialize>(path: PathBuf, value: &T) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let data = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
        std::fs::write(&path, data).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save_stats(&self, snapshot: StatsSnapshot) -> Result<(), String> {
        let path = self.session_dir(&snapshot.session_id)
            .join("data")
            .join(format!("{}.json", snapshot.elapsed_secs));
        Self::write_json(path, &snapshot)
    }

    async fn save_final(&self, report: FinalReport) -> Result<(), String> {
        let dir = self.session_dir(&report.session_id);
        Self::write_json(dir.join("ptg.json"), &report.ptg)?;
        Self::write_json(dir.join("dfa.json"), &report.dfa)?;
        Self::write_json(dir.join("states.json"), &report.states)?;
        Self::write_json(dir.join("final.json"), &report)
    }

    async fn load_stats(&self, session_id: &str) -> Result<Vec<StatsSnapshot>, String> {
        let dir = self.session_dir(session_id).join("data");
        if !dir.exists() { return Ok(Vec::new()); }
        let mut snapshots = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| e.to_string())? {
            let entry = entry.map_err(|e| e.to_string())?;
            let data = std::fs::read_to_string(entry.path()).map_err(|e| e.to_string())?;
            let snapshot: StatsSnapshot = serde_json::from_str(&data).map_err(|e| e.to_string())?;
            snapshots.push(snapshot);
        }
        snapshots.sort_by_key(|s| s.elapsed_secs);
        Ok(snapshots)
    }

    async fn load_final(&self, session_id: &str) -> Result<Option<FinalReport>, String> {
        let path = self.session_dir(session_id).join("final.json");
        if !path.exists() { return Ok(None); }
        let data = std::fs::read_to_string(&path).map_err(|e| e.to_string())?;
        serde_json::from_str(&data).map(Some).map_err(|e| e.to_string())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, String> {
        let mut sessions = Vec::new();
        for entry in std::fs::read_dir(&self.base_path).map_err(|e| e.to_string())? {
            let entry = entry.map_err(|e| e.to_string())?;
            if entry.path().is_dir() {
                sessions.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        sessions.sort();
        Ok(sessions)
    }
}

// ── SQLite ───────────────────────────────────────────────

/// A snapshot store backed by a SQLite database.
pub struct SqliteSnapshotStore {
    path: PathBuf,
}

impl SqliteSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        let conn = rusqlite::Connection::open(&path).map_err(|e| e.to_string())?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS stats (
                session_id   TEXT    NOT NULL,
                elapsed_secs INTEGER NOT NULL,
                timestamp    TEXT    NOT NULL,
                payload      TEXT    NOT NULL
            );
            CREATE TABLE IF NOT EXISTS final_reports (
                session_id TEXT PRIMARY KEY,
                payload    TEXT NOT NULL
            );",
        ).map_err(|e| e.to_string())?;
        Ok(Self { path })
    }

    fn get_conn(&self) -> Result<rusqlite::Connection, String> {
        rusqlite::Connection::open(&self.path).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn save_stats(&self, snapshot: StatsSnapshot) -> Result<(), String> {
        let conn = self.get_conn()?;
        let payload = serde_json::to_string(&snapshot).map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO stats (session_id, elapsed_secs, timestamp, payload)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                snapshot.session_id,
                snapshot.elapsed_secs as i64,
                snapshot.timestamp.to_rfc3339(),
                payload
            ],
        ).map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn save_final(&self, report: FinalReport) -> Result<(), String> {
        let conn = self.get_conn()?;
        let payload = serde_json::to_string(&report).map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT OR REPLACE INTO final_reports (session_id, payload) VALUES (?1, ?2)",
            rusqlite::params![report.session_id, payload],
        ).map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn load_stats(&self, session_id: &str) -> Result<Vec<StatsSnapshot>, String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT payload FROM stats WHERE session_id = ?1 ORDER BY elapsed_secs ASC, rowid ASC"
        ).map_err(|e| e.to_string())?;
        let rows = stmt.query_map(rusqlite::params![session_id], |row| row.get::<_, String>(0))
            .map_err(|e| e.to_string())?;
        let mut snapshots = Vec::new();
        for payload in rows {
            let payload = payload.map_err(|e| e.to_string())?;
            snapshots.push(serde_json::from_str(&payload).map_err(|e| e.to_string())?);
        }
        Ok(snapshots)
    }

    async fn load_final(&self, session_id: &str) -> Result<Option<FinalReport>, String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT payload FROM final_reports WHERE session_id = ?1")
            .map_err(|e| e.to_string())?;
        let mut rows = stmt.query(rusqlite::params![session_id]).map_err(|e| e.to_string())?;
        if let Some(row) = rows.next().map_err(|e| e.to_string())? {
            let payload: String = row.get(0).map_err(|e| e.to_string())?;
            Ok(Some(serde_json::from_str(&payload).map_err(|e| e.to_string())?))
        } else {
            Ok(None)
        }
    }

    async fn list_sessions(&self) -> Result<Vec<String>, String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT session_id FROM stats UNION SELECT session_id FROM final_reports ORDER BY 1"
        ).map_err(|e| e.to_string())?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(|e| e.to_string())?;
        let mut sessions = Vec::new();
        for session in rows {
            sessions.push(session.map_err(|e| e.to_string())?);
        }
        Ok(sessions)
    }
}
