use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::bridge::{ImportOutcome, LedgerBridge};
use crate::error::{CajeroError, Result};
use crate::models::Record;
use crate::tasks::Task;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS movements (
    id TEXT PRIMARY KEY,
    caja TEXT NOT NULL,
    fecha TEXT NOT NULL,
    concepto TEXT NOT NULL,
    importe REAL NOT NULL,
    saldo REAL,
    insertion_date TEXT,
    is_contabilized INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_movements_caja ON movements(caja, insertion_date);

CREATE TABLE IF NOT EXISTS accounting_tasks (
    id INTEGER PRIMARY KEY,
    movement_id TEXT NOT NULL,
    tipo TEXT NOT NULL,
    detalle TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (movement_id) REFERENCES movements(id)
);

CREATE INDEX IF NOT EXISTS idx_accounting_tasks_movement ON accounting_tasks(movement_id);
";

pub const DEFAULT_RECENT_LIMIT: usize = 100;

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

const RECORD_COLUMNS: &str =
    "id, caja, fecha, concepto, importe, saldo, insertion_date, is_contabilized";

/// Older databases hold the flag as text or real; read whatever is stored
/// with the same rules as incoming JSON.
fn flag_from_sql(value: SqlValue) -> bool {
    match value {
        SqlValue::Integer(i) => i == 1,
        SqlValue::Real(f) => f == 1.0,
        SqlValue::Text(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        SqlValue::Null | SqlValue::Blob(_) => false,
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get(0)?,
        caja: row.get(1)?,
        fecha: row.get(2)?,
        concepto: row.get(3)?,
        importe: row.get(4)?,
        saldo: row.get(5)?,
        insertion_date: row.get(6)?,
        is_contabilized: flag_from_sql(row.get(7)?),
        already_in_database: true,
    })
}

/// Per-account totals shown by `accounts` and `status`.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    pub caja: String,
    pub movements: usize,
    pub pending: usize,
    /// `saldo` of the most recently inserted movement.
    pub balance: Option<f64>,
}

/// Local SQLite implementation of the ledger bridge.
pub struct SqliteBridge {
    conn: Connection,
    recent_limit: usize,
}

impl SqliteBridge {
    pub fn open(db_path: &Path, recent_limit: usize) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self::new(conn, recent_limit))
    }

    pub fn new(conn: Connection, recent_limit: usize) -> Self {
        let recent_limit = if recent_limit == 0 { DEFAULT_RECENT_LIMIT } else { recent_limit };
        Self { conn, recent_limit }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn account_summaries(&self) -> Result<Vec<AccountSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.caja, count(*), sum(CASE WHEN m.is_contabilized = 1 THEN 0 ELSE 1 END),
                    (SELECT l.saldo FROM movements l WHERE l.caja = m.caja
                     ORDER BY l.insertion_date DESC, l.rowid ASC LIMIT 1)
             FROM movements m GROUP BY m.caja ORDER BY m.caja",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AccountSummary {
                caja: row.get(0)?,
                movements: row.get::<_, i64>(1)? as usize,
                pending: row.get::<_, i64>(2)? as usize,
                balance: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn task_count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT count(*) FROM accounting_tasks", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    fn movement_caja(&self, id: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT caja FROM movements WHERE id = ?1", [id], |r| r.get(0))
            .optional()?)
    }

    fn set_flag(&self, id: &str, accounted: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE movements SET is_contabilized = ?1 WHERE id = ?2",
            params![accounted as i64, id],
        )?;
        if changed == 0 {
            return Err(CajeroError::UnknownRecord(id.to_string()));
        }
        Ok(())
    }
}

impl LedgerBridge for SqliteBridge {
    fn list_accounts(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT caja FROM movements ORDER BY caja")?;
        let rows = stmt.query_map([], |r| r.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<String>, _>>()?)
    }

    fn list_recent_records(&self, caja: &str) -> Result<Vec<Record>> {
        log::debug!("list_recent_records({caja}) limit {}", self.recent_limit);
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM movements WHERE caja = ?1
             ORDER BY insertion_date DESC, rowid ASC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![caja, self.recent_limit as i64], record_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn set_accounted_state(&self, id: &str, caja: &str, accounted: bool) -> Result<Vec<Record>> {
        log::debug!("set_accounted_state({id}, {caja}, {accounted})");
        match self.movement_caja(id)? {
            Some(owner) if owner == caja => {}
            Some(owner) => {
                return Err(CajeroError::Bridge(format!(
                    "movement {id} belongs to {owner}, not {caja}"
                )))
            }
            None => return Err(CajeroError::UnknownRecord(id.to_string())),
        }
        self.set_flag(id, accounted)?;
        self.list_recent_records(caja)
    }

    fn record_exists(&self, id: &str) -> Result<bool> {
        Ok(self.movement_caja(id)?.is_some())
    }

    fn import_records(&self, records: &[Record]) -> Result<ImportOutcome> {
        let stamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        let tx = self.conn.unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO movements
                 (id, caja, fecha, concepto, importe, saldo, insertion_date, is_contabilized)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for r in records {
                if r.id.is_empty() {
                    log::warn!("skipping movement without id: {}", r.concepto);
                    continue;
                }
                count += stmt.execute(params![
                    r.id,
                    r.caja,
                    r.fecha,
                    r.concepto,
                    r.importe,
                    r.saldo,
                    stamp,
                    r.is_contabilized as i64,
                ])?;
            }
        }
        tx.commit()?;
        log::info!("imported {count} of {} movements", records.len());
        Ok(ImportOutcome { success: true, count, error: None })
    }

    fn save_tasks(&self, movement_id: &str, tasks: &[Task]) -> Result<usize> {
        if !self.record_exists(movement_id)? {
            return Err(CajeroError::UnknownRecord(movement_id.to_string()));
        }
        let tx = self.conn.unchecked_transaction()?;
        for task in tasks {
            let value = serde_json::to_value(task)?;
            tx.execute(
                "INSERT INTO accounting_tasks (movement_id, tipo, detalle) VALUES (?1, ?2, ?3)",
                params![movement_id, task.tipo(), value["detalle"].to_string()],
            )?;
        }
        if !tasks.is_empty() {
            tx.execute(
                "UPDATE movements SET is_contabilized = 1 WHERE id = ?1",
                [movement_id],
            )?;
        }
        tx.commit()?;
        log::debug!("save_tasks({movement_id}) stored {}", tasks.len());
        Ok(tasks.len())
    }

    fn list_tasks(&self, movement_id: &str) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT tipo, detalle FROM accounting_tasks WHERE movement_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([movement_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut tasks = Vec::new();
        for row in rows {
            let (tipo, detalle) = row?;
            let parsed = serde_json::from_str::<serde_json::Value>(&detalle).and_then(|detalle| {
                serde_json::from_value(serde_json::json!({ "tipo": tipo, "detalle": detalle }))
            });
            match parsed {
                Ok(task) => tasks.push(task),
                Err(e) => log::warn!("skipping unreadable {tipo} task of {movement_id}: {e}"),
            }
        }
        Ok(tasks)
    }

    fn delete_tasks(&self, movement_id: &str) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM accounting_tasks WHERE movement_id = ?1",
            [movement_id],
        )?;
        tx.execute(
            "UPDATE movements SET is_contabilized = 0 WHERE id = ?1",
            [movement_id],
        )?;
        tx.commit()?;
        log::debug!("delete_tasks({movement_id}) removed {removed}");
        Ok(removed)
    }
}
