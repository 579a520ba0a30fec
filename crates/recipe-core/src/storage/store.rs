use super::schema::{DDL, SCHEMA_VERSION};
use super::{sort_summaries, DefinitionStore};
use crate::config::{JournalMode, StoreConfig};
use crate::errors::Result;
use crate::model::{RecipeDefinition, RecipeSummary, RecipeTest, TestRow};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const UPSERT_SQL: &str = "INSERT INTO recipe_definitions(
        recipe_id, version, test_number, test_name, characteristic,
        target_value, tol_lower, tol_upper, unit, method_reference, remarks, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
     ON CONFLICT(recipe_id, version, test_number) DO UPDATE SET
        test_name=excluded.test_name,
        characteristic=excluded.characteristic,
        target_value=excluded.target_value,
        tol_lower=excluded.tol_lower,
        tol_upper=excluded.tol_upper,
        unit=excluded.unit,
        method_reference=excluded.method_reference,
        remarks=excluded.remarks";

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub recipes: u64,
    pub versions: u64,
    pub tests: u64,
    pub schema_version: i64,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &StoreConfig::default())
    }

    pub fn from_config(cfg: &StoreConfig) -> Result<Self> {
        Self::open_with(&cfg.db_path, cfg)
    }

    fn open_with(path: &Path, cfg: &StoreConfig) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::RecipeError::StoreUnavailable(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(cfg.busy_timeout_ms))?;
        set_journal_mode(&conn, cfg.journal_mode)?;
        tracing::debug!(
            event = "store_open",
            path = %path.display(),
            journal_mode = cfg.journal_mode.pragma_value()
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates the table and index if missing. Safe to call on every start.
    pub fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock()?;
        conn.execute_batch(DDL)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock()?;
        let (recipes, versions, tests): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(DISTINCT recipe_id),
                    COUNT(DISTINCT recipe_id || char(31) || version),
                    COUNT(*)
             FROM recipe_definitions",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;
        let schema_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        Ok(StoreStats {
            recipes: recipes as u64,
            versions: versions as u64,
            tests: tests as u64,
            schema_version,
        })
    }
}

impl DefinitionStore for SqliteStore {
    fn upsert(&self, test: &RecipeTest) -> Result<()> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(UPSERT_SQL)?;
        execute_upsert(&mut stmt, test, &now_rfc3339())?;
        Ok(())
    }

    fn upsert_batch(&self, tests: &[RecipeTest]) -> Result<usize> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;
        let created_at = now_rfc3339();
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for test in tests {
                execute_upsert(&mut stmt, test, &created_at)?;
            }
        }
        tx.commit()?;
        Ok(tests.len())
    }

    fn delete_version(&self, recipe_id: &str, version: &str) -> Result<u64> {
        let conn = self.conn.lock()?;
        let n = conn.execute(
            "DELETE FROM recipe_definitions WHERE recipe_id=?1 AND version=?2",
            params![recipe_id, version],
        )?;
        Ok(n as u64)
    }

    fn list_all(&self) -> Result<Vec<RecipeSummary>> {
        let conn = self.conn.lock()?;
        // Version order is applied in Rust; SQL text ordering is lexical.
        let mut stmt = conn.prepare(
            "SELECT recipe_id, version, test_number, test_name
             FROM recipe_definitions
             ORDER BY recipe_id, test_number",
        )?;
        let mut rows = stmt
            .query_map([], |row| {
                Ok(RecipeSummary {
                    recipe_id: row.get(0)?,
                    version: row.get(1)?,
                    test_number: row.get(2)?,
                    test_name: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        sort_summaries(&mut rows);
        Ok(rows)
    }

    fn list_by_version(&self, recipe_id: &str, version: &str) -> Result<Vec<TestRow>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT test_number, test_name, characteristic, target_value, tol_lower,
                    tol_upper, unit, method_reference, remarks
             FROM recipe_definitions
             WHERE recipe_id=?1 AND version=?2
             ORDER BY test_number ASC",
        )?;
        let rows = stmt
            .query_map(params![recipe_id, version], |row| {
                Ok(TestRow {
                    test_number: row.get(0)?,
                    test_name: row.get(1)?,
                    characteristic: row.get(2)?,
                    target_value: row.get(3)?,
                    tol_lower: row.get(4)?,
                    tol_upper: row.get(5)?,
                    unit: row.get(6)?,
                    method_reference: row.get(7)?,
                    remarks: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn get_test(
        &self,
        recipe_id: &str,
        version: &str,
        test_number: i64,
    ) -> Result<Option<RecipeDefinition>> {
        let conn = self.conn.lock()?;
        let row = conn
            .query_row(
                "SELECT recipe_id, version, test_number, test_name, characteristic,
                        target_value, tol_lower, tol_upper, unit, method_reference,
                        remarks, created_at
                 FROM recipe_definitions
                 WHERE recipe_id=?1 AND version=?2 AND test_number=?3",
                params![recipe_id, version, test_number],
                row_to_definition,
            )
            .optional()?;
        Ok(row)
    }

    fn versions(&self, recipe_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT version FROM recipe_definitions WHERE recipe_id=?1")?;
        let out = stmt
            .query_map(params![recipe_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(out)
    }
}

fn execute_upsert(
    stmt: &mut rusqlite::Statement<'_>,
    t: &RecipeTest,
    created_at: &str,
) -> rusqlite::Result<usize> {
    stmt.execute(params![
        t.recipe_id,
        t.version,
        t.test_number,
        t.test_name,
        t.characteristic,
        t.target_value,
        t.tol_lower,
        t.tol_upper,
        t.unit,
        t.method_reference,
        t.remarks,
        created_at,
    ])
}

fn row_to_definition(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecipeDefinition> {
    let created_raw: String = row.get(11)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);
    Ok(RecipeDefinition {
        test: RecipeTest {
            recipe_id: row.get(0)?,
            version: row.get(1)?,
            test_number: row.get(2)?,
            test_name: row.get(3)?,
            characteristic: row.get(4)?,
            target_value: row.get(5)?,
            tol_lower: row.get(6)?,
            tol_upper: row.get(7)?,
            unit: row.get(8)?,
            method_reference: row.get(9)?,
            remarks: row.get(10)?,
        },
        created_at,
    })
}

fn set_journal_mode(conn: &Connection, mode: JournalMode) -> Result<()> {
    // journal_mode answers with the resulting mode, so it must be queried
    let _: String = conn.query_row(
        &format!("PRAGMA journal_mode = {}", mode.pragma_value()),
        [],
        |r| r.get(0),
    )?;
    Ok(())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
