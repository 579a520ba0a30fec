use super::{sort_summaries, DefinitionStore};
use crate::errors::{RecipeError, Result};
use crate::model::{DefinitionKey, RecipeDefinition, RecipeSummary, RecipeTest, TestRow};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// In-memory [`DefinitionStore`] with the same semantics as the SQLite store.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<DefinitionKey, RecipeDefinition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// SQLite binds NaN as NULL, which the NOT NULL measurement columns reject.
fn check_not_null(test: &RecipeTest) -> Result<()> {
    for (col, v) in [
        ("target_value", test.target_value),
        ("tol_lower", test.tol_lower),
        ("tol_upper", test.tol_upper),
    ] {
        if v.is_nan() {
            return Err(RecipeError::ConstraintViolation(format!(
                "NOT NULL constraint failed: recipe_definitions.{}",
                col
            )));
        }
    }
    Ok(())
}

fn write(
    rows: &mut BTreeMap<DefinitionKey, RecipeDefinition>,
    test: &RecipeTest,
    now: chrono::DateTime<chrono::Utc>,
) {
    let key = test.key();
    let created_at = rows.get(&key).map(|d| d.created_at).unwrap_or(now);
    rows.insert(
        key,
        RecipeDefinition {
            test: test.clone(),
            created_at,
        },
    );
}

impl DefinitionStore for MemoryStore {
    fn upsert(&self, test: &RecipeTest) -> Result<()> {
        check_not_null(test)?;
        let mut rows = self.rows.lock()?;
        write(&mut rows, test, chrono::Utc::now());
        Ok(())
    }

    fn upsert_batch(&self, tests: &[RecipeTest]) -> Result<usize> {
        for t in tests {
            check_not_null(t)?;
        }
        let mut rows = self.rows.lock()?;
        let now = chrono::Utc::now();
        for t in tests {
            write(&mut rows, t, now);
        }
        Ok(tests.len())
    }

    fn delete_version(&self, recipe_id: &str, version: &str) -> Result<u64> {
        let mut rows = self.rows.lock()?;
        let before = rows.len();
        rows.retain(|k, _| !(k.recipe_id == recipe_id && k.version == version));
        Ok((before - rows.len()) as u64)
    }

    fn list_all(&self) -> Result<Vec<RecipeSummary>> {
        let rows = self.rows.lock()?;
        let mut out: Vec<RecipeSummary> = rows.values().map(RecipeSummary::from).collect();
        sort_summaries(&mut out);
        Ok(out)
    }

    fn list_by_version(&self, recipe_id: &str, version: &str) -> Result<Vec<TestRow>> {
        let rows = self.rows.lock()?;
        let mut out: Vec<TestRow> = rows
            .values()
            .filter(|d| d.test.recipe_id == recipe_id && d.test.version == version)
            .map(|d| TestRow::from(d.clone()))
            .collect();
        out.sort_by_key(|r| r.test_number);
        Ok(out)
    }

    fn get_test(
        &self,
        recipe_id: &str,
        version: &str,
        test_number: i64,
    ) -> Result<Option<RecipeDefinition>> {
        let rows = self.rows.lock()?;
        let key = DefinitionKey {
            recipe_id: recipe_id.to_string(),
            version: version.to_string(),
            test_number,
        };
        Ok(rows.get(&key).cloned())
    }

    fn versions(&self, recipe_id: &str) -> Result<Vec<String>> {
        let rows = self.rows.lock()?;
        let set: BTreeSet<&str> = rows
            .keys()
            .filter(|k| k.recipe_id == recipe_id)
            .map(|k| k.version.as_str())
            .collect();
        Ok(set.into_iter().map(str::to_string).collect())
    }
}
