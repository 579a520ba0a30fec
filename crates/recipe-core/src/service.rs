use crate::csv_format;
use crate::errors::Result;
use crate::model::{RecipeDefinition, RecipeSummary, RecipeTest, TestRow};
use crate::storage::DefinitionStore;
use crate::version;
use serde::Serialize;

/// Outcome of [`RecipeService::get_test_info_from_filename`].
///
/// Keeps "recipe has no versions at all" apart from "the latest version has
/// no such test".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FilenameLookup {
    Found(RecipeDefinition),
    TestNotFound { recipe_id: String, version: String },
    RecipeNotFound { recipe_id: String },
}

/// Caller-facing operations over a [`DefinitionStore`].
#[derive(Clone)]
pub struct RecipeService<S> {
    store: S,
}

impl<S: DefinitionStore> RecipeService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn upsert_recipe(&self, test: &RecipeTest) -> Result<()> {
        self.store.upsert(test)?;
        tracing::info!(
            event = "recipe_upsert",
            recipe_id = %test.recipe_id,
            version = %test.version,
            test_number = test.test_number
        );
        Ok(())
    }

    pub fn import_recipes(&self, tests: &[RecipeTest]) -> Result<usize> {
        let n = self.store.upsert_batch(tests)?;
        tracing::info!(event = "recipe_import", rows = n);
        Ok(n)
    }

    pub fn get_all_recipes(&self) -> Result<Vec<RecipeSummary>> {
        self.store.list_all()
    }

    pub fn get_recipe_version(&self, recipe_id: &str, version: &str) -> Result<Vec<TestRow>> {
        self.store.list_by_version(recipe_id, version)
    }

    /// One version rendered as a recipe CSV file, or `None` when the version
    /// has no tests.
    pub fn get_recipe_version_csv(&self, recipe_id: &str, version: &str) -> Result<Option<String>> {
        let rows = self.store.list_by_version(recipe_id, version)?;
        if rows.is_empty() {
            return Ok(None);
        }
        let tests: Vec<RecipeTest> = rows
            .into_iter()
            .map(|r| r.into_test(recipe_id, version))
            .collect();
        tracing::debug!(
            event = "recipe_version_export",
            recipe_id = recipe_id,
            version = version,
            rows = tests.len()
        );
        csv_format::to_csv(&tests).map(Some)
    }

    pub fn get_test_info(
        &self,
        recipe_id: &str,
        version: &str,
        test_number: i64,
    ) -> Result<Option<TestRow>> {
        Ok(self
            .store
            .get_test(recipe_id, version, test_number)?
            .map(TestRow::from))
    }

    pub fn delete_recipe_version(&self, recipe_id: &str, version: &str) -> Result<u64> {
        let removed = self.store.delete_version(recipe_id, version)?;
        tracing::info!(
            event = "recipe_version_delete",
            recipe_id = recipe_id,
            version = version,
            removed = removed
        );
        Ok(removed)
    }

    pub fn get_latest_version_from_filename(&self, filename: &str) -> Result<Option<String>> {
        let (_, latest) = version::resolve_from_filename(&self.store, filename)?;
        Ok(latest)
    }

    pub fn get_test_info_from_filename(
        &self,
        filename: &str,
        test_number: i64,
    ) -> Result<FilenameLookup> {
        let (recipe_id, latest) = version::resolve_from_filename(&self.store, filename)?;
        let Some(version) = latest else {
            tracing::debug!(
                event = "filename_lookup_miss",
                filename = filename,
                recipe_id = recipe_id
            );
            return Ok(FilenameLookup::RecipeNotFound {
                recipe_id: recipe_id.to_string(),
            });
        };
        Ok(match self.store.get_test(recipe_id, &version, test_number)? {
            Some(def) => FilenameLookup::Found(def),
            None => FilenameLookup::TestNotFound {
                recipe_id: recipe_id.to_string(),
                version,
            },
        })
    }
}
