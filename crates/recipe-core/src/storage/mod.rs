pub mod memory;
pub mod schema;
pub mod store;

pub use memory::MemoryStore;
pub use store::{SqliteStore, StoreStats};

use crate::errors::Result;
use crate::model::{RecipeDefinition, RecipeSummary, RecipeTest, TestRow};

/// Data access over the `recipe_definitions` table.
///
/// Every method is one atomic unit against the backing store. Reads that
/// match nothing return empty results rather than errors.
pub trait DefinitionStore: Send + Sync {
    /// Inserts the row, or replaces every non-key field when the key exists.
    /// `created_at` is preserved on overwrite.
    fn upsert(&self, test: &RecipeTest) -> Result<()>;

    /// Upserts all rows or none of them.
    fn upsert_batch(&self, tests: &[RecipeTest]) -> Result<usize>;

    /// Removes every test under (recipe_id, version); returns the row count.
    fn delete_version(&self, recipe_id: &str, version: &str) -> Result<u64>;

    fn list_all(&self) -> Result<Vec<RecipeSummary>>;

    fn list_by_version(&self, recipe_id: &str, version: &str) -> Result<Vec<TestRow>>;

    fn get_test(
        &self,
        recipe_id: &str,
        version: &str,
        test_number: i64,
    ) -> Result<Option<RecipeDefinition>>;

    /// Distinct version strings recorded for `recipe_id`, in no particular order.
    fn versions(&self, recipe_id: &str) -> Result<Vec<String>>;
}

/// Canonical listing order: recipe_id, numeric version, test_number.
pub(crate) fn sort_summaries(rows: &mut [RecipeSummary]) {
    rows.sort_by(|a, b| {
        a.recipe_id
            .cmp(&b.recipe_id)
            .then_with(|| crate::version::compare_version_strings(&a.version, &b.version))
            .then_with(|| a.test_number.cmp(&b.test_number))
    });
}
