use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied fields of one test definition: the input of an upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeTest {
    pub recipe_id: String,
    pub version: String,
    pub test_number: i64,
    pub test_name: String,
    pub characteristic: String,
    pub target_value: f64,
    pub tol_lower: f64,
    pub tol_upper: f64,
    pub unit: String,
    pub method_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl RecipeTest {
    pub fn key(&self) -> DefinitionKey {
        DefinitionKey {
            recipe_id: self.recipe_id.clone(),
            version: self.version.clone(),
            test_number: self.test_number,
        }
    }
}

/// Natural key of a stored definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DefinitionKey {
    pub recipe_id: String,
    pub version: String,
    pub test_number: i64,
}

/// A stored row: the definition plus the time it was first inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDefinition {
    #[serde(flatten)]
    pub test: RecipeTest,
    pub created_at: DateTime<Utc>,
}

/// Listing row returned by `get_all_recipes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub recipe_id: String,
    pub version: String,
    pub test_number: i64,
    pub test_name: String,
}

/// One test of a known (recipe_id, version): everything after the key prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRow {
    pub test_number: i64,
    pub test_name: String,
    pub characteristic: String,
    pub target_value: f64,
    pub tol_lower: f64,
    pub tol_upper: f64,
    pub unit: String,
    pub method_reference: String,
    pub remarks: Option<String>,
}

impl TestRow {
    /// Reattaches the key prefix dropped by version listings.
    pub fn into_test(self, recipe_id: &str, version: &str) -> RecipeTest {
        RecipeTest {
            recipe_id: recipe_id.to_string(),
            version: version.to_string(),
            test_number: self.test_number,
            test_name: self.test_name,
            characteristic: self.characteristic,
            target_value: self.target_value,
            tol_lower: self.tol_lower,
            tol_upper: self.tol_upper,
            unit: self.unit,
            method_reference: self.method_reference,
            remarks: self.remarks,
        }
    }
}

impl From<RecipeTest> for TestRow {
    fn from(t: RecipeTest) -> Self {
        Self {
            test_number: t.test_number,
            test_name: t.test_name,
            characteristic: t.characteristic,
            target_value: t.target_value,
            tol_lower: t.tol_lower,
            tol_upper: t.tol_upper,
            unit: t.unit,
            method_reference: t.method_reference,
            remarks: t.remarks,
        }
    }
}

impl From<RecipeDefinition> for TestRow {
    fn from(d: RecipeDefinition) -> Self {
        d.test.into()
    }
}

impl From<&RecipeDefinition> for RecipeSummary {
    fn from(d: &RecipeDefinition) -> Self {
        Self {
            recipe_id: d.test.recipe_id.clone(),
            version: d.test.version.clone(),
            test_number: d.test.test_number,
            test_name: d.test.test_name.clone(),
        }
    }
}
