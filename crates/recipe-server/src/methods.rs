use recipe_core::{DefinitionStore, RecipeError, RecipeService, RecipeTest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const APPLICATION_ERROR: i32 = -32000;

#[derive(Debug, Serialize)]
pub struct MethodError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MethodError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn app(code: &str, message: String) -> Self {
        Self {
            code: APPLICATION_ERROR,
            message,
            data: Some(serde_json::json!({ "code": code })),
        }
    }
}

impl From<RecipeError> for MethodError {
    fn from(e: RecipeError) -> Self {
        MethodError::app(e.code(), e.to_string())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VersionParams {
    recipe_id: String,
    version: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TestParams {
    recipe_id: String,
    version: String,
    test_number: i64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FilenameParams {
    filename: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FilenameTestParams {
    filename: String,
    test_number: i64,
}

const METHODS: &[(&str, &str)] = &[
    ("upsert_recipe", "Insert or overwrite one test definition."),
    ("get_all_recipes", "List (recipe_id, version, test_number, test_name) for every row."),
    ("get_recipe_version", "All tests of one recipe version, by test_number."),
    ("get_test_info", "A single test, or null."),
    (
        "get_recipe_version_csv",
        "One recipe version as recipe CSV text, or null.",
    ),
    ("delete_recipe_version", "Delete every test of one recipe version."),
    (
        "get_latest_version_from_filename",
        "Latest version of the recipe a filename refers to.",
    ),
    (
        "get_test_info_from_filename",
        "A test of the latest version of the recipe a filename refers to.",
    ),
];

pub fn is_method(name: &str) -> bool {
    METHODS.iter().any(|(m, _)| *m == name)
}

pub fn list_methods() -> Vec<Value> {
    METHODS
        .iter()
        .map(|(name, description)| {
            serde_json::json!({ "name": name, "description": description })
        })
        .collect()
}

fn parse<T: DeserializeOwned>(params: Value) -> Result<T, MethodError> {
    // absent params behave like an empty object
    let params = if params.is_null() {
        serde_json::json!({})
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| MethodError::new(INVALID_PARAMS, e.to_string()))
}

fn to_value<T: Serialize>(v: T) -> Result<Value, MethodError> {
    serde_json::to_value(v).map_err(|e| MethodError::app("E_INTERNAL", e.to_string()))
}

pub fn call<S: DefinitionStore>(
    svc: &RecipeService<S>,
    method: &str,
    params: Value,
) -> Result<Value, MethodError> {
    match method {
        "upsert_recipe" => {
            let t: RecipeTest = parse(params)?;
            svc.upsert_recipe(&t)?;
            to_value(t.key())
        }
        "get_all_recipes" => to_value(svc.get_all_recipes()?),
        "get_recipe_version" => {
            let p: VersionParams = parse(params)?;
            to_value(svc.get_recipe_version(&p.recipe_id, &p.version)?)
        }
        "get_recipe_version_csv" => {
            let p: VersionParams = parse(params)?;
            match svc.get_recipe_version_csv(&p.recipe_id, &p.version)? {
                Some(csv) => Ok(serde_json::json!({
                    "recipe_id": p.recipe_id,
                    "version": p.version,
                    "csv": csv
                })),
                None => Ok(Value::Null),
            }
        }
        "get_test_info" => {
            let p: TestParams = parse(params)?;
            to_value(svc.get_test_info(&p.recipe_id, &p.version, p.test_number)?)
        }
        "delete_recipe_version" => {
            let p: VersionParams = parse(params)?;
            let removed = svc.delete_recipe_version(&p.recipe_id, &p.version)?;
            Ok(serde_json::json!({ "removed": removed }))
        }
        "get_latest_version_from_filename" => {
            let p: FilenameParams = parse(params)?;
            let version = svc.get_latest_version_from_filename(&p.filename)?;
            Ok(serde_json::json!({ "version": version }))
        }
        "get_test_info_from_filename" => {
            let p: FilenameTestParams = parse(params)?;
            to_value(svc.get_test_info_from_filename(&p.filename, p.test_number)?)
        }
        other => Err(MethodError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_core::MemoryStore;
    use serde_json::json;

    fn upsert_params(recipe: &str, version: &str, n: i64) -> Value {
        json!({
            "recipe_id": recipe,
            "version": version,
            "test_number": n,
            "test_name": "Torque",
            "characteristic": "breakaway torque",
            "target_value": 12.0,
            "tol_lower": 11.0,
            "tol_upper": 13.0,
            "unit": "Nm",
            "method_reference": "DIN-912"
        })
    }

    #[test]
    fn every_listed_method_dispatches() {
        let svc = RecipeService::new(MemoryStore::new());
        for m in list_methods() {
            let name = m["name"].as_str().unwrap();
            let err = call(&svc, name, json!({ "unexpected": true })).err();
            // unknown fields are rejected, except by the parameterless listing
            match err {
                Some(e) => assert_eq!(e.code, INVALID_PARAMS, "method {name}"),
                None => assert_eq!(name, "get_all_recipes"),
            }
        }
    }

    #[test]
    fn filename_lookup_reports_status() {
        let svc = RecipeService::new(MemoryStore::new());
        call(&svc, "upsert_recipe", upsert_params("abc", "1.0", 3)).unwrap();
        call(&svc, "upsert_recipe", upsert_params("abc", "1.1", 3)).unwrap();

        let found = call(
            &svc,
            "get_test_info_from_filename",
            json!({ "filename": "abc_v1.csv", "test_number": 3 }),
        )
        .unwrap();
        assert_eq!(found["status"], "found");
        assert_eq!(found["version"], "1.1");

        let missing = call(
            &svc,
            "get_test_info_from_filename",
            json!({ "filename": "abc_v1.csv", "test_number": 4 }),
        )
        .unwrap();
        assert_eq!(missing["status"], "test_not_found");

        let none = call(
            &svc,
            "get_test_info_from_filename",
            json!({ "filename": "nope.csv", "test_number": 3 }),
        )
        .unwrap();
        assert_eq!(none["status"], "recipe_not_found");
        assert_eq!(none["recipe_id"], "nope");
    }

    #[test]
    fn application_errors_carry_kind_code() {
        let svc = RecipeService::new(MemoryStore::new());
        call(&svc, "upsert_recipe", upsert_params("abc", "v2", 1)).unwrap();
        let err = call(
            &svc,
            "get_latest_version_from_filename",
            json!({ "filename": "abc.csv" }),
        )
        .unwrap_err();
        assert_eq!(err.code, APPLICATION_ERROR);
        assert_eq!(err.data.unwrap()["code"], "E_MALFORMED_VERSION");
    }

    #[test]
    fn version_csv_carries_header_and_rows() {
        let svc = RecipeService::new(MemoryStore::new());
        call(&svc, "upsert_recipe", upsert_params("abc", "1.0", 2)).unwrap();
        call(&svc, "upsert_recipe", upsert_params("abc", "1.0", 1)).unwrap();

        let v = call(
            &svc,
            "get_recipe_version_csv",
            json!({ "recipe_id": "abc", "version": "1.0" }),
        )
        .unwrap();
        let csv = v["csv"].as_str().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("recipe_id,version,test_number,"));
        assert!(lines[1].starts_with("abc,1.0,1,Torque,"));
        assert!(lines[2].starts_with("abc,1.0,2,Torque,"));

        let missing = call(
            &svc,
            "get_recipe_version_csv",
            json!({ "recipe_id": "abc", "version": "2.0" }),
        )
        .unwrap();
        assert!(missing.is_null());
    }

    #[test]
    fn missing_test_is_null() {
        let svc = RecipeService::new(MemoryStore::new());
        let v = call(
            &svc,
            "get_test_info",
            json!({ "recipe_id": "abc", "version": "1.0", "test_number": 1 }),
        )
        .unwrap();
        assert!(v.is_null());
    }
}
