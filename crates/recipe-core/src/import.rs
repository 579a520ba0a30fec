//! Loading definition files for bulk import.
//!
//! A definition file is either a recipe CSV (see [`crate::csv_format`]) or
//! YAML (JSON is accepted too) with a top-level `definitions` list of
//! [`RecipeTest`] records. Files with a `.csv` extension are read as CSV.

use crate::csv_format;
use crate::model::RecipeTest;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionFile {
    definitions: Vec<RecipeTest>,
}

pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

pub fn load_definitions(path: &Path) -> anyhow::Result<Vec<RecipeTest>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read definitions: {}", path.display()))?;
    let parsed = if is_csv_path(path) {
        parse_definitions_csv(&raw)
    } else {
        parse_definitions(&raw)
    };
    parsed.with_context(|| format!("invalid definitions file: {}", path.display()))
}

pub fn parse_definitions(raw: &str) -> anyhow::Result<Vec<RecipeTest>> {
    let file: DefinitionFile = serde_yaml::from_str(raw).context("failed to parse YAML")?;
    reject_duplicates(&file.definitions)?;
    Ok(file.definitions)
}

pub fn parse_definitions_csv(raw: &str) -> anyhow::Result<Vec<RecipeTest>> {
    let defs = csv_format::from_csv(raw).context("failed to parse CSV")?;
    reject_duplicates(&defs)?;
    Ok(defs)
}

fn reject_duplicates(defs: &[RecipeTest]) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for t in defs {
        if !seen.insert(t.key()) {
            anyhow::bail!(
                "duplicate definition recipe_id={} version={} test_number={}",
                t.recipe_id,
                t.version,
                t.test_number
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_with_optional_remarks() {
        let defs = parse_definitions(
            r#"
definitions:
  - recipe_id: abc
    version: "1.0"
    test_number: 1
    test_name: Bore
    characteristic: diameter
    target_value: 12.5
    tol_lower: 12.4
    tol_upper: 12.6
    unit: mm
    method_reference: ISO-286
  - recipe_id: abc
    version: "1.0"
    test_number: 2
    test_name: Finish
    characteristic: roughness
    target_value: 0.8
    tol_lower: 0.0
    tol_upper: 1.6
    unit: um
    method_reference: ISO-4287
    remarks: polished
"#,
        )
        .unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].remarks, None);
        assert_eq!(defs[1].remarks.as_deref(), Some("polished"));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let one = concat!(
            r#"{"recipe_id":"a","version":"1","test_number":1,"test_name":"t","#,
            r#""characteristic":"c","target_value":1.0,"tol_lower":0.0,"tol_upper":2.0,"#,
            r#""unit":"u","method_reference":"m"}"#
        );
        let raw = format!("{{\"definitions\": [{one}, {one}]}}");
        let err = parse_definitions(&raw).unwrap_err();
        assert!(err.to_string().contains("duplicate definition"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let raw = "definitions:\n  - recipe_id: a\n    colour: red\n";
        assert!(parse_definitions(raw).is_err());
    }

    #[test]
    fn csv_duplicates_are_rejected() {
        let raw = "recipe_id,version,test_number,test_name,characteristic,target_value,\
                   tol_lower,tol_upper,unit,method_reference,remarks\n\
                   a,1,1,t,c,1.0,0.5,1.5,mm,M,\n\
                   a,1,1,t,c,1.0,0.5,1.5,mm,M,\n";
        let err = parse_definitions_csv(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate definition"));
    }

    #[test]
    fn csv_is_chosen_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("REC-001_2.0.0.CSV");
        std::fs::write(
            &path,
            "recipe_id,version,test_number,test_name,characteristic,target_value,\
             tol_lower,tol_upper,unit,method_reference,remarks\n\
             REC-001,2.0.0,201,Test_201,Characteristic_201,1.25,1.2,1.3,mm,STD-METH-201,\n",
        )
        .unwrap();
        assert!(is_csv_path(&path));
        let defs = load_definitions(&path).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].test_number, 201);
        assert_eq!(defs[0].remarks, None);

        assert!(!is_csv_path(Path::new("defs.yaml")));
    }
}
