//! Flat CSV layout of recipe files (`<recipe_id>_<version>.csv`).
//!
//! One header row followed by one row per test, columns in [`CSV_HEADER`]
//! order. An empty `remarks` cell means no remarks.

use crate::errors::{RecipeError, Result};
use crate::model::RecipeTest;
use serde::{Deserialize, Serialize};

pub const CSV_HEADER: [&str; 11] = [
    "recipe_id",
    "version",
    "test_number",
    "test_name",
    "characteristic",
    "target_value",
    "tol_lower",
    "tol_upper",
    "unit",
    "method_reference",
    "remarks",
];

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CsvRecord {
    recipe_id: String,
    version: String,
    test_number: i64,
    test_name: String,
    characteristic: String,
    target_value: f64,
    tol_lower: f64,
    tol_upper: f64,
    unit: String,
    method_reference: String,
    #[serde(default)]
    remarks: String,
}

impl From<CsvRecord> for RecipeTest {
    fn from(r: CsvRecord) -> Self {
        Self {
            recipe_id: r.recipe_id,
            version: r.version,
            test_number: r.test_number,
            test_name: r.test_name,
            characteristic: r.characteristic,
            target_value: r.target_value,
            tol_lower: r.tol_lower,
            tol_upper: r.tol_upper,
            unit: r.unit,
            method_reference: r.method_reference,
            remarks: Some(r.remarks).filter(|s| !s.is_empty()),
        }
    }
}

impl From<&RecipeTest> for CsvRecord {
    fn from(t: &RecipeTest) -> Self {
        Self {
            recipe_id: t.recipe_id.clone(),
            version: t.version.clone(),
            test_number: t.test_number,
            test_name: t.test_name.clone(),
            characteristic: t.characteristic.clone(),
            target_value: t.target_value,
            tol_lower: t.tol_lower,
            tol_upper: t.tol_upper,
            unit: t.unit.clone(),
            method_reference: t.method_reference.clone(),
            remarks: t.remarks.clone().unwrap_or_default(),
        }
    }
}

/// Parses a headed CSV document. Columns are matched by header name.
pub fn from_csv(raw: &str) -> Result<Vec<RecipeTest>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(raw.as_bytes());
    let mut out = Vec::new();
    for record in reader.deserialize::<CsvRecord>() {
        out.push(record?.into());
    }
    Ok(out)
}

/// Renders tests in [`CSV_HEADER`] order. The header is written even when
/// `tests` is empty.
pub fn to_csv(tests: &[RecipeTest]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for t in tests {
        writer.serialize(CsvRecord::from(t))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| RecipeError::Csv(e.into_error().to_string()))?;
    String::from_utf8(bytes).map_err(|e| RecipeError::Csv(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Layout written by the recipe file generator (pandas `to_csv`, index off).
    const GENERATED: &str = "recipe_id,version,test_number,test_name,characteristic,\
        target_value,tol_lower,tol_upper,unit,method_reference,remarks\n\
        REC-001,1.0.0,101,Test_101,Characteristic_101,1.532,1.478,1.586,mm,STD-METH-101,\n\
        REC-001,1.0.0,102,Test_102,Characteristic_102,1.907,1.851,1.963,mm,STD-METH-102,\
        \"hand, gauge\"\n";

    #[test]
    fn reads_generated_recipe_file() {
        let defs = from_csv(GENERATED).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].recipe_id, "REC-001");
        assert_eq!(defs[0].version, "1.0.0");
        assert_eq!(defs[0].test_number, 101);
        assert_eq!(defs[0].tol_upper, 1.586);
        assert_eq!(defs[0].remarks, None);
        assert_eq!(defs[1].remarks.as_deref(), Some("hand, gauge"));
    }

    #[test]
    fn written_layout_reads_back() {
        let defs = from_csv(GENERATED).unwrap();
        let text = to_csv(&defs).unwrap();
        assert_eq!(text.lines().next(), Some(CSV_HEADER.join(",").as_str()));
        assert!(text.contains("REC-001,1.0.0,101,Test_101,"));
        assert!(text.lines().nth(1).unwrap().ends_with(",mm,STD-METH-101,"));
        assert_eq!(from_csv(&text).unwrap(), defs);
    }

    #[test]
    fn empty_export_keeps_header() {
        let text = to_csv(&[]).unwrap();
        assert_eq!(text.trim_end(), CSV_HEADER.join(","));
    }

    #[test]
    fn bad_cells_are_csv_errors() {
        let raw = "recipe_id,version,test_number,test_name,characteristic,target_value,\
                   tol_lower,tol_upper,unit,method_reference,remarks\n\
                   a,1,one,t,c,1.0,0.5,1.5,mm,M,\n";
        let err = from_csv(raw).unwrap_err();
        assert_eq!(err.code(), "E_CSV");
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let raw = "recipe_id,version,test_number,test_name,characteristic,target_value,\
                   tol_lower,tol_upper,unit,method_reference,remarks,colour\n\
                   a,1,1,t,c,1.0,0.5,1.5,mm,M,,red\n";
        assert!(from_csv(raw).is_err());
    }
}
