pub const SCHEMA_VERSION: i64 = 1;

pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS recipe_definitions (
  recipe_id TEXT NOT NULL,
  version TEXT NOT NULL,
  test_number INTEGER NOT NULL,
  test_name TEXT NOT NULL,
  characteristic TEXT NOT NULL,
  target_value REAL NOT NULL,
  tol_lower REAL NOT NULL,
  tol_upper REAL NOT NULL,
  unit TEXT NOT NULL,
  method_reference TEXT NOT NULL,
  remarks TEXT,
  created_at TEXT NOT NULL,
  PRIMARY KEY (recipe_id, version, test_number)
);

CREATE INDEX IF NOT EXISTS idx_recipe_definitions_recipe ON recipe_definitions(recipe_id);
"#;
