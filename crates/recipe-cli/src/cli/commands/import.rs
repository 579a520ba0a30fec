use super::{exit_codes, Output};
use crate::cli::args::ImportArgs;
use anyhow::Context;
use recipe_core::{RecipeService, SqliteStore};

pub fn cmd_import(
    svc: &RecipeService<SqliteStore>,
    args: ImportArgs,
    out: Output,
) -> anyhow::Result<i32> {
    if !args.file.exists() {
        eprintln!("config error: definitions file not found: {}", args.file.display());
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let defs = recipe_core::import::load_definitions(&args.file)?;
    let n = svc
        .import_recipes(&defs)
        .with_context(|| format!("import of {} rolled back", args.file.display()))?;

    out.emit(
        &serde_json::json!({ "imported": n, "file": args.file }),
        || vec![format!("imported {} definition(s) from {}", n, args.file.display())],
    )?;
    Ok(exit_codes::OK)
}
