use super::{exit_codes, Output};
use crate::cli::args::ExportArgs;
use anyhow::Context;
use recipe_core::{RecipeService, SqliteStore};

pub fn cmd_export(
    svc: &RecipeService<SqliteStore>,
    args: ExportArgs,
    out: Output,
) -> anyhow::Result<i32> {
    let Some(csv) = svc.get_recipe_version_csv(&args.recipe_id, &args.version)? else {
        eprintln!("not found: {} {}", args.recipe_id, args.version);
        return Ok(exit_codes::NOT_FOUND);
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            out.emit(
                &serde_json::json!({
                    "recipe_id": args.recipe_id,
                    "version": args.version,
                    "file": path
                }),
                || {
                    vec![format!(
                        "exported {} {} to {}",
                        args.recipe_id,
                        args.version,
                        path.display()
                    )]
                },
            )?;
        }
        None => out.emit(
            &serde_json::json!({
                "recipe_id": args.recipe_id,
                "version": args.version,
                "csv": csv
            }),
            || csv.lines().map(str::to_string).collect(),
        )?,
    }
    Ok(exit_codes::OK)
}
