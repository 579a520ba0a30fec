use super::args::*;
use anyhow::Context;
use recipe_core::config::StoreConfig;
use recipe_core::{FilenameLookup, RecipeService, RecipeTest, SqliteStore, TestRow};
use serde::Serialize;
use std::path::Path;

pub mod export;
pub mod import;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const NOT_FOUND: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
        Command::Store(cmd) => {
            let cfg = resolve_store_config(cli.config.as_deref(), cli.db.as_deref())?;
            tracing::debug!(
                event = "store_config",
                db = %cfg.db_path.display(),
                busy_timeout_ms = cfg.busy_timeout_ms,
                journal_mode = cfg.journal_mode.pragma_value()
            );
            let store = SqliteStore::from_config(&cfg)
                .with_context(|| format!("failed to open store {}", cfg.db_path.display()))?;
            store.init_schema()?;
            run(&RecipeService::new(store), &cfg, cmd, Output(cli.format))
        }
    }
}

fn run(
    svc: &RecipeService<SqliteStore>,
    cfg: &StoreConfig,
    cmd: StoreCommand,
    out: Output,
) -> anyhow::Result<i32> {
    match cmd {
        StoreCommand::Init => cmd_init(svc, cfg, out),
        StoreCommand::Upsert(args) => {
            let test = RecipeTest::from(args);
            svc.upsert_recipe(&test)?;
            out.emit(&test.key(), || {
                vec![format!(
                    "upserted {} {} #{}",
                    test.recipe_id, test.version, test.test_number
                )]
            })?;
            Ok(exit_codes::OK)
        }
        StoreCommand::List => {
            let rows = svc.get_all_recipes()?;
            out.emit(&rows, || {
                rows.iter()
                    .map(|r| {
                        format!(
                            "{}\t{}\t{}\t{}",
                            r.recipe_id, r.version, r.test_number, r.test_name
                        )
                    })
                    .collect()
            })?;
            Ok(exit_codes::OK)
        }
        StoreCommand::Show(args) => {
            let rows = svc.get_recipe_version(&args.recipe_id, &args.version)?;
            out.emit(&rows, || rows.iter().map(test_line).collect())?;
            Ok(exit_codes::OK)
        }
        StoreCommand::Test(args) => {
            match svc.get_test_info(&args.recipe_id, &args.version, args.test_number)? {
                Some(row) => {
                    out.emit(&row, || vec![test_line(&row)])?;
                    Ok(exit_codes::OK)
                }
                None => {
                    eprintln!(
                        "not found: {} {} #{}",
                        args.recipe_id, args.version, args.test_number
                    );
                    Ok(exit_codes::NOT_FOUND)
                }
            }
        }
        StoreCommand::Delete(args) => {
            let removed = svc.delete_recipe_version(&args.recipe_id, &args.version)?;
            out.emit(&serde_json::json!({ "removed": removed }), || {
                vec![format!(
                    "deleted {} test(s) from {} {}",
                    removed, args.recipe_id, args.version
                )]
            })?;
            Ok(exit_codes::OK)
        }
        StoreCommand::Latest(args) => match svc.get_latest_version_from_filename(&args.filename)? {
            Some(version) => {
                out.emit(&serde_json::json!({ "version": version }), || {
                    vec![version.clone()]
                })?;
                Ok(exit_codes::OK)
            }
            None => {
                eprintln!("no version found for {}", args.filename);
                Ok(exit_codes::NOT_FOUND)
            }
        },
        StoreCommand::TestFromFile(args) => {
            let lookup = svc.get_test_info_from_filename(&args.filename, args.test_number)?;
            match &lookup {
                FilenameLookup::Found(def) => {
                    out.emit(def, || {
                        vec![format!(
                            "{}\t{}\t{}",
                            def.test.recipe_id,
                            def.test.version,
                            test_line(&TestRow::from(def.test.clone()))
                        )]
                    })?;
                    Ok(exit_codes::OK)
                }
                FilenameLookup::TestNotFound { recipe_id, version } => {
                    eprintln!(
                        "not found: test #{} in {} {} (latest)",
                        args.test_number, recipe_id, version
                    );
                    Ok(exit_codes::NOT_FOUND)
                }
                FilenameLookup::RecipeNotFound { recipe_id } => {
                    eprintln!("no version found for recipe '{}'", recipe_id);
                    Ok(exit_codes::NOT_FOUND)
                }
            }
        }
        StoreCommand::Import(args) => import::cmd_import(svc, args, out),
        StoreCommand::Export(args) => export::cmd_export(svc, args, out),
    }
}

/// Config file < environment < `--db`.
fn resolve_store_config(config: Option<&Path>, db: Option<&Path>) -> anyhow::Result<StoreConfig> {
    let base = match config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    let mut cfg = base.apply_env()?;
    if let Some(db) = db {
        cfg.db_path = db.to_path_buf();
    }
    Ok(cfg)
}

fn cmd_init(
    svc: &RecipeService<SqliteStore>,
    cfg: &StoreConfig,
    out: Output,
) -> anyhow::Result<i32> {
    let stats = svc.store().stats()?;
    out.emit(
        &serde_json::json!({
            "db": cfg.db_path,
            "schema_version": stats.schema_version,
            "recipes": stats.recipes,
            "versions": stats.versions,
            "tests": stats.tests,
        }),
        || {
            vec![
                format!("store: {}", cfg.db_path.display()),
                format!("schema version: {}", stats.schema_version),
                format!(
                    "{} recipe(s), {} version(s), {} test(s)",
                    stats.recipes, stats.versions, stats.tests
                ),
            ]
        },
    )?;
    Ok(exit_codes::OK)
}

fn test_line(r: &TestRow) -> String {
    format!(
        "{}\t{}\t{}\t{} [{}, {}] {}\t{}\t{}",
        r.test_number,
        r.test_name,
        r.characteristic,
        r.target_value,
        r.tol_lower,
        r.tol_upper,
        r.unit,
        r.method_reference,
        r.remarks.as_deref().unwrap_or("")
    )
}

#[derive(Clone, Copy)]
pub struct Output(OutputFormat);

impl Output {
    pub fn emit<T: Serialize + ?Sized>(
        &self,
        value: &T,
        text: impl FnOnce() -> Vec<String>,
    ) -> anyhow::Result<()> {
        match self.0 {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => {
                for line in text() {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}
