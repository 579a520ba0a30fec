use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "recipe",
    version,
    about = "Manage versioned recipe test definitions"
)]
pub struct Cli {
    /// SQLite database (overrides config file and RECIPE_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// YAML store configuration
    #[arg(long, global = true, env = "RECIPE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(flatten)]
    Store(StoreCommand),
    /// Print the version
    Version,
}

/// Subcommands that operate on the definition store.
#[derive(Subcommand)]
pub enum StoreCommand {
    /// Create the schema (idempotent) and print store statistics
    Init,
    /// Insert or overwrite one test definition
    Upsert(UpsertArgs),
    /// List every (recipe, version, test) on record
    List,
    /// Show all tests of one recipe version
    Show(VersionArgs),
    /// Show a single test
    Test(TestArgs),
    /// Delete every test of one recipe version
    Delete(VersionArgs),
    /// Latest version of the recipe a filename refers to
    Latest(FilenameArgs),
    /// Test of the latest version of the recipe a filename refers to
    TestFromFile(TestFromFileArgs),
    /// Upsert all definitions from a CSV, YAML or JSON file in one transaction
    Import(ImportArgs),
    /// Write one recipe version as a recipe CSV file
    Export(ExportArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct UpsertArgs {
    #[arg(long)]
    pub recipe_id: String,
    #[arg(long)]
    pub version: String,
    #[arg(long, allow_negative_numbers = true)]
    pub test_number: i64,
    #[arg(long)]
    pub test_name: String,
    #[arg(long)]
    pub characteristic: String,
    #[arg(long, allow_negative_numbers = true)]
    pub target_value: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub tol_lower: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub tol_upper: f64,
    #[arg(long)]
    pub unit: String,
    #[arg(long)]
    pub method_reference: String,
    #[arg(long)]
    pub remarks: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct VersionArgs {
    #[arg(long)]
    pub recipe_id: String,
    #[arg(long)]
    pub version: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TestArgs {
    #[arg(long)]
    pub recipe_id: String,
    #[arg(long)]
    pub version: String,
    #[arg(long, allow_negative_numbers = true)]
    pub test_number: i64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct FilenameArgs {
    /// e.g. abc_v1.csv
    #[arg(long)]
    pub filename: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TestFromFileArgs {
    #[arg(long)]
    pub filename: String,
    #[arg(long, allow_negative_numbers = true)]
    pub test_number: i64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long)]
    pub recipe_id: String,
    #[arg(long)]
    pub version: String,
    /// Output file (default: stdout)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl From<UpsertArgs> for recipe_core::RecipeTest {
    fn from(a: UpsertArgs) -> Self {
        Self {
            recipe_id: a.recipe_id,
            version: a.version,
            test_number: a.test_number,
            test_name: a.test_name,
            characteristic: a.characteristic,
            target_value: a.target_value,
            tol_lower: a.tol_lower,
            tol_upper: a.tol_upper,
            unit: a.unit,
            method_reference: a.method_reference,
            remarks: a.remarks,
        }
    }
}
