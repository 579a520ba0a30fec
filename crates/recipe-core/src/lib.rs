pub mod config;
pub mod csv_format;
pub mod errors;
pub mod import;
pub mod model;
pub mod service;
pub mod storage;
pub mod version;

pub use errors::{RecipeError, Result};
pub use model::{RecipeDefinition, RecipeSummary, RecipeTest, TestRow};
pub use service::{FilenameLookup, RecipeService};
pub use storage::{DefinitionStore, MemoryStore, SqliteStore};
