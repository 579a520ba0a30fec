use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecipeError>;

/// Errors surfaced by the store, the version resolver and the access layer.
///
/// Absence of data is never an error here: reads return `Option`, empty
/// vectors or [`crate::service::FilenameLookup`].
#[derive(Debug, Error)]
pub enum RecipeError {
    /// A write violated a storage constraint (e.g. a NULL in a NOT NULL column).
    #[error("E_CONSTRAINT: {0}")]
    ConstraintViolation(String),

    /// A recorded version string could not be parsed into numeric segments.
    #[error("E_MALFORMED_VERSION: '{version}' is not a dotted numeric version ({reason})")]
    MalformedVersion { version: String, reason: String },

    #[error("E_STORE: store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("E_STORE: {0}")]
    Sqlite(rusqlite::Error),

    #[error("E_CONFIG: {0}")]
    Config(String),

    /// A CSV definition file or export could not be read or written.
    #[error("E_CSV: {0}")]
    Csv(String),
}

impl RecipeError {
    /// Stable machine-readable code, used by the CLI and the JSON-RPC server.
    pub fn code(&self) -> &'static str {
        match self {
            RecipeError::ConstraintViolation(_) => "E_CONSTRAINT",
            RecipeError::MalformedVersion { .. } => "E_MALFORMED_VERSION",
            RecipeError::StoreUnavailable(_) | RecipeError::Sqlite(_) => "E_STORE",
            RecipeError::Config(_) => "E_CONFIG",
            RecipeError::Csv(_) => "E_CSV",
        }
    }

    pub(crate) fn malformed(version: &str, reason: impl Into<String>) -> Self {
        RecipeError::MalformedVersion {
            version: version.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for RecipeError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, msg)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RecipeError::ConstraintViolation(
                    msg.clone().unwrap_or_else(|| err.to_string()),
                )
            }
            _ => RecipeError::Sqlite(e),
        }
    }
}

impl From<csv::Error> for RecipeError {
    fn from(e: csv::Error) -> Self {
        RecipeError::Csv(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for RecipeError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RecipeError::StoreUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_failures_are_classified() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL),
            Some("NOT NULL constraint failed: recipe_definitions.target_value".into()),
        );
        let mapped = RecipeError::from(err);
        assert_eq!(mapped.code(), "E_CONSTRAINT");
        assert!(mapped.to_string().contains("target_value"));
    }

    #[test]
    fn other_sqlite_failures_pass_through() {
        let mapped = RecipeError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(mapped, RecipeError::Sqlite(_)));
        assert_eq!(mapped.code(), "E_STORE");
    }
}
