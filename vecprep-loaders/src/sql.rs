use crate::{IngestionError, ValidationError};

// SQLSTATE codes reported by Postgres-compatible drivers.
const UNDEFINED_TABLE: &str = "42P01";
const UNDEFINED_COLUMN: &str = "42703";
const UNDEFINED_FUNCTION: &str = "42883";
const INVALID_SCHEMA_NAME: &str = "3F000";
const INVALID_PARAMETER_VALUE: &str = "22023";

pub(crate) fn validate_identifier(field: &str, value: &str) -> Result<(), IngestionError> {
    let mut chars = value.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    if valid_start && valid_rest && value.len() <= 128 {
        Ok(())
    } else {
        Err(IngestionError::Configuration(format!(
            "`{field}` is not a valid SQL identifier: {value:?}"
        )))
    }
}

/// Identifiers are validated before quoting, so no escaping is needed.
pub(crate) fn quote_identifier(value: &str) -> String {
    format!("\"{value}\"")
}

/// Maps a driver error onto the ingestion taxonomy. `object` names what the
/// statement touched and ends up in `NotFound` errors.
pub(crate) fn classify(error: sqlx::Error, object: &str) -> IngestionError {
    let kind = match &error {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNDEFINED_TABLE | UNDEFINED_COLUMN | UNDEFINED_FUNCTION | INVALID_SCHEMA_NAME) => {
                Classified::NotFound
            }
            Some(INVALID_PARAMETER_VALUE) => Classified::Rejected(db.message().to_string()),
            _ if is_sqlite_missing_object(db.message()) => Classified::NotFound,
            _ => Classified::Other,
        },
        sqlx::Error::ColumnNotFound(_) => Classified::NotFound,
        _ => Classified::Other,
    };

    match kind {
        Classified::NotFound => IngestionError::not_found(object, error),
        Classified::Rejected(message) => ValidationError::Engine(message).into(),
        Classified::Other => IngestionError::Database(error),
    }
}

enum Classified {
    NotFound,
    Rejected(String),
    Other,
}

// SQLite reports every prepare failure under the generic SQLITE_ERROR code.
fn is_sqlite_missing_object(message: &str) -> bool {
    ["no such table", "no such column", "no such function", "unknown database"]
        .iter()
        .any(|prefix| message.starts_with(prefix))
}
