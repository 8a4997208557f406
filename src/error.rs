//! Error types for mssql-scaffold

use thiserror::Error;

/// Errors that abort a scaffold run
///
/// Data-quality problems in the catalog (unresolvable columns, missing
/// principal tables, ...) are not errors; they are reported through
/// [`crate::diagnostics::Diagnostics`] and the offending object is skipped.
#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("The table '{filter}' could not be parsed. Use [schema].[table] or an unquoted name without '.', '[' or ']'")]
    InvalidTableFilter { filter: String },

    #[error("Failed to connect to SQL Server: {message}")]
    Connection { message: String },

    #[error("Catalog query failed: {message}\n{sql}")]
    Query { sql: String, message: String },

    #[error("Catalog row has no field named '{field}'")]
    MissingField { field: String },

    #[error("Catalog field '{field}' is NULL but a value is required")]
    NullField { field: String },

    #[error("Catalog field '{field}' cannot be read as {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },
}

#[cfg(feature = "mssql")]
impl From<tiberius::error::Error> for ScaffoldError {
    fn from(err: tiberius::error::Error) -> Self {
        ScaffoldError::Connection {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "mssql")]
impl From<std::io::Error> for ScaffoldError {
    fn from(err: std::io::Error) -> Self {
        ScaffoldError::Connection {
            message: err.to_string(),
        }
    }
}
