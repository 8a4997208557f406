//! mssql-scaffold: reverse-engineer a SQL Server database into a schema model
//!
//! This library reads the SQL Server system catalog (sequences, tables,
//! views, columns, keys, indexes, foreign keys, triggers) and assembles a
//! provider-neutral [`DatabaseModel`] suitable for code generation.

pub mod catalog;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod parser;
mod util;

pub use diagnostics::{CollectingDiagnostics, Diagnostics, ScaffoldEvent, TracingDiagnostics};
pub use error::ScaffoldError;
pub use model::{build_model, DatabaseModel, DatabaseModelFactory, ScaffoldOptions};

/// Options for scaffolding a live database
#[cfg(feature = "mssql")]
#[derive(Debug, Clone)]
pub struct ScaffoldCommand {
    /// ADO.NET style connection string
    pub connection_string: String,
    /// Schema and table selection
    pub options: ScaffoldOptions,
    /// Enable verbose output
    pub verbose: bool,
}

/// Connect to SQL Server and scaffold the selected objects
///
/// Returns the model together with every diagnostic raised during the run.
#[cfg(feature = "mssql")]
pub fn scaffold_database(
    command: &ScaffoldCommand,
) -> anyhow::Result<(DatabaseModel, Vec<ScaffoldEvent>)> {
    use anyhow::Context;

    let mut connection = catalog::TiberiusConnection::from_ado_string(&command.connection_string)
        .context("invalid connection string")?;

    if command.verbose {
        println!(
            "Scaffolding {} schema(s), {} table(s) selected",
            command.options.schemas.len(),
            command.options.tables.len()
        );
    }

    let mut diagnostics = CollectingDiagnostics::new().with_tracing();
    let model = build_model(&mut connection, &command.options, &mut diagnostics)?;

    if command.verbose {
        println!(
            "Built model with {} tables/views and {} sequences",
            model.tables.len(),
            model.sequences.len()
        );
    }

    Ok((model, diagnostics.events))
}
