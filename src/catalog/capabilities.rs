//! Server capability detection
//!
//! Every optional catalog query is gated on what the connected engine can
//! answer. Capabilities are probed once per scaffold run and never cached
//! across runs.

use super::connection::CatalogConnection;
use crate::diagnostics::{Diagnostics, ScaffoldEvent};
use crate::error::ScaffoldError;

pub const ENGINE_EDITION_QUERY: &str = "SELECT CAST(SERVERPROPERTY('EngineEdition') AS int);";

pub const COMPATIBILITY_LEVEL_QUERY: &str =
    "SELECT compatibility_level FROM sys.databases WHERE name = DB_NAME();";

pub const VIEW_DEFINITION_RIGHTS_QUERY: &str =
    "SELECT HAS_PERMS_BY_NAME(QUOTENAME(DB_NAME()), 'DATABASE', 'VIEW DEFINITION');";

/// `SERVERPROPERTY('EngineEdition')`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEdition {
    Personal,
    Standard,
    Enterprise,
    Express,
    SqlDatabase,
    SqlDataWarehouse,
    SqlManagedInstance,
    SqlEdge,
    SqlOnDemand,
    DynamicsTdsEndpoint,
    Other(i32),
}

impl EngineEdition {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => EngineEdition::Personal,
            2 => EngineEdition::Standard,
            3 => EngineEdition::Enterprise,
            4 => EngineEdition::Express,
            5 => EngineEdition::SqlDatabase,
            6 => EngineEdition::SqlDataWarehouse,
            8 => EngineEdition::SqlManagedInstance,
            9 => EngineEdition::SqlEdge,
            11 => EngineEdition::SqlOnDemand,
            1000 => EngineEdition::DynamicsTdsEndpoint,
            other => EngineEdition::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            EngineEdition::Personal => 1,
            EngineEdition::Standard => 2,
            EngineEdition::Enterprise => 3,
            EngineEdition::Express => 4,
            EngineEdition::SqlDatabase => 5,
            EngineEdition::SqlDataWarehouse => 6,
            EngineEdition::SqlManagedInstance => 8,
            EngineEdition::SqlEdge => 9,
            EngineEdition::SqlOnDemand => 11,
            EngineEdition::DynamicsTdsEndpoint => 1000,
            EngineEdition::Other(code) => code,
        }
    }

    /// Anything except the warehouse, serverless and Dynamics endpoints
    pub fn is_full_featured(self) -> bool {
        !matches!(
            self,
            EngineEdition::SqlDataWarehouse
                | EngineEdition::SqlOnDemand
                | EngineEdition::DynamicsTdsEndpoint
        )
    }
}

/// Capability snapshot of the connected database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerCapabilities {
    pub engine_edition: EngineEdition,
    pub compatibility_level: i32,
}

impl ServerCapabilities {
    pub fn new(engine_edition: EngineEdition, compatibility_level: i32) -> Self {
        Self {
            engine_edition,
            compatibility_level,
        }
    }

    pub fn supports_sequences(&self) -> bool {
        self.compatibility_level >= 110 && self.engine_edition.is_full_featured()
    }

    pub fn supports_memory_optimized(&self) -> bool {
        self.compatibility_level >= 120 && self.engine_edition.is_full_featured()
    }

    pub fn supports_temporal(&self) -> bool {
        self.compatibility_level >= 130 && self.engine_edition.is_full_featured()
    }

    pub fn supports_triggers(&self) -> bool {
        self.engine_edition.is_full_featured()
    }

    pub fn supports_views(&self) -> bool {
        self.engine_edition != EngineEdition::DynamicsTdsEndpoint
    }

    pub fn supports_indexes(&self) -> bool {
        self.engine_edition != EngineEdition::DynamicsTdsEndpoint
    }
}

/// Probe edition, compatibility level and VIEW DEFINITION rights.
///
/// Missing rights only produce a warning; scaffolding continues with
/// whatever the catalog views expose.
pub fn detect_capabilities<C, D>(
    connection: &mut C,
    diagnostics: &mut D,
) -> Result<ServerCapabilities, ScaffoldError>
where
    C: CatalogConnection + ?Sized,
    D: Diagnostics + ?Sized,
{
    let edition = scalar_i32(connection, ENGINE_EDITION_QUERY)?.unwrap_or(0);
    let level = scalar_i32(connection, COMPATIBILITY_LEVEL_QUERY)?.unwrap_or(0);

    if scalar_i32(connection, VIEW_DEFINITION_RIGHTS_QUERY)? != Some(1) {
        diagnostics.emit(ScaffoldEvent::MissingViewDefinitionRights);
    }

    let capabilities = ServerCapabilities::new(EngineEdition::from_code(edition), level);
    tracing::debug!(
        engine_edition = edition,
        compatibility_level = level,
        "detected server capabilities"
    );
    Ok(capabilities)
}

fn scalar_i32<C: CatalogConnection + ?Sized>(
    connection: &mut C,
    sql: &str,
) -> Result<Option<i32>, ScaffoldError> {
    let row = super::connection::CatalogRow::new().with("value", connection.query_scalar(sql)?);
    row.get_i32("value")
}
