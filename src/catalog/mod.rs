//! Catalog access: connections, capability probing and query text

mod capabilities;
mod connection;
mod filter;
mod mock;
mod queries;
#[cfg(feature = "mssql")]
mod sql_server;

pub use capabilities::{
    detect_capabilities, EngineEdition, ServerCapabilities, COMPATIBILITY_LEVEL_QUERY,
    ENGINE_EDITION_QUERY, VIEW_DEFINITION_RIGHTS_QUERY,
};
pub use connection::{CatalogConnection, CatalogRow, ConnectionScope, SqlValue};
pub use filter::{CatalogFilter, TableSelection};
pub use mock::{CatalogQuery, MockConnection};
pub use queries::{
    CatalogQueries, QueryBuilder, COLLATION_QUERY, DATABASE_NAME_QUERY, DEFAULT_SCHEMA_QUERY,
};
#[cfg(feature = "mssql")]
pub use sql_server::TiberiusConnection;
