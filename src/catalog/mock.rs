//! In-memory catalog connection for tests
//!
//! Answers catalog queries from predefined rows without touching a server.
//! Every statement is classified into a [`CatalogQuery`] kind, so fixtures
//! say "these are the column rows" rather than matching SQL text.
//!
//! ```
//! use mssql_scaffold::catalog::{CatalogConnection, CatalogQuery, CatalogRow, MockConnection};
//!
//! let mut conn = MockConnection::new().with_rows(
//!     CatalogQuery::Triggers,
//!     vec![CatalogRow::new().with("trigger_name", "TR_Audit")],
//! );
//! conn.open().unwrap();
//! let rows = conn.query("SELECT ... FROM [sys].[triggers] AS [tr] ...").unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

use std::collections::HashMap;

use super::capabilities::{
    COMPATIBILITY_LEVEL_QUERY, ENGINE_EDITION_QUERY, VIEW_DEFINITION_RIGHTS_QUERY,
};
use super::connection::{CatalogConnection, CatalogRow, SqlValue};
use super::queries::{COLLATION_QUERY, DATABASE_NAME_QUERY, DEFAULT_SCHEMA_QUERY};
use crate::error::ScaffoldError;

/// Kind of catalog statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogQuery {
    EngineEdition,
    CompatibilityLevel,
    ViewDefinitionRights,
    DatabaseName,
    DefaultSchema,
    Collation,
    TypeAliases,
    Sequences,
    Tables,
    Columns,
    Indexes,
    ForeignKeys,
    Triggers,
}

impl CatalogQuery {
    /// Classify a statement produced by this crate
    pub fn classify(sql: &str) -> Option<Self> {
        let exact = [
            (ENGINE_EDITION_QUERY, CatalogQuery::EngineEdition),
            (COMPATIBILITY_LEVEL_QUERY, CatalogQuery::CompatibilityLevel),
            (VIEW_DEFINITION_RIGHTS_QUERY, CatalogQuery::ViewDefinitionRights),
            (DATABASE_NAME_QUERY, CatalogQuery::DatabaseName),
            (DEFAULT_SCHEMA_QUERY, CatalogQuery::DefaultSchema),
            (COLLATION_QUERY, CatalogQuery::Collation),
        ];
        if let Some((_, kind)) = exact.iter().find(|(q, _)| *q == sql.trim()) {
            return Some(*kind);
        }

        let markers = [
            ("[underlying_system_type]", CatalogQuery::TypeAliases),
            ("FROM [sys].[sequences]", CatalogQuery::Sequences),
            ("'table' AS [type]", CatalogQuery::Tables),
            ("JOIN [sys].[columns] AS [c] ON [o]", CatalogQuery::Columns),
            ("FROM [sys].[indexes]", CatalogQuery::Indexes),
            ("FROM [sys].[foreign_keys]", CatalogQuery::ForeignKeys),
            ("FROM [sys].[triggers]", CatalogQuery::Triggers),
        ];
        markers
            .iter()
            .find(|(marker, _)| sql.contains(marker))
            .map(|(_, kind)| *kind)
    }
}

fn scalar(value: impl Into<SqlValue>) -> Vec<CatalogRow> {
    vec![CatalogRow::new().with("value", value)]
}

/// Mock catalog connection
///
/// Defaults to an Enterprise edition server at compatibility level 160,
/// a database named `TestDatabase` with default schema `dbo`, full VIEW
/// DEFINITION rights and no objects.
#[derive(Debug, Clone)]
pub struct MockConnection {
    results: HashMap<CatalogQuery, Vec<CatalogRow>>,
    failures: HashMap<CatalogQuery, String>,
    fail_open: bool,
    is_open: bool,
    open_calls: usize,
    close_calls: usize,
    executed: Vec<String>,
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnection {
    pub fn new() -> Self {
        let mut conn = Self {
            results: HashMap::new(),
            failures: HashMap::new(),
            fail_open: false,
            is_open: false,
            open_calls: 0,
            close_calls: 0,
            executed: Vec::new(),
        };
        conn.set(CatalogQuery::EngineEdition, scalar(3));
        conn.set(CatalogQuery::CompatibilityLevel, scalar(160));
        conn.set(CatalogQuery::ViewDefinitionRights, scalar(1));
        conn.set(CatalogQuery::DatabaseName, scalar("TestDatabase"));
        conn.set(CatalogQuery::DefaultSchema, scalar("dbo"));
        conn.set(
            CatalogQuery::Collation,
            vec![CatalogRow::new()
                .with("server_collation", "SQL_Latin1_General_CP1_CI_AS")
                .with("database_collation", "SQL_Latin1_General_CP1_CI_AS")],
        );
        conn
    }

    fn set(&mut self, kind: CatalogQuery, rows: Vec<CatalogRow>) {
        self.results.insert(kind, rows);
    }

    /// Engine edition code and compatibility level
    pub fn with_server(mut self, engine_edition: i32, compatibility_level: i32) -> Self {
        self.set(CatalogQuery::EngineEdition, scalar(engine_edition));
        self.set(CatalogQuery::CompatibilityLevel, scalar(compatibility_level));
        self
    }

    pub fn with_view_definition_rights(mut self, granted: bool) -> Self {
        self.set(CatalogQuery::ViewDefinitionRights, scalar(i32::from(granted)));
        self
    }

    pub fn with_database_name(mut self, name: &str) -> Self {
        self.set(CatalogQuery::DatabaseName, scalar(name));
        self
    }

    pub fn with_default_schema(mut self, schema: Option<&str>) -> Self {
        self.set(CatalogQuery::DefaultSchema, scalar(schema));
        self
    }

    pub fn with_collation(mut self, server: &str, database: &str) -> Self {
        self.set(
            CatalogQuery::Collation,
            vec![CatalogRow::new()
                .with("server_collation", server)
                .with("database_collation", database)],
        );
        self
    }

    /// Append rows returned for a query kind
    pub fn with_rows(mut self, kind: CatalogQuery, rows: Vec<CatalogRow>) -> Self {
        self.results.entry(kind).or_default().extend(rows);
        self
    }

    /// Make a query kind fail with the given message
    pub fn with_failure(mut self, kind: CatalogQuery, message: &str) -> Self {
        self.failures.insert(kind, message.to_string());
        self
    }

    /// Simulate a connection that cannot be opened
    pub fn with_open_failure(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Start in the open state, as if the caller opened it beforehand
    pub fn already_open(mut self) -> Self {
        self.is_open = true;
        self
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    /// Every statement received, in order
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Kinds of the statements received, in order
    pub fn executed_kinds(&self) -> Vec<CatalogQuery> {
        self.executed
            .iter()
            .filter_map(|sql| CatalogQuery::classify(sql))
            .collect()
    }

    pub fn was_executed(&self, kind: CatalogQuery) -> bool {
        self.executed_kinds().contains(&kind)
    }

    /// The last statement of the given kind
    pub fn last_sql(&self, kind: CatalogQuery) -> Option<&str> {
        self.executed
            .iter()
            .rev()
            .find(|sql| CatalogQuery::classify(sql) == Some(kind))
            .map(String::as_str)
    }
}

impl CatalogConnection for MockConnection {
    fn is_open(&self) -> bool {
        self.is_open
    }

    fn open(&mut self) -> Result<(), ScaffoldError> {
        self.open_calls += 1;
        if self.fail_open {
            return Err(ScaffoldError::Connection {
                message: "mock connection refused".to_string(),
            });
        }
        self.is_open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ScaffoldError> {
        self.close_calls += 1;
        self.is_open = false;
        Ok(())
    }

    fn query(&mut self, sql: &str) -> Result<Vec<CatalogRow>, ScaffoldError> {
        if !self.is_open {
            return Err(ScaffoldError::Connection {
                message: "connection is not open".to_string(),
            });
        }
        self.executed.push(sql.to_string());

        let Some(kind) = CatalogQuery::classify(sql) else {
            return Ok(Vec::new());
        };
        if let Some(message) = self.failures.get(&kind) {
            return Err(ScaffoldError::Query {
                sql: sql.to_string(),
                message: message.clone(),
            });
        }
        Ok(self.results.get(&kind).cloned().unwrap_or_default())
    }
}
