//! Schema and table selection
//!
//! Turns the user's requested schemas and tables into SQL predicates that
//! restrict every catalog query. All names are emitted as escaped `N'...'`
//! literals; nothing from the user is ever spliced into SQL unquoted.

use crate::error::ScaffoldError;
use crate::parser::{escape_literal, parse_table_name, QualifiedName};
use crate::util::eq_ci;

/// A requested table together with its parsed form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSelection {
    /// The filter exactly as the user wrote it
    pub raw: String,
    pub name: QualifiedName,
}

/// The selection set of a scaffold run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    schemas: Vec<String>,
    tables: Vec<TableSelection>,
}

impl CatalogFilter {
    /// Parse the table filters. A malformed table filter aborts the run
    /// before any catalog query is sent.
    pub fn new<S, T>(schemas: S, tables: T) -> Result<Self, ScaffoldError>
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let schemas = schemas.into_iter().map(|s| s.as_ref().to_string()).collect();
        let tables = tables
            .into_iter()
            .map(|raw| {
                let raw = raw.as_ref();
                parse_table_name(raw).map(|name| TableSelection {
                    raw: raw.to_string(),
                    name,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { schemas, tables })
    }

    pub fn schemas(&self) -> &[String] {
        &self.schemas
    }

    pub fn tables(&self) -> &[TableSelection] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.tables.is_empty()
    }

    /// Requested schemas with case-insensitive duplicates removed
    pub fn distinct_schemas(&self) -> Vec<&str> {
        let mut distinct: Vec<&str> = Vec::new();
        for schema in &self.schemas {
            if !distinct.iter().any(|s| eq_ci(s, schema)) {
                distinct.push(schema);
            }
        }
        distinct
    }

    /// `{schema} IN (N'a', N'b')`, or `None` without requested schemas
    pub fn schema_filter(&self, schema_expr: &str) -> Option<String> {
        if self.schemas.is_empty() {
            return None;
        }
        let list = self
            .schemas
            .iter()
            .map(|s| escape_literal(s))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("{} IN ({})", schema_expr, list))
    }

    /// Combined schema/table predicate, or `None` when nothing is selected.
    ///
    /// Requested schemas widen the selection: a row passes when it matches
    /// a schema OR one of the requested tables.
    pub fn table_filter(&self, schema_expr: &str, table_expr: &str) -> Option<String> {
        let schema_filter = self.schema_filter(schema_expr);
        if self.tables.is_empty() {
            return schema_filter;
        }

        let mut sql = String::from("(");
        if let Some(schema_filter) = &schema_filter {
            sql.push_str(schema_filter);
            sql.push_str("\nOR ");
        }

        let unqualified: Vec<String> = self
            .tables
            .iter()
            .filter(|t| t.name.schema.is_none())
            .map(|t| escape_literal(&t.name.table))
            .collect();
        let qualified: Vec<&QualifiedName> = self
            .tables
            .iter()
            .map(|t| &t.name)
            .filter(|n| n.schema.is_some())
            .collect();

        let mut needs_or = false;
        if !unqualified.is_empty() {
            sql.push_str(&format!("{} IN ({})", table_expr, unqualified.join(", ")));
            needs_or = true;
        }

        if !qualified.is_empty() {
            if needs_or {
                sql.push_str(" OR ");
            }
            let table_names = qualified
                .iter()
                .map(|n| escape_literal(&n.table))
                .collect::<Vec<_>>()
                .join(", ");
            let full_names = qualified
                .iter()
                .map(|n| escape_literal(&n.to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(
                "{} IN ({}) AND ({} + N'.' + {}) IN ({})",
                table_expr, table_names, schema_expr, table_expr, full_names
            ));
        }

        sql.push(')');
        Some(sql)
    }
}
