//! Database model representation

use std::fmt::Write;

use super::{SequenceElement, TableElement, TableId};
use crate::parser::display_name;
use crate::util::opt_eq_ci;

/// The complete database model produced by a scaffold run
#[derive(Debug, Clone, Default)]
pub struct DatabaseModel {
    pub database_name: Option<String>,
    pub default_schema: Option<String>,
    /// Only set when it differs from the server collation
    pub collation: Option<String>,
    pub sequences: Vec<SequenceElement>,
    pub tables: Vec<TableElement>,
}

impl DatabaseModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: TableElement) -> TableId {
        self.tables.push(table);
        TableId(self.tables.len() - 1)
    }

    pub fn table(&self, id: TableId) -> &TableElement {
        &self.tables[id.0]
    }

    pub fn table_mut(&mut self, id: TableId) -> &mut TableElement {
        &mut self.tables[id.0]
    }

    /// Find a table by (schema, name): exact match first, then case-insensitive.
    pub fn find_table(&self, schema: Option<&str>, name: &str) -> Option<TableId> {
        self.tables
            .iter()
            .position(|t| t.schema.as_deref() == schema && t.name == name)
            .or_else(|| {
                self.tables.iter().position(|t| {
                    opt_eq_ci(t.schema.as_deref(), schema) && crate::util::eq_ci(&t.name, name)
                })
            })
            .map(TableId)
    }

    /// Human-readable listing of the discovered objects
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Database: {} (default schema: {})",
            self.database_name.as_deref().unwrap_or("(unknown)"),
            self.default_schema.as_deref().unwrap_or("(none)")
        );
        if let Some(collation) = &self.collation {
            let _ = writeln!(out, "Collation: {}", collation);
        }

        let _ = writeln!(out, "Sequences: {}", self.sequences.len());
        for sequence in &self.sequences {
            let _ = writeln!(
                out,
                "  {} ({})",
                display_name(sequence.schema.as_deref(), &sequence.name),
                sequence.store_type
            );
        }

        let _ = writeln!(out, "Tables and views: {}", self.tables.len());
        for table in &self.tables {
            let _ = write!(
                out,
                "  {}{} ({} columns",
                table.display_name(),
                if table.is_view() { " [view]" } else { "" },
                table.columns.len()
            );
            if let Some(pk) = &table.primary_key {
                let _ = write!(out, ", PK({})", pk.columns.join(", "));
            }
            if !table.unique_constraints.is_empty() {
                let _ = write!(out, ", {} unique", table.unique_constraints.len());
            }
            if !table.indexes.is_empty() {
                let _ = write!(out, ", {} indexes", table.indexes.len());
            }
            for fk in &table.foreign_keys {
                let _ = write!(
                    out,
                    ", FK({}) -> {}",
                    fk.columns.join(", "),
                    self.table(fk.principal_table).display_name()
                );
            }
            if !table.triggers.is_empty() {
                let _ = write!(out, ", {} triggers", table.triggers.len());
            }
            let _ = writeln!(out, ")");
        }
        out
    }

    /// Convenience lookup by exact (schema, name)
    pub fn get_table(&self, schema: &str, name: &str) -> Option<&TableElement> {
        self.tables
            .iter()
            .find(|t| t.schema.as_deref() == Some(schema) && t.name == name)
    }
}
