//! Identifier handling for user-supplied table filters.
//!
//! Table filters are written the way a T-SQL author would write an object
//! name: `Orders`, `Sales.Orders`, `[My Schema].[My Table]` or mixes such as
//! `dbo.[Table.With.Dot]`. Inside brackets `]]` is an escaped `]`.
//!
//! # Examples
//!
//! ```
//! use mssql_scaffold::parser::{parse_table_name, QualifiedName};
//!
//! assert_eq!(
//!     parse_table_name("[Sales].[Order Lines]").unwrap(),
//!     QualifiedName::new(Some("Sales"), "Order Lines")
//! );
//! assert_eq!(parse_table_name("Orders").unwrap(), QualifiedName::new(None, "Orders"));
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ScaffoldError;

/// One or two dot-separated parts; each part is bracketed (with `]]` escapes)
/// or a bare run without `.`, `[` and `]`.
static TABLE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\[(?P<b1>(?:\]\]|[^\]])+)\]|(?P<u1>[^.\[\]]+))(?:\.(?:\[(?P<b2>(?:\]\]|[^\]])+)\]|(?P<u2>[^.\[\]]+)))?$",
    )
    .unwrap()
});

/// A possibly schema-qualified object name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub table: String,
}

impl QualifiedName {
    pub fn new(schema: Option<&str>, table: &str) -> Self {
        Self {
            schema: schema.map(str::to_string),
            table: table.to_string(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_name(self.schema.as_deref(), &self.table))
    }
}

/// Parse a table filter string into an optional schema and a table name.
///
/// A single part is the table name. Fails with
/// [`ScaffoldError::InvalidTableFilter`] when the string does not follow the
/// grammar (unbalanced brackets, more than two parts, empty parts).
pub fn parse_table_name(input: &str) -> Result<QualifiedName, ScaffoldError> {
    let caps = TABLE_NAME_RE
        .captures(input.trim())
        .ok_or_else(|| ScaffoldError::InvalidTableFilter {
            filter: input.to_string(),
        })?;

    let part = |bracketed: &str, bare: &str| -> Option<String> {
        caps.name(bracketed)
            .map(|m| m.as_str().replace("]]", "]"))
            .or_else(|| caps.name(bare).map(|m| m.as_str().to_string()))
    };

    let first = part("b1", "u1").ok_or_else(|| ScaffoldError::InvalidTableFilter {
        filter: input.to_string(),
    })?;

    Ok(match part("b2", "u2") {
        Some(second) => QualifiedName {
            schema: Some(first),
            table: second,
        },
        None => QualifiedName {
            schema: None,
            table: first,
        },
    })
}

/// Quote a value as a Unicode T-SQL string literal: `N'...'` with `'` doubled.
pub fn escape_literal(value: &str) -> String {
    format!("N'{}'", value.replace('\'', "''"))
}

/// `schema.name`, or `name` when no schema is given.
pub fn display_name(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(s) if !s.is_empty() => format!("{}.{}", s, name),
        _ => name.to_string(),
    }
}
