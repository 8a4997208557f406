//! Query-executing collaborator
//!
//! The scaffolder never talks to a driver directly. It sends ad hoc SQL text
//! to a [`CatalogConnection`] and reads the fully drained result as
//! [`CatalogRow`]s with named-field access.

use std::ops::{Deref, DerefMut};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::ScaffoldError;

/// A single catalog value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// One row of a catalog result set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow {
    fields: Vec<(String, SqlValue)>,
}

impl CatalogRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`CatalogRow::push`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a field, replacing any existing field of the same name
    /// (case-insensitive) in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        let name = name.into();
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value of the first field; scalar queries read their result this way
    pub fn first_value(&self) -> &SqlValue {
        self.fields.first().map_or(&SqlValue::Null, |(_, v)| v)
    }

    /// Raw field value; field names match case-insensitively
    pub fn value(&self, field: &str) -> Result<&SqlValue, ScaffoldError> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, v)| v)
            .ok_or_else(|| ScaffoldError::MissingField {
                field: field.to_string(),
            })
    }

    pub fn get_str(&self, field: &str) -> Result<Option<&str>, ScaffoldError> {
        match self.value(field)? {
            SqlValue::Null => Ok(None),
            SqlValue::String(s) => Ok(Some(s)),
            _ => Err(type_error(field, "a string")),
        }
    }

    pub fn get_string(&self, field: &str) -> Result<Option<String>, ScaffoldError> {
        Ok(self.get_str(field)?.map(str::to_string))
    }

    pub fn get_i64(&self, field: &str) -> Result<Option<i64>, ScaffoldError> {
        match self.value(field)? {
            SqlValue::Null => Ok(None),
            SqlValue::Int(i) => Ok(Some(*i)),
            SqlValue::Bool(b) => Ok(Some(i64::from(*b))),
            SqlValue::Decimal(d) if d.fract().is_zero() => d
                .to_i64()
                .map(Some)
                .ok_or_else(|| type_error(field, "a 64-bit integer")),
            _ => Err(type_error(field, "a 64-bit integer")),
        }
    }

    pub fn get_i32(&self, field: &str) -> Result<Option<i32>, ScaffoldError> {
        self.get_i64(field)?
            .map(|v| i32::try_from(v).map_err(|_| type_error(field, "a 32-bit integer")))
            .transpose()
    }

    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, ScaffoldError> {
        match self.value(field)? {
            SqlValue::Null => Ok(None),
            SqlValue::Bool(b) => Ok(Some(*b)),
            SqlValue::Int(i) => Ok(Some(*i != 0)),
            _ => Err(type_error(field, "a boolean")),
        }
    }

    pub fn required_str(&self, field: &str) -> Result<&str, ScaffoldError> {
        self.get_str(field)?.ok_or_else(|| null_error(field))
    }

    pub fn required_i32(&self, field: &str) -> Result<i32, ScaffoldError> {
        self.get_i32(field)?.ok_or_else(|| null_error(field))
    }

    pub fn required_bool(&self, field: &str) -> Result<bool, ScaffoldError> {
        self.get_bool(field)?.ok_or_else(|| null_error(field))
    }
}

fn type_error(field: &str, expected: &'static str) -> ScaffoldError {
    ScaffoldError::FieldType {
        field: field.to_string(),
        expected,
    }
}

fn null_error(field: &str) -> ScaffoldError {
    ScaffoldError::NullField {
        field: field.to_string(),
    }
}

/// A database connection able to run catalog queries
///
/// Implementations execute one statement at a time and return the first
/// result set fully drained.
pub trait CatalogConnection {
    fn is_open(&self) -> bool;

    fn open(&mut self) -> Result<(), ScaffoldError>;

    fn close(&mut self) -> Result<(), ScaffoldError>;

    fn query(&mut self, sql: &str) -> Result<Vec<CatalogRow>, ScaffoldError>;

    /// First column of the first row, `Null` for an empty result
    fn query_scalar(&mut self, sql: &str) -> Result<SqlValue, ScaffoldError> {
        Ok(self
            .query(sql)?
            .first()
            .map_or(SqlValue::Null, |row| row.first_value().clone()))
    }
}

/// Opens the connection if it was closed and closes it again on drop.
///
/// A connection that was already open on entry is left open, so the
/// caller's own connection lifecycle is never disturbed.
pub struct ConnectionScope<'a, C: CatalogConnection + ?Sized> {
    connection: &'a mut C,
    opened: bool,
}

impl<'a, C: CatalogConnection + ?Sized> ConnectionScope<'a, C> {
    pub fn new(connection: &'a mut C) -> Result<Self, ScaffoldError> {
        let opened = if connection.is_open() {
            false
        } else {
            connection.open()?;
            true
        };
        Ok(Self { connection, opened })
    }

    /// Whether this scope opened the connection (and will close it)
    pub fn opened(&self) -> bool {
        self.opened
    }
}

impl<C: CatalogConnection + ?Sized> Deref for ConnectionScope<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.connection
    }
}

impl<C: CatalogConnection + ?Sized> DerefMut for ConnectionScope<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.connection
    }
}

impl<C: CatalogConnection + ?Sized> Drop for ConnectionScope<'_, C> {
    fn drop(&mut self) {
        if self.opened {
            if let Err(err) = self.connection.close() {
                tracing::warn!(error = %err, "failed to close catalog connection");
            }
        }
    }
}
