//! Scaffolding diagnostics
//!
//! The assembler reports every discovery and every recovered data-quality
//! problem as a [`ScaffoldEvent`]. Events are advisory: none of them changes
//! the outcome of a run. [`TracingDiagnostics`] forwards them to `tracing`;
//! [`CollectingDiagnostics`] keeps them for inspection.

use std::fmt;

use crate::model::ReferentialAction;

/// Severity of a scaffold event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Debug,
    Warning,
}

/// A structured scaffolding event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldEvent {
    DefaultSchemaFound {
        schema: String,
    },
    TypeAliasFound {
        alias: String,
        store_type: String,
    },
    SequenceFound {
        name: String,
        store_type: String,
        is_cyclic: bool,
        increment_by: i32,
        start_value: Option<i64>,
        min_value: Option<i64>,
        max_value: Option<i64>,
    },
    TableFound {
        name: String,
    },
    ViewFound {
        name: String,
    },
    ColumnFound {
        table: String,
        column: String,
        ordinal: i32,
        store_type: String,
        is_nullable: bool,
        is_identity: bool,
        default_value_sql: Option<String>,
        computed_column_sql: Option<String>,
    },
    PrimaryKeyFound {
        name: String,
        table: String,
    },
    UniqueConstraintFound {
        name: String,
        table: String,
    },
    IndexFound {
        name: String,
        table: String,
        is_unique: bool,
    },
    ForeignKeyFound {
        name: String,
        table: String,
        principal_table: String,
        on_delete: Option<ReferentialAction>,
    },
    TriggerFound {
        name: String,
        table: String,
    },
    MissingViewDefinitionRights,
    MissingSchema {
        schema: String,
    },
    MissingTable {
        table: String,
    },
    ColumnWithoutType {
        table: String,
        column: String,
    },
    PrincipalTableNotInSelectionSet {
        foreign_key: String,
        table: String,
        principal_table: String,
    },
    ForeignKeyColumnNotFound {
        foreign_key: String,
        table: String,
        column: String,
    },
    PrincipalColumnNotFound {
        foreign_key: String,
        table: String,
        principal_column: String,
        principal_table: String,
    },
    ReflexiveConstraintIgnored {
        foreign_key: String,
        table: String,
    },
    DuplicateForeignKeyIgnored {
        foreign_key: String,
        table: String,
        duplicate_of: String,
    },
}

impl ScaffoldEvent {
    /// Stable identifier of the event kind
    pub fn id(&self) -> &'static str {
        match self {
            ScaffoldEvent::DefaultSchemaFound { .. } => "DefaultSchemaFound",
            ScaffoldEvent::TypeAliasFound { .. } => "TypeAliasFound",
            ScaffoldEvent::SequenceFound { .. } => "SequenceFound",
            ScaffoldEvent::TableFound { .. } => "TableFound",
            ScaffoldEvent::ViewFound { .. } => "ViewFound",
            ScaffoldEvent::ColumnFound { .. } => "ColumnFound",
            ScaffoldEvent::PrimaryKeyFound { .. } => "PrimaryKeyFound",
            ScaffoldEvent::UniqueConstraintFound { .. } => "UniqueConstraintFound",
            ScaffoldEvent::IndexFound { .. } => "IndexFound",
            ScaffoldEvent::ForeignKeyFound { .. } => "ForeignKeyFound",
            ScaffoldEvent::TriggerFound { .. } => "TriggerFound",
            ScaffoldEvent::MissingViewDefinitionRights => "MissingViewDefinitionRightsWarning",
            ScaffoldEvent::MissingSchema { .. } => "MissingSchemaWarning",
            ScaffoldEvent::MissingTable { .. } => "MissingTableWarning",
            ScaffoldEvent::ColumnWithoutType { .. } => "ColumnWithoutTypeWarning",
            ScaffoldEvent::PrincipalTableNotInSelectionSet { .. } => {
                "ForeignKeyReferencesMissingPrincipalTableWarning"
            }
            ScaffoldEvent::ForeignKeyColumnNotFound { .. } => "ForeignKeyColumnNotFoundWarning",
            ScaffoldEvent::PrincipalColumnNotFound { .. } => {
                "ForeignKeyPrincipalColumnMissingWarning"
            }
            ScaffoldEvent::ReflexiveConstraintIgnored { .. } => "ReflexiveConstraintIgnored",
            ScaffoldEvent::DuplicateForeignKeyIgnored { .. } => {
                "DuplicateForeignKeyConstraintIgnored"
            }
        }
    }

    pub fn level(&self) -> EventLevel {
        match self {
            ScaffoldEvent::MissingViewDefinitionRights
            | ScaffoldEvent::MissingSchema { .. }
            | ScaffoldEvent::MissingTable { .. }
            | ScaffoldEvent::ColumnWithoutType { .. }
            | ScaffoldEvent::PrincipalTableNotInSelectionSet { .. }
            | ScaffoldEvent::ForeignKeyColumnNotFound { .. }
            | ScaffoldEvent::PrincipalColumnNotFound { .. }
            | ScaffoldEvent::ReflexiveConstraintIgnored { .. }
            | ScaffoldEvent::DuplicateForeignKeyIgnored { .. } => EventLevel::Warning,
            _ => EventLevel::Debug,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.level() == EventLevel::Warning
    }
}

fn opt<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "(null)".to_string(),
    }
}

impl fmt::Display for ScaffoldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaffoldEvent::DefaultSchemaFound { schema } => {
                write!(f, "Found default schema '{}'.", schema)
            }
            ScaffoldEvent::TypeAliasFound { alias, store_type } => write!(
                f,
                "Found type alias with name: {} which maps to underlying data type {}.",
                alias, store_type
            ),
            ScaffoldEvent::SequenceFound {
                name,
                store_type,
                is_cyclic,
                increment_by,
                start_value,
                min_value,
                max_value,
            } => write!(
                f,
                "Found sequence with name: {}, data type: {}, cyclic: {}, increment: {}, start: {}, minimum: {}, maximum: {}.",
                name,
                store_type,
                is_cyclic,
                increment_by,
                opt(start_value),
                opt(min_value),
                opt(max_value)
            ),
            ScaffoldEvent::TableFound { name } => write!(f, "Found table with name: {}.", name),
            ScaffoldEvent::ViewFound { name } => write!(f, "Found view with name: {}.", name),
            ScaffoldEvent::ColumnFound {
                table,
                column,
                ordinal,
                store_type,
                is_nullable,
                is_identity,
                default_value_sql,
                computed_column_sql,
            } => write!(
                f,
                "Found column with table: {}, column name: {}, ordinal: {}, data type: {}, nullable: {}, identity: {}, default value: {}, computed value: {}.",
                table,
                column,
                ordinal,
                store_type,
                is_nullable,
                is_identity,
                opt(default_value_sql),
                opt(computed_column_sql)
            ),
            ScaffoldEvent::PrimaryKeyFound { name, table } => {
                write!(f, "Found primary key with name: {}, table: {}.", name, table)
            }
            ScaffoldEvent::UniqueConstraintFound { name, table } => write!(
                f,
                "Found unique constraint with name: {}, table: {}.",
                name, table
            ),
            ScaffoldEvent::IndexFound {
                name,
                table,
                is_unique,
            } => write!(
                f,
                "Found index with name: {}, table: {}, is unique: {}.",
                name, table, is_unique
            ),
            ScaffoldEvent::ForeignKeyFound {
                name,
                table,
                principal_table,
                on_delete,
            } => write!(
                f,
                "Found foreign key on table: {}, name: {}, principal table: {}, delete action: {}.",
                table,
                name,
                principal_table,
                match on_delete {
                    Some(action) => format!("{:?}", action),
                    None => "(null)".to_string(),
                }
            ),
            ScaffoldEvent::TriggerFound { name, table } => {
                write!(f, "Found trigger with name: {}, table: {}.", name, table)
            }
            ScaffoldEvent::MissingViewDefinitionRights => f.write_str(
                "Could not scaffold the database model because the user lacks the VIEW DEFINITION permission. The model may be incomplete.",
            ),
            ScaffoldEvent::MissingSchema { schema } => write!(
                f,
                "Unable to find a schema in the database matching the selected schema '{}'.",
                schema
            ),
            ScaffoldEvent::MissingTable { table } => write!(
                f,
                "Unable to find a table in the database matching the selected table '{}'.",
                table
            ),
            ScaffoldEvent::ColumnWithoutType { table, column } => write!(
                f,
                "Could not find type mapping for column '{}.{}'. Skipping column.",
                table, column
            ),
            ScaffoldEvent::PrincipalTableNotInSelectionSet {
                foreign_key,
                table,
                principal_table,
            } => write!(
                f,
                "The foreign key {} on table {} references table {} which was not included in the model. This foreign key was skipped.",
                foreign_key, table, principal_table
            ),
            ScaffoldEvent::ForeignKeyColumnNotFound {
                foreign_key,
                table,
                column,
            } => write!(
                f,
                "Skipping foreign key '{}' on table '{}' since column '{}' could not be found.",
                foreign_key, table, column
            ),
            ScaffoldEvent::PrincipalColumnNotFound {
                foreign_key,
                table,
                principal_column,
                principal_table,
            } => write!(
                f,
                "Skipping foreign key '{}' on table '{}' since principal column '{}' could not be found in principal table '{}'.",
                foreign_key, table, principal_column, principal_table
            ),
            ScaffoldEvent::ReflexiveConstraintIgnored { foreign_key, table } => write!(
                f,
                "Skipping foreign key '{}' on table '{}' since all of its columns reference themselves.",
                foreign_key, table
            ),
            ScaffoldEvent::DuplicateForeignKeyIgnored {
                foreign_key,
                table,
                duplicate_of,
            } => write!(
                f,
                "The foreign key '{}' on table '{}' is identical to foreign key '{}' and was skipped.",
                foreign_key, table, duplicate_of
            ),
        }
    }
}

/// Receiver of scaffold events
pub trait Diagnostics {
    fn emit(&mut self, event: ScaffoldEvent);
}

fn log_event(event: &ScaffoldEvent) {
    match event.level() {
        EventLevel::Debug => tracing::debug!(event_id = event.id(), "{}", event),
        EventLevel::Warning => tracing::warn!(event_id = event.id(), "{}", event),
    }
}

/// Forwards every event to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&mut self, event: ScaffoldEvent) {
        log_event(&event);
    }
}

/// Keeps every event, optionally logging it as well
#[derive(Debug, Default, Clone)]
pub struct CollectingDiagnostics {
    pub events: Vec<ScaffoldEvent>,
    log: bool,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also forward each event to `tracing`
    pub fn with_tracing(mut self) -> Self {
        self.log = true;
        self
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ScaffoldEvent> {
        self.events.iter().filter(|e| e.is_warning())
    }

    /// Events with the given [`ScaffoldEvent::id`]
    pub fn with_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ScaffoldEvent> + 'a {
        self.events.iter().filter(move |e| e.id() == id)
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn emit(&mut self, event: ScaffoldEvent) {
        if self.log {
            log_event(&event);
        }
        self.events.push(event);
    }
}
