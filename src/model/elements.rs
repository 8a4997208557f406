//! Database model element types

use std::collections::BTreeMap;
use std::fmt;

use crate::parser::DefaultValue;

/// Annotation names for provider-specific facts attached to model elements
pub mod annotations {
    pub const CONCURRENCY_TOKEN: &str = "ConcurrencyToken";
    pub const CLUSTERED: &str = "SqlServer:Clustered";
    pub const FILL_FACTOR: &str = "SqlServer:FillFactor";
    pub const MEMORY_OPTIMIZED: &str = "SqlServer:MemoryOptimized";
    pub const SPARSE: &str = "SqlServer:Sparse";
    pub const IS_TEMPORAL: &str = "SqlServer:IsTemporal";
    pub const TEMPORAL_HISTORY_TABLE_NAME: &str = "SqlServer:TemporalHistoryTableName";
    pub const TEMPORAL_HISTORY_TABLE_SCHEMA: &str = "SqlServer:TemporalHistoryTableSchema";
    pub const TEMPORAL_PERIOD_START_COLUMN_NAME: &str = "SqlServer:TemporalPeriodStartColumnName";
    pub const TEMPORAL_PERIOD_END_COLUMN_NAME: &str = "SqlServer:TemporalPeriodEndColumnName";
}

/// Value stored in an annotation bag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Bool(b) => write!(f, "{}", b),
            AnnotationValue::Int(i) => write!(f, "{}", i),
            AnnotationValue::String(s) => f.write_str(s),
        }
    }
}

/// Key/value bag of provider-specific facts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations(BTreeMap<&'static str, AnnotationValue>);

impl Annotations {
    pub fn set(&mut self, name: &'static str, value: AnnotationValue) {
        self.0.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&AnnotationValue> {
        self.0.get(name)
    }

    /// Boolean annotation value, `None` when unset or not a boolean
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name) {
            Some(AnnotationValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(AnnotationValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AnnotationValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

/// Index of a table inside [`super::DatabaseModel::tables`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub usize);

/// Discriminates plain tables from views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Table,
    View,
}

impl TableKind {
    /// Parse the `type` column of the tables query (`'table'` / `'view'`)
    pub fn from_catalog(value: &str) -> Self {
        if value.eq_ignore_ascii_case("view") {
            TableKind::View
        } else {
            TableKind::Table
        }
    }
}

/// Table or view element
#[derive(Debug, Clone)]
pub struct TableElement {
    /// Schema name (None means the default schema)
    pub schema: Option<String>,
    pub name: String,
    pub kind: TableKind,
    pub comment: Option<String>,
    pub annotations: Annotations,
    /// Columns in declaration (column_id) order
    pub columns: Vec<ColumnElement>,
    pub primary_key: Option<PrimaryKeyElement>,
    pub unique_constraints: Vec<UniqueConstraintElement>,
    pub indexes: Vec<IndexElement>,
    /// Foreign keys where this table is the dependent side
    pub foreign_keys: Vec<ForeignKeyElement>,
    pub triggers: Vec<TriggerElement>,
}

impl TableElement {
    pub fn new(schema: Option<String>, name: impl Into<String>, kind: TableKind) -> Self {
        Self {
            schema,
            name: name.into(),
            kind,
            comment: None,
            annotations: Annotations::default(),
            columns: Vec::new(),
            primary_key: None,
            unique_constraints: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// `schema.name`, or just `name` when the schema is absent
    pub fn display_name(&self) -> String {
        crate::parser::display_name(self.schema.as_deref(), &self.name)
    }

    /// Find a column by exact name, falling back to a case-insensitive match
    pub fn find_column(&self, name: &str) -> Option<&ColumnElement> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| crate::util::eq_ci(&c.name, name))
            })
    }

    pub fn is_view(&self) -> bool {
        self.kind == TableKind::View
    }
}

/// How the database generates a column's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueGenerated {
    /// Identity columns
    OnAdd,
    /// `rowversion` columns
    OnAddOrUpdate,
}

/// Column element
#[derive(Debug, Clone)]
pub struct ColumnElement {
    pub name: String,
    pub store_type: String,
    pub is_nullable: bool,
    /// Default constraint SQL copied verbatim (e.g. `((0))`)
    pub default_value_sql: Option<String>,
    /// Best-effort typed interpretation of `default_value_sql`
    pub default_value: Option<DefaultValue>,
    pub computed_column_sql: Option<String>,
    /// Whether the computed column is persisted
    pub is_stored: Option<bool>,
    pub value_generated: Option<ValueGenerated>,
    /// Only set when it differs from the database collation
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub annotations: Annotations,
}

/// Primary key element
#[derive(Debug, Clone)]
pub struct PrimaryKeyElement {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub annotations: Annotations,
}

/// Unique constraint element
#[derive(Debug, Clone)]
pub struct UniqueConstraintElement {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub annotations: Annotations,
}

/// Index element
#[derive(Debug, Clone)]
pub struct IndexElement {
    pub name: Option<String>,
    /// Key columns only; INCLUDE columns are not tracked
    pub columns: Vec<String>,
    /// Aligned with `columns`
    pub is_descending: Vec<bool>,
    pub is_unique: bool,
    pub filter: Option<String>,
    pub annotations: Annotations,
}

/// ON DELETE action of a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    /// Convert `delete_referential_action_desc`; unknown values map to `None`
    pub fn from_catalog(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "NO_ACTION" => Some(ReferentialAction::NoAction),
            "CASCADE" => Some(ReferentialAction::Cascade),
            "SET_NULL" => Some(ReferentialAction::SetNull),
            "SET_DEFAULT" => Some(ReferentialAction::SetDefault),
            _ => None,
        }
    }
}

/// Foreign key element, owned by the dependent table
#[derive(Debug, Clone)]
pub struct ForeignKeyElement {
    pub name: Option<String>,
    pub principal_table: TableId,
    /// Dependent columns, positionally paired with `principal_columns`
    pub columns: Vec<String>,
    pub principal_columns: Vec<String>,
    pub on_delete: Option<ReferentialAction>,
}

/// Sequence element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceElement {
    pub schema: Option<String>,
    pub name: String,
    pub store_type: String,
    pub is_cyclic: bool,
    pub increment_by: i32,
    /// None when equal to the type's default lower bound
    pub start_value: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub is_cached: bool,
    pub cache_size: Option<i32>,
}

/// Trigger element (existence marker)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerElement {
    pub name: String,
}
