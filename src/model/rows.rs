//! Typed views of catalog result rows

use crate::catalog::CatalogRow;
use crate::error::ScaffoldError;

/// `(schema, table)` grouping key
pub(crate) type TableKey = (Option<String>, String);

#[derive(Debug, Clone)]
pub(crate) struct TypeAliasRow {
    pub schema_name: Option<String>,
    pub type_name: String,
    pub underlying_system_type: String,
    pub max_length: i32,
    pub precision: i32,
    pub scale: i32,
}

impl TryFrom<&CatalogRow> for TypeAliasRow {
    type Error = ScaffoldError;

    fn try_from(row: &CatalogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            schema_name: row.get_string("schema_name")?,
            type_name: row.required_str("type_name")?.to_string(),
            underlying_system_type: row.required_str("underlying_system_type")?.to_string(),
            max_length: row.get_i32("max_length")?.unwrap_or(0),
            precision: row.get_i32("precision")?.unwrap_or(0),
            scale: row.get_i32("scale")?.unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SequenceRow {
    pub schema: Option<String>,
    pub name: String,
    pub type_schema: Option<String>,
    pub type_name: String,
    pub precision: i32,
    pub scale: i32,
    pub is_cycling: bool,
    pub increment: i32,
    pub start_value: Option<i64>,
    pub minimum_value: Option<i64>,
    pub maximum_value: Option<i64>,
    pub is_cached: bool,
    pub cache_size: Option<i32>,
}

impl TryFrom<&CatalogRow> for SequenceRow {
    type Error = ScaffoldError;

    fn try_from(row: &CatalogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            schema: row.get_string("schema")?,
            name: row.required_str("name")?.to_string(),
            type_schema: row.get_string("type_schema")?,
            type_name: row.required_str("type_name")?.to_string(),
            precision: row.get_i32("precision")?.unwrap_or(0),
            scale: row.get_i32("scale")?.unwrap_or(0),
            is_cycling: row.get_bool("is_cycling")?.unwrap_or(false),
            increment: row.required_i32("increment")?,
            start_value: row.get_i64("start_value")?,
            minimum_value: row.get_i64("minimum_value")?,
            maximum_value: row.get_i64("maximum_value")?,
            is_cached: row.get_bool("is_cached")?.unwrap_or(false),
            cache_size: row.get_i32("cache_size")?,
        })
    }
}

/// Row of the tables/views query; the optional columns are only read
/// when the matching capability put them in the query.
#[derive(Debug, Clone)]
pub(crate) struct TableRow {
    pub schema: Option<String>,
    pub name: String,
    pub comment: Option<String>,
    pub kind: String,
    pub is_memory_optimized: bool,
    pub temporal_type: Option<i32>,
    pub history_table_name: Option<String>,
    pub history_table_schema: Option<String>,
    pub period_start_column: Option<String>,
    pub period_end_column: Option<String>,
}

impl TableRow {
    pub fn read(
        row: &CatalogRow,
        memory_optimized: bool,
        temporal: bool,
    ) -> Result<Self, ScaffoldError> {
        let mut table = Self {
            schema: row.get_string("schema")?,
            name: row.required_str("name")?.to_string(),
            comment: row.get_string("comment")?,
            kind: row.required_str("type")?.to_string(),
            is_memory_optimized: false,
            temporal_type: None,
            history_table_name: None,
            history_table_schema: None,
            period_start_column: None,
            period_end_column: None,
        };
        if memory_optimized {
            table.is_memory_optimized = row.get_bool("is_memory_optimized")?.unwrap_or(false);
        }
        if temporal {
            table.temporal_type = row.get_i32("temporal_type")?;
            table.history_table_name = row.get_string("history_table_name")?;
            table.history_table_schema = row.get_string("history_table_schema")?;
            table.period_start_column = row.get_string("period_start_column")?;
            table.period_end_column = row.get_string("period_end_column")?;
        }
        Ok(table)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ColumnRow {
    pub table_schema: Option<String>,
    pub table_name: String,
    pub column_name: String,
    pub ordinal: i32,
    pub type_schema: Option<String>,
    pub type_name: Option<String>,
    pub max_length: i32,
    pub precision: i32,
    pub scale: i32,
    pub is_nullable: bool,
    pub is_identity: bool,
    pub default_sql: Option<String>,
    pub computed_sql: Option<String>,
    pub computed_is_persisted: Option<bool>,
    pub comment: Option<String>,
    pub collation_name: Option<String>,
    pub is_sparse: bool,
}

impl ColumnRow {
    pub fn table_key(&self) -> TableKey {
        (self.table_schema.clone(), self.table_name.clone())
    }
}

impl TryFrom<&CatalogRow> for ColumnRow {
    type Error = ScaffoldError;

    fn try_from(row: &CatalogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            table_schema: row.get_string("table_schema")?,
            table_name: row.required_str("table_name")?.to_string(),
            column_name: row.required_str("column_name")?.to_string(),
            ordinal: row.get_i32("ordinal")?.unwrap_or(0),
            type_schema: row.get_string("type_schema")?,
            type_name: row.get_string("type_name")?,
            max_length: row.get_i32("max_length")?.unwrap_or(0),
            precision: row.get_i32("precision")?.unwrap_or(0),
            scale: row.get_i32("scale")?.unwrap_or(0),
            is_nullable: row.get_bool("is_nullable")?.unwrap_or(true),
            is_identity: row.get_bool("is_identity")?.unwrap_or(false),
            default_sql: row.get_string("default_sql")?,
            computed_sql: row.get_string("computed_sql")?,
            computed_is_persisted: row.get_bool("computed_is_persisted")?,
            comment: row.get_string("comment")?,
            collation_name: row.get_string("collation_name")?,
            is_sparse: row.get_bool("is_sparse")?.unwrap_or(false),
        })
    }
}

/// Everything that identifies one index within its table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct IndexKey {
    pub name: Option<String>,
    pub type_desc: String,
    pub is_primary_key: bool,
    pub is_unique_constraint: bool,
    pub is_unique: bool,
    pub has_filter: bool,
    pub filter_definition: Option<String>,
    pub fill_factor: i32,
}

#[derive(Debug, Clone)]
pub(crate) struct IndexRow {
    pub table_schema: Option<String>,
    pub table_name: String,
    pub index: IndexKey,
    pub column_name: Option<String>,
    pub is_descending_key: bool,
    pub is_included_column: bool,
}

impl IndexRow {
    pub fn table_key(&self) -> TableKey {
        (self.table_schema.clone(), self.table_name.clone())
    }
}

impl TryFrom<&CatalogRow> for IndexRow {
    type Error = ScaffoldError;

    fn try_from(row: &CatalogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            table_schema: row.get_string("table_schema")?,
            table_name: row.required_str("table_name")?.to_string(),
            index: IndexKey {
                name: row.get_string("index_name")?,
                type_desc: row.get_string("type_desc")?.unwrap_or_default(),
                is_primary_key: row.get_bool("is_primary_key")?.unwrap_or(false),
                is_unique_constraint: row.get_bool("is_unique_constraint")?.unwrap_or(false),
                is_unique: row.get_bool("is_unique")?.unwrap_or(false),
                has_filter: row.get_bool("has_filter")?.unwrap_or(false),
                filter_definition: row.get_string("filter_definition")?,
                fill_factor: row.get_i32("fill_factor")?.unwrap_or(0),
            },
            column_name: row.get_string("column_name")?,
            is_descending_key: row.get_bool("is_descending_key")?.unwrap_or(false),
            is_included_column: row.get_bool("is_included_column")?.unwrap_or(false),
        })
    }
}

/// Everything that identifies one foreign key within its table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ForeignKeyKey {
    pub name: Option<String>,
    pub principal_table_schema: Option<String>,
    pub principal_table_name: String,
    pub delete_referential_action_desc: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ForeignKeyRow {
    pub table_schema: Option<String>,
    pub table_name: String,
    pub foreign_key: ForeignKeyKey,
    pub column_name: Option<String>,
    pub referenced_column_name: Option<String>,
}

impl ForeignKeyRow {
    pub fn table_key(&self) -> TableKey {
        (self.table_schema.clone(), self.table_name.clone())
    }
}

impl TryFrom<&CatalogRow> for ForeignKeyRow {
    type Error = ScaffoldError;

    fn try_from(row: &CatalogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            table_schema: row.get_string("table_schema")?,
            table_name: row.required_str("table_name")?.to_string(),
            foreign_key: ForeignKeyKey {
                name: row.get_string("name")?,
                principal_table_schema: row.get_string("principal_table_schema")?,
                principal_table_name: row.required_str("principal_table_name")?.to_string(),
                delete_referential_action_desc: row
                    .get_string("delete_referential_action_desc")?,
            },
            column_name: row.get_string("column_name")?,
            referenced_column_name: row.get_string("referenced_column_name")?,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TriggerRow {
    pub table_schema: Option<String>,
    pub table_name: String,
    pub trigger_name: String,
}

impl TryFrom<&CatalogRow> for TriggerRow {
    type Error = ScaffoldError;

    fn try_from(row: &CatalogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            table_schema: row.get_string("table_schema")?,
            table_name: row.required_str("table_name")?.to_string(),
            trigger_name: row.required_str("trigger_name")?.to_string(),
        })
    }
}

/// Convert every row, failing on the first malformed one
pub(crate) fn read_rows<'a, T>(rows: &'a [CatalogRow]) -> Result<Vec<T>, ScaffoldError>
where
    T: TryFrom<&'a CatalogRow, Error = ScaffoldError>,
{
    rows.iter().map(T::try_from).collect()
}
