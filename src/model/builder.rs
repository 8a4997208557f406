//! Assemble a database model from the SQL Server catalog
//!
//! A scaffold run is a fixed pipeline over one connection: probe the server,
//! read database-level facts, load type aliases, then sequences, tables,
//! columns, indexes, foreign keys and triggers, and finally report any
//! requested schema or table that matched nothing. Each stage only issues
//! the queries the server's capabilities allow.
//!
//! Catalog data problems never abort a run. An object that cannot be built
//! consistently (a column without a type, a key over an unknown column, a
//! foreign key to an unselected table) is reported through [`Diagnostics`]
//! and skipped.

use std::collections::HashMap;

use crate::catalog::{
    detect_capabilities, CatalogConnection, CatalogFilter, CatalogQueries, CatalogRow,
    ConnectionScope, ServerCapabilities, SqlValue, COLLATION_QUERY, DATABASE_NAME_QUERY,
    DEFAULT_SCHEMA_QUERY,
};
use crate::diagnostics::{Diagnostics, ScaffoldEvent};
use crate::error::ScaffoldError;
use crate::parser::{
    display_name, store_type, try_parse_clr_default, SqlServerTypeMappingSource, TypeMappingSource,
};
use crate::util::{eq_ci, group_by};

use super::rows::{
    read_rows, ColumnRow, ForeignKeyKey, ForeignKeyRow, IndexKey, IndexRow, SequenceRow,
    TableRow, TriggerRow, TypeAliasRow,
};
use super::{
    annotations, AnnotationValue, Annotations, ColumnElement, DatabaseModel, ForeignKeyElement,
    IndexElement, PrimaryKeyElement, ReferentialAction, SequenceElement, TableElement, TableId,
    TableKind, TriggerElement, UniqueConstraintElement, ValueGenerated,
};

/// Which part of the database to scaffold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldOptions {
    /// Schema names; empty means no schema restriction
    pub schemas: Vec<String>,
    /// Table filters (`Orders`, `dbo.Orders`, `[dbo].[Order Lines]`)
    pub tables: Vec<String>,
}

impl ScaffoldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schemas.push(schema.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.tables.push(table.into());
        self
    }
}

/// Lower/upper bound SQL Server assigns a sequence of the given type
/// when MINVALUE/MAXVALUE are not specified
fn default_sequence_bounds(store_type: &str) -> Option<(i64, i64)> {
    match store_type {
        "tinyint" => Some((0, 255)),
        "smallint" => Some((i16::MIN.into(), i16::MAX.into())),
        "int" => Some((i32::MIN.into(), i32::MAX.into())),
        "bigint" => Some((i64::MIN, i64::MAX)),
        _ => None,
    }
}

/// Builds a [`DatabaseModel`] from a live catalog
#[derive(Debug, Clone, Default)]
pub struct DatabaseModelFactory<M = SqlServerTypeMappingSource> {
    type_mapping: M,
}

impl DatabaseModelFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: TypeMappingSource> DatabaseModelFactory<M> {
    pub fn with_type_mapping(type_mapping: M) -> Self {
        Self { type_mapping }
    }

    /// Scaffold the selected part of the database behind `connection`.
    ///
    /// The connection is opened for the duration of the run if it is not
    /// already open, and closed again afterwards (also on error). Table
    /// filters are validated before the connection is touched.
    pub fn create<C, D>(
        &self,
        connection: &mut C,
        options: &ScaffoldOptions,
        diagnostics: &mut D,
    ) -> Result<DatabaseModel, ScaffoldError>
    where
        C: CatalogConnection + ?Sized,
        D: Diagnostics + ?Sized,
    {
        let filter = CatalogFilter::new(&options.schemas, &options.tables)?;

        let mut connection = ConnectionScope::new(connection)?;
        let capabilities = detect_capabilities(&mut *connection, &mut *diagnostics)?;

        let mut run = ScaffoldRun {
            connection: &mut *connection,
            diagnostics,
            type_mapping: &self.type_mapping,
            filter: &filter,
            capabilities,
            database_collation: None,
            type_aliases: HashMap::new(),
        };
        let model = run.execute()?;
        Ok(model)
    }
}

/// Scaffold with the built-in SQL Server type mappings
pub fn build_model<C, D>(
    connection: &mut C,
    options: &ScaffoldOptions,
    diagnostics: &mut D,
) -> Result<DatabaseModel, ScaffoldError>
where
    C: CatalogConnection + ?Sized,
    D: Diagnostics + ?Sized,
{
    DatabaseModelFactory::new().create(connection, options, diagnostics)
}

/// State of one scaffold run; nothing here outlives the run
struct ScaffoldRun<'a, C: ?Sized, D: ?Sized> {
    connection: &'a mut C,
    diagnostics: &'a mut D,
    type_mapping: &'a dyn TypeMappingSource,
    filter: &'a CatalogFilter,
    capabilities: ServerCapabilities,
    database_collation: Option<String>,
    /// `[schema].[name]` -> (store type, underlying system type)
    type_aliases: HashMap<String, (String, String)>,
}

impl<C, D> ScaffoldRun<'_, C, D>
where
    C: CatalogConnection + ?Sized,
    D: Diagnostics + ?Sized,
{
    fn execute(&mut self) -> Result<DatabaseModel, ScaffoldError> {
        let mut model = DatabaseModel::new();
        model.database_name = self.scalar_string(DATABASE_NAME_QUERY)?;
        model.default_schema = self.default_schema()?;
        model.collation = self.collation()?;

        self.type_aliases = self.load_type_aliases()?;

        if self.capabilities.supports_sequences() {
            model.sequences = self.sequences()?;
        }

        self.tables(&mut model)?;
        self.columns(&mut model)?;

        if self.capabilities.supports_indexes() {
            self.indexes(&mut model)?;
        }

        self.foreign_keys(&mut model)?;

        if self.capabilities.supports_triggers() {
            self.triggers(&mut model)?;
        }

        self.report_unmatched_selections(&model);

        tracing::info!(
            tables = model.tables.iter().filter(|t| !t.is_view()).count(),
            views = model.tables.iter().filter(|t| t.is_view()).count(),
            sequences = model.sequences.len(),
            "scaffolded database model"
        );
        Ok(model)
    }

    fn queries(&self) -> CatalogQueries<'_> {
        CatalogQueries::new(&self.capabilities, self.filter)
    }

    fn emit(&mut self, event: ScaffoldEvent) {
        self.diagnostics.emit(event);
    }

    fn query(&mut self, sql: &str) -> Result<Vec<CatalogRow>, ScaffoldError> {
        tracing::debug!(sql, "running catalog query");
        self.connection.query(sql)
    }

    fn scalar_string(&mut self, sql: &str) -> Result<Option<String>, ScaffoldError> {
        tracing::debug!(sql, "running catalog query");
        Ok(match self.connection.query_scalar(sql)? {
            SqlValue::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
    }

    fn default_schema(&mut self) -> Result<Option<String>, ScaffoldError> {
        let schema = self.scalar_string(DEFAULT_SCHEMA_QUERY)?;
        if let Some(schema) = &schema {
            self.emit(ScaffoldEvent::DefaultSchemaFound {
                schema: schema.clone(),
            });
        }
        Ok(schema)
    }

    /// Database collation, kept on the model only when it differs from the
    /// server's. Column collations are compared against it later.
    fn collation(&mut self) -> Result<Option<String>, ScaffoldError> {
        let rows = self.query(COLLATION_QUERY)?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let server = row.get_string("server_collation")?;
        let database = row.get_string("database_collation")?;
        self.database_collation = database.clone();
        Ok(if database != server { database } else { None })
    }

    fn load_type_aliases(&mut self) -> Result<HashMap<String, (String, String)>, ScaffoldError> {
        let sql = self.queries().type_aliases().build();
        let rows = self.query(&sql)?;

        let mut aliases = HashMap::new();
        for alias in read_rows::<TypeAliasRow>(&rows)? {
            let resolved = store_type(
                &alias.underlying_system_type,
                alias.max_length,
                alias.precision,
                alias.scale,
            );
            self.emit(ScaffoldEvent::TypeAliasFound {
                alias: display_name(alias.schema_name.as_deref(), &alias.type_name),
                store_type: resolved.clone(),
            });
            aliases.insert(
                alias_key(alias.schema_name.as_deref(), &alias.type_name),
                (resolved, alias.underlying_system_type),
            );
        }
        Ok(aliases)
    }

    /// (store type, system type) of a column or sequence type
    fn resolve_type(
        &self,
        type_schema: Option<&str>,
        type_name: &str,
        max_length: i32,
        precision: i32,
        scale: i32,
    ) -> (String, String) {
        match self.type_aliases.get(&alias_key(type_schema, type_name)) {
            Some((store, system)) => (store.clone(), system.clone()),
            None => (
                store_type(type_name, max_length, precision, scale),
                type_name.to_string(),
            ),
        }
    }

    fn sequences(&mut self) -> Result<Vec<SequenceElement>, ScaffoldError> {
        let sql = self.queries().sequences().build();
        let rows = self.query(&sql)?;

        let mut sequences = Vec::new();
        for row in read_rows::<SequenceRow>(&rows)? {
            let system_type = match self
                .type_aliases
                .get(&alias_key(row.type_schema.as_deref(), &row.type_name))
            {
                Some((_, system)) => system.clone(),
                None => row.type_name.clone(),
            };
            let resolved = store_type(&system_type, 0, row.precision, row.scale);

            let mut start_value = row.start_value;
            let mut min_value = row.minimum_value;
            let mut max_value = row.maximum_value;
            if let Some((lower, upper)) = default_sequence_bounds(&resolved) {
                if min_value == Some(lower) {
                    min_value = None;
                }
                if start_value == Some(lower) {
                    start_value = None;
                }
                if max_value == Some(upper) {
                    max_value = None;
                }
            }

            self.emit(ScaffoldEvent::SequenceFound {
                name: display_name(row.schema.as_deref(), &row.name),
                store_type: resolved.clone(),
                is_cyclic: row.is_cycling,
                increment_by: row.increment,
                start_value,
                min_value,
                max_value,
            });

            sequences.push(SequenceElement {
                schema: row.schema,
                name: row.name,
                store_type: resolved,
                is_cyclic: row.is_cycling,
                increment_by: row.increment,
                start_value,
                min_value,
                max_value,
                is_cached: row.is_cached,
                cache_size: row.cache_size,
            });
        }
        Ok(sequences)
    }

    fn tables(&mut self, model: &mut DatabaseModel) -> Result<(), ScaffoldError> {
        let sql = self.queries().tables().build();
        let rows = self.query(&sql)?;
        let memory_optimized = self.capabilities.supports_memory_optimized();
        let temporal = self.capabilities.supports_temporal();

        for row in &rows {
            let row = TableRow::read(row, memory_optimized, temporal)?;
            let mut table = TableElement::new(row.schema, row.name, TableKind::from_catalog(&row.kind));
            table.comment = row.comment;

            if row.is_memory_optimized {
                table
                    .annotations
                    .set(annotations::MEMORY_OPTIMIZED, AnnotationValue::Bool(true));
            }

            if row.temporal_type == Some(2) {
                let bag = &mut table.annotations;
                bag.set(annotations::IS_TEMPORAL, AnnotationValue::Bool(true));
                let facts = [
                    (annotations::TEMPORAL_HISTORY_TABLE_NAME, row.history_table_name),
                    (annotations::TEMPORAL_HISTORY_TABLE_SCHEMA, row.history_table_schema),
                    (annotations::TEMPORAL_PERIOD_START_COLUMN_NAME, row.period_start_column),
                    (annotations::TEMPORAL_PERIOD_END_COLUMN_NAME, row.period_end_column),
                ];
                for (name, value) in facts {
                    if let Some(value) = value {
                        bag.set(name, AnnotationValue::String(value));
                    }
                }
            }

            let name = table.display_name();
            let event = if table.is_view() {
                ScaffoldEvent::ViewFound { name }
            } else {
                ScaffoldEvent::TableFound { name }
            };
            self.emit(event);
            model.add_table(table);
        }
        Ok(())
    }

    fn columns(&mut self, model: &mut DatabaseModel) -> Result<(), ScaffoldError> {
        let sql = self.queries().columns().build();
        let rows = self.query(&sql)?;
        let rows = read_rows::<ColumnRow>(&rows)?;

        for ((schema, name), mut group) in group_by(rows, ColumnRow::table_key) {
            let Some(id) = model.find_table(schema.as_deref(), &name) else {
                continue;
            };
            let table_name = model.table(id).display_name();
            group.sort_by_key(|c| c.ordinal);

            for row in group {
                if let Some(column) = self.column(&table_name, row) {
                    model.table_mut(id).columns.push(column);
                }
            }
        }
        Ok(())
    }

    fn column(&mut self, table_name: &str, row: ColumnRow) -> Option<ColumnElement> {
        let Some(type_name) = row.type_name.as_deref() else {
            self.emit(ScaffoldEvent::ColumnWithoutType {
                table: table_name.to_string(),
                column: row.column_name,
            });
            return None;
        };

        let (store_type, system_type) = self.resolve_type(
            row.type_schema.as_deref(),
            type_name,
            row.max_length,
            row.precision,
            row.scale,
        );

        let default_value = row.default_sql.as_deref().and_then(|sql| {
            self.type_mapping
                .find_mapping(&system_type)
                .and_then(|clr_type| try_parse_clr_default(clr_type, sql))
        });

        let value_generated = if row.is_identity {
            Some(ValueGenerated::OnAdd)
        } else if store_type == "rowversion" {
            Some(ValueGenerated::OnAddOrUpdate)
        } else {
            None
        };

        let mut bag = Annotations::default();
        if store_type == "rowversion" {
            bag.set(annotations::CONCURRENCY_TOKEN, AnnotationValue::Bool(true));
        }
        if row.is_sparse {
            bag.set(annotations::SPARSE, AnnotationValue::Bool(true));
        }

        let collation = match row.collation_name {
            Some(c) if Some(&c) != self.database_collation.as_ref() => Some(c),
            _ => None,
        };

        self.emit(ScaffoldEvent::ColumnFound {
            table: table_name.to_string(),
            column: row.column_name.clone(),
            ordinal: row.ordinal,
            store_type: store_type.clone(),
            is_nullable: row.is_nullable,
            is_identity: row.is_identity,
            default_value_sql: row.default_sql.clone(),
            computed_column_sql: row.computed_sql.clone(),
        });

        let is_stored = row
            .computed_sql
            .as_ref()
            .map(|_| row.computed_is_persisted.unwrap_or(false));

        Some(ColumnElement {
            name: row.column_name,
            store_type,
            is_nullable: row.is_nullable,
            default_value_sql: row.default_sql,
            default_value,
            computed_column_sql: row.computed_sql,
            is_stored,
            value_generated,
            collation,
            comment: row.comment,
            annotations: bag,
        })
    }

    fn indexes(&mut self, model: &mut DatabaseModel) -> Result<(), ScaffoldError> {
        let sql = self.queries().indexes().build();
        let rows = self.query(&sql)?;
        let rows = read_rows::<IndexRow>(&rows)?;

        for ((schema, name), rows) in group_by(rows, IndexRow::table_key) {
            let Some(id) = model.find_table(schema.as_deref(), &name) else {
                continue;
            };
            let groups = group_by(rows, |r: &IndexRow| r.index.clone());
            self.table_indexes(model, id, groups);
        }
        Ok(())
    }

    fn table_indexes(
        &mut self,
        model: &mut DatabaseModel,
        id: TableId,
        groups: Vec<(IndexKey, Vec<IndexRow>)>,
    ) {
        let table_name = model.table(id).display_name();

        let primary_keys: Vec<_> = groups.iter().filter(|(k, _)| k.is_primary_key).collect();
        debug_assert!(
            primary_keys.len() <= 1,
            "table {} reports more than one primary key",
            table_name
        );
        if let [(key, rows)] = primary_keys.as_slice() {
            if let Some((columns, _)) = key_columns(model.table(id), rows) {
                let mut bag = Annotations::default();
                if key.type_desc == "NONCLUSTERED" {
                    bag.set(annotations::CLUSTERED, AnnotationValue::Bool(false));
                }
                set_fill_factor(&mut bag, key.fill_factor);

                self.emit(ScaffoldEvent::PrimaryKeyFound {
                    name: key.name.clone().unwrap_or_default(),
                    table: table_name.clone(),
                });
                model.table_mut(id).primary_key = Some(PrimaryKeyElement {
                    name: key.name.clone(),
                    columns,
                    annotations: bag,
                });
            }
        }

        for (key, rows) in groups.iter().filter(|(k, _)| k.is_unique_constraint) {
            let Some((columns, _)) = key_columns(model.table(id), rows) else {
                continue;
            };
            self.emit(ScaffoldEvent::UniqueConstraintFound {
                name: key.name.clone().unwrap_or_default(),
                table: table_name.clone(),
            });
            model
                .table_mut(id)
                .unique_constraints
                .push(UniqueConstraintElement {
                    name: key.name.clone(),
                    columns,
                    annotations: clustered_annotations(key),
                });
        }

        for (key, rows) in groups
            .iter()
            .filter(|(k, _)| !k.is_primary_key && !k.is_unique_constraint)
        {
            let Some((columns, is_descending)) = key_columns(model.table(id), rows) else {
                continue;
            };
            self.emit(ScaffoldEvent::IndexFound {
                name: key.name.clone().unwrap_or_default(),
                table: table_name.clone(),
                is_unique: key.is_unique,
            });
            model.table_mut(id).indexes.push(IndexElement {
                name: key.name.clone(),
                columns,
                is_descending,
                is_unique: key.is_unique,
                filter: if key.has_filter {
                    key.filter_definition.clone()
                } else {
                    None
                },
                annotations: clustered_annotations(key),
            });
        }
    }

    fn foreign_keys(&mut self, model: &mut DatabaseModel) -> Result<(), ScaffoldError> {
        let sql = self.queries().foreign_keys().build();
        let rows = self.query(&sql)?;
        let rows = read_rows::<ForeignKeyRow>(&rows)?;

        for ((schema, name), rows) in group_by(rows, ForeignKeyRow::table_key) {
            let Some(id) = model.find_table(schema.as_deref(), &name) else {
                continue;
            };
            for (key, rows) in group_by(rows, |r: &ForeignKeyRow| r.foreign_key.clone()) {
                if let Some(foreign_key) = self.foreign_key(model, id, &key, &rows) {
                    model.table_mut(id).foreign_keys.push(foreign_key);
                }
            }
        }
        Ok(())
    }

    fn foreign_key(
        &mut self,
        model: &DatabaseModel,
        id: TableId,
        key: &ForeignKeyKey,
        rows: &[ForeignKeyRow],
    ) -> Option<ForeignKeyElement> {
        let dependent = model.table(id);
        let table_name = dependent.display_name();
        let fk_name = key.name.clone().unwrap_or_default();
        let principal_name =
            display_name(key.principal_table_schema.as_deref(), &key.principal_table_name);

        let Some(principal_id) = model.find_table(
            key.principal_table_schema.as_deref(),
            &key.principal_table_name,
        ) else {
            self.emit(ScaffoldEvent::PrincipalTableNotInSelectionSet {
                foreign_key: fk_name,
                table: table_name,
                principal_table: principal_name,
            });
            return None;
        };
        let principal = model.table(principal_id);

        let mut columns = Vec::with_capacity(rows.len());
        let mut principal_columns = Vec::with_capacity(rows.len());
        for row in rows {
            let column_name = row.column_name.as_deref().unwrap_or_default();
            let Some(column) = dependent.find_column(column_name) else {
                self.emit(ScaffoldEvent::ForeignKeyColumnNotFound {
                    foreign_key: fk_name,
                    table: table_name,
                    column: column_name.to_string(),
                });
                return None;
            };

            let principal_column_name = row.referenced_column_name.as_deref().unwrap_or_default();
            let Some(principal_column) = principal.find_column(principal_column_name) else {
                self.emit(ScaffoldEvent::PrincipalColumnNotFound {
                    foreign_key: fk_name,
                    table: table_name,
                    principal_column: principal_column_name.to_string(),
                    principal_table: principal_name,
                });
                return None;
            };

            columns.push(column.name.clone());
            principal_columns.push(principal_column.name.clone());
        }

        if principal_id == id && columns == principal_columns {
            self.emit(ScaffoldEvent::ReflexiveConstraintIgnored {
                foreign_key: fk_name,
                table: table_name,
            });
            return None;
        }

        if let Some(existing) = dependent.foreign_keys.iter().find(|fk| {
            fk.principal_table == principal_id
                && fk.columns == columns
                && fk.principal_columns == principal_columns
        }) {
            self.emit(ScaffoldEvent::DuplicateForeignKeyIgnored {
                foreign_key: fk_name,
                table: table_name,
                duplicate_of: existing.name.clone().unwrap_or_default(),
            });
            return None;
        }

        let on_delete = key
            .delete_referential_action_desc
            .as_deref()
            .and_then(ReferentialAction::from_catalog);

        self.emit(ScaffoldEvent::ForeignKeyFound {
            name: fk_name,
            table: table_name,
            principal_table: principal.display_name(),
            on_delete,
        });

        Some(ForeignKeyElement {
            name: key.name.clone(),
            principal_table: principal_id,
            columns,
            principal_columns,
            on_delete,
        })
    }

    fn triggers(&mut self, model: &mut DatabaseModel) -> Result<(), ScaffoldError> {
        let sql = self.queries().triggers().build();
        let rows = self.query(&sql)?;

        for row in read_rows::<TriggerRow>(&rows)? {
            let Some(id) = model.find_table(row.table_schema.as_deref(), &row.table_name) else {
                continue;
            };
            let table = model.table_mut(id);
            table.triggers.push(TriggerElement {
                name: row.trigger_name.clone(),
            });
            let table_name = table.display_name();
            self.emit(ScaffoldEvent::TriggerFound {
                name: row.trigger_name,
                table: table_name,
            });
        }
        Ok(())
    }

    /// Warn about requested schemas and tables that matched nothing
    fn report_unmatched_selections(&mut self, model: &DatabaseModel) {
        let filter = self.filter;

        for schema in filter.distinct_schemas() {
            let found = model
                .sequences
                .iter()
                .filter_map(|s| s.schema.as_deref())
                .chain(model.tables.iter().filter_map(|t| t.schema.as_deref()))
                .any(|s| eq_ci(s, schema));
            if !found {
                self.emit(ScaffoldEvent::MissingSchema {
                    schema: schema.to_string(),
                });
            }
        }

        for selection in filter.tables() {
            let wanted = &selection.name;
            // A schema-qualified selection is satisfied by any table in that
            // schema, or by any table with the requested name.
            let found = model.tables.iter().any(|t| {
                (wanted.schema.is_some() && t.schema == wanted.schema) || t.name == wanted.table
            });
            if !found {
                self.emit(ScaffoldEvent::MissingTable {
                    table: selection.raw.clone(),
                });
            }
        }
    }
}

fn alias_key(schema: Option<&str>, name: &str) -> String {
    format!("[{}].[{}]", schema.unwrap_or_default(), name)
}

/// Resolve the key columns of an index group (INCLUDE columns are skipped).
/// `None` when any key column is unknown or there are no key columns.
fn key_columns(table: &TableElement, rows: &[IndexRow]) -> Option<(Vec<String>, Vec<bool>)> {
    let mut columns = Vec::new();
    let mut is_descending = Vec::new();
    for row in rows.iter().filter(|r| !r.is_included_column) {
        let column = table.find_column(row.column_name.as_deref()?)?;
        columns.push(column.name.clone());
        is_descending.push(row.is_descending_key);
    }
    (!columns.is_empty()).then_some((columns, is_descending))
}

fn set_fill_factor(bag: &mut Annotations, fill_factor: i32) {
    if (1..=100).contains(&fill_factor) {
        bag.set(
            annotations::FILL_FACTOR,
            AnnotationValue::Int(fill_factor.into()),
        );
    }
}

/// Unique constraints and indexes are nonclustered unless stated otherwise
fn clustered_annotations(key: &IndexKey) -> Annotations {
    let mut bag = Annotations::default();
    if key.type_desc == "CLUSTERED" {
        bag.set(annotations::CLUSTERED, AnnotationValue::Bool(true));
    }
    set_fill_factor(&mut bag, key.fill_factor);
    bag
}
