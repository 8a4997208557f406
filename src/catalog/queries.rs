//! Catalog query text
//!
//! Queries are assembled from named fragments so optional pieces (temporal
//! columns, view unions, selection predicates) are switched on and off per
//! capability instead of being spliced with ad hoc string edits.

use super::capabilities::ServerCapabilities;
use super::filter::CatalogFilter;

pub const DATABASE_NAME_QUERY: &str = "SELECT DB_NAME();";

pub const DEFAULT_SCHEMA_QUERY: &str = "SELECT SCHEMA_NAME();";

pub const COLLATION_QUERY: &str = "SELECT CAST(SERVERPROPERTY('Collation') AS nvarchar(128)) AS [server_collation], [collation_name] AS [database_collation]
FROM [sys].[databases]
WHERE [name] = DB_NAME();";

/// Ordered list of named SQL fragments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    fragments: Vec<(&'static str, String)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, name: &'static str, sql: impl Into<String>) -> Self {
        self.fragments.push((name, sql.into()));
        self
    }

    pub fn push_if(self, enabled: bool, name: &'static str, sql: impl Into<String>) -> Self {
        if enabled {
            self.push(name, sql)
        } else {
            self
        }
    }

    pub fn push_opt(self, name: &'static str, sql: Option<String>) -> Self {
        match sql {
            Some(sql) => self.push(name, sql),
            None => self,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fragments.iter().any(|(n, _)| *n == name)
    }

    pub fn fragment_names(&self) -> Vec<&'static str> {
        self.fragments.iter().map(|(n, _)| *n).collect()
    }

    pub fn build(&self) -> String {
        let mut sql = self
            .fragments
            .iter()
            .map(|(_, s)| s.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        sql.push(';');
        sql
    }
}

/// Catalog queries for one scaffold run
pub struct CatalogQueries<'a> {
    capabilities: &'a ServerCapabilities,
    filter: &'a CatalogFilter,
}

impl<'a> CatalogQueries<'a> {
    pub fn new(capabilities: &'a ServerCapabilities, filter: &'a CatalogFilter) -> Self {
        Self {
            capabilities,
            filter,
        }
    }

    /// `WHERE`/`AND` continuation for the selection predicate
    fn and_table_filter(&self, schema_expr: &str, table_expr: &str) -> Option<String> {
        self.filter
            .table_filter(schema_expr, table_expr)
            .map(|f| format!("AND {}", f))
    }

    pub fn type_aliases(&self) -> QueryBuilder {
        QueryBuilder::new().push(
            "select",
            "SELECT
    SCHEMA_NAME([t].[schema_id]) AS [schema_name],
    [t].[name] AS [type_name],
    [t2].[name] AS [underlying_system_type],
    CAST([t].[max_length] AS int) AS [max_length],
    CAST([t].[precision] AS int) AS [precision],
    CAST([t].[scale] AS int) AS [scale]
FROM [sys].[types] AS [t]
JOIN [sys].[types] AS [t2] ON [t].[system_type_id] = [t2].[user_type_id]
WHERE [t].[is_user_defined] = 1 OR [t].[system_type_id] <> [t].[user_type_id]",
        )
    }

    pub fn sequences(&self) -> QueryBuilder {
        QueryBuilder::new()
            .push(
                "select",
                format!(
                    "SELECT
    OBJECT_SCHEMA_NAME([s].[object_id]) AS [schema],
    [s].[name],
    SCHEMA_NAME([t].[schema_id]) AS [type_schema],
    TYPE_NAME([s].[user_type_id]) AS [type_name],
    CAST([s].[precision] AS int) AS [precision],
    CAST([s].[scale] AS int) AS [scale],
    [s].[is_cycling],
    CAST([s].[increment] AS int) AS [increment],
    {} AS [start_value],
    {} AS [minimum_value],
    {} AS [maximum_value],
    [s].[is_cached],
    [s].[cache_size]
FROM [sys].[sequences] AS [s]
JOIN [sys].[types] AS [t] ON [s].[user_type_id] = [t].[user_type_id]",
                    clamped_bigint("[s].[start_value]"),
                    clamped_bigint("[s].[minimum_value]"),
                    clamped_bigint("[s].[maximum_value]"),
                ),
            )
            .push_opt(
                "schema_filter",
                self.filter
                    .schema_filter("OBJECT_SCHEMA_NAME([s].[object_id])")
                    .map(|f| format!("WHERE {}", f)),
            )
    }

    pub fn tables(&self) -> QueryBuilder {
        let caps = self.capabilities;
        let table_filter = self.and_table_filter("SCHEMA_NAME([t].[schema_id])", "[t].[name]");
        let view_filter = self.and_table_filter("SCHEMA_NAME([v].[schema_id])", "[v].[name]");

        QueryBuilder::new()
            .push(
                "select_tables",
                "SELECT
    SCHEMA_NAME([t].[schema_id]) AS [schema],
    [t].[name],
    CAST([e].[value] AS nvarchar(MAX)) AS [comment],
    'table' AS [type]",
            )
            .push_if(
                caps.supports_memory_optimized(),
                "memory_optimized_column",
                ",
    [t].[is_memory_optimized]",
            )
            .push_if(
                caps.supports_temporal(),
                "temporal_columns",
                ",
    [t].[temporal_type],
    (SELECT [t2].[name] FROM [sys].[tables] AS [t2] WHERE [t2].[object_id] = [t].[history_table_id]) AS [history_table_name],
    (SELECT SCHEMA_NAME([t2].[schema_id]) FROM [sys].[tables] AS [t2] WHERE [t2].[object_id] = [t].[history_table_id]) AS [history_table_schema],
    (SELECT [c].[name] FROM [sys].[columns] AS [c] WHERE [c].[object_id] = [t].[object_id] AND [c].[generated_always_type] = 1) AS [period_start_column],
    (SELECT [c].[name] FROM [sys].[columns] AS [c] WHERE [c].[object_id] = [t].[object_id] AND [c].[generated_always_type] = 2) AS [period_end_column]",
            )
            .push(
                "from_tables",
                "FROM [sys].[tables] AS [t]
LEFT JOIN [sys].[extended_properties] AS [e] ON [e].[major_id] = [t].[object_id] AND [e].[minor_id] = 0 AND [e].[class] = 1 AND [e].[name] = 'MS_Description'
WHERE [t].[is_ms_shipped] = 0
AND NOT EXISTS (SELECT *
    FROM [sys].[extended_properties] AS [ep]
    WHERE [ep].[major_id] = [t].[object_id]
        AND [ep].[minor_id] = 0
        AND [ep].[class] = 1
        AND [ep].[name] = N'microsoft_database_tools_support'
    )
AND [t].[name] <> '__EFMigrationsHistory'",
            )
            .push_if(
                caps.supports_temporal(),
                "exclude_history_tables",
                "AND [t].[temporal_type] <> 1",
            )
            .push_opt("table_filter", table_filter)
            .push_if(
                caps.supports_views(),
                "union_views",
                self.views_select(view_filter.as_deref()),
            )
    }

    fn views_select(&self, view_filter: Option<&str>) -> String {
        let caps = self.capabilities;
        let mut sql = String::from(
            "UNION
SELECT
    SCHEMA_NAME([v].[schema_id]) AS [schema],
    [v].[name],
    CAST([e].[value] AS nvarchar(MAX)) AS [comment],
    'view' AS [type]",
        );
        if caps.supports_memory_optimized() {
            sql.push_str(",\n    CAST(0 AS bit) AS [is_memory_optimized]");
        }
        if caps.supports_temporal() {
            sql.push_str(
                ",
    NULL AS [temporal_type],
    NULL AS [history_table_name],
    NULL AS [history_table_schema],
    NULL AS [period_start_column],
    NULL AS [period_end_column]",
            );
        }
        sql.push_str(
            "
FROM [sys].[views] AS [v]
LEFT JOIN [sys].[extended_properties] AS [e] ON [e].[major_id] = [v].[object_id] AND [e].[minor_id] = 0 AND [e].[class] = 1 AND [e].[name] = 'MS_Description'
WHERE [v].[is_ms_shipped] = 0
AND [v].[is_date_correlation_view] = 0",
        );
        if let Some(filter) = view_filter {
            sql.push('\n');
            sql.push_str(filter);
        }
        sql
    }

    pub fn columns(&self) -> QueryBuilder {
        let caps = self.capabilities;
        let table_filter = self
            .filter
            .table_filter("SCHEMA_NAME([t].[schema_id])", "[t].[name]")
            .map(|f| format!("WHERE {}", f))
            .unwrap_or_default();
        let view_filter = self
            .filter
            .table_filter("SCHEMA_NAME([v].[schema_id])", "[v].[name]")
            .map(|f| format!("WHERE {}", f))
            .unwrap_or_default();

        let mut objects = String::from("FROM\n(\n");
        if caps.supports_views() {
            objects.push_str(&format!(
                "    SELECT [v].[name], [v].[object_id], [v].[schema_id]\n    FROM [sys].[views] AS [v] {}\n    UNION ALL\n",
                view_filter
            ));
        }
        objects.push_str(&format!(
            "    SELECT [t].[name], [t].[object_id], [t].[schema_id]\n    FROM [sys].[tables] AS [t] {}\n) AS [o]",
            table_filter
        ));

        QueryBuilder::new()
            .push(
                "select",
                "SELECT
    SCHEMA_NAME([o].[schema_id]) AS [table_schema],
    [o].[name] AS [table_name],
    [c].[name] AS [column_name],
    [c].[column_id] AS [ordinal],
    SCHEMA_NAME([tp].[schema_id]) AS [type_schema],
    [tp].[name] AS [type_name],
    CAST([c].[max_length] AS int) AS [max_length],
    CAST([c].[precision] AS int) AS [precision],
    CAST([c].[scale] AS int) AS [scale],
    [c].[is_nullable],
    [c].[is_identity],
    [dc].[definition] AS [default_sql],
    [cc].[definition] AS [computed_sql],
    [cc].[is_persisted] AS [computed_is_persisted],
    CAST([e].[value] AS nvarchar(MAX)) AS [comment],
    [c].[collation_name],
    [c].[is_sparse]",
            )
            .push("objects", objects)
            .push(
                "joins",
                "JOIN [sys].[columns] AS [c] ON [o].[object_id] = [c].[object_id]
LEFT JOIN [sys].[types] AS [tp] ON [c].[user_type_id] = [tp].[user_type_id]
LEFT JOIN [sys].[extended_properties] AS [e] ON [e].[major_id] = [o].[object_id] AND [e].[minor_id] = [c].[column_id] AND [e].[class] = 1 AND [e].[name] = 'MS_Description'
LEFT JOIN [sys].[computed_columns] AS [cc] ON [c].[object_id] = [cc].[object_id] AND [c].[column_id] = [cc].[column_id]
LEFT JOIN [sys].[default_constraints] AS [dc] ON [c].[object_id] = [dc].[parent_object_id] AND [c].[column_id] = [dc].[parent_column_id]",
            )
            .push_if(
                caps.supports_temporal(),
                "exclude_period_columns",
                "WHERE [c].[generated_always_type] NOT IN (1, 2)",
            )
            .push(
                "order",
                "ORDER BY SCHEMA_NAME([o].[schema_id]), [o].[name], [c].[column_id]",
            )
    }

    pub fn indexes(&self) -> QueryBuilder {
        QueryBuilder::new()
            .push(
                "select",
                "SELECT
    SCHEMA_NAME([t].[schema_id]) AS [table_schema],
    [t].[name] AS [table_name],
    [i].[name] AS [index_name],
    [i].[type_desc],
    [i].[is_primary_key],
    [i].[is_unique_constraint],
    [i].[is_unique],
    [i].[has_filter],
    [i].[filter_definition],
    CAST([i].[fill_factor] AS int) AS [fill_factor],
    COL_NAME([ic].[object_id], [ic].[column_id]) AS [column_name],
    [ic].[is_descending_key],
    [ic].[is_included_column]
FROM [sys].[indexes] AS [i]
JOIN [sys].[tables] AS [t] ON [i].[object_id] = [t].[object_id]
JOIN [sys].[index_columns] AS [ic] ON [i].[object_id] = [ic].[object_id] AND [i].[index_id] = [ic].[index_id]
WHERE [t].[is_ms_shipped] = 0
AND [i].[is_hypothetical] = 0
AND [i].[type] <> 0",
            )
            .push_opt(
                "table_filter",
                self.and_table_filter("SCHEMA_NAME([t].[schema_id])", "[t].[name]"),
            )
            .push(
                "order",
                "ORDER BY [table_schema], [table_name], [index_name], [ic].[key_ordinal]",
            )
    }

    pub fn foreign_keys(&self) -> QueryBuilder {
        QueryBuilder::new()
            .push(
                "select",
                "SELECT
    SCHEMA_NAME([t].[schema_id]) AS [table_schema],
    [t].[name] AS [table_name],
    [f].[name],
    OBJECT_SCHEMA_NAME([f].[referenced_object_id]) AS [principal_table_schema],
    OBJECT_NAME([f].[referenced_object_id]) AS [principal_table_name],
    [f].[delete_referential_action_desc],
    COL_NAME([fc].[parent_object_id], [fc].[parent_column_id]) AS [column_name],
    COL_NAME([fc].[referenced_object_id], [fc].[referenced_column_id]) AS [referenced_column_name]
FROM [sys].[foreign_keys] AS [f]
JOIN [sys].[tables] AS [t] ON [f].[parent_object_id] = [t].[object_id]
JOIN [sys].[foreign_key_columns] AS [fc] ON [f].[object_id] = [fc].[constraint_object_id]
WHERE [t].[is_ms_shipped] = 0",
            )
            .push_opt(
                "table_filter",
                self.and_table_filter("SCHEMA_NAME([t].[schema_id])", "[t].[name]"),
            )
            .push(
                "order",
                "ORDER BY [table_schema], [table_name], [f].[name], [fc].[constraint_column_id]",
            )
    }

    pub fn triggers(&self) -> QueryBuilder {
        QueryBuilder::new()
            .push(
                "select",
                "SELECT
    SCHEMA_NAME([t].[schema_id]) AS [table_schema],
    [t].[name] AS [table_name],
    [tr].[name] AS [trigger_name]
FROM [sys].[triggers] AS [tr]
JOIN [sys].[tables] AS [t] ON [tr].[parent_id] = [t].[object_id]
WHERE [t].[is_ms_shipped] = 0",
            )
            .push_opt(
                "table_filter",
                self.and_table_filter("SCHEMA_NAME([t].[schema_id])", "[t].[name]"),
            )
            .push("order", "ORDER BY [table_schema], [table_name], [tr].[name]")
    }
}

/// Cast a `sql_variant` sequence bound to bigint, saturating at the bigint
/// range so wide decimal sequences do not overflow.
fn clamped_bigint(column: &str) -> String {
    format!(
        "CAST(CASE WHEN {column} > 9223372036854775807 THEN 9223372036854775807 \
WHEN {column} < -9223372036854775808 THEN -9223372036854775808 \
ELSE {column} END AS bigint)"
    )
}
