//! Column assembly: store types, aliases, defaults and facets

use mssql_scaffold::catalog::{CatalogQuery, MockConnection};
use mssql_scaffold::model::{annotations, ColumnElement, ValueGenerated};
use mssql_scaffold::parser::DefaultValue;
use mssql_scaffold::ScaffoldEvent;
use rust_decimal::Decimal;

use crate::common::*;

/// Scaffold a single `dbo.T` table with the given columns
fn scaffold_columns(conn: MockConnection, columns: Vec<ColumnFixture>) -> ScaffoldResult {
    let mut conn = conn
        .with_rows(CatalogQuery::Tables, vec![table_row("dbo", "T")])
        .with_rows(
            CatalogQuery::Columns,
            columns.iter().map(ColumnFixture::row).collect(),
        );
    scaffold_all(&mut conn)
}

fn find<'a>(result: &'a ScaffoldResult, name: &str) -> &'a ColumnElement {
    result
        .model
        .get_table("dbo", "T")
        .and_then(|t| t.find_column(name))
        .unwrap_or_else(|| panic!("column {} not scaffolded", name))
}

// ============================================================================
// Store types
// ============================================================================

#[test]
fn test_store_types_from_facets() {
    let result = scaffold_columns(
        MockConnection::new(),
        vec![
            column("dbo", "T", "Code", 1, "char").max_length(10),
            column("dbo", "T", "Note", 2, "nvarchar").max_length(-1),
            column("dbo", "T", "Amount", 3, "numeric").precision(10, 3),
            column("dbo", "T", "Stamp", 4, "datetime2").scale(3),
            column("dbo", "T", "At", 5, "datetimeoffset").scale(7),
            column("dbo", "T", "Payload", 6, "varbinary").max_length(16),
            column("dbo", "T", "Flag", 7, "bit"),
        ],
    );

    let types: Vec<_> = result.model.tables[0]
        .columns
        .iter()
        .map(|c| c.store_type.as_str())
        .collect();
    assert_eq!(
        types,
        vec![
            "char(10)",
            "nvarchar(max)",
            "numeric(10, 3)",
            "datetime2(3)",
            "datetimeoffset",
            "varbinary(16)",
            "bit"
        ]
    );
}

#[test]
fn test_columns_ordered_by_ordinal() {
    let result = scaffold_columns(
        MockConnection::new(),
        vec![
            column("dbo", "T", "Third", 3, "int"),
            column("dbo", "T", "First", 1, "int"),
            column("dbo", "T", "Second", 2, "int"),
        ],
    );
    let names: Vec<_> = result.model.tables[0]
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["First", "Second", "Third"]);
}

#[test]
fn test_sysname_alias_resolves_to_nvarchar() {
    let result = scaffold_columns(
        MockConnection::new().with_rows(
            CatalogQuery::TypeAliases,
            vec![type_alias_row("sys", "sysname", "nvarchar", 256, 0, 0)],
        ),
        vec![column("dbo", "T", "Login", 1, "sysname").max_length(256)],
    );

    assert_eq!(find(&result, "Login").store_type, "nvarchar(128)");
    assert_eq!(result.count("TypeAliasFound"), 1);
}

#[test]
fn test_user_alias_uses_its_own_facets_and_underlying_defaults() {
    let result = scaffold_columns(
        MockConnection::new().with_rows(
            CatalogQuery::TypeAliases,
            vec![type_alias_row("dbo", "Price", "decimal", 9, 18, 4)],
        ),
        vec![column("dbo", "T", "UnitPrice", 1, "Price")
            .user_type("dbo")
            .precision(5, 0)
            .default_sql("((1.5))")],
    );

    let price = find(&result, "UnitPrice");
    assert_eq!(price.store_type, "decimal(18, 4)");
    assert_eq!(price.default_value, Some(DefaultValue::Decimal(Decimal::new(15, 1))));
}

#[test]
fn test_alias_in_other_schema_does_not_match() {
    let result = scaffold_columns(
        MockConnection::new().with_rows(
            CatalogQuery::TypeAliases,
            vec![type_alias_row("sales", "Price", "decimal", 9, 18, 4)],
        ),
        vec![column("dbo", "T", "UnitPrice", 1, "Price").user_type("dbo")],
    );
    assert_eq!(find(&result, "UnitPrice").store_type, "Price");
}

#[test]
fn test_untyped_column_is_skipped_with_warning() {
    let result = scaffold_columns(
        MockConnection::new(),
        vec![
            column("dbo", "T", "Id", 1, "int"),
            column("dbo", "T", "Mystery", 2, "int").untyped(),
        ],
    );

    let table = result.model.get_table("dbo", "T").unwrap();
    assert_eq!(table.columns.len(), 1);
    assert_eq!(
        result.diagnostics.warnings().cloned().collect::<Vec<_>>(),
        vec![ScaffoldEvent::ColumnWithoutType {
            table: "dbo.T".to_string(),
            column: "Mystery".to_string()
        }]
    );
}

// ============================================================================
// Generation, defaults and facets
// ============================================================================

#[test]
fn test_rowversion_is_concurrency_token() {
    let result = scaffold_columns(
        MockConnection::new(),
        vec![column("dbo", "T", "Version", 1, "timestamp").max_length(8)],
    );

    let version = find(&result, "Version");
    assert_eq!(version.store_type, "rowversion");
    assert_eq!(version.value_generated, Some(ValueGenerated::OnAddOrUpdate));
    assert_eq!(
        version.annotations.get_bool(annotations::CONCURRENCY_TOKEN),
        Some(true)
    );
}

#[test]
fn test_typed_defaults() {
    let result = scaffold_columns(
        MockConnection::new(),
        vec![
            column("dbo", "T", "Active", 1, "bit").default_sql("((1))"),
            column("dbo", "T", "Label", 2, "nvarchar")
                .max_length(100)
                .default_sql("(N'none')"),
            column("dbo", "T", "Created", 3, "datetime2").default_sql("(getdate())"),
            column("dbo", "T", "Parent", 4, "int")
                .nullable()
                .default_sql("(NULL)"),
        ],
    );

    assert_eq!(find(&result, "Active").default_value, Some(DefaultValue::Bool(true)));
    assert_eq!(
        find(&result, "Label").default_value,
        Some(DefaultValue::String("none".to_string()))
    );

    let created = find(&result, "Created");
    assert_eq!(created.default_value, None);
    assert_eq!(created.default_value_sql.as_deref(), Some("(getdate())"));

    assert_eq!(find(&result, "Parent").default_value, None);
}

#[test]
fn test_computed_columns() {
    let result = scaffold_columns(
        MockConnection::new(),
        vec![
            column("dbo", "T", "Qty", 1, "int"),
            column("dbo", "T", "Double", 2, "int").computed("([Qty]*(2))", true),
            column("dbo", "T", "Triple", 3, "int").computed("([Qty]*(3))", false),
        ],
    );

    assert_eq!(find(&result, "Qty").is_stored, None);
    let double = find(&result, "Double");
    assert_eq!(double.computed_column_sql.as_deref(), Some("([Qty]*(2))"));
    assert_eq!(double.is_stored, Some(true));
    assert_eq!(find(&result, "Triple").is_stored, Some(false));
}

#[test]
fn test_collation_kept_only_when_it_differs_from_database() {
    let result = scaffold_columns(
        MockConnection::new(),
        vec![
            column("dbo", "T", "Same", 1, "varchar")
                .max_length(10)
                .collation("SQL_Latin1_General_CP1_CI_AS"),
            column("dbo", "T", "Other", 2, "varchar")
                .max_length(10)
                .collation("Japanese_CI_AS"),
        ],
    );

    assert_eq!(find(&result, "Same").collation, None);
    assert_eq!(find(&result, "Other").collation.as_deref(), Some("Japanese_CI_AS"));
}

#[test]
fn test_sparse_annotation() {
    let result = scaffold_columns(
        MockConnection::new(),
        vec![column("dbo", "T", "Rare", 1, "int").nullable().sparse()],
    );
    assert_eq!(
        find(&result, "Rare").annotations.get_bool(annotations::SPARSE),
        Some(true)
    );
}
