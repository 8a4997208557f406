//! Schema and table selection

use mssql_scaffold::catalog::{CatalogQuery, MockConnection};
use mssql_scaffold::{build_model, CollectingDiagnostics, ScaffoldError, ScaffoldEvent, ScaffoldOptions};
use pretty_assertions::assert_eq;

use crate::common::*;

#[test]
fn test_missing_table_warning() {
    // The server answers the filtered query with just dbo.Orders
    let mut conn = MockConnection::new()
        .with_rows(CatalogQuery::Tables, vec![table_row("dbo", "Orders")])
        .with_rows(
            CatalogQuery::Columns,
            vec![column("dbo", "Orders", "Id", 1, "int").row()],
        );
    let options = ScaffoldOptions::new()
        .with_table("dbo.Orders")
        .with_table("Missing");
    let result = scaffold(&mut conn, &options);

    assert_eq!(result.model.tables.len(), 1);
    assert_eq!(
        result.diagnostics.warnings().cloned().collect::<Vec<_>>(),
        vec![ScaffoldEvent::MissingTable {
            table: "Missing".to_string()
        }]
    );

    let sql = conn.last_sql(CatalogQuery::Tables).unwrap();
    assert!(sql.contains("N'Missing'"));
    assert!(sql.contains("N'dbo.Orders'"));
}

#[test]
fn test_qualified_selection_matches_any_table_in_schema() {
    // A table in the requested schema satisfies a schema-qualified selection
    // even when its name differs.
    let mut conn = MockConnection::new()
        .with_rows(CatalogQuery::Tables, vec![table_row("sales", "Invoices")]);
    let options = ScaffoldOptions::new().with_table("[sales].[Orders]");
    let result = scaffold(&mut conn, &options);

    assert_eq!(result.count("MissingTableWarning"), 0);
}

#[test]
fn test_missing_schema_warning() {
    let mut conn = MockConnection::new()
        .with_rows(CatalogQuery::Tables, vec![table_row("dbo", "Orders")]);
    let options = ScaffoldOptions::new()
        .with_schema("DBO")
        .with_schema("audit")
        .with_schema("Audit");
    let result = scaffold(&mut conn, &options);

    let missing: Vec<_> = result
        .diagnostics
        .with_id("MissingSchemaWarning")
        .cloned()
        .collect();
    assert_eq!(
        missing,
        vec![ScaffoldEvent::MissingSchema {
            schema: "audit".to_string()
        }]
    );
}

#[test]
fn test_schema_satisfied_by_sequence() {
    let mut conn = MockConnection::new().with_rows(
        CatalogQuery::Sequences,
        vec![sequence_row("ids", "OrderNumbers", "int", 1, 1, 1, 1000, false)],
    );
    let result = scaffold(&mut conn, &ScaffoldOptions::new().with_schema("ids"));
    assert_eq!(result.count("MissingSchemaWarning"), 0);
}

#[test]
fn test_schema_filter_reaches_sequences_query() {
    let mut conn = MockConnection::new();
    scaffold(&mut conn, &ScaffoldOptions::new().with_schema("o'brien"));

    let sql = conn.last_sql(CatalogQuery::Sequences).unwrap();
    assert!(sql.contains("IN (N'o''brien')"));
}

#[test]
fn test_no_selection_means_no_predicates() {
    let mut conn = orders_catalog();
    scaffold_all(&mut conn);
    for kind in [CatalogQuery::Tables, CatalogQuery::Indexes, CatalogQuery::ForeignKeys] {
        let sql = conn.last_sql(kind).unwrap();
        assert!(!sql.contains(" IN ("), "unexpected predicate in {}", sql);
    }
}

#[test]
fn test_invalid_table_filter_aborts_before_connecting() {
    let mut conn = orders_catalog();
    let mut diagnostics = CollectingDiagnostics::new();
    let options = ScaffoldOptions::new().with_table("[dbo].[Unclosed");

    let result = build_model(&mut conn, &options, &mut diagnostics);

    assert!(matches!(
        result,
        Err(ScaffoldError::InvalidTableFilter { ref filter }) if filter == "[dbo].[Unclosed"
    ));
    assert_eq!(conn.open_calls(), 0);
    assert!(conn.executed().is_empty());
}
