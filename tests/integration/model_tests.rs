//! End-to-end assembly of small catalogs

use mssql_scaffold::catalog::{CatalogQuery, MockConnection};
use mssql_scaffold::model::{annotations, TableKind, ValueGenerated};
use mssql_scaffold::parser::DefaultValue;
use mssql_scaffold::ScaffoldOptions;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use crate::common::*;

#[test]
fn test_orders_table_end_to_end() {
    let mut conn = orders_catalog();
    let result = scaffold_all(&mut conn);
    let model = &result.model;

    assert_eq!(model.tables.len(), 1);
    let orders = model.get_table("dbo", "Orders").expect("dbo.Orders");
    assert_eq!(orders.kind, TableKind::Table);

    let names: Vec<_> = orders.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Id", "CustomerName", "Total"]);

    let id = &orders.columns[0];
    assert_eq!(id.store_type, "int");
    assert!(!id.is_nullable);
    assert_eq!(id.value_generated, Some(ValueGenerated::OnAdd));

    let customer = &orders.columns[1];
    assert_eq!(customer.store_type, "nvarchar(100)");
    assert!(customer.is_nullable);
    assert_eq!(customer.value_generated, None);

    let total = &orders.columns[2];
    assert_eq!(total.store_type, "decimal(18, 2)");
    assert_eq!(total.default_value_sql.as_deref(), Some("((0))"));
    assert_eq!(total.default_value, Some(DefaultValue::Decimal(Decimal::ZERO)));

    let pk = orders.primary_key.as_ref().expect("primary key");
    assert_eq!(pk.name.as_deref(), Some("PK_Orders"));
    assert_eq!(pk.columns, vec!["Id".to_string()]);
    assert!(pk.annotations.get(annotations::CLUSTERED).is_none());

    assert!(orders.foreign_keys.is_empty());
    assert!(result.warning_ids().is_empty());
}

#[test]
fn test_database_level_facts() {
    let mut conn = orders_catalog()
        .with_database_name("Shop")
        .with_collation("SQL_Latin1_General_CP1_CI_AS", "Latin1_General_100_CS_AS");
    let result = scaffold_all(&mut conn);

    assert_eq!(result.model.database_name.as_deref(), Some("Shop"));
    assert_eq!(result.model.default_schema.as_deref(), Some("dbo"));
    assert_eq!(
        result.model.collation.as_deref(),
        Some("Latin1_General_100_CS_AS")
    );
    assert_eq!(result.count("DefaultSchemaFound"), 1);
}

#[test]
fn test_matching_collation_is_not_recorded() {
    let mut conn = orders_catalog();
    let result = scaffold_all(&mut conn);
    assert_eq!(result.model.collation, None);
}

#[test]
fn test_missing_default_schema() {
    let mut conn = orders_catalog().with_default_schema(None);
    let result = scaffold_all(&mut conn);
    assert_eq!(result.model.default_schema, None);
    assert_eq!(result.count("DefaultSchemaFound"), 0);
}

#[test]
fn test_views_are_tables_with_view_kind() {
    let mut conn = MockConnection::new()
        .with_rows(
            CatalogQuery::Tables,
            vec![table_row("dbo", "Orders"), view_row("dbo", "OrderTotals")],
        )
        .with_rows(
            CatalogQuery::Columns,
            vec![
                column("dbo", "Orders", "Id", 1, "int").row(),
                column("dbo", "OrderTotals", "Total", 1, "money").nullable().row(),
            ],
        );
    let result = scaffold_all(&mut conn);

    let view = result.model.get_table("dbo", "OrderTotals").unwrap();
    assert!(view.is_view());
    assert_eq!(view.columns[0].store_type, "money");
    assert_eq!(result.count("ViewFound"), 1);
    assert_eq!(result.count("TableFound"), 1);
}

#[test]
fn test_table_and_column_comments() {
    let mut conn = MockConnection::new()
        .with_rows(
            CatalogQuery::Tables,
            vec![table_row("dbo", "Orders").with("comment", "Customer orders")],
        )
        .with_rows(
            CatalogQuery::Columns,
            vec![column("dbo", "Orders", "Id", 1, "int")
                .comment("Surrogate key")
                .row()],
        );
    let result = scaffold_all(&mut conn);

    let orders = result.model.get_table("dbo", "Orders").unwrap();
    assert_eq!(orders.comment.as_deref(), Some("Customer orders"));
    assert_eq!(orders.columns[0].comment.as_deref(), Some("Surrogate key"));
}

#[test]
fn test_triggers_attach_to_their_table() {
    let mut conn = orders_catalog().with_rows(
        CatalogQuery::Triggers,
        vec![
            trigger_row("dbo", "Orders", "TR_Orders_Audit"),
            trigger_row("dbo", "Unknown", "TR_Ignored"),
        ],
    );
    let result = scaffold_all(&mut conn);

    let orders = result.model.get_table("dbo", "Orders").unwrap();
    let names: Vec<_> = orders.triggers.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["TR_Orders_Audit"]);
    assert_eq!(result.count("TriggerFound"), 1);
}

#[test]
fn test_columns_of_unselected_tables_are_ignored() {
    let mut conn = orders_catalog().with_rows(
        CatalogQuery::Columns,
        vec![column("dbo", "Elsewhere", "Id", 1, "int").row()],
    );
    let result = scaffold(&mut conn, &ScaffoldOptions::new());
    assert_eq!(result.model.tables.len(), 1);
    assert_eq!(result.model.tables[0].columns.len(), 3);
}
