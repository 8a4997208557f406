//! Unit tests for model elements, diagnostics and the model summary

use mssql_scaffold::catalog::{CatalogQuery, MockConnection};
use mssql_scaffold::model::{
    annotations, AnnotationValue, Annotations, ReferentialAction, TableElement, TableKind,
};
use mssql_scaffold::{
    build_model, CollectingDiagnostics, DatabaseModel, DatabaseModelFactory, Diagnostics,
    ScaffoldEvent, ScaffoldOptions,
};

// ============================================================================
// Elements
// ============================================================================

#[test]
fn test_table_kind_from_catalog() {
    assert_eq!(TableKind::from_catalog("table"), TableKind::Table);
    assert_eq!(TableKind::from_catalog("VIEW"), TableKind::View);
}

#[test]
fn test_referential_actions() {
    assert_eq!(
        ReferentialAction::from_catalog("SET_NULL"),
        Some(ReferentialAction::SetNull)
    );
    assert_eq!(
        ReferentialAction::from_catalog("set_default"),
        Some(ReferentialAction::SetDefault)
    );
    assert_eq!(ReferentialAction::from_catalog("RESTRICT"), None);
}

#[test]
fn test_annotation_bag() {
    let mut bag = Annotations::default();
    assert!(bag.is_empty());

    bag.set(annotations::CLUSTERED, AnnotationValue::Bool(false));
    bag.set(annotations::FILL_FACTOR, AnnotationValue::Int(70));
    bag.set(annotations::CLUSTERED, AnnotationValue::Bool(true));

    assert_eq!(bag.get_bool(annotations::CLUSTERED), Some(true));
    assert_eq!(bag.get_bool(annotations::FILL_FACTOR), None);
    assert_eq!(bag.get_str(annotations::FILL_FACTOR), None);
    assert_eq!(bag.iter().count(), 2);
}

#[test]
fn test_table_display_name_without_schema() {
    let table = TableElement::new(None, "Orders", TableKind::Table);
    assert_eq!(table.display_name(), "Orders");
}

#[test]
fn test_find_table_prefers_exact_match() {
    let mut model = DatabaseModel::new();
    let upper = model.add_table(TableElement::new(Some("dbo".into()), "ORDERS", TableKind::Table));
    let exact = model.add_table(TableElement::new(Some("dbo".into()), "Orders", TableKind::Table));

    assert_eq!(model.find_table(Some("dbo"), "Orders"), Some(exact));
    assert_eq!(model.find_table(Some("DBO"), "orders"), Some(upper));
    assert_eq!(model.find_table(None, "Orders"), None);
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_event_messages() {
    let cases = [
        (
            ScaffoldEvent::MissingSchema {
                schema: "audit".to_string(),
            },
            "Unable to find a schema in the database matching the selected schema 'audit'.",
        ),
        (
            ScaffoldEvent::ColumnWithoutType {
                table: "dbo.T".to_string(),
                column: "C".to_string(),
            },
            "Could not find type mapping for column 'dbo.T.C'. Skipping column.",
        ),
        (
            ScaffoldEvent::DefaultSchemaFound {
                schema: "dbo".to_string(),
            },
            "Found default schema 'dbo'.",
        ),
    ];
    for (event, message) in cases {
        assert_eq!(event.to_string(), message);
    }
}

#[test]
fn test_warning_ids() {
    let warnings = [
        ScaffoldEvent::MissingViewDefinitionRights,
        ScaffoldEvent::PrincipalTableNotInSelectionSet {
            foreign_key: "FK".to_string(),
            table: "dbo.A".to_string(),
            principal_table: "dbo.B".to_string(),
        },
        ScaffoldEvent::DuplicateForeignKeyIgnored {
            foreign_key: "FK2".to_string(),
            table: "dbo.A".to_string(),
            duplicate_of: "FK".to_string(),
        },
    ];
    let ids: Vec<_> = warnings.iter().map(|e| e.id()).collect();
    assert_eq!(
        ids,
        vec![
            "MissingViewDefinitionRightsWarning",
            "ForeignKeyReferencesMissingPrincipalTableWarning",
            "DuplicateForeignKeyConstraintIgnored"
        ]
    );
    assert!(warnings.iter().all(ScaffoldEvent::is_warning));
}

/// Counts events without keeping them
#[derive(Default)]
struct CountingDiagnostics {
    found: usize,
    warnings: usize,
}

impl Diagnostics for CountingDiagnostics {
    fn emit(&mut self, event: ScaffoldEvent) {
        if event.is_warning() {
            self.warnings += 1;
        } else {
            self.found += 1;
        }
    }
}

#[test]
fn test_custom_diagnostics_sink() {
    let mut conn = MockConnection::new().with_rows(
        CatalogQuery::Tables,
        vec![mssql_scaffold::catalog::CatalogRow::new()
            .with("schema", "dbo")
            .with("name", "T")
            .with("comment", None::<String>)
            .with("type", "table")
            .with("is_memory_optimized", false)
            .with("temporal_type", None::<i32>)
            .with("history_table_name", None::<String>)
            .with("history_table_schema", None::<String>)
            .with("period_start_column", None::<String>)
            .with("period_end_column", None::<String>)],
    );
    let mut diagnostics = CountingDiagnostics::default();
    let options = ScaffoldOptions::new().with_schema("missing");

    let model = DatabaseModelFactory::new()
        .create(&mut conn, &options, &mut diagnostics)
        .unwrap();

    assert_eq!(model.tables.len(), 1);
    // DefaultSchemaFound + TableFound
    assert_eq!(diagnostics.found, 2);
    assert_eq!(diagnostics.warnings, 1);
}

#[test]
fn test_diagnostics_as_trait_object() {
    let mut conn = MockConnection::new();
    let mut collecting = CollectingDiagnostics::new();
    let diagnostics: &mut dyn Diagnostics = &mut collecting;

    build_model(&mut conn, &ScaffoldOptions::new(), diagnostics).unwrap();

    assert_eq!(collecting.with_id("DefaultSchemaFound").count(), 1);
}

// ============================================================================
// Summary
// ============================================================================

#[test]
fn test_summary_of_empty_model() {
    let summary = DatabaseModel::new().summary();
    assert_eq!(
        summary,
        "Database: (unknown) (default schema: (none))\nSequences: 0\nTables and views: 0\n"
    );
}
