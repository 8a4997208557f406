//! Unit tests for filter parsing, store types and default values

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use mssql_scaffold::parser::{
    display_name, escape_literal, parse_table_name, store_type, try_parse_clr_default, ClrType,
    DefaultValue, QualifiedName, SqlServerTypeMappingSource, TypeMappingSource,
};
use mssql_scaffold::ScaffoldError;
use rust_decimal::Decimal;
use uuid::Uuid;

// ============================================================================
// Table filters
// ============================================================================

#[test]
fn test_parse_table_name_forms() {
    let cases = [
        ("Orders", None, "Orders"),
        ("dbo.Orders", Some("dbo"), "Orders"),
        ("[dbo].[Order Lines]", Some("dbo"), "Order Lines"),
        ("dbo.[Table.With.Dot]", Some("dbo"), "Table.With.Dot"),
        ("[My Schema].Orders", Some("My Schema"), "Orders"),
        ("[Odd]]Name]", None, "Odd]Name"),
        ("  Orders  ", None, "Orders"),
    ];
    for (input, schema, table) in cases {
        assert_eq!(
            parse_table_name(input).unwrap(),
            QualifiedName::new(schema, table),
            "input: {}",
            input
        );
    }
}

#[test]
fn test_parse_table_name_rejects_malformed_input() {
    for input in ["", "a.b.c", "[unclosed", "dbo.", ".Orders", "[]", "dbo.[x"] {
        match parse_table_name(input) {
            Err(ScaffoldError::InvalidTableFilter { filter }) => assert_eq!(filter, input),
            other => panic!("expected an invalid filter for {:?}, got {:?}", input, other),
        }
    }
}

#[test]
fn test_qualified_name_display() {
    assert_eq!(QualifiedName::new(Some("dbo"), "Orders").to_string(), "dbo.Orders");
    assert_eq!(QualifiedName::new(None, "Orders").to_string(), "Orders");
    assert_eq!(display_name(Some(""), "Orders"), "Orders");
}

#[test]
fn test_escape_literal() {
    assert_eq!(escape_literal("dbo"), "N'dbo'");
    assert_eq!(escape_literal("it's"), "N'it''s'");
}

// ============================================================================
// Store types
// ============================================================================

#[test]
fn test_store_type_table() {
    let cases = [
        (("nvarchar", 100, 0, 0), "nvarchar(50)"),
        (("nchar", 20, 0, 0), "nchar(10)"),
        (("varchar", -1, 0, 0), "varchar(max)"),
        (("varbinary", -1, 0, 0), "varbinary(max)"),
        (("decimal", 17, 38, 10), "decimal(38, 10)"),
        (("time", 5, 16, 7), "time"),
        (("time", 5, 12, 3), "time(3)"),
        (("datetime2", 6, 23, 0), "datetime2(0)"),
        (("timestamp", 8, 0, 0), "rowversion"),
        (("geography", -1, 0, 0), "geography"),
    ];
    for ((name, max_length, precision, scale), expected) in cases {
        assert_eq!(store_type(name, max_length, precision, scale), expected);
    }
}

#[test]
fn test_type_mapping_of_store_types() {
    let source = SqlServerTypeMappingSource;
    assert_eq!(source.find_mapping("money"), Some(ClrType::Decimal));
    assert_eq!(source.find_mapping("time(3)"), Some(ClrType::TimeOnly));
    assert_eq!(source.find_mapping("rowversion"), Some(ClrType::Bytes));
    assert_eq!(source.find_mapping("hierarchyid"), None);
}

// ============================================================================
// Default values
// ============================================================================

#[test]
fn test_numeric_defaults() {
    assert_eq!(
        try_parse_clr_default(ClrType::Decimal, "((12.50))"),
        Some(DefaultValue::Decimal(Decimal::new(1250, 2)))
    );
    assert_eq!(
        try_parse_clr_default(ClrType::Int64, "((-1))"),
        Some(DefaultValue::Int64(-1))
    );
    assert_eq!(
        try_parse_clr_default(ClrType::Byte, "((300))"),
        None,
        "out of range for tinyint"
    );
    assert_eq!(
        try_parse_clr_default(ClrType::Double, "((1.5))"),
        Some(DefaultValue::Double(1.5))
    );
}

#[test]
fn test_bool_defaults() {
    assert_eq!(
        try_parse_clr_default(ClrType::Bool, "((0))"),
        Some(DefaultValue::Bool(false))
    );
    assert_eq!(
        try_parse_clr_default(ClrType::Bool, "(CONVERT([bit],(1)))"),
        Some(DefaultValue::Bool(true))
    );
    assert_eq!(
        try_parse_clr_default(ClrType::Bool, "('true')"),
        Some(DefaultValue::Bool(true))
    );
}

#[test]
fn test_string_defaults() {
    assert_eq!(
        try_parse_clr_default(ClrType::String, "(N'O''Brien')"),
        Some(DefaultValue::String("O''Brien".to_string()))
    );
    assert_eq!(
        try_parse_clr_default(ClrType::String, "('')"),
        Some(DefaultValue::String(String::new()))
    );
    assert_eq!(try_parse_clr_default(ClrType::String, "(suser_sname())"), None);
}

#[test]
fn test_temporal_defaults() {
    assert_eq!(
        try_parse_clr_default(ClrType::DateOnly, "('2024-02-29')"),
        Some(DefaultValue::DateOnly(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
    );
    assert_eq!(
        try_parse_clr_default(ClrType::TimeOnly, "('13:45:00')"),
        Some(DefaultValue::TimeOnly(NaiveTime::from_hms_opt(13, 45, 0).unwrap()))
    );
    assert_eq!(
        try_parse_clr_default(ClrType::DateTime, "('1900-01-01T00:00:00')"),
        Some(DefaultValue::DateTime(
            NaiveDate::from_ymd_opt(1900, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        ))
    );
    assert_eq!(try_parse_clr_default(ClrType::DateTime, "(sysutcdatetime())"), None);
}

#[test]
fn test_date_time_offset_without_offset_is_utc() {
    let parsed = try_parse_clr_default(ClrType::DateTimeOffset, "('2020-05-01 10:00:00')");
    let expected = Utc.with_ymd_and_hms(2020, 5, 1, 10, 0, 0).unwrap().fixed_offset();
    assert_eq!(parsed, Some(DefaultValue::DateTimeOffset(expected)));
}

#[test]
fn test_guid_default() {
    let parsed = try_parse_clr_default(
        ClrType::Guid,
        "('6f9619ff-8b86-d011-b42d-00c04fc964ff')",
    );
    assert_eq!(
        parsed,
        Some(DefaultValue::Guid(
            Uuid::parse_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap()
        ))
    );
    assert_eq!(try_parse_clr_default(ClrType::Guid, "(newid())"), None);
}

#[test]
fn test_binary_defaults_are_not_interpreted() {
    assert_eq!(try_parse_clr_default(ClrType::Bytes, "(0x00)"), None);
}
