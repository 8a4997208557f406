//! Store type to target (CLR) type mapping

/// Target type a column's values map to in generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClrType {
    Bool,
    Byte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    Guid,
    DateTime,
    DateOnly,
    TimeOnly,
    DateTimeOffset,
    Bytes,
}

impl ClrType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ClrType::Byte
                | ClrType::Int16
                | ClrType::Int32
                | ClrType::Int64
                | ClrType::Single
                | ClrType::Double
                | ClrType::Decimal
        )
    }
}

/// Resolves a store type to the target type used for default values
pub trait TypeMappingSource {
    /// `None` means the type is unknown and no default value can be inferred
    fn find_mapping(&self, store_type: &str) -> Option<ClrType>;
}

/// Built-in SQL Server mappings
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerTypeMappingSource;

impl TypeMappingSource for SqlServerTypeMappingSource {
    fn find_mapping(&self, store_type: &str) -> Option<ClrType> {
        let base = store_type
            .split('(')
            .next()
            .unwrap_or(store_type)
            .trim()
            .to_ascii_lowercase();

        let clr_type = match base.as_str() {
            "bit" => ClrType::Bool,
            "tinyint" => ClrType::Byte,
            "smallint" => ClrType::Int16,
            "int" => ClrType::Int32,
            "bigint" => ClrType::Int64,
            "real" => ClrType::Single,
            "float" => ClrType::Double,
            "decimal" | "numeric" | "money" | "smallmoney" => ClrType::Decimal,
            "char" | "varchar" | "nchar" | "nvarchar" | "text" | "ntext" | "xml" | "sysname" => {
                ClrType::String
            }
            "uniqueidentifier" => ClrType::Guid,
            "datetime" | "datetime2" | "smalldatetime" => ClrType::DateTime,
            "date" => ClrType::DateOnly,
            "time" => ClrType::TimeOnly,
            "datetimeoffset" => ClrType::DateTimeOffset,
            "binary" | "varbinary" | "image" | "rowversion" | "timestamp" => ClrType::Bytes,
            _ => return None,
        };
        Some(clr_type)
    }
}
