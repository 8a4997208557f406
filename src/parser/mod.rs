//! Parsing and normalization of catalog values and user filters

mod default_value;
mod identifier_utils;
mod store_type;
mod type_mapping;

pub use default_value::{strip_parentheses, try_parse_clr_default, DefaultValue};
pub use identifier_utils::{display_name, escape_literal, parse_table_name, QualifiedName};
pub use store_type::{store_type, MAX_LENGTH_SENTINEL};
pub use type_mapping::{ClrType, SqlServerTypeMappingSource, TypeMappingSource};
