//! Store type normalization
//!
//! Turns the raw `sys.types` name plus the `max_length` / `precision` /
//! `scale` facets of a column or sequence into the textual store type used
//! by code generation, e.g. `nvarchar(50)`, `decimal(18, 2)`, `datetime2(3)`.

/// Types whose scale is their fractional-seconds precision (7 is implicit)
const TIME_PRECISION_TYPES: &[&str] = &["datetimeoffset", "datetime2", "time"];

/// Types whose store type carries a length
const LENGTH_TYPES: &[&str] = &["binary", "varbinary", "char", "varchar", "nchar", "nvarchar"];

/// `max_length` value the catalog uses for `(max)` columns
pub const MAX_LENGTH_SENTINEL: i32 = -1;

/// Build the canonical store type for a system type and its facets.
///
/// `max_length` is the byte length from the catalog, so `nchar`/`nvarchar`
/// lengths are halved to get a character count.
pub fn store_type(data_type_name: &str, max_length: i32, precision: i32, scale: i32) -> String {
    if data_type_name == "timestamp" {
        return "rowversion".to_string();
    }

    if data_type_name == "decimal" || data_type_name == "numeric" {
        return format!("{}({}, {})", data_type_name, precision, scale);
    }

    if TIME_PRECISION_TYPES.contains(&data_type_name) && scale != 7 {
        return format!("{}({})", data_type_name, scale);
    }

    if LENGTH_TYPES.contains(&data_type_name) {
        if max_length == MAX_LENGTH_SENTINEL {
            return format!("{}(max)", data_type_name);
        }

        let length = if data_type_name == "nvarchar" || data_type_name == "nchar" {
            max_length / 2
        } else {
            max_length
        };
        return format!("{}({})", data_type_name, length);
    }

    data_type_name.to_string()
}
