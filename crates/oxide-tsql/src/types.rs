//! Logical-to-physical type mapping for SQL Server.
//!
//! Maps host-language type tags ([`ClrType`]) and native types ([`SqlDbType`])
//! to the physical type clause used in DDL, renders the platform default
//! generators, and normalizes catalog type codes so that columns from
//! different tables can be compared.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Catalog `system_type_id` codes used by the column reconciliation queries.
pub mod type_code {
    /// `text`
    pub const TEXT: i32 = 35;
    /// `ntext`
    pub const NTEXT: i32 = 99;
    /// `varchar`
    pub const VARCHAR: i32 = 167;
    /// `char`
    pub const CHAR: i32 = 175;
    /// `nvarchar`
    pub const NVARCHAR: i32 = 231;
    /// `nchar`
    pub const NCHAR: i32 = 239;

    /// Codes whose `max_length` is reported in bytes for two-byte characters.
    pub const DOUBLE_WIDTH: [i32; 3] = [NCHAR, NVARCHAR, NTEXT];

    /// Legacy/single-byte codes and the unicode code they collapse to.
    pub const NORMALIZED: [(i32, i32); 3] = [(VARCHAR, NVARCHAR), (CHAR, NCHAR), (TEXT, NTEXT)];

    /// The text family considered when detecting narrowing conversions.
    pub const WIDE_FAMILY: [i32; 6] = [CHAR, VARCHAR, TEXT, NCHAR, NVARCHAR, NTEXT];
}

/// Host-language type tags accepted in column definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClrType {
    /// 128-bit identifier.
    Guid,
    /// Unicode string.
    String,
    /// Boolean.
    Bool,
    /// Unsigned byte.
    Byte,
    /// 16-bit integer.
    Int16,
    /// 32-bit integer.
    Int32,
    /// 64-bit integer.
    Int64,
    /// Single precision float.
    Single,
    /// Double precision float.
    Double,
    /// Fixed-point decimal.
    Decimal,
    /// Date and time.
    DateTime,
    /// Byte array.
    ByteArray,
}

impl ClrType {
    /// Returns the native SQL Server type this tag stores as.
    #[must_use]
    pub const fn sql_type(self) -> SqlDbType {
        match self {
            Self::Guid => SqlDbType::UniqueIdentifier,
            Self::String => SqlDbType::NVarChar,
            Self::Bool => SqlDbType::Bit,
            Self::Byte => SqlDbType::TinyInt,
            Self::Int16 => SqlDbType::SmallInt,
            Self::Int32 => SqlDbType::Int,
            Self::Int64 => SqlDbType::BigInt,
            Self::Single => SqlDbType::Real,
            Self::Double => SqlDbType::Float,
            Self::Decimal => SqlDbType::Decimal,
            Self::DateTime => SqlDbType::DateTime,
            Self::ByteArray => SqlDbType::VarBinary,
        }
    }
}

/// Native SQL Server types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlDbType {
    BigInt,
    Binary,
    Bit,
    Char,
    Date,
    DateTime,
    DateTime2,
    DateTimeOffset,
    Decimal,
    Float,
    Image,
    Int,
    Money,
    NChar,
    NText,
    NVarChar,
    Real,
    SmallDateTime,
    SmallInt,
    SmallMoney,
    Variant,
    Text,
    Time,
    Timestamp,
    TinyInt,
    UniqueIdentifier,
    VarBinary,
    VarChar,
    Xml,
}

impl SqlDbType {
    /// Returns the type name as written in DDL.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BigInt => "bigint",
            Self::Binary => "binary",
            Self::Bit => "bit",
            Self::Char => "char",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::DateTime2 => "datetime2",
            Self::DateTimeOffset => "datetimeoffset",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Image => "image",
            Self::Int => "int",
            Self::Money => "money",
            Self::NChar => "nchar",
            Self::NText => "ntext",
            Self::NVarChar => "nvarchar",
            Self::Real => "real",
            Self::SmallDateTime => "smalldatetime",
            Self::SmallInt => "smallint",
            Self::SmallMoney => "smallmoney",
            Self::Variant => "sql_variant",
            Self::Text => "text",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::TinyInt => "tinyint",
            Self::UniqueIdentifier => "uniqueidentifier",
            Self::VarBinary => "varbinary",
            Self::VarChar => "varchar",
            Self::Xml => "xml",
        }
    }

    /// Returns the catalog `system_type_id` of this type.
    #[must_use]
    pub const fn system_type_id(self) -> i32 {
        match self {
            Self::Image => 34,
            Self::Text => type_code::TEXT,
            Self::UniqueIdentifier => 36,
            Self::Date => 40,
            Self::Time => 41,
            Self::DateTime2 => 42,
            Self::DateTimeOffset => 43,
            Self::TinyInt => 48,
            Self::SmallInt => 52,
            Self::Int => 56,
            Self::SmallDateTime => 58,
            Self::Real => 59,
            Self::Money => 60,
            Self::DateTime => 61,
            Self::Float => 62,
            Self::Variant => 98,
            Self::NText => type_code::NTEXT,
            Self::Bit => 104,
            Self::Decimal => 106,
            Self::SmallMoney => 122,
            Self::BigInt => 127,
            Self::VarBinary => 165,
            Self::VarChar => type_code::VARCHAR,
            Self::Binary => 173,
            Self::Char => type_code::CHAR,
            Self::Timestamp => 189,
            Self::NVarChar => type_code::NVARCHAR,
            Self::NChar => type_code::NCHAR,
            Self::Xml => 241,
        }
    }

    /// Looks a type up by catalog `system_type_id`. `numeric` (108) maps to decimal.
    #[must_use]
    pub const fn from_system_type_id(code: i32) -> Option<Self> {
        Some(match code {
            34 => Self::Image,
            35 => Self::Text,
            36 => Self::UniqueIdentifier,
            40 => Self::Date,
            41 => Self::Time,
            42 => Self::DateTime2,
            43 => Self::DateTimeOffset,
            48 => Self::TinyInt,
            52 => Self::SmallInt,
            56 => Self::Int,
            58 => Self::SmallDateTime,
            59 => Self::Real,
            60 => Self::Money,
            61 => Self::DateTime,
            62 => Self::Float,
            98 => Self::Variant,
            99 => Self::NText,
            104 => Self::Bit,
            106 | 108 => Self::Decimal,
            122 => Self::SmallMoney,
            127 => Self::BigInt,
            165 => Self::VarBinary,
            167 => Self::VarChar,
            173 => Self::Binary,
            175 => Self::Char,
            189 => Self::Timestamp,
            231 => Self::NVarChar,
            239 => Self::NChar,
            241 => Self::Xml,
            _ => return None,
        })
    }

    /// Returns `true` for integer types (the only ones that may carry `IDENTITY`).
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::TinyInt | Self::SmallInt | Self::Int | Self::BigInt
        )
    }

    /// Returns `true` for types that can default to the current timestamp.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Date
                | Self::DateTime
                | Self::DateTime2
                | Self::DateTimeOffset
                | Self::SmallDateTime
        )
    }

    /// Returns `true` for types that accept a length clause.
    #[must_use]
    pub const fn has_length(self) -> bool {
        matches!(
            self,
            Self::Binary | Self::Char | Self::NChar | Self::NVarChar | Self::VarBinary | Self::VarChar
        )
    }

    /// Returns `true` for variable-width types that accept `MAX`.
    #[must_use]
    pub const fn is_variable_width(self) -> bool {
        matches!(self, Self::NVarChar | Self::VarBinary | Self::VarChar)
    }

    /// Largest explicit length the type accepts.
    const fn max_length(self) -> u32 {
        match self {
            Self::NChar | Self::NVarChar => 4000,
            _ => 8000,
        }
    }
}

impl fmt::Display for SqlDbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The logical storage type of a column: a host type tag or a native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Host-language type tag.
    Clr(ClrType),
    /// Native SQL Server type.
    Sql(SqlDbType),
}

impl ColumnType {
    /// Resolves to the native SQL Server type.
    #[must_use]
    pub const fn sql_type(self) -> SqlDbType {
        match self {
            Self::Clr(clr) => clr.sql_type(),
            Self::Sql(sql) => sql,
        }
    }
}

impl From<ClrType> for ColumnType {
    fn from(value: ClrType) -> Self {
        Self::Clr(value)
    }
}

impl From<SqlDbType> for ColumnType {
    fn from(value: SqlDbType) -> Self {
        Self::Sql(value)
    }
}

/// A resolved physical type: the type name plus its optional length clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalType {
    /// Type name, e.g. `nvarchar`.
    pub name: &'static str,
    /// Contents of the parenthesized clause, e.g. `500`, `MAX` or `5, 1`.
    pub length_clause: Option<String>,
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.length_clause {
            Some(clause) => write!(f, "{} ({clause})", self.name),
            None => f.write_str(self.name),
        }
    }
}

/// Resolves a logical type plus its size facets to a physical type.
///
/// # Errors
///
/// Returns [`RenderError::UnsupportedType`] when a facet does not apply to
/// the type or is out of range.
pub fn physical_type(
    column_type: ColumnType,
    length: Option<u32>,
    precision: Option<u8>,
    scale: Option<u8>,
) -> Result<PhysicalType> {
    let sql_type = column_type.sql_type();
    let name = sql_type.name();

    if sql_type != SqlDbType::Decimal && (precision.is_some() || scale.is_some()) {
        return Err(RenderError::unsupported_type(format!(
            "{name} does not take a precision or scale"
        )));
    }
    if !sql_type.has_length() && length.is_some() {
        return Err(RenderError::unsupported_type(format!(
            "{name} does not take a length"
        )));
    }

    let length_clause = if sql_type == SqlDbType::Decimal {
        decimal_clause(precision, scale)?
    } else if sql_type.has_length() {
        match length {
            Some(0) => {
                return Err(RenderError::unsupported_type(format!(
                    "{name} length must be positive"
                )))
            }
            Some(n) if n <= sql_type.max_length() => Some(n.to_string()),
            Some(n) if !sql_type.is_variable_width() => {
                return Err(RenderError::unsupported_type(format!(
                    "{name} ({n}) exceeds the maximum length of {}",
                    sql_type.max_length()
                )))
            }
            Some(_) => Some(String::from("MAX")),
            None if sql_type.is_variable_width() => Some(String::from("MAX")),
            None => None,
        }
    } else {
        None
    };

    Ok(PhysicalType {
        name,
        length_clause,
    })
}

fn decimal_clause(precision: Option<u8>, scale: Option<u8>) -> Result<Option<String>> {
    match (precision, scale) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(RenderError::unsupported_type(
            "decimal scale requires a precision",
        )),
        (Some(p), _) if p == 0 || p > 38 => Err(RenderError::unsupported_type(format!(
            "decimal precision {p} is outside 1..=38"
        ))),
        (Some(p), Some(s)) if s > p => Err(RenderError::unsupported_type(format!(
            "decimal scale {s} exceeds precision {p}"
        ))),
        (Some(p), Some(s)) => Ok(Some(format!("{p}, {s}"))),
        (Some(p), None) => Ok(Some(p.to_string())),
    }
}

/// Platform-generated default values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generator {
    /// Current timestamp.
    Now,
    /// Random identifier.
    NewId,
    /// Sequential identifier.
    NewSequentialId,
}

impl Generator {
    /// All generators, in the order the catalog statements test for them.
    pub const ALL: [Self; 3] = [Self::Now, Self::NewId, Self::NewSequentialId];

    /// Returns the SQL expression of the generator.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Now => "GETDATE()",
            Self::NewId => "NEWID()",
            Self::NewSequentialId => "NEWSEQUENTIALID()",
        }
    }

    /// Returns the expression as the catalog stores it in `OBJECT_DEFINITION`.
    #[must_use]
    pub fn catalog_definition(self) -> String {
        format!("({})", self.sql())
    }
}

/// Collapses storage-compatible catalog type codes to one comparable code.
#[must_use]
pub fn normalize_type_code(code: i32) -> i32 {
    type_code::NORMALIZED
        .iter()
        .find(|(from, _)| *from == code)
        .map_or(code, |(_, to)| *to)
}

/// Returns `true` when the catalog reports `max_length` in bytes of two-byte characters.
#[must_use]
pub fn is_double_width(code: i32) -> bool {
    type_code::DOUBLE_WIDTH.contains(&code)
}

/// In-process equivalent of the narrowing-conversion expression of the shared-columns statement.
///
/// The destination narrows when its code is strictly smaller than the largest
/// wide-family code among the sources.
#[must_use]
pub fn is_narrowing_conversion(destination_code: i32, source_codes: &[i32]) -> bool {
    source_codes
        .iter()
        .copied()
        .filter(|code| type_code::WIDE_FAMILY.contains(code))
        .max()
        .is_some_and(|widest| destination_code < widest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(ty: impl Into<ColumnType>, length: Option<u32>) -> String {
        physical_type(ty.into(), length, None, None).unwrap().to_string()
    }

    #[test]
    fn test_clr_mapping() {
        assert_eq!(render(ClrType::Guid, None), "uniqueidentifier");
        assert_eq!(render(ClrType::String, Some(500)), "nvarchar (500)");
        assert_eq!(render(ClrType::String, None), "nvarchar (MAX)");
        assert_eq!(render(ClrType::Bool, None), "bit");
        assert_eq!(render(ClrType::DateTime, None), "datetime");
        assert_eq!(render(ClrType::Double, None), "float");
        assert_eq!(render(ClrType::ByteArray, None), "varbinary (MAX)");
    }

    #[test]
    fn test_length_limits() {
        assert_eq!(render(SqlDbType::NVarChar, Some(5000)), "nvarchar (MAX)");
        assert_eq!(render(SqlDbType::VarChar, Some(8000)), "varchar (8000)");
        assert_eq!(render(SqlDbType::Char, None), "char");
        assert!(physical_type(SqlDbType::NChar.into(), Some(4001), None, None).is_err());
        assert!(physical_type(SqlDbType::NVarChar.into(), Some(0), None, None).is_err());
        assert!(matches!(
            physical_type(SqlDbType::Int.into(), Some(5), None, None),
            Err(RenderError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_decimal_facets() {
        let ty = ColumnType::Clr(ClrType::Decimal);
        assert_eq!(
            physical_type(ty, None, Some(5), None).unwrap().to_string(),
            "decimal (5)"
        );
        assert_eq!(
            physical_type(ty, None, Some(5), Some(1)).unwrap().to_string(),
            "decimal (5, 1)"
        );
        assert_eq!(physical_type(ty, None, None, None).unwrap().to_string(), "decimal");
        assert!(physical_type(ty, None, None, Some(2)).is_err());
        assert!(physical_type(ty, None, Some(39), None).is_err());
        assert!(physical_type(ty, None, Some(4), Some(5)).is_err());
        assert!(physical_type(ClrType::Int32.into(), None, Some(4), None).is_err());
    }

    #[test]
    fn test_system_type_ids_round_trip() {
        for ty in [
            SqlDbType::BigInt,
            SqlDbType::Bit,
            SqlDbType::DateTime,
            SqlDbType::NVarChar,
            SqlDbType::UniqueIdentifier,
            SqlDbType::Xml,
        ] {
            assert_eq!(SqlDbType::from_system_type_id(ty.system_type_id()), Some(ty));
        }
        assert_eq!(SqlDbType::from_system_type_id(108), Some(SqlDbType::Decimal));
        assert_eq!(SqlDbType::from_system_type_id(1), None);
    }

    #[test]
    fn test_generators() {
        assert_eq!(Generator::Now.sql(), "GETDATE()");
        assert_eq!(Generator::NewSequentialId.catalog_definition(), "(NEWSEQUENTIALID())");
    }

    #[test]
    fn test_normalize_type_code() {
        assert_eq!(normalize_type_code(type_code::VARCHAR), type_code::NVARCHAR);
        assert_eq!(normalize_type_code(type_code::CHAR), type_code::NCHAR);
        assert_eq!(normalize_type_code(type_code::TEXT), type_code::NTEXT);
        assert_eq!(normalize_type_code(56), 56);
        assert!(is_double_width(type_code::NVARCHAR));
        assert!(!is_double_width(type_code::VARCHAR));
    }

    #[test]
    fn test_narrowing_monotonicity() {
        let sources = [type_code::NVARCHAR, type_code::VARCHAR, type_code::VARCHAR];
        assert!(is_narrowing_conversion(type_code::VARCHAR, &sources));
        assert!(!is_narrowing_conversion(type_code::NVARCHAR, &sources));
        assert!(!is_narrowing_conversion(56, &[56, 56]));
    }
}
