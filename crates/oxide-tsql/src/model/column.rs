//! Column definitions.

use serde::{Deserialize, Serialize};

use crate::types::{ColumnType, Generator};
use crate::value::{SqlValue, ToSqlValue};

/// Primary key role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyType {
    /// Not part of the primary key.
    #[default]
    None,
    /// Part of a non-clustered primary key.
    PrimaryKey,
    /// Part of a clustered primary key.
    ClusteredPrimaryKey,
}

impl KeyType {
    /// Returns `true` for either primary key role.
    #[must_use]
    pub const fn is_key(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// How a column gets its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// A stored column with a physical type.
    Stored(ColumnType),
    /// A column computed from an expression over the row.
    ///
    /// Persisted computations are stored and always `NOT NULL`.
    Computed {
        /// Computation text, rendered inside `AS (...)`.
        expression: String,
        /// Whether the computed value is stored.
        persisted: bool,
    },
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// A literal value.
    Value(SqlValue),
    /// A platform generator (timestamp, identifiers).
    Generated(Generator),
    /// Raw SQL expression, e.g. a default read back from the catalog.
    Expression(String),
    /// Generated by the platform, with the generator chosen from the column type.
    Auto,
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Stored type or computation.
    pub kind: ColumnKind,
    /// Maximum length for character and binary types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Decimal precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
    /// Decimal scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,
    /// Whether the column allows NULL values.
    #[serde(default)]
    pub nullable: bool,
    /// Primary key role.
    #[serde(default)]
    pub key: KeyType,
    /// Whether the column is an `IDENTITY(1,1)` column.
    #[serde(default)]
    pub identity: bool,
    /// Default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

impl Column {
    /// Creates a stored, non-nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: impl Into<ColumnType>) -> Self {
        Self::with_kind(name, ColumnKind::Stored(column_type.into()))
    }

    /// Creates a non-persisted computed column.
    #[must_use]
    pub fn computed(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            ColumnKind::Computed {
                expression: expression.into(),
                persisted: false,
            },
        )
    }

    fn with_kind(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            length: None,
            precision: None,
            scale: None,
            nullable: false,
            key: KeyType::None,
            identity: false,
            default: None,
        }
    }

    /// Sets the maximum length.
    #[must_use]
    pub const fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets the decimal precision.
    #[must_use]
    pub const fn precision(mut self, precision: u8) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Sets the decimal scale.
    #[must_use]
    pub const fn scale(mut self, scale: u8) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Marks the column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the column as NOT NULL (default).
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Makes the column part of a non-clustered primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.key = KeyType::PrimaryKey;
        self.nullable = false; // Primary keys are implicitly NOT NULL
        self
    }

    /// Makes the column part of a clustered primary key.
    #[must_use]
    pub const fn clustered_primary_key(mut self) -> Self {
        self.key = KeyType::ClusteredPrimaryKey;
        self.nullable = false;
        self
    }

    /// Marks the column as `IDENTITY(1,1)`.
    #[must_use]
    pub const fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Lets the platform generate the value (timestamp or identifier).
    #[must_use]
    pub fn auto_generated(mut self) -> Self {
        self.default = Some(DefaultValue::Auto);
        self
    }

    /// Sets a literal default value.
    #[must_use]
    pub fn default_value<T: ToSqlValue>(mut self, value: T) -> Self {
        self.default = Some(DefaultValue::Value(value.to_sql_value()));
        self
    }

    /// Sets an explicit generator as default.
    #[must_use]
    pub fn default_generated(mut self, generator: Generator) -> Self {
        self.default = Some(DefaultValue::Generated(generator));
        self
    }

    /// Sets a raw SQL expression as default.
    #[must_use]
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Expression(expr.into()));
        self
    }

    /// Stores the computed value. No effect on stored columns.
    #[must_use]
    pub fn persisted(mut self) -> Self {
        if let ColumnKind::Computed { persisted, .. } = &mut self.kind {
            *persisted = true;
        }
        self
    }

    /// Returns the stored type, or `None` for computed columns.
    #[must_use]
    pub const fn stored_type(&self) -> Option<ColumnType> {
        match &self.kind {
            ColumnKind::Stored(ty) => Some(*ty),
            ColumnKind::Computed { .. } => None,
        }
    }

    /// Returns `true` if the column is computed.
    #[must_use]
    pub const fn is_computed(&self) -> bool {
        matches!(self.kind, ColumnKind::Computed { .. })
    }

    /// Returns `true` if the column is part of the primary key.
    #[must_use]
    pub const fn is_key(&self) -> bool {
        self.key.is_key()
    }

    /// Returns `true` if the value is produced by the platform on insert.
    #[must_use]
    pub fn is_auto_generated(&self) -> bool {
        matches!(
            self.default,
            Some(DefaultValue::Auto | DefaultValue::Generated(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClrType;

    #[test]
    fn test_defaults() {
        let column = Column::new("Name", ClrType::String);
        assert!(!column.nullable);
        assert_eq!(column.key, KeyType::None);
        assert!(!column.identity);
        assert!(column.default.is_none());
    }

    #[test]
    fn test_primary_key_forces_not_null() {
        let column = Column::new("Id", ClrType::Int32).nullable().primary_key();
        assert!(!column.nullable);
        assert!(column.is_key());
    }

    #[test]
    fn test_persisted_only_affects_computed() {
        let stored = Column::new("Value", ClrType::Int32).persisted();
        assert_eq!(stored.kind, ColumnKind::Stored(ClrType::Int32.into()));

        let computed = Column::computed("Value", "1 + 1").persisted();
        assert_eq!(
            computed.kind,
            ColumnKind::Computed {
                expression: String::from("1 + 1"),
                persisted: true
            }
        );
        assert!(computed.stored_type().is_none());
    }

    #[test]
    fn test_auto_generated() {
        assert!(Column::new("Id", ClrType::Guid).auto_generated().is_auto_generated());
        assert!(!Column::new("Active", ClrType::Bool)
            .default_value(true)
            .is_auto_generated());
    }
}
