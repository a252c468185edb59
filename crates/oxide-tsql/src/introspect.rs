//! Typed rows of the catalog statements.
//!
//! Field names match the columns projected by
//! [`SchemaWriter`](crate::SchemaWriter), so rows deserialize directly from a
//! name-keyed result row.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result, SchemaMismatchError};
use crate::model::{Column, DefaultValue, Index, IndexColumn, KeyType, Select};
use crate::types::SqlDbType;

/// `sys.indexes.type` of a clustered index.
const CLUSTERED_INDEX_TYPE: u8 = 1;

/// One row of the table columns statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub system_type_id: i32,
    /// Length in characters for unicode types; `-1` for `MAX`.
    pub max_length: i16,
    pub is_nullable: bool,
    pub is_identity: bool,
    /// The default is one of the platform generators.
    pub is_auto_generated: bool,
    /// Default expression with parentheses removed; `None` for generators.
    #[serde(default)]
    pub default_value: Option<String>,
    pub is_primary_key: bool,
    pub is_primary_key_clustered: bool,
    pub precision: u8,
    pub scale: u8,
    #[serde(default)]
    pub computation: Option<String>,
    #[serde(default)]
    pub persisted_computation: Option<bool>,
}

impl ColumnInfo {
    /// Rebuilds the column definition described by this row.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnsupportedType`] for an unknown type code.
    pub fn to_column(&self) -> Result<Column> {
        let key = match (self.is_primary_key, self.is_primary_key_clustered) {
            (false, _) => KeyType::None,
            (true, false) => KeyType::PrimaryKey,
            (true, true) => KeyType::ClusteredPrimaryKey,
        };

        if let Some(definition) = &self.computation {
            let mut column = Column::computed(&self.name, strip_parentheses(definition));
            if self.persisted_computation == Some(true) {
                column = column.persisted();
            }
            column.nullable = self.is_nullable;
            column.key = key;
            return Ok(column);
        }

        let sql_type = SqlDbType::from_system_type_id(self.system_type_id).ok_or_else(|| {
            RenderError::unsupported_type(format!(
                "column {} has unknown type code {}",
                self.name, self.system_type_id
            ))
        })?;

        let mut column = Column::new(&self.name, sql_type);
        if sql_type.has_length() {
            column.length = u32::try_from(self.max_length).ok();
        }
        if sql_type == SqlDbType::Decimal {
            column.precision = Some(self.precision);
            column.scale = Some(self.scale);
        }
        column.nullable = self.is_nullable;
        column.key = key;
        column.identity = self.is_identity;
        column.default = if self.is_auto_generated {
            Some(DefaultValue::Auto)
        } else {
            self.default_value.clone().map(DefaultValue::Expression)
        };
        Ok(column)
    }
}

/// The catalog wraps computed definitions in one pair of parentheses.
fn strip_parentheses(definition: &str) -> &str {
    definition
        .strip_prefix('(')
        .and_then(|d| d.strip_suffix(')'))
        .unwrap_or(definition)
}

/// One row of the table indexes statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumnInfo {
    /// Index name; `None` for heaps.
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub index_type: u8,
    pub is_unique: bool,
    pub is_primary_key: bool,
    pub column_name: String,
    pub is_descending_key: bool,
}

/// An index read back from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub index: Index,
    /// The index backs the primary key constraint.
    pub primary_key: bool,
}

/// Groups index rows by index name, keeping first-seen order.
#[must_use]
pub fn group_indexes(rows: &[IndexColumnInfo]) -> Vec<IndexInfo> {
    let mut indexes: Vec<IndexInfo> = vec![];
    for row in rows {
        let Some(name) = &row.name else { continue };
        let column = if row.is_descending_key {
            IndexColumn::descending(&row.column_name)
        } else {
            IndexColumn::new(&row.column_name)
        };
        match indexes
            .iter_mut()
            .find(|info| info.index.name.as_deref() == Some(name.as_str()))
        {
            Some(info) => info.index.columns.push(column),
            None => {
                let mut index = Index::new([column]).named(name);
                index.clustered = row.index_type == CLUSTERED_INDEX_TYPE;
                index.unique = row.is_unique;
                indexes.push(IndexInfo {
                    index,
                    primary_key: row.is_primary_key,
                });
            }
        }
    }
    indexes
}

/// One row of the union columns statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnionColumn {
    pub name: String,
    pub system_type_id: i32,
    pub user_type_id: i32,
}

/// One row of the shared columns statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharedColumn {
    pub name: String,
    /// Copying the widest source value into the destination may truncate it.
    #[serde(rename = "NarrowingConversion")]
    pub narrowing_conversion: bool,
}

/// Fails when the reconciliation of `select`'s source tables found no column.
///
/// # Errors
///
/// Returns [`SchemaMismatchError`] listing the source tables when `columns`
/// is empty.
pub fn ensure_shared_columns<T>(
    columns: Vec<T>,
    select: &Select,
) -> std::result::Result<Vec<T>, SchemaMismatchError> {
    if columns.is_empty() {
        return Err(SchemaMismatchError {
            tables: select
                .source_tables()
                .into_iter()
                .map(|t| t.object_name())
                .collect(),
        });
    }
    Ok(columns)
}
