//! Index definitions.

use serde::{Deserialize, Serialize};

use super::projection::Order;

/// A column participating in an index, with its sort direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Sort direction.
    #[serde(default)]
    pub order: Order,
}

impl IndexColumn {
    /// Creates an ascending index column.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: Order::Ascending,
        }
    }

    /// Creates a descending index column.
    #[must_use]
    pub fn descending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: Order::Descending,
        }
    }

    /// Returns `true` for descending columns.
    #[must_use]
    pub fn is_descending(&self) -> bool {
        self.order == Order::Descending
    }
}

/// An index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Explicit name. Derived from the table and column names when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Indexed columns in key order.
    pub columns: Vec<IndexColumn>,
    /// Whether the index is clustered.
    #[serde(default)]
    pub clustered: bool,
    /// Whether the index enforces uniqueness.
    #[serde(default)]
    pub unique: bool,
}

impl Index {
    /// Creates an unnamed, non-clustered, non-unique index.
    #[must_use]
    pub fn new(columns: impl IntoIterator<Item = IndexColumn>) -> Self {
        Self {
            name: None,
            columns: columns.into_iter().collect(),
            clustered: false,
            unique: false,
        }
    }

    /// Sets an explicit name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Makes the index clustered.
    #[must_use]
    pub const fn clustered(mut self) -> Self {
        self.clustered = true;
        self
    }

    /// Makes the index unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Returns the explicit name, or `IX_<table>_<col1>_<col2>...`.
    #[must_use]
    pub fn name_for(&self, table: &str) -> String {
        self.name.clone().unwrap_or_else(|| {
            let mut name = format!("IX_{table}");
            for column in &self.columns {
                name.push('_');
                name.push_str(&column.name);
            }
            name
        })
    }
}
