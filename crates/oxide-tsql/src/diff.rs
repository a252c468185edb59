//! Schema diff between an introspected table and its desired definition.
//!
//! Only additive and subtractive changes become statements. Changes to an
//! existing column (type, nullability, key role, identity) are reported as
//! [`DiffWarning`]s because SQL Server cannot apply most of them without
//! rebuilding the table.

use tracing::warn;

use crate::error::Result;
use crate::introspect::IndexInfo;
use crate::model::{Column, Index, Table};
use crate::render::SchemaWriter;
use crate::statement::Statement;

/// A change the diff detected but does not turn into DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffWarning {
    /// The stored type (or computation) of a column changed.
    TypeChange {
        /// Column name.
        column: String,
    },
    /// The nullability of a column changed.
    NullabilityChange {
        /// Column name.
        column: String,
        /// Desired nullability.
        nullable: bool,
    },
    /// The primary key role of a column changed.
    KeyChange {
        /// Column name.
        column: String,
    },
    /// The identity flag of a column changed.
    IdentityChange {
        /// Column name.
        column: String,
        /// Desired identity flag.
        identity: bool,
    },
}

impl DiffWarning {
    /// Name of the affected column.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::TypeChange { column }
            | Self::NullabilityChange { column, .. }
            | Self::KeyChange { column }
            | Self::IdentityChange { column, .. } => column,
        }
    }
}

/// The changes needed to bring a table to its desired definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDiff {
    /// Columns missing from the table, in desired order.
    pub add_columns: Vec<Column>,
    /// Columns no longer desired.
    pub drop_columns: Vec<String>,
    /// Indexes missing from the table.
    pub add_indexes: Vec<Index>,
    /// Indexes no longer desired (or redefined).
    pub drop_indexes: Vec<String>,
    /// Changes that need manual attention.
    pub warnings: Vec<DiffWarning>,
}

impl TableDiff {
    /// Compares an introspected table with its desired definition.
    ///
    /// Names compare case-insensitively, like the default SQL Server
    /// collation. Primary key indexes are managed through the column key
    /// roles and never appear in the index changes.
    #[must_use]
    pub fn compute(
        table: &Table,
        existing_columns: &[Column],
        existing_indexes: &[IndexInfo],
        desired_columns: &[Column],
        desired_indexes: &[Index],
    ) -> Self {
        let mut diff = Self::default();

        for desired in desired_columns {
            match find_column(existing_columns, &desired.name) {
                Some(existing) => diff.compare_column(existing, desired),
                None => diff.add_columns.push(desired.clone()),
            }
        }
        for existing in existing_columns {
            if find_column(desired_columns, &existing.name).is_none() {
                diff.drop_columns.push(existing.name.clone());
            }
        }

        let existing_indexes: Vec<&Index> = existing_indexes
            .iter()
            .filter(|info| !info.primary_key)
            .map(|info| &info.index)
            .collect();
        for desired in desired_indexes {
            let name = desired.name_for(&table.name);
            match existing_indexes
                .iter()
                .find(|index| same_name(&index.name_for(&table.name), &name))
            {
                Some(existing) if same_definition(existing, desired) => {}
                Some(_) => {
                    diff.drop_indexes.push(name);
                    diff.add_indexes.push(desired.clone());
                }
                None => diff.add_indexes.push(desired.clone()),
            }
        }
        for existing in &existing_indexes {
            let name = existing.name_for(&table.name);
            if !desired_indexes
                .iter()
                .any(|desired| same_name(&desired.name_for(&table.name), &name))
            {
                diff.drop_indexes.push(name);
            }
        }

        for warning in &diff.warnings {
            warn!(table = %table, column = warning.column(), ?warning, "Column change needs a table rebuild");
        }
        diff
    }

    fn compare_column(&mut self, existing: &Column, desired: &Column) {
        let column = desired.name.clone();
        // Host type tags and native types compare by the native type they store as.
        let existing_type = existing.stored_type().map(|t| t.sql_type());
        let desired_type = desired.stored_type().map(|t| t.sql_type());
        if existing.is_computed() != desired.is_computed() || existing_type != desired_type {
            self.warnings.push(DiffWarning::TypeChange {
                column: column.clone(),
            });
        }
        if existing.nullable != desired.nullable && !desired.is_computed() {
            self.warnings.push(DiffWarning::NullabilityChange {
                column: column.clone(),
                nullable: desired.nullable,
            });
        }
        if existing.key != desired.key {
            self.warnings.push(DiffWarning::KeyChange {
                column: column.clone(),
            });
        }
        if existing.identity != desired.identity {
            self.warnings.push(DiffWarning::IdentityChange {
                column,
                identity: desired.identity,
            });
        }
    }

    /// Returns `true` when nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add_columns.is_empty()
            && self.drop_columns.is_empty()
            && self.add_indexes.is_empty()
            && self.drop_indexes.is_empty()
            && self.warnings.is_empty()
    }

    /// Renders the changes: index drops, column drops, column additions,
    /// then index additions.
    ///
    /// # Errors
    ///
    /// Returns the render errors of the added columns and indexes.
    pub fn statements(&self, table: impl Into<Table>) -> Result<Vec<Statement>> {
        let table = table.into();
        let writer = SchemaWriter::new();
        let mut statements = vec![];

        for index in &self.drop_indexes {
            statements.push(writer.drop_index_statement(&table, index));
        }
        for column in &self.drop_columns {
            statements.push(writer.drop_column_statement(&table, column));
        }
        for column in &self.add_columns {
            statements.push(writer.add_column_statement(&table, column)?);
        }
        for index in &self.add_indexes {
            statements.push(writer.add_index_statement(&table, index)?);
        }
        Ok(statements)
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn find_column<'a>(columns: &'a [Column], name: &str) -> Option<&'a Column> {
    columns.iter().find(|c| same_name(&c.name, name))
}

fn same_definition(existing: &Index, desired: &Index) -> bool {
    existing.clustered == desired.clustered
        && existing.unique == desired.unique
        && existing.columns.len() == desired.columns.len()
        && existing
            .columns
            .iter()
            .zip(&desired.columns)
            .all(|(a, b)| same_name(&a.name, &b.name) && a.order == b.order)
}
