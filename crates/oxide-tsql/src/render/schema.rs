//! DDL, catalog checks and metadata statements.

use std::collections::HashSet;

use tracing::debug;

use super::SqlWriter;
use crate::dialect::{Dialect, TSqlDialect};
use crate::error::{RenderError, Result};
use crate::model::{Column, ColumnKind, DefaultValue, Index, IndexColumn, KeyType, Select, Table};
use crate::statement::{ResultType, Statement};
use crate::types::{physical_type, type_code, ColumnType, Generator, SqlDbType};

/// Renders schema operations and catalog queries for SQL Server.
///
/// Drops are always guarded by an existence check, so dropping an object
/// that is not there is a no-op.
///
/// ```rust
/// use oxide_tsql::{ClrType, Column, SchemaWriter};
///
/// let writer = SchemaWriter::new();
/// let statement = writer
///     .create_table_statement("users", &[Column::new("Id", ClrType::Int32).primary_key().identity()])
///     .unwrap();
///
/// assert_eq!(
///     statement.text,
///     "CREATE TABLE [users] ([Id] int IDENTITY(1,1) NOT NULL, \
///      CONSTRAINT [PK_users_Id] PRIMARY KEY ([Id] ASC))"
/// );
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaWriter<D: Dialect = TSqlDialect> {
    pub(super) dialect: D,
}

impl SchemaWriter<TSqlDialect> {
    /// Creates a writer for SQL Server.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dialect: TSqlDialect::new(),
        }
    }
}

impl<D: Dialect> SchemaWriter<D> {
    /// Creates a writer for the given dialect.
    #[must_use]
    pub const fn with_dialect(dialect: D) -> Self {
        Self { dialect }
    }

    pub(super) const fn writer(&self) -> SqlWriter<'_, D> {
        SqlWriter::new(&self.dialect)
    }

    // ==================== Tables ====================

    /// Renders `CREATE TABLE` with a named primary key constraint when any
    /// column has a key role.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidQuery`] for an empty or inconsistent
    /// column set and [`RenderError::UnsupportedType`] for unmappable types.
    pub fn create_table_statement(
        &self,
        table: impl Into<Table>,
        columns: &[Column],
    ) -> Result<Statement> {
        let table = table.into();
        let writer = self.writer();

        if columns.is_empty() {
            return Err(RenderError::invalid_query(format!(
                "table {table} has no columns"
            )));
        }
        let mut seen = HashSet::new();
        for column in columns {
            if !seen.insert(column.name.to_lowercase()) {
                return Err(RenderError::invalid_query(format!(
                    "column {} is declared twice",
                    column.name
                )));
            }
        }
        if columns.iter().filter(|c| c.identity).count() > 1 {
            return Err(RenderError::invalid_query(format!(
                "table {table} has more than one identity column"
            )));
        }

        let mut parts = Vec::with_capacity(columns.len() + 1);
        for column in columns {
            parts.push(column_clause(&writer, column)?);
        }
        if let Some(constraint) = primary_key_clause(&writer, &table, columns)? {
            parts.push(constraint);
        }

        let text = format!("CREATE TABLE {} ({})", writer.table(&table), parts.join(", "));
        Ok(self.finish(text, ResultType::None))
    }

    /// Renders a boolean scalar check for a table.
    #[must_use]
    pub fn table_exists_statement(&self, table: impl Into<Table>) -> Statement {
        let check = table_check(&self.writer(), &table.into());
        self.finish(exists_scalar(&check), ResultType::Scalar)
    }

    /// Renders `DROP TABLE` guarded by an existence check.
    #[must_use]
    pub fn drop_table_statement(&self, table: impl Into<Table>) -> Statement {
        let table = table.into();
        let writer = self.writer();
        let text = format!(
            "IF EXISTS ({}) DROP TABLE {}",
            table_check(&writer, &table),
            writer.table(&table)
        );
        self.finish(text, ResultType::None)
    }

    // ==================== Columns ====================

    /// Renders a boolean scalar check for a column.
    #[must_use]
    pub fn column_exists_statement(&self, table: impl Into<Table>, column: &str) -> Statement {
        let check = object_check(&self.writer(), "columns", &table.into(), column);
        self.finish(exists_scalar(&check), ResultType::Scalar)
    }

    /// Renders `ALTER TABLE ... ADD` with the same clause as `CREATE TABLE`.
    ///
    /// # Errors
    ///
    /// Returns the column clause errors of [`Self::create_table_statement`].
    pub fn add_column_statement(&self, table: impl Into<Table>, column: &Column) -> Result<Statement> {
        let table = table.into();
        let writer = self.writer();
        let text = format!(
            "ALTER TABLE {} ADD {}",
            writer.table(&table),
            column_clause(&writer, column)?
        );
        Ok(self.finish(text, ResultType::None))
    }

    /// Renders `ALTER TABLE ... DROP COLUMN` guarded by an existence check.
    #[must_use]
    pub fn drop_column_statement(&self, table: impl Into<Table>, column: &str) -> Statement {
        let table = table.into();
        let writer = self.writer();
        let text = format!(
            "IF EXISTS ({}) ALTER TABLE {} DROP COLUMN {}",
            object_check(&writer, "columns", &table, column),
            writer.table(&table),
            writer.quote(column)
        );
        self.finish(text, ResultType::None)
    }

    // ==================== Indexes ====================

    /// Renders a boolean scalar check for an index.
    #[must_use]
    pub fn index_exists_statement(&self, table: impl Into<Table>, index: &str) -> Statement {
        let check = object_check(&self.writer(), "indexes", &table.into(), index);
        self.finish(exists_scalar(&check), ResultType::Scalar)
    }

    /// Renders `CREATE NONCLUSTERED INDEX` named `IX_<table>_<columns>`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidQuery`] when no column is given.
    pub fn add_non_clustered_index_statement(
        &self,
        table: impl Into<Table>,
        columns: impl IntoIterator<Item = IndexColumn>,
    ) -> Result<Statement> {
        self.add_index_statement(table, &Index::new(columns))
    }

    /// Renders `CREATE [UNIQUE] CLUSTERED|NONCLUSTERED INDEX`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidQuery`] when the index has no column.
    pub fn add_index_statement(&self, table: impl Into<Table>, index: &Index) -> Result<Statement> {
        let table = table.into();
        let writer = self.writer();
        if index.columns.is_empty() {
            return Err(RenderError::invalid_query(format!(
                "index on {table} has no columns"
            )));
        }

        let mut text = String::from("CREATE ");
        if index.unique {
            text.push_str("UNIQUE ");
        }
        text.push_str(if index.clustered {
            "CLUSTERED"
        } else {
            "NONCLUSTERED"
        });
        let columns: Vec<String> = index
            .columns
            .iter()
            .map(|c| format!("{} {}", writer.quote(&c.name), c.order.as_sql()))
            .collect();
        text.push_str(&format!(
            " INDEX {} ON {} ({})",
            writer.quote(&index.name_for(&table.name)),
            writer.table(&table),
            columns.join(", ")
        ));
        Ok(self.finish(text, ResultType::None))
    }

    /// Renders `DROP INDEX` guarded by an existence check.
    #[must_use]
    pub fn drop_index_statement(&self, table: impl Into<Table>, index: &str) -> Statement {
        let table = table.into();
        let writer = self.writer();
        let text = format!(
            "IF EXISTS ({}) DROP INDEX {} ON {}",
            object_check(&writer, "indexes", &table, index),
            writer.quote(index),
            writer.table(&table)
        );
        self.finish(text, ResultType::None)
    }

    // ==================== Metadata ====================

    /// Lists the columns of a table, one row per column (see
    /// [`ColumnInfo`](crate::introspect::ColumnInfo)).
    #[must_use]
    pub fn table_columns_statement(&self, table: impl Into<Table>) -> Statement {
        let writer = self.writer();
        let text = format!(
            "{} WHERE [SC].[object_id] = {}",
            columns_query(&writer),
            writer.object_id(&table.into())
        );
        self.finish(text, ResultType::Multiple)
    }

    /// Lists the columns of the first source table of `select` that are
    /// shared by every source table.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidQuery`] when the query has no source table.
    pub fn create_table_columns_statement(&self, select: &Select) -> Result<Statement> {
        let writer = self.writer();
        let first = select
            .source_tables()
            .into_iter()
            .next()
            .ok_or_else(|| RenderError::invalid_query("query has no source table"))?;
        let union = self.union_columns_text(select)?;
        let text = format!(
            "{} JOIN {} ON [__SubQuery__].[name] = [SC].[name] AND [SC].[object_id] = {}",
            columns_query(&writer),
            writer.derived(&union),
            writer.object_id(first)
        );
        Ok(self.finish(text, ResultType::Multiple))
    }

    /// Lists index columns of a table, one row per (index, column), ordered
    /// by index name (see [`IndexColumnInfo`](crate::introspect::IndexColumnInfo)).
    #[must_use]
    pub fn table_indexes_statement(&self, table: impl Into<Table>) -> Statement {
        let writer = self.writer();
        let text = format!(
            "SELECT [SI].[name] , [SI].[type] , [SI].[is_unique] , [SI].[is_primary_key] , \
             [SC].[name] AS [column_name] , [SIC].[is_descending_key] \
             FROM [sys].[indexes] [SI] \
             JOIN [sys].[index_columns] [SIC] ON [SI].[object_id] = [SIC].[object_id] AND [SI].[index_id] = [SIC].[index_id] \
             JOIN [sys].[columns] [SC] ON [SIC].[object_id] = [SC].[object_id] AND [SIC].[column_id] = [SC].[column_id] \
             WHERE [SI].[object_id] = {} ORDER BY [SI].[name]",
            writer.object_id(&table.into())
        );
        self.finish(text, ResultType::Multiple)
    }

    pub(super) fn finish(&self, text: String, result: ResultType) -> Statement {
        debug!(dialect = self.dialect.name(), sql = %text, result = ?result, "Rendered schema statement");
        Statement::new(text, result)
    }
}

fn exists_scalar(check: &str) -> String {
    format!("SELECT CAST(CASE WHEN EXISTS ({check}) THEN 1 ELSE 0 END AS bit)")
}

fn table_check<D: Dialect>(writer: &SqlWriter<'_, D>, table: &Table) -> String {
    let mut sql = format!(
        "SELECT * FROM [sys].[tables] WHERE [name] = {}",
        writer.literal(&table.name)
    );
    if let Some(schema) = &table.schema {
        sql.push_str(&format!(
            " AND [schema_id] = SCHEMA_ID({})",
            writer.literal(schema)
        ));
    }
    sql
}

/// Existence check for a named object (`columns`, `indexes`) of a table.
fn object_check<D: Dialect>(
    writer: &SqlWriter<'_, D>,
    view: &str,
    table: &Table,
    name: &str,
) -> String {
    format!(
        "SELECT * FROM [sys].[{view}] WHERE [object_id] = {} AND [name] = {}",
        writer.object_id(table),
        writer.literal(name)
    )
}

/// The column listing without its filter.
fn columns_query<D: Dialect>(writer: &SqlWriter<'_, D>) -> String {
    let double_width: Vec<String> = type_code::DOUBLE_WIDTH.iter().map(i32::to_string).collect();
    let definition = "OBJECT_DEFINITION([SC].[default_object_id])";
    let generated = |then: &str| -> String {
        Generator::ALL
            .iter()
            .map(|g| {
                format!(
                    "WHEN {} THEN {then}",
                    writer.literal(&g.catalog_definition())
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    };

    format!(
        "SELECT [SC].[name], [SC].[system_type_id], \
         CAST(CASE WHEN [SC].[system_type_id] IN ({double_width}) THEN [SC].[max_length] / 2 ELSE [SC].[max_length] END AS smallint) AS [max_length], \
         [SC].[is_nullable], [SC].[is_identity], \
         CAST((CASE {definition} {auto} ELSE 0 END) AS bit) AS [is_auto_generated], \
         CASE {definition} {nulls} ELSE REPLACE(REPLACE({definition}, '(', ''), ')', '') END AS [default_value], \
         ISNULL([SI].[is_primary_key], 0) AS [is_primary_key], \
         CAST((CASE [SI].[type] WHEN 1 THEN 1 ELSE 0 END) AS bit) AS [is_primary_key_clustered], \
         [SC].[precision], [SC].[scale], \
         [SCC].[definition] AS [computation], [SCC].[is_persisted] AS [persisted_computation] \
         FROM ( ( ( [sys].[columns] [SC] \
         LEFT JOIN [sys].[index_columns] [SIC] ON [SC].[column_id] = [SIC].[column_id] AND [SC].[object_id] = [SIC].[object_id] ) \
         LEFT JOIN [sys].[indexes] [SI] ON [SI].[index_id] = [SIC].[index_id] AND [SI].[object_id] = [SIC].[object_id] ) \
         LEFT JOIN [sys].[computed_columns] [SCC] ON [SC].[column_id] = [SCC].[column_id] AND [SC].[object_id] = [SCC].[object_id] )",
        double_width = double_width.join(", "),
        auto = generated("1"),
        nulls = generated("NULL"),
    )
}

/// Renders one column definition as used by `CREATE TABLE` and `ADD`.
fn column_clause<D: Dialect>(writer: &SqlWriter<'_, D>, column: &Column) -> Result<String> {
    let name = writer.quote(&column.name);

    let column_type = match &column.kind {
        ColumnKind::Computed {
            expression,
            persisted,
        } => {
            if column.identity {
                return Err(RenderError::invalid_query(format!(
                    "computed column {} cannot be an identity",
                    column.name
                )));
            }
            if column.default.is_some() {
                return Err(RenderError::invalid_query(format!(
                    "computed column {} cannot have a default",
                    column.name
                )));
            }
            let mut sql = format!("{name} AS ({expression})");
            if *persisted {
                sql.push_str(" PERSISTED NOT NULL");
            }
            return Ok(sql);
        }
        ColumnKind::Stored(column_type) => *column_type,
    };

    let physical = physical_type(column_type, column.length, column.precision, column.scale)?;
    let sql_type = column_type.sql_type();

    let mut sql = format!("{name} {physical}");
    if column.identity {
        if !sql_type.is_integer() {
            return Err(RenderError::unsupported_type(format!(
                "identity column {} must be an integer, not {sql_type}",
                column.name
            )));
        }
        if column.default.is_some() {
            return Err(RenderError::invalid_query(format!(
                "identity column {} cannot have a default",
                column.name
            )));
        }
        sql.push_str(" IDENTITY(1,1)");
    }
    sql.push_str(if column.nullable && !column.is_key() {
        " NULL"
    } else {
        " NOT NULL"
    });

    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        match default {
            DefaultValue::Value(value) if !value.has_literal() => {
                return Err(RenderError::unsupported_type(format!(
                    "column {} default {value:?} has no T-SQL literal",
                    column.name
                )));
            }
            DefaultValue::Value(value) => sql.push_str(&value.to_sql_inline()),
            DefaultValue::Generated(generator) => sql.push_str(generator.sql()),
            DefaultValue::Expression(expr) => sql.push_str(expr),
            DefaultValue::Auto => sql.push_str(auto_generator(column, column_type)?.sql()),
        }
    }
    Ok(sql)
}

/// Key identifiers are generated sequentially to keep clustered inserts ordered.
fn auto_generator(column: &Column, column_type: ColumnType) -> Result<Generator> {
    match column_type.sql_type() {
        SqlDbType::UniqueIdentifier if column.is_key() => Ok(Generator::NewSequentialId),
        SqlDbType::UniqueIdentifier => Ok(Generator::NewId),
        ty if ty.is_temporal() => Ok(Generator::Now),
        ty => Err(RenderError::unsupported_type(format!(
            "{ty} column {} cannot be generated automatically",
            column.name
        ))),
    }
}

/// `CONSTRAINT [PK_<table>_<sorted key names>] PRIMARY KEY [CLUSTERED] (...)`.
fn primary_key_clause<D: Dialect>(
    writer: &SqlWriter<'_, D>,
    table: &Table,
    columns: &[Column],
) -> Result<Option<String>> {
    let keys: Vec<&Column> = columns.iter().filter(|c| c.is_key()).collect();
    let Some(first) = keys.first() else {
        return Ok(None);
    };
    if keys.iter().any(|c| c.key != first.key) {
        return Err(RenderError::invalid_query(format!(
            "primary key of {table} mixes clustered and non-clustered columns"
        )));
    }

    let mut names: Vec<&str> = keys.iter().map(|c| c.name.as_str()).collect();
    names.sort_unstable();
    let constraint = format!("PK_{}_{}", table.name, names.join("_"));

    let key_columns: Vec<String> = keys
        .iter()
        .map(|c| format!("{} ASC", writer.quote(&c.name)))
        .collect();
    let clustered = if first.key == KeyType::ClusteredPrimaryKey {
        " CLUSTERED"
    } else {
        ""
    };
    Ok(Some(format!(
        "CONSTRAINT {} PRIMARY KEY{clustered} ({})",
        writer.quote(&constraint),
        key_columns.join(", ")
    )))
}
