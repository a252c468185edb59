//! # oxide-tsql
//!
//! A query-model compiler for Microsoft SQL Server.
//!
//! This crate provides:
//! - A dialect-neutral query model ([`Select`], predicate trees, projections)
//!   and schema descriptors ([`Column`], [`Index`], [`Table`])
//! - Deterministic rendering of both into T-SQL [`Statement`]s: text, bound
//!   parameters and the expected result shape
//! - Catalog statements for schema introspection, and column reconciliation
//!   across the source tables of multi-table queries with narrowing detection
//! - A schema diff producing guarded DDL, and the interface of the execution
//!   layer that runs statements
//!
//! Rendering is pure: the same input always yields the same statement, and
//! nothing here opens a connection.
//!
//! ## Rendering a query
//!
//! ```rust
//! use oxide_tsql::{Projection, ResultType, Select, SelectWriter};
//!
//! let select = Select::from_table("users")
//!     .filter(Projection::field("Name").eq("'; DROP TABLE users; --"))
//!     .first_or_default();
//!
//! let statement = SelectWriter::new().create_statement(&select).unwrap();
//!
//! assert_eq!(statement.text, "SELECT TOP (1) * FROM [users] WHERE [Name] = @p0");
//! assert_eq!(statement.result, ResultType::Single { or_none: true });
//! assert_eq!(statement.parameters[0].name, "@p0");
//! ```
//!
//! ## Schema changes
//!
//! ```rust
//! use oxide_tsql::{ClrType, Column, SchemaWriter};
//!
//! let writer = SchemaWriter::new();
//! let add = writer
//!     .add_column_statement("users", &Column::new("Created", ClrType::DateTime).auto_generated())
//!     .unwrap();
//! assert_eq!(add.text, "ALTER TABLE [users] ADD [Created] datetime NOT NULL DEFAULT GETDATE()");
//!
//! // Drops are guarded and never fail on a missing object.
//! let drop = writer.drop_column_statement("users", "Created");
//! assert!(drop.text.starts_with("IF EXISTS ("));
//! ```

pub mod dialect;
pub mod diff;
pub mod error;
pub mod exec;
pub mod introspect;
pub mod model;
pub mod render;
pub mod statement;
pub mod types;
pub mod value;

pub use diff::{DiffWarning, TableDiff};
pub use error::{RenderError, SchemaMismatchError};
pub use exec::{Command, CommandConfig, Connection, ExecError, Executor, Outcome, Row};
pub use introspect::{ColumnInfo, IndexColumnInfo, IndexInfo, SharedColumn, UnionColumn};
pub use model::{
    Column, ColumnKind, Comparison, Data, DefaultValue, Function, Index, IndexColumn, KeyType,
    OperationType, Operator, Order, OrderByProjection, Projection, Select, SelectProjection,
    SetOperation, Table, Target, Top, TopType,
};
pub use render::{SchemaWriter, SelectWriter};
pub use statement::{ResultType, Statement, StatementType, StoredProcedure};
pub use types::{ClrType, ColumnType, Generator, SqlDbType};
pub use value::{Parameter, SqlValue, ToSqlValue};
