//! Execution-layer interface.
//!
//! The renderers never touch a database. This module defines what they hand
//! off to: a [`Connection`] runs one [`Command`] at a time, and an
//! [`Executor`] owns a connection and maps results according to the
//! statement's [`ResultType`].
//!
//! Rows are name-keyed maps so that typed rows (such as the
//! [`introspect`](crate::introspect) structs) deserialize with `serde`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{RenderError, SchemaMismatchError};
use crate::introspect::{ensure_shared_columns, SharedColumn};
use crate::model::{Select, Table};
use crate::render::SchemaWriter;
use crate::statement::{ResultType, Statement};

/// A result row keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Command settings applied by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Command timeout in seconds.
    #[serde(default = "CommandConfig::default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl CommandConfig {
    const fn default_timeout_seconds() -> u64 {
        300
    }

    /// Creates a configuration with the given timeout.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout_seconds: timeout.as_secs(),
        }
    }

    /// Returns the command timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: Self::default_timeout_seconds(),
        }
    }
}

/// A statement bound to its execution settings.
#[derive(Debug, Clone, Copy)]
pub struct Command<'a> {
    pub statement: &'a Statement,
    pub timeout: Duration,
}

/// A live database connection.
///
/// Implementations bind `statement.parameters` by name and honor
/// `statement.kind` (ad-hoc text or stored procedure).
pub trait Connection {
    /// Driver error.
    type Error: std::error::Error + 'static;

    /// Runs a command that returns no rows; returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    fn execute(&mut self, command: &Command<'_>) -> Result<u64, Self::Error>;

    /// Runs a command and collects its rows.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    fn query(&mut self, command: &Command<'_>) -> Result<Vec<Row>, Self::Error>;
}

/// Errors of the execution layer.
#[derive(Debug, thiserror::Error)]
pub enum ExecError<E: std::error::Error + 'static> {
    /// The connection failed.
    #[error("Connection error: {0}")]
    Connection(#[source] E),

    /// A single row was required but none came back.
    #[error("Expected one row, got none")]
    NoRows,

    /// At most one row was expected.
    #[error("Expected at most one row, got {0}")]
    MultipleRows(usize),

    /// Column reconciliation found no shared column.
    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatchError),

    /// A statement could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A row did not match the requested type.
    #[error("Row decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The result of [`Executor::run`], shaped by the statement's result type.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Affected row count.
    Affected(u64),
    /// A single value; `None` for NULL or an empty result.
    Scalar(Option<Value>),
    /// A single row; `None` only for single-or-none statements.
    Row(Option<Row>),
    /// All rows.
    Rows(Vec<Row>),
}

/// Executes statements on an owned connection.
///
/// The connection is released when the executor is dropped, whichever way
/// the caller leaves.
pub struct Executor<C: Connection> {
    connection: C,
    config: CommandConfig,
}

impl<C: Connection> Executor<C> {
    /// Creates an executor over a connection.
    pub const fn new(connection: C, config: CommandConfig) -> Self {
        Self { connection, config }
    }

    /// Returns the command configuration.
    #[must_use]
    pub const fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Gives the connection back.
    pub fn into_inner(self) -> C {
        self.connection
    }

    fn command<'a>(&self, statement: &'a Statement) -> Command<'a> {
        debug!(
            sql = %statement.text,
            kind = ?statement.kind,
            parameters = statement.parameters.len(),
            timeout_seconds = self.config.timeout_seconds,
            "Executing statement"
        );
        Command {
            statement,
            timeout: self.config.timeout(),
        }
    }

    fn rows(&mut self, statement: &Statement) -> Result<Vec<Row>, ExecError<C::Error>> {
        let command = self.command(statement);
        self.connection.query(&command).map_err(ExecError::Connection)
    }

    /// Runs a statement that returns no rows.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Connection`] on driver failure.
    pub fn execute(&mut self, statement: &Statement) -> Result<u64, ExecError<C::Error>> {
        let command = self.command(statement);
        self.connection
            .execute(&command)
            .map_err(ExecError::Connection)
    }

    /// Returns the first column of the first row, `None` for NULL or no row.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Connection`] or [`ExecError::Decode`].
    pub fn execute_scalar<T: DeserializeOwned>(
        &mut self,
        statement: &Statement,
    ) -> Result<Option<T>, ExecError<C::Error>> {
        match scalar(self.rows(statement)?) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Returns exactly one row.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::NoRows`] or [`ExecError::MultipleRows`] when the
    /// row count is not one.
    pub fn execute_single<T: DeserializeOwned>(
        &mut self,
        statement: &Statement,
    ) -> Result<T, ExecError<C::Error>> {
        self.execute_single_or_none(statement)?
            .ok_or(ExecError::NoRows)
    }

    /// Returns one row, or `None` when the result is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::MultipleRows`] for more than one row.
    pub fn execute_single_or_none<T: DeserializeOwned>(
        &mut self,
        statement: &Statement,
    ) -> Result<Option<T>, ExecError<C::Error>> {
        match single(self.rows(statement)?)? {
            Some(row) => Ok(Some(serde_json::from_value(Value::Object(row))?)),
            None => Ok(None),
        }
    }

    /// Returns every row.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Connection`] or [`ExecError::Decode`].
    pub fn execute_many<T: DeserializeOwned>(
        &mut self,
        statement: &Statement,
    ) -> Result<Vec<T>, ExecError<C::Error>> {
        self.rows(statement)?
            .into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(ExecError::from))
            .collect()
    }

    /// Runs a statement and shapes its result by the statement's result type.
    ///
    /// # Errors
    ///
    /// Returns the errors of the matching `execute_*` method.
    pub fn run(&mut self, statement: &Statement) -> Result<Outcome, ExecError<C::Error>> {
        match statement.result {
            ResultType::None => self.execute(statement).map(Outcome::Affected),
            ResultType::Scalar => Ok(Outcome::Scalar(scalar(self.rows(statement)?))),
            ResultType::Single { or_none } => {
                let row = single(self.rows(statement)?)?;
                if row.is_none() && !or_none {
                    return Err(ExecError::NoRows);
                }
                Ok(Outcome::Row(row))
            }
            ResultType::Multiple => self.rows(statement).map(Outcome::Rows),
        }
    }

    /// Reconciles the source tables of `select` with the destination `into`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::SchemaMismatch`] when no column is shared.
    pub fn shared_columns(
        &mut self,
        select: &Select,
        into: impl Into<Table>,
    ) -> Result<Vec<SharedColumn>, ExecError<C::Error>> {
        let statement = SchemaWriter::new().shared_columns_statement(select, into)?;
        let columns = self.execute_many(&statement)?;
        Ok(ensure_shared_columns(columns, select)?)
    }
}

fn scalar(rows: Vec<Row>) -> Option<Value> {
    rows.into_iter()
        .next()
        .and_then(|row| row.into_iter().next())
        .map(|(_, value)| value)
        .filter(|value| !value.is_null())
}

fn single<E: std::error::Error + 'static>(rows: Vec<Row>) -> Result<Option<Row>, ExecError<E>> {
    if rows.len() > 1 {
        return Err(ExecError::MultipleRows(rows.len()));
    }
    Ok(rows.into_iter().next())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection lost")]
    struct Lost;

    /// Replays queued results and records what it was asked to run.
    #[derive(Default)]
    struct FakeConnection {
        results: VecDeque<Vec<Row>>,
        executed: Vec<(String, Duration)>,
        fail: bool,
    }

    impl FakeConnection {
        fn returning(rows: Vec<Value>) -> Self {
            let rows = rows
                .into_iter()
                .map(|v| match v {
                    Value::Object(map) => map,
                    other => panic!("not a row: {other}"),
                })
                .collect();
            Self {
                results: VecDeque::from([rows]),
                ..Self::default()
            }
        }
    }

    impl Connection for FakeConnection {
        type Error = Lost;

        fn execute(&mut self, command: &Command<'_>) -> Result<u64, Lost> {
            if self.fail {
                return Err(Lost);
            }
            self.executed
                .push((command.statement.text.clone(), command.timeout));
            Ok(1)
        }

        fn query(&mut self, command: &Command<'_>) -> Result<Vec<Row>, Lost> {
            if self.fail {
                return Err(Lost);
            }
            self.executed
                .push((command.statement.text.clone(), command.timeout));
            Ok(self.results.pop_front().unwrap_or_default())
        }
    }

    fn statement(result: ResultType) -> Statement {
        Statement::new("SELECT 1", result)
    }

    #[test]
    fn test_default_timeout_is_five_minutes() {
        assert_eq!(CommandConfig::default().timeout(), Duration::from_secs(300));
        let config: CommandConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CommandConfig::default());
    }

    #[test]
    fn test_timeout_reaches_connection() {
        let config = CommandConfig::with_timeout(Duration::from_secs(30));
        let mut executor = Executor::new(FakeConnection::default(), config);
        executor.execute(&statement(ResultType::None)).unwrap();
        let connection = executor.into_inner();
        assert_eq!(
            connection.executed,
            vec![(String::from("SELECT 1"), Duration::from_secs(30))]
        );
    }

    #[test]
    fn test_scalar() {
        let connection = FakeConnection::returning(vec![json!({"": true})]);
        let mut executor = Executor::new(connection, CommandConfig::default());
        let exists: Option<bool> = executor
            .execute_scalar(&statement(ResultType::Scalar))
            .unwrap();
        assert_eq!(exists, Some(true));

        let mut executor = Executor::new(FakeConnection::default(), CommandConfig::default());
        let missing: Option<bool> = executor
            .execute_scalar(&statement(ResultType::Scalar))
            .unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_single_cardinality() {
        let mut executor = Executor::new(FakeConnection::default(), CommandConfig::default());
        assert!(matches!(
            executor.execute_single::<Row>(&statement(ResultType::Single { or_none: false })),
            Err(ExecError::NoRows)
        ));

        let mut executor = Executor::new(FakeConnection::default(), CommandConfig::default());
        let none: Option<Row> = executor
            .execute_single_or_none(&statement(ResultType::Single { or_none: true }))
            .unwrap();
        assert!(none.is_none());

        let connection = FakeConnection::returning(vec![json!({"a": 1}), json!({"a": 2})]);
        let mut executor = Executor::new(connection, CommandConfig::default());
        assert!(matches!(
            executor.execute_single_or_none::<Row>(&statement(ResultType::Single { or_none: true })),
            Err(ExecError::MultipleRows(2))
        ));
    }

    #[test]
    fn test_run_dispatches_on_result_type() {
        let mut executor = Executor::new(FakeConnection::default(), CommandConfig::default());
        assert_eq!(
            executor.run(&statement(ResultType::None)).unwrap(),
            Outcome::Affected(1)
        );
        assert!(matches!(
            executor.run(&statement(ResultType::Single { or_none: false })),
            Err(ExecError::NoRows)
        ));

        let connection = FakeConnection::returning(vec![json!({"Id": 1})]);
        let mut executor = Executor::new(connection, CommandConfig::default());
        let Outcome::Rows(rows) = executor.run(&statement(ResultType::Multiple)).unwrap() else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_connection_errors_propagate() {
        let connection = FakeConnection {
            fail: true,
            ..FakeConnection::default()
        };
        let mut executor = Executor::new(connection, CommandConfig::default());
        let err = executor.execute(&statement(ResultType::None)).unwrap_err();
        assert_eq!(err.to_string(), "Connection error: connection lost");
    }

    #[test]
    fn test_shared_columns_mismatch() {
        let mut executor = Executor::new(FakeConnection::default(), CommandConfig::default());
        let select = Select::union(["a", "b"]);
        assert!(matches!(
            executor.shared_columns(&select, "c"),
            Err(ExecError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_shared_columns_decode() {
        let connection = FakeConnection::returning(vec![
            json!({"name": "Active", "NarrowingConversion": false}),
            json!({"name": "Name", "NarrowingConversion": true}),
        ]);
        let mut executor = Executor::new(connection, CommandConfig::default());
        let columns = executor
            .shared_columns(&Select::union(["a", "b"]), "c")
            .unwrap();
        assert_eq!(columns.len(), 2);
        assert!(columns[1].narrowing_conversion);
    }
}
