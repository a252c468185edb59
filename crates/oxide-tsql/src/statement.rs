//! Rendered statements.
//!
//! A [`Statement`] is a plain value: SQL text, its bound parameters and the
//! result shape the execution layer should expect. It carries no live
//! resource and may be cloned, serialized or executed any number of times.

use serde::{Deserialize, Serialize};

use crate::value::{Parameter, ToSqlValue};

/// The result shape a statement produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultType {
    /// No rows are expected.
    None,
    /// A single value.
    Scalar,
    /// One row; `or_none` allows zero rows.
    Single {
        /// Whether an empty result is a valid outcome.
        or_none: bool,
    },
    /// Any number of rows.
    Multiple,
}

/// How the statement text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatementType {
    /// Ad-hoc SQL text.
    #[default]
    Text,
    /// The text is the name of a stored procedure.
    StoredProcedure,
}

/// A rendered statement ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// SQL text, or the procedure name for stored procedures.
    pub text: String,
    /// Ordered parameter bindings.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Expected result shape.
    pub result: ResultType,
    /// Interpretation of `text`.
    #[serde(default)]
    pub kind: StatementType,
}

impl Statement {
    /// Creates a text statement without parameters.
    #[must_use]
    pub fn new(text: impl Into<String>, result: ResultType) -> Self {
        Self {
            text: text.into(),
            parameters: vec![],
            result,
            kind: StatementType::Text,
        }
    }

    /// Replaces the parameter list.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Builder for stored procedure invocations.
///
/// ```rust
/// use oxide_tsql::{ResultType, StoredProcedure, StatementType};
///
/// let statement = StoredProcedure::new("dbo.archive_orders")
///     .parameter("before", 2024)
///     .returns(ResultType::Scalar)
///     .build();
///
/// assert_eq!(statement.kind, StatementType::StoredProcedure);
/// assert_eq!(statement.parameters[0].name, "@before");
/// ```
#[derive(Debug, Clone)]
pub struct StoredProcedure {
    name: String,
    parameters: Vec<Parameter>,
    result: ResultType,
}

impl StoredProcedure {
    /// Starts an invocation of the named procedure.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: vec![],
            result: ResultType::None,
        }
    }

    /// Binds a named parameter. The `@` prefix is added when missing.
    #[must_use]
    pub fn parameter(mut self, name: &str, value: impl ToSqlValue) -> Self {
        let name = if name.starts_with('@') {
            String::from(name)
        } else {
            format!("@{name}")
        };
        self.parameters.push(Parameter::new(name, value));
        self
    }

    /// Declares the result shape of the procedure.
    #[must_use]
    pub const fn returns(mut self, result: ResultType) -> Self {
        self.result = result;
        self
    }

    /// Builds the statement.
    #[must_use]
    pub fn build(self) -> Statement {
        Statement {
            text: self.name,
            parameters: self.parameters,
            result: self.result,
            kind: StatementType::StoredProcedure,
        }
    }
}
