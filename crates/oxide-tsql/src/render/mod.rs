//! Statement rendering.
//!
//! Every renderer builds its text with a [`SqlWriter`], which owns the
//! parameter list of the statement being rendered. Nested queries share the
//! writer of their parent, so parameters are numbered `@p0, @p1, ...` in
//! text order across the whole statement.

mod expr;
mod reconcile;
mod schema;
mod select;

pub use schema::SchemaWriter;
pub use select::SelectWriter;

use crate::dialect::Dialect;
use crate::model::Table;
use crate::value::{Parameter, SqlValue};

/// Alias given to every derived table.
pub(crate) const SUBQUERY_ALIAS: &str = "__SubQuery__";

/// Accumulates parameters while statement text is assembled.
pub(crate) struct SqlWriter<'d, D: Dialect> {
    dialect: &'d D,
    parameters: Vec<Parameter>,
}

impl<'d, D: Dialect> SqlWriter<'d, D> {
    pub(crate) const fn new(dialect: &'d D) -> Self {
        Self {
            dialect,
            parameters: vec![],
        }
    }

    /// Binds a value and returns its placeholder.
    pub(crate) fn bind(&mut self, value: SqlValue) -> String {
        let name = self.dialect.parameter_name(self.parameters.len());
        self.parameters.push(Parameter {
            name: name.clone(),
            value,
        });
        name
    }

    pub(crate) fn quote(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    /// `[schema].[name]` or `[name]`.
    pub(crate) fn table(&self, table: &Table) -> String {
        match &table.schema {
            Some(schema) => format!("{}.{}", self.quote(schema), self.quote(&table.name)),
            None => self.quote(&table.name),
        }
    }

    /// `OBJECT_ID(N'<object name>')`.
    pub(crate) fn object_id(&self, table: &Table) -> String {
        format!(
            "OBJECT_ID({})",
            self.dialect.unicode_literal(&table.object_name())
        )
    }

    pub(crate) fn literal(&self, value: &str) -> String {
        self.dialect.string_literal(value)
    }

    /// Wraps a query as the derived table `(<query>) [__SubQuery__]`.
    pub(crate) fn derived(&self, query: &str) -> String {
        format!("({query}) {}", self.quote(SUBQUERY_ALIAS))
    }

    pub(crate) fn into_parameters(self) -> Vec<Parameter> {
        self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::TSqlDialect;

    #[test]
    fn test_bind_numbers_in_order() {
        let dialect = TSqlDialect::new();
        let mut writer = SqlWriter::new(&dialect);
        assert_eq!(writer.bind(SqlValue::Int(1)), "@p0");
        assert_eq!(writer.bind(SqlValue::Bool(true)), "@p1");

        let parameters = writer.into_parameters();
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[1].value, SqlValue::Bool(true));
    }

    #[test]
    fn test_table_names() {
        let dialect = TSqlDialect::new();
        let writer = SqlWriter::new(&dialect);
        assert_eq!(writer.table(&Table::new("users")), "[users]");
        assert_eq!(
            writer.table(&Table::qualified("dbo", "users")),
            "[dbo].[users]"
        );
        assert_eq!(
            writer.object_id(&Table::qualified("dbo", "users")),
            "OBJECT_ID(N'dbo.users')"
        );
        assert_eq!(writer.derived("SELECT 1"), "(SELECT 1) [__SubQuery__]");
    }
}
