//! SQL Server (T-SQL) dialect.

use super::Dialect;

/// Microsoft SQL Server dialect: bracket-quoted identifiers and `@`-prefixed parameters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TSqlDialect;

impl TSqlDialect {
    /// Creates a new T-SQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for TSqlDialect {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('[', ']')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tsql_dialect() {
        let dialect = TSqlDialect::new();
        assert_eq!(dialect.name(), "tsql");
        assert_eq!(dialect.identifier_quotes(), ('[', ']'));
        assert_eq!(dialect.parameter_name(0), "@p0");
        assert_eq!(dialect.parameter_name(12), "@p12");
    }

    #[test]
    fn test_quote_identifier_escapes_closing_bracket() {
        let dialect = TSqlDialect::new();
        assert_eq!(dialect.quote_identifier("Name"), "[Name]");
        assert_eq!(dialect.quote_identifier("odd]name"), "[odd]]name]");
    }

    #[test]
    fn test_literals_double_quotes() {
        let dialect = TSqlDialect::new();
        assert_eq!(dialect.string_literal("O'Brien"), "'O''Brien'");
        assert_eq!(dialect.unicode_literal("XLIST_1"), "N'XLIST_1'");
        assert_eq!(
            dialect.string_literal("'; DROP TABLE users; --"),
            "'''; DROP TABLE users; --'"
        );
    }
}
