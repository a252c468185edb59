//! SQL Dialect support.
//!
//! The renderers only ever target SQL Server, but the lexical rules they rely
//! on (identifier quoting, literal escaping, parameter naming) live behind this
//! trait so the writers never hard-code them.

mod tsql;

pub use tsql::TSqlDialect;

/// Trait for dialect-specific lexical rules.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// Returns the prefix used for named parameters.
    fn parameter_prefix(&self) -> &'static str {
        "@"
    }

    /// Returns the name of the `index`-th parameter of a statement.
    fn parameter_name(&self, index: usize) -> String {
        format!("{}p{index}", self.parameter_prefix())
    }

    /// Quotes an identifier, doubling any embedded closing quote.
    fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.identifier_quotes();
        let escaped = name.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    /// Renders a string literal, doubling embedded single quotes.
    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Renders a national (unicode) string literal.
    fn unicode_literal(&self, value: &str) -> String {
        format!("N{}", self.string_literal(value))
    }
}
