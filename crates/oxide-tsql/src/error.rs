//! Error types for statement rendering.

/// Errors raised while rendering a query model or schema descriptor.
///
/// Every variant is a deterministic function of the input: rendering the same
/// input again fails the same way. No partially rendered statement is ever
/// returned alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The logical type (or its length/precision/scale) has no SQL Server mapping.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A predicate or expression node has no rendering rule.
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// The query model or schema descriptor is structurally inconsistent.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl RenderError {
    pub(crate) fn unsupported_type(message: impl Into<String>) -> Self {
        Self::UnsupportedType(message.into())
    }

    pub(crate) fn unsupported_operator(message: impl Into<String>) -> Self {
        Self::UnsupportedOperator(message.into())
    }

    pub(crate) fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }
}

/// A column reconciliation returned no column shared by every source table.
///
/// Raised by the execution layer when the shared-columns catalog query
/// comes back empty; the renderer itself never sees live catalog state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Schema mismatch: no columns are shared by {}", .tables.join(", "))]
pub struct SchemaMismatchError {
    /// Tables that took part in the reconciliation, in source order.
    pub tables: Vec<String>,
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RenderError::unsupported_type("int (5)").to_string(),
            "Unsupported type: int (5)"
        );
        assert_eq!(
            RenderError::invalid_query("paging requires an ordering").to_string(),
            "Invalid query: paging requires an ordering"
        );
    }

    #[test]
    fn test_schema_mismatch_lists_tables() {
        let err = SchemaMismatchError {
            tables: vec![String::from("a"), String::from("b")],
        };
        assert_eq!(
            err.to_string(),
            "Schema mismatch: no columns are shared by a, b"
        );
    }
}
