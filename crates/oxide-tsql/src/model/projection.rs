//! Value expressions: field references, literals and function calls.

use serde::{Deserialize, Serialize};

use super::operator::{Comparison, Operator};
use crate::types::ColumnType;
use crate::value::{SqlValue, ToSqlValue};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Order {
    /// Ascending.
    #[default]
    Ascending,
    /// Descending.
    Descending,
}

impl Order {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A value expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Reference to a column of the source.
    Field(String),
    /// A literal value, bound as a parameter.
    Value(SqlValue),
    /// A function call.
    Function(Function),
}

/// Function calls over projections.
///
/// `StartsWith`, `EndsWith`, `Contains` and `In` are boolean and may be used
/// directly as predicates; the others produce values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Function {
    ToUpper(Box<Projection>),
    ToLower(Box<Projection>),
    Trim(Box<Projection>),
    Length(Box<Projection>),
    /// Zero-based `start`; `length` runs to the end of the text when absent.
    Substring {
        text: Box<Projection>,
        start: Box<Projection>,
        length: Option<Box<Projection>>,
    },
    Replace {
        text: Box<Projection>,
        search: Box<Projection>,
        replacement: Box<Projection>,
    },
    /// Zero-based position of `value` in `text`, `-1` when absent.
    IndexOf {
        text: Box<Projection>,
        value: Box<Projection>,
    },
    Concat(Vec<Projection>),
    Coalesce(Vec<Projection>),
    Convert {
        projection: Box<Projection>,
        to: ColumnType,
    },
    StartsWith {
        text: Box<Projection>,
        value: Box<Projection>,
    },
    EndsWith {
        text: Box<Projection>,
        value: Box<Projection>,
    },
    Contains {
        text: Box<Projection>,
        value: Box<Projection>,
    },
    In {
        projection: Box<Projection>,
        values: Vec<Projection>,
    },
}

impl Function {
    /// Returns `true` for functions that evaluate to a boolean condition.
    #[must_use]
    pub const fn is_predicate(&self) -> bool {
        matches!(
            self,
            Self::StartsWith { .. } | Self::EndsWith { .. } | Self::Contains { .. } | Self::In { .. }
        )
    }
}

impl Projection {
    /// Creates a field reference.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Creates a literal value.
    #[must_use]
    pub fn value<T: ToSqlValue>(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }

    fn compare<T: ToSqlValue>(self, op: Comparison, value: T) -> Operator {
        Operator::Comparison {
            op,
            left: self,
            right: Self::value(value),
        }
    }

    /// Creates an equality condition.
    #[must_use]
    pub fn eq<T: ToSqlValue>(self, value: T) -> Operator {
        self.compare(Comparison::Equal, value)
    }

    /// Creates an inequality condition.
    #[must_use]
    pub fn not_eq<T: ToSqlValue>(self, value: T) -> Operator {
        self.compare(Comparison::NotEqual, value)
    }

    /// Creates a greater-than condition.
    #[must_use]
    pub fn gt<T: ToSqlValue>(self, value: T) -> Operator {
        self.compare(Comparison::Greater, value)
    }

    /// Creates a greater-than-or-equal condition.
    #[must_use]
    pub fn gt_eq<T: ToSqlValue>(self, value: T) -> Operator {
        self.compare(Comparison::GreaterOrEqual, value)
    }

    /// Creates a less-than condition.
    #[must_use]
    pub fn lt<T: ToSqlValue>(self, value: T) -> Operator {
        self.compare(Comparison::Less, value)
    }

    /// Creates a less-than-or-equal condition.
    #[must_use]
    pub fn lt_eq<T: ToSqlValue>(self, value: T) -> Operator {
        self.compare(Comparison::LessOrEqual, value)
    }

    /// Creates a prefix match condition.
    #[must_use]
    pub fn starts_with<T: ToSqlValue>(self, value: T) -> Operator {
        Operator::Predicate(Self::Function(Function::StartsWith {
            text: Box::new(self),
            value: Box::new(Self::value(value)),
        }))
    }

    /// Creates a suffix match condition.
    #[must_use]
    pub fn ends_with<T: ToSqlValue>(self, value: T) -> Operator {
        Operator::Predicate(Self::Function(Function::EndsWith {
            text: Box::new(self),
            value: Box::new(Self::value(value)),
        }))
    }

    /// Creates a substring match condition.
    #[must_use]
    pub fn contains<T: ToSqlValue>(self, value: T) -> Operator {
        Operator::Predicate(Self::Function(Function::Contains {
            text: Box::new(self),
            value: Box::new(Self::value(value)),
        }))
    }

    /// Creates a membership condition.
    #[must_use]
    pub fn in_list<T: ToSqlValue>(self, values: Vec<T>) -> Operator {
        Operator::Predicate(Self::Function(Function::In {
            projection: Box::new(self),
            values: values.into_iter().map(Self::value).collect(),
        }))
    }

    /// Wraps the projection in `UPPER`.
    #[must_use]
    pub fn to_upper(self) -> Self {
        Self::Function(Function::ToUpper(Box::new(self)))
    }

    /// Wraps the projection in `LOWER`.
    #[must_use]
    pub fn to_lower(self) -> Self {
        Self::Function(Function::ToLower(Box::new(self)))
    }

    /// Treats the projection as a boolean condition.
    #[must_use]
    pub fn is_true(self) -> Operator {
        Operator::Predicate(self)
    }
}

/// An entry of the projection list, with an optional output alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectProjection {
    /// The projected expression.
    pub projection: Projection,
    /// Output column name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl SelectProjection {
    /// Creates an unaliased entry.
    #[must_use]
    pub const fn new(projection: Projection) -> Self {
        Self {
            projection,
            alias: None,
        }
    }

    /// Creates an aliased entry.
    #[must_use]
    pub fn aliased(projection: Projection, alias: impl Into<String>) -> Self {
        Self {
            projection,
            alias: Some(alias.into()),
        }
    }

    /// Name of the output column: the alias, or the field name.
    #[must_use]
    pub fn output_name(&self) -> Option<&str> {
        match (&self.alias, &self.projection) {
            (Some(alias), _) => Some(alias),
            (None, Projection::Field(name)) => Some(name),
            (None, _) => None,
        }
    }
}

impl From<Projection> for SelectProjection {
    fn from(projection: Projection) -> Self {
        Self::new(projection)
    }
}

/// An ordering term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByProjection {
    /// The sort key.
    pub projection: Projection,
    /// Sort direction.
    #[serde(default)]
    pub order: Order,
}

impl OrderByProjection {
    /// Ascending ordering on a projection.
    #[must_use]
    pub const fn ascending(projection: Projection) -> Self {
        Self {
            projection,
            order: Order::Ascending,
        }
    }

    /// Descending ordering on a projection.
    #[must_use]
    pub const fn descending(projection: Projection) -> Self {
        Self {
            projection,
            order: Order::Descending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name() {
        assert_eq!(
            SelectProjection::new(Projection::field("Name")).output_name(),
            Some("Name")
        );
        assert_eq!(
            SelectProjection::aliased(Projection::field("Name").to_upper(), "Upper").output_name(),
            Some("Upper")
        );
        assert_eq!(
            SelectProjection::new(Projection::field("Name").to_upper()).output_name(),
            None
        );
    }

    #[test]
    fn test_predicate_functions() {
        let starts = Projection::field("Name").starts_with("A");
        assert!(matches!(
            starts,
            Operator::Predicate(Projection::Function(ref f)) if f.is_predicate()
        ));
        assert!(!Function::Length(Box::new(Projection::field("Name"))).is_predicate());
    }
}
