//! Predicate trees.

use serde::{Deserialize, Serialize};

use super::projection::Projection;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Comparison {
    /// Returns the SQL operator symbol.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
        }
    }
}

/// A node of a predicate tree.
///
/// Precedence is carried by the tree shape alone: the renderer parenthesizes
/// every operand of a boolean connective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    /// Binary comparison of two projections.
    Comparison {
        op: Comparison,
        left: Projection,
        right: Projection,
    },
    /// Both operands hold.
    And(Box<Operator>, Box<Operator>),
    /// Either operand holds.
    Or(Box<Operator>, Box<Operator>),
    /// The operand does not hold.
    Not(Box<Operator>),
    /// A boolean projection: a bit field, a boolean literal or a predicate function.
    Predicate(Projection),
}

impl Operator {
    /// Combines with another condition using AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Combines with another condition using OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negates the condition.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}
