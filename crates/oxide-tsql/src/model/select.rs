//! The SELECT query model.

use serde::{Deserialize, Serialize};

use super::operator::Operator;
use super::projection::{OrderByProjection, Projection, SelectProjection};
use super::table::Table;

/// How a TOP value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TopType {
    /// A row count.
    #[default]
    Count,
    /// A percentage of the rows.
    Percent,
}

/// A TOP clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Top {
    /// Row count or percentage.
    pub value: u32,
    /// Interpretation of `value`.
    #[serde(default)]
    pub kind: TopType,
}

/// Where rows come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Data {
    /// A table.
    Table(Table),
    /// Nested queries; several queries are concatenated with UNION ALL.
    Query(Vec<Select>),
}

/// What the query produces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Target {
    /// A result set (or a subquery when nested).
    #[default]
    Query,
    /// Rows copied into an existing table.
    Table(Table),
}

/// How a set operation combines with the rows before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    /// Keep rows present in both.
    Intersect,
    /// Keep rows of the base that are absent from the nested query.
    Complement,
}

impl OperationType {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Intersect => "INTERSECT",
            Self::Complement => "EXCEPT",
        }
    }
}

/// A nested query combined with the base result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperation {
    /// The combining operation.
    pub operation: OperationType,
    /// The nested query.
    pub select: Select,
}

/// A SELECT-like query.
///
/// An instance with no conditions (see [`Select::has_conditions`]) selects
/// every row of its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub source: Data,
    #[serde(default)]
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<Top>,
    /// Number of leading rows to skip.
    #[serde(default)]
    pub start: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub first_or_default: bool,
    #[serde(default)]
    pub count: bool,
    #[serde(default)]
    pub randomize: bool,
    /// Output expressions; empty selects every column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projection: Vec<SelectProjection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Operator>,
    /// Uniqueness key of the result.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distinct: Vec<Projection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderByProjection>,
    /// Applied to the base result in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_operations: Vec<SetOperation>,
}

impl Select {
    fn with_source(source: Data) -> Self {
        Self {
            source,
            target: Target::Query,
            top: None,
            start: 0,
            first: false,
            first_or_default: false,
            count: false,
            randomize: false,
            projection: vec![],
            filter: None,
            distinct: vec![],
            order_by: vec![],
            set_operations: vec![],
        }
    }

    /// Selects from a table.
    #[must_use]
    pub fn from_table(table: impl Into<Table>) -> Self {
        Self::with_source(Data::Table(table.into()))
    }

    /// Selects from nested queries (UNION ALL when there are several).
    #[must_use]
    pub fn from_queries(queries: Vec<Self>) -> Self {
        Self::with_source(Data::Query(queries))
    }

    /// Selects every row of several tables.
    #[must_use]
    pub fn union<T: Into<Table>>(tables: impl IntoIterator<Item = T>) -> Self {
        Self::from_queries(tables.into_iter().map(Self::from_table).collect())
    }

    /// Limits the result to `value` rows.
    #[must_use]
    pub const fn top(mut self, value: u32) -> Self {
        self.top = Some(Top {
            value,
            kind: TopType::Count,
        });
        self
    }

    /// Limits the result to `value` percent of the rows.
    #[must_use]
    pub const fn top_percent(mut self, value: u32) -> Self {
        self.top = Some(Top {
            value,
            kind: TopType::Percent,
        });
        self
    }

    /// Skips the first `start` rows.
    #[must_use]
    pub const fn skip(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    /// Requests exactly one row.
    #[must_use]
    pub const fn first(mut self) -> Self {
        self.first = true;
        self
    }

    /// Requests at most one row.
    #[must_use]
    pub const fn first_or_default(mut self) -> Self {
        self.first_or_default = true;
        self
    }

    /// Requests the row count.
    #[must_use]
    pub const fn count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Requests rows in random order.
    #[must_use]
    pub const fn randomize(mut self) -> Self {
        self.randomize = true;
        self
    }

    /// Adds an output expression.
    #[must_use]
    pub fn project(mut self, projection: impl Into<SelectProjection>) -> Self {
        self.projection.push(projection.into());
        self
    }

    /// Adds a condition, combined with any existing one using AND.
    #[must_use]
    pub fn filter(mut self, condition: Operator) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Sets the uniqueness key.
    #[must_use]
    pub fn distinct(mut self, key: Vec<Projection>) -> Self {
        self.distinct = key;
        self
    }

    /// Adds an ascending ordering term.
    #[must_use]
    pub fn order_by(mut self, projection: Projection) -> Self {
        self.order_by.push(OrderByProjection::ascending(projection));
        self
    }

    /// Adds a descending ordering term.
    #[must_use]
    pub fn order_by_desc(mut self, projection: Projection) -> Self {
        self.order_by.push(OrderByProjection::descending(projection));
        self
    }

    /// Keeps only rows also returned by `other`.
    #[must_use]
    pub fn intersect(mut self, other: Self) -> Self {
        self.set_operations.push(SetOperation {
            operation: OperationType::Intersect,
            select: other,
        });
        self
    }

    /// Keeps only rows not returned by `other`.
    #[must_use]
    pub fn except(mut self, other: Self) -> Self {
        self.set_operations.push(SetOperation {
            operation: OperationType::Complement,
            select: other,
        });
        self
    }

    /// Copies the result into a table instead of returning it.
    #[must_use]
    pub fn copy_to(mut self, table: impl Into<Table>) -> Self {
        self.target = Target::Table(table.into());
        self
    }

    #[must_use]
    pub const fn has_top(&self) -> bool {
        matches!(self.top, Some(Top { value, .. }) if value > 0)
    }

    #[must_use]
    pub const fn has_start(&self) -> bool {
        self.start > 0
    }

    #[must_use]
    pub fn has_projection(&self) -> bool {
        !self.projection.is_empty()
    }

    #[must_use]
    pub const fn has_where(&self) -> bool {
        self.filter.is_some()
    }

    #[must_use]
    pub fn has_distinct(&self) -> bool {
        !self.distinct.is_empty()
    }

    #[must_use]
    pub fn has_order_by(&self) -> bool {
        !self.order_by.is_empty()
    }

    #[must_use]
    pub fn has_set_operations(&self) -> bool {
        !self.set_operations.is_empty()
    }

    #[must_use]
    pub fn has_intersections(&self) -> bool {
        self.set_operations
            .iter()
            .any(|op| op.operation == OperationType::Intersect)
    }

    #[must_use]
    pub fn has_complements(&self) -> bool {
        self.set_operations
            .iter()
            .any(|op| op.operation == OperationType::Complement)
    }

    /// Returns `true` if any optional feature is populated.
    #[must_use]
    pub fn has_conditions(&self) -> bool {
        self.has_top()
            || self.has_start()
            || self.first
            || self.first_or_default
            || self.count
            || self.randomize
            || self.has_projection()
            || self.has_where()
            || self.has_distinct()
            || self.has_order_by()
            || self.has_set_operations()
    }

    /// Returns the tables feeding the result rows, in source order.
    ///
    /// Nested queries are flattened; set-operation operands only filter rows
    /// and are not included.
    #[must_use]
    pub fn source_tables(&self) -> Vec<&Table> {
        let mut tables = vec![];
        self.collect_source_tables(&mut tables);
        tables
    }

    fn collect_source_tables<'a>(&'a self, tables: &mut Vec<&'a Table>) {
        match &self.source {
            Data::Table(table) => tables.push(table),
            Data::Query(queries) => {
                for query in queries {
                    query.collect_source_tables(tables);
                }
            }
        }
    }
}
