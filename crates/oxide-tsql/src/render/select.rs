//! SELECT rendering.

use std::borrow::Cow;

use tracing::debug;

use super::SqlWriter;
use crate::dialect::{Dialect, TSqlDialect};
use crate::error::{RenderError, Result};
use crate::model::{Data, Projection, Select, Target, Top, TopType};
use crate::statement::{ResultType, Statement};

/// Renders [`Select`] query models.
///
/// ```rust
/// use oxide_tsql::{Projection, Select, SelectWriter};
///
/// let select = Select::from_table("users")
///     .filter(Projection::field("Active").is_true())
///     .order_by(Projection::field("Name"))
///     .top(10);
///
/// let statement = SelectWriter::new().create_statement(&select).unwrap();
/// assert_eq!(
///     statement.text,
///     "SELECT TOP (10) * FROM [users] WHERE [Active] = 1 ORDER BY [Name] ASC"
/// );
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectWriter<D: Dialect = TSqlDialect> {
    dialect: D,
}

impl SelectWriter<TSqlDialect> {
    /// Creates a writer for SQL Server.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dialect: TSqlDialect::new(),
        }
    }
}

impl<D: Dialect> SelectWriter<D> {
    /// Creates a writer for the given dialect.
    #[must_use]
    pub const fn with_dialect(dialect: D) -> Self {
        Self { dialect }
    }

    /// Renders a query model into a statement.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidQuery`] for inconsistent models (paging
    /// without ordering, conflicting cardinality flags, ...), and the
    /// expression errors of any predicate or projection it contains.
    pub fn create_statement(&self, select: &Select) -> Result<Statement> {
        let mut writer = SqlWriter::new(&self.dialect);

        let text = match &select.target {
            Target::Query => writer.query(select)?,
            Target::Table(table) => {
                if select.count {
                    return Err(RenderError::invalid_query(
                        "a count cannot be copied into a table",
                    ));
                }
                let columns = insert_columns(select)?;
                let query = writer.query(select)?;
                let mut sql = format!("INSERT INTO {}", writer.table(table));
                if !columns.is_empty() {
                    let quoted: Vec<String> = columns.iter().map(|c| writer.quote(c)).collect();
                    sql.push_str(&format!(" ({})", quoted.join(", ")));
                }
                sql.push(' ');
                sql.push_str(&query);
                sql
            }
        };

        let statement =
            Statement::new(text, result_type(select)).with_parameters(writer.into_parameters());
        debug!(
            dialect = self.dialect.name(),
            result = ?statement.result,
            parameters = statement.parameters.len(),
            "Rendered select statement"
        );
        Ok(statement)
    }
}

fn result_type(select: &Select) -> ResultType {
    if matches!(select.target, Target::Table(_)) {
        ResultType::None
    } else if select.count {
        ResultType::Scalar
    } else if select.first {
        ResultType::Single { or_none: false }
    } else if select.first_or_default {
        ResultType::Single { or_none: true }
    } else {
        ResultType::Multiple
    }
}

/// Output column names for `INSERT INTO`; empty when every column is copied.
fn insert_columns(select: &Select) -> Result<Vec<String>> {
    if select.has_projection() {
        select
            .projection
            .iter()
            .map(|p| {
                p.output_name().map(String::from).ok_or_else(|| {
                    RenderError::invalid_query("copied expressions need an alias")
                })
            })
            .collect()
    } else if select.has_distinct() {
        select
            .distinct
            .iter()
            .map(|p| match p {
                Projection::Field(name) => Ok(name.clone()),
                _ => Err(RenderError::invalid_query(
                    "copied distinct keys must be fields",
                )),
            })
            .collect()
    } else {
        Ok(vec![])
    }
}

fn validate(select: &Select) -> Result<()> {
    if select.has_start() && !select.has_order_by() {
        return Err(RenderError::invalid_query(
            "skipping rows requires an ordering",
        ));
    }
    if select.has_start() && matches!(select.top, Some(Top { kind: TopType::Percent, .. })) {
        return Err(RenderError::invalid_query(
            "a percent top cannot be combined with skipped rows",
        ));
    }
    if let Some(Top {
        kind: TopType::Percent,
        value,
    }) = select.top
    {
        if value > 100 {
            return Err(RenderError::invalid_query(format!(
                "a percent top must be at most 100, not {value}"
            )));
        }
    }
    if select.first && select.first_or_default {
        return Err(RenderError::invalid_query(
            "first and first-or-default are exclusive",
        ));
    }
    if select.randomize && select.has_order_by() {
        return Err(RenderError::invalid_query(
            "random order cannot be combined with an ordering",
        ));
    }
    if select.has_distinct() && select.has_projection() {
        let projected: Vec<&Projection> = select.projection.iter().map(|p| &p.projection).collect();
        let distinct: Vec<&Projection> = select.distinct.iter().collect();
        if projected != distinct {
            return Err(RenderError::invalid_query(
                "distinct key and projection differ",
            ));
        }
    }
    if let Data::Query(queries) = &select.source {
        if queries.is_empty() {
            return Err(RenderError::invalid_query("query source is empty"));
        }
        if queries.iter().any(|q| matches!(q.target, Target::Table(_))) {
            return Err(RenderError::invalid_query(
                "nested queries cannot copy into a table",
            ));
        }
    }
    Ok(())
}

/// DISTINCT only sorts on columns of its select list.
fn validate_distinct_order(select: &Select) -> Result<()> {
    if !select.has_distinct() {
        return Ok(());
    }
    if select.randomize {
        return Err(RenderError::invalid_query(
            "distinct rows cannot be randomly ordered",
        ));
    }
    if let Some(item) = select
        .order_by
        .iter()
        .find(|item| !select.distinct.contains(&item.projection))
    {
        return Err(RenderError::invalid_query(format!(
            "ordering by {:?} requires it in the distinct key",
            item.projection
        )));
    }
    Ok(())
}

/// A derived table keeps its ordering only when TOP or OFFSET limits it.
fn derivable(select: &Select) -> Result<Cow<'_, Select>> {
    validate(select)?;
    let limited =
        select.has_top() || select.has_start() || select.first || select.first_or_default;
    if limited || !(select.has_order_by() || select.randomize) {
        return Ok(Cow::Borrowed(select));
    }
    let mut unordered = select.clone();
    unordered.order_by.clear();
    unordered.randomize = false;
    Ok(Cow::Owned(unordered))
}

impl<D: Dialect> SqlWriter<'_, D> {
    /// Renders a query without its copy target.
    pub(crate) fn query(&mut self, select: &Select) -> Result<String> {
        validate(select)?;

        if select.count {
            return self.count(select);
        }
        validate_distinct_order(select)?;

        // First and FirstOrDefault imply TOP (1), which also caps a larger explicit top.
        let top = if select.first || select.first_or_default {
            Some(Top {
                value: 1,
                kind: TopType::Count,
            })
        } else {
            select.top.filter(|_| select.has_top())
        };

        let mut sql = String::from("SELECT ");
        if select.has_distinct() {
            sql.push_str("DISTINCT ");
        }
        if let (Some(top), false) = (top, select.has_start()) {
            sql.push_str(&format!("TOP ({}) ", top.value));
            if top.kind == TopType::Percent {
                sql.push_str("PERCENT ");
            }
        }
        sql.push_str(&self.select_list(select)?);
        sql.push_str(" FROM ");
        sql.push_str(&self.source(select)?);
        self.push_where(&mut sql, select)?;

        if select.randomize {
            sql.push_str(" ORDER BY NEWID()");
        } else if select.has_order_by() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by(&select.order_by)?);
        }

        if select.has_start() {
            sql.push_str(&format!(" OFFSET {} ROWS", select.start));
            if let Some(top) = top {
                sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", top.value));
            }
        }
        Ok(sql)
    }

    /// `COUNT(*)` replaces the projection. Paging and distinct rows are
    /// counted over a derived table; otherwise the ordering is dropped.
    fn count(&mut self, select: &Select) -> Result<String> {
        if select.has_top() || select.has_start() || select.has_distinct() {
            let mut inner = select.clone();
            inner.count = false;
            inner.first = false;
            inner.first_or_default = false;
            let inner = self.query(&*derivable(&inner)?)?;
            return Ok(format!("SELECT COUNT(*) FROM {}", self.derived(&inner)));
        }

        let mut sql = String::from("SELECT COUNT(*) FROM ");
        sql.push_str(&self.source(select)?);
        self.push_where(&mut sql, select)?;
        Ok(sql)
    }

    fn select_list(&mut self, select: &Select) -> Result<String> {
        if select.has_projection() {
            let mut items = Vec::with_capacity(select.projection.len());
            for item in &select.projection {
                let rendered = self.projection(&item.projection)?;
                items.push(match &item.alias {
                    Some(alias) => format!("{rendered} AS {}", self.quote(alias)),
                    None => rendered,
                });
            }
            Ok(items.join(", "))
        } else if select.has_distinct() {
            let mut items = Vec::with_capacity(select.distinct.len());
            for projection in &select.distinct {
                items.push(self.projection(projection)?);
            }
            Ok(items.join(", "))
        } else {
            Ok(String::from("*"))
        }
    }

    fn push_where(&mut self, sql: &mut String, select: &Select) -> Result<()> {
        if let Some(filter) = &select.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicate(filter)?);
        }
        Ok(())
    }

    /// Renders the FROM source, including the set-operation chain.
    fn source(&mut self, select: &Select) -> Result<String> {
        let base = match &select.source {
            Data::Table(table) => self.table(table),
            Data::Query(queries) => {
                let mut parts = Vec::with_capacity(queries.len());
                for query in queries {
                    parts.push(if queries.len() > 1 {
                        self.operand(query)?
                    } else {
                        self.query(&*derivable(query)?)?
                    });
                }
                self.derived(&parts.join(" UNION ALL "))
            }
        };

        if !select.has_set_operations() {
            return Ok(base);
        }

        let mut chain = format!("SELECT * FROM {base}");
        for operation in &select.set_operations {
            chain.push(' ');
            chain.push_str(operation.operation.as_sql());
            chain.push(' ');
            chain.push_str(&self.operand(&operation.select)?);
        }
        Ok(self.derived(&chain))
    }

    /// Set operators reject ordered operands, so limited ones are wrapped.
    fn operand(&mut self, select: &Select) -> Result<String> {
        let select = derivable(select)?;
        let query = self.query(&select)?;
        if select.has_order_by() || select.randomize {
            Ok(format!("SELECT * FROM {}", self.derived(&query)))
        } else {
            Ok(query)
        }
    }
}
