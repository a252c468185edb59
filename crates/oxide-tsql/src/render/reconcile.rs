//! Column reconciliation across the source tables of a query.
//!
//! Two columns of different tables are the same column when their names and
//! normalized type codes match. The listing below collapses the legacy text
//! codes onto their unicode counterparts so INTERSECT compares type classes
//! rather than exact storage types.

use super::schema::SchemaWriter;
use super::SqlWriter;
use crate::dialect::Dialect;
use crate::error::{RenderError, Result};
use crate::model::{Select, Table};
use crate::statement::{ResultType, Statement};
use crate::types::type_code;

impl<D: Dialect> SchemaWriter<D> {
    /// Renders the names and normalized type codes of the columns shared by
    /// every source table of `select`, in source order.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidQuery`] when the query has no source table.
    pub fn union_columns_statement(&self, select: &Select) -> Result<Statement> {
        let text = self.union_columns_text(select)?;
        Ok(self.finish(text, ResultType::Multiple))
    }

    /// Renders the columns shared by every source table of `select` and the
    /// destination table `into`, each flagged with `NarrowingConversion`.
    ///
    /// A column narrows when its type code in `into` is smaller than the
    /// widest text-family code the source tables use for it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidQuery`] when the query has no source table.
    pub fn shared_columns_statement(
        &self,
        select: &Select,
        into: impl Into<Table>,
    ) -> Result<Statement> {
        let into = into.into();
        let writer = self.writer();
        let sources = select.source_tables();
        if sources.is_empty() {
            return Err(RenderError::invalid_query("query has no source table"));
        }

        let mut listings: Vec<String> = sources.iter().map(|t| listing(&writer, t)).collect();
        listings.push(listing(&writer, &into));

        let family: Vec<String> = type_code::WIDE_FAMILY.iter().map(i32::to_string).collect();
        let source_ids: Vec<String> = sources.iter().map(|t| writer.object_id(t)).collect();

        let text = format!(
            "SELECT [__SubQuery__].[name], \
             CAST(CASE WHEN [SC].[system_type_id] < (SELECT MAX([system_type_id]) FROM [sys].[columns] \
             WHERE [name] = [__SubQuery__].[name] AND [system_type_id] IN ({}) AND [object_id] IN ({})) \
             THEN 1 ELSE 0 END AS bit) AS [NarrowingConversion] \
             FROM {} JOIN [sys].[columns] [SC] ON [__SubQuery__].[name] = [SC].[name] AND [SC].[object_id] = {}",
            family.join(", "),
            source_ids.join(", "),
            writer.derived(&listings.join(" INTERSECT ")),
            writer.object_id(&into)
        );
        Ok(self.finish(text, ResultType::Multiple))
    }

    pub(super) fn union_columns_text(&self, select: &Select) -> Result<String> {
        let writer = self.writer();
        let sources = select.source_tables();
        if sources.is_empty() {
            return Err(RenderError::invalid_query("query has no source table"));
        }
        let listings: Vec<String> = sources.iter().map(|t| listing(&writer, t)).collect();
        Ok(listings.join(" INTERSECT "))
    }
}

/// Column names of one table with their normalized system and user type codes.
fn listing<D: Dialect>(writer: &SqlWriter<'_, D>, table: &Table) -> String {
    format!(
        "SELECT [name], {}, {} FROM [sys].[columns] WHERE [object_id] = {}",
        normalized("system_type_id"),
        normalized("user_type_id"),
        writer.object_id(table)
    )
}

fn normalized(column: &str) -> String {
    let cases: Vec<String> = type_code::NORMALIZED
        .iter()
        .map(|(from, to)| format!("WHEN {from} THEN {to}"))
        .collect();
    format!(
        "CASE [{column}] {} ELSE [{column}] END AS [{column}]",
        cases.join(" ")
    )
}
