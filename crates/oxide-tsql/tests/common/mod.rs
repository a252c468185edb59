#![allow(dead_code)]

use oxide_tsql::{
    Projection, RenderError, SchemaWriter, Select, SelectWriter, SqlValue, Statement,
};

pub const TABLE: &str = "some_table_in_the_db";

/// The column listing of `SchemaWriter::table_columns_statement` without its filter.
pub const COLUMNS_QUERY: &str = "SELECT [SC].[name], [SC].[system_type_id], CAST(CASE WHEN [SC].[system_type_id] IN (239, 231, 99) THEN [SC].[max_length] / 2 ELSE [SC].[max_length] END AS smallint) AS [max_length], [SC].[is_nullable], [SC].[is_identity], \
CAST((CASE OBJECT_DEFINITION([SC].[default_object_id]) WHEN '(GETDATE())' THEN 1 WHEN '(NEWID())' THEN 1 WHEN '(NEWSEQUENTIALID())' THEN 1 ELSE 0 END) AS bit) AS [is_auto_generated], \
CASE OBJECT_DEFINITION([SC].[default_object_id]) WHEN '(GETDATE())' THEN NULL WHEN '(NEWID())' THEN NULL WHEN '(NEWSEQUENTIALID())' THEN NULL ELSE REPLACE(REPLACE(OBJECT_DEFINITION([SC].[default_object_id]), '(', ''), ')', '') END AS [default_value], \
ISNULL([SI].[is_primary_key], 0) AS [is_primary_key], CAST((CASE [SI].[type] WHEN 1 THEN 1 ELSE 0 END) AS bit) AS [is_primary_key_clustered], [SC].[precision], [SC].[scale], [SCC].[definition] AS [computation], [SCC].[is_persisted] AS [persisted_computation] \
FROM ( ( ( [sys].[columns] [SC] LEFT JOIN [sys].[index_columns] [SIC] ON [SC].[column_id] = [SIC].[column_id] AND [SC].[object_id] = [SIC].[object_id] ) LEFT JOIN [sys].[indexes] [SI] ON [SI].[index_id] = [SIC].[index_id] AND \
[SI].[object_id] = [SIC].[object_id] ) LEFT JOIN [sys].[computed_columns] [SCC] ON [SC].[column_id] = [SCC].[column_id] AND [SC].[object_id] = [SCC].[object_id] )";

pub fn schema() -> SchemaWriter {
    SchemaWriter::new()
}

pub fn render(select: &Select) -> Statement {
    SelectWriter::new()
        .create_statement(select)
        .unwrap_or_else(|e| panic!("Failed to render: {select:?}\nError: {e}"))
}

pub fn render_err(select: &Select) -> RenderError {
    SelectWriter::new()
        .create_statement(select)
        .expect_err(&format!("Expected render error for: {select:?}"))
}

/// Parameter values in binding order.
pub fn values(statement: &Statement) -> Vec<SqlValue> {
    statement.parameters.iter().map(|p| p.value.clone()).collect()
}

/// The per-table listing of the union columns statement.
pub fn listing(table: &str) -> String {
    format!(
        "SELECT [name], CASE [system_type_id] WHEN 167 THEN 231 WHEN 175 THEN 239 WHEN 35 THEN 99 ELSE [system_type_id] END AS [system_type_id], \
         CASE [user_type_id] WHEN 167 THEN 231 WHEN 175 THEN 239 WHEN 35 THEN 99 ELSE [user_type_id] END AS [user_type_id] \
         FROM [sys].[columns] WHERE [object_id] = OBJECT_ID(N'{table}')"
    )
}

/// `XLIST_1` unioned with `XLIST_2` (top 5) and `XLIST_3` (skip 4, ordered).
pub fn three_table_union() -> Select {
    Select::from_queries(vec![
        Select::from_table("XLIST_1"),
        Select::from_queries(vec![
            Select::from_table("XLIST_2").top(5),
            Select::from_table("XLIST_3")
                .skip(4)
                .order_by(Projection::field("Active")),
        ]),
    ])
}
