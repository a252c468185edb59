//! oxide-tsql CLI
//!
//! Renders SQL Server statements from JSON table definitions and query
//! models. Nothing is executed: the output is meant for review, scripting or
//! piping into `sqlcmd`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_tsql::{Column, Index, IndexColumn, SchemaWriter, Select, SelectWriter, Statement, Table};

/// Render SQL Server statements from JSON documents.
#[derive(Parser)]
#[command(name = "oxide-tsql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format.
    #[arg(short, long, env = "OXIDE_TSQL_FORMAT", value_enum, default_value_t = Format::Sql)]
    format: Format,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// SQL text, with bound parameters listed as comments.
    Sql,
    /// The statements as JSON.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a table (and its indexes) from a table definition file.
    CreateTable {
        /// JSON table definition.
        file: PathBuf,
    },

    /// Add a column from a JSON column definition file.
    AddColumn {
        /// Table name, optionally `schema.table`.
        table: String,
        /// JSON column definition.
        file: PathBuf,
    },

    /// Drop a table if it exists.
    DropTable {
        /// Table name, optionally `schema.table`.
        table: String,
    },

    /// Drop a column if it exists.
    DropColumn {
        /// Table name, optionally `schema.table`.
        table: String,
        /// Column name.
        column: String,
    },

    /// Create an index.
    AddIndex {
        /// Table name, optionally `schema.table`.
        table: String,
        /// Indexed columns; append `:desc` for descending order.
        #[arg(required = true)]
        columns: Vec<String>,
        /// Index name (derived from the table and columns if omitted).
        #[arg(short, long)]
        name: Option<String>,
        /// Create a unique index.
        #[arg(long)]
        unique: bool,
        /// Create a clustered index.
        #[arg(long)]
        clustered: bool,
    },

    /// Drop an index if it exists.
    DropIndex {
        /// Table name, optionally `schema.table`.
        table: String,
        /// Index name.
        index: String,
    },

    /// Check whether a table, column or index exists.
    Exists {
        /// Table name, optionally `schema.table`.
        table: String,
        /// Check for this column instead of the table.
        #[arg(long, conflicts_with = "index")]
        column: Option<String>,
        /// Check for this index instead of the table.
        #[arg(long)]
        index: Option<String>,
    },

    /// List the columns of a table.
    Columns {
        /// Table name, optionally `schema.table`.
        table: String,
    },

    /// List the indexes of a table.
    Indexes {
        /// Table name, optionally `schema.table`.
        table: String,
    },

    /// Render a query model file.
    Select {
        /// JSON query model.
        file: PathBuf,
    },

    /// List the columns shared by several tables.
    SharedColumns {
        /// Source tables.
        #[arg(required = true)]
        tables: Vec<String>,
        /// Destination table; flags columns that would narrow when copied into it.
        #[arg(long)]
        into: Option<String>,
    },
}

/// A table definition file.
#[derive(Debug, Deserialize)]
struct TableDefinition {
    name: String,
    #[serde(default)]
    schema: Option<String>,
    columns: Vec<Column>,
    #[serde(default)]
    indexes: Vec<Index>,
}

impl TableDefinition {
    fn table(&self) -> Table {
        match &self.schema {
            Some(schema) => Table::qualified(schema, &self.name),
            None => Table::new(&self.name),
        }
    }
}

/// Parses `schema.table` or `table`.
fn parse_table(name: &str) -> Table {
    match name.split_once('.') {
        Some((schema, table)) => Table::qualified(schema, table),
        None => Table::new(name),
    }
}

/// Parses `column` or `column:asc|desc`.
fn parse_index_column(spec: &str) -> anyhow::Result<IndexColumn> {
    match spec.rsplit_once(':') {
        None => Ok(IndexColumn::new(spec)),
        Some((name, order)) if order.eq_ignore_ascii_case("asc") => Ok(IndexColumn::new(name)),
        Some((name, order)) if order.eq_ignore_ascii_case("desc") => {
            Ok(IndexColumn::descending(name))
        }
        Some((_, order)) => anyhow::bail!("Unknown sort order '{order}' in '{spec}'"),
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> anyhow::Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn render(command: &Commands) -> anyhow::Result<Vec<Statement>> {
    let schema = SchemaWriter::new();

    let statements = match command {
        Commands::CreateTable { file } => {
            let definition: TableDefinition = read_json(file)?;
            let table = definition.table();
            info!(table = %table, columns = definition.columns.len(), "Rendering table definition");
            let mut statements = vec![schema.create_table_statement(&table, &definition.columns)?];
            for index in &definition.indexes {
                statements.push(schema.add_index_statement(&table, index)?);
            }
            statements
        }
        Commands::AddColumn { table, file } => {
            let column: Column = read_json(file)?;
            vec![schema.add_column_statement(parse_table(table), &column)?]
        }
        Commands::DropTable { table } => vec![schema.drop_table_statement(parse_table(table))],
        Commands::DropColumn { table, column } => {
            vec![schema.drop_column_statement(parse_table(table), column)]
        }
        Commands::AddIndex {
            table,
            columns,
            name,
            unique,
            clustered,
        } => {
            let columns = columns
                .iter()
                .map(|c| parse_index_column(c))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let mut index = Index::new(columns);
            if let Some(name) = name {
                index = index.named(name);
            }
            if *unique {
                index = index.unique();
            }
            if *clustered {
                index = index.clustered();
            }
            vec![schema.add_index_statement(parse_table(table), &index)?]
        }
        Commands::DropIndex { table, index } => {
            vec![schema.drop_index_statement(parse_table(table), index)]
        }
        Commands::Exists {
            table,
            column,
            index,
        } => {
            let table = parse_table(table);
            vec![match (column, index) {
                (Some(column), _) => schema.column_exists_statement(table, column),
                (None, Some(index)) => schema.index_exists_statement(table, index),
                (None, None) => schema.table_exists_statement(table),
            }]
        }
        Commands::Columns { table } => vec![schema.table_columns_statement(parse_table(table))],
        Commands::Indexes { table } => vec![schema.table_indexes_statement(parse_table(table))],
        Commands::Select { file } => {
            let select: Select = read_json(file)?;
            vec![SelectWriter::new().create_statement(&select)?]
        }
        Commands::SharedColumns { tables, into } => {
            let select = Select::union(tables.iter().map(|t| parse_table(t)));
            vec![match into {
                Some(into) => schema.shared_columns_statement(&select, parse_table(into))?,
                None => schema.union_columns_statement(&select)?,
            }]
        }
    };
    Ok(statements)
}

fn format_statements(statements: &[Statement], format: Format) -> anyhow::Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(statements)?),
        Format::Sql => {
            let mut out = String::new();
            for statement in statements {
                for parameter in &statement.parameters {
                    out.push_str(&format!(
                        "-- {} = {}\n",
                        parameter.name,
                        parameter.value.to_sql_inline()
                    ));
                }
                out.push_str(&statement.text);
                out.push_str(";\n");
            }
            Ok(out)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the rendered SQL can be piped.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let statements = render(&cli.command)?;
    debug!(count = statements.len(), format = ?cli.format, "Rendered statements");
    print!("{}", format_statements(&statements, cli.format)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use oxide_tsql::ResultType;
    use tempfile::NamedTempFile;

    use super::*;

    fn run(args: &[&str]) -> Vec<Statement> {
        let cli = Cli::try_parse_from(std::iter::once("oxide-tsql").chain(args.iter().copied()))
            .unwrap_or_else(|e| panic!("Failed to parse {args:?}: {e}"));
        render(&cli.command).unwrap_or_else(|e| panic!("Failed to render {args:?}: {e}"))
    }

    fn json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_create_table_with_indexes() {
        let file = json_file(
            r#"{
                "name": "users",
                "schema": "dbo",
                "columns": [
                    {"name": "Id", "kind": {"Stored": {"Clr": "Int32"}}, "key": "PrimaryKey", "identity": true},
                    {"name": "Email", "kind": {"Stored": {"Sql": "NVarChar"}}, "length": 320, "nullable": true}
                ],
                "indexes": [
                    {"columns": [{"name": "Email"}], "unique": true}
                ]
            }"#,
        );
        let statements = run(&["create-table", file.path().to_str().unwrap()]);

        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].text,
            "CREATE TABLE [dbo].[users] ([Id] int IDENTITY(1,1) NOT NULL, [Email] nvarchar (320) NULL, \
             CONSTRAINT [PK_users_Id] PRIMARY KEY ([Id] ASC))"
        );
        assert_eq!(
            statements[1].text,
            "CREATE UNIQUE NONCLUSTERED INDEX [IX_users_Email] ON [dbo].[users] ([Email] ASC)"
        );
    }

    #[test]
    fn test_add_index_column_orders() {
        let statements = run(&["add-index", "users", "Created:desc", "Id", "--name", "IX_recent"]);
        assert_eq!(
            statements[0].text,
            "CREATE NONCLUSTERED INDEX [IX_recent] ON [users] ([Created] DESC, [Id] ASC)"
        );
        assert!(parse_index_column("Id:sideways").is_err());
    }

    #[test]
    fn test_exists_variants() {
        assert_eq!(run(&["exists", "users"])[0].result, ResultType::Scalar);
        assert!(run(&["exists", "users", "--column", "Email"])[0]
            .text
            .contains("[sys].[columns]"));
        assert!(run(&["exists", "users", "--index", "IX_recent"])[0]
            .text
            .contains("[sys].[indexes]"));
        assert!(Cli::try_parse_from(["oxide-tsql", "exists", "users", "--column", "a", "--index", "b"]).is_err());
    }

    #[test]
    fn test_select_file() {
        let file = json_file(
            r#"{
                "source": {"Table": {"name": "users"}},
                "first_or_default": true,
                "filter": {"Comparison": {
                    "op": "Equal",
                    "left": {"Field": "Email"},
                    "right": {"Value": {"Text": "a@b.c"}}
                }}
            }"#,
        );
        let statements = run(&["select", file.path().to_str().unwrap()]);
        assert_eq!(
            statements[0].text,
            "SELECT TOP (1) * FROM [users] WHERE [Email] = @p0"
        );

        let sql = format_statements(&statements, Format::Sql).unwrap();
        assert_eq!(
            sql,
            "-- @p0 = N'a@b.c'\nSELECT TOP (1) * FROM [users] WHERE [Email] = @p0;\n"
        );
    }

    #[test]
    fn test_shared_columns() {
        let union = run(&["shared-columns", "a", "b"]);
        assert!(union[0].text.contains(" INTERSECT "));

        let shared = run(&["shared-columns", "a", "b", "--into", "archive.c"]);
        assert!(shared[0].text.ends_with("AND [SC].[object_id] = OBJECT_ID(N'archive.c')"));
    }

    #[test]
    fn test_json_output() {
        let statements = run(&["drop-table", "users"]);
        let json = format_statements(&statements, Format::Json).unwrap();
        let parsed: Vec<Statement> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, statements);
    }

    #[test]
    fn test_missing_file() {
        let cli = Cli::try_parse_from(["oxide-tsql", "select", "/nonexistent/query.json"]).unwrap();
        let err = render(&cli.command).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_parse_table() {
        assert_eq!(parse_table("dbo.users"), Table::qualified("dbo", "users"));
        assert_eq!(parse_table("users"), Table::new("users"));
    }
}
