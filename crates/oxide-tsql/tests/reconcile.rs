//! Integration tests for column reconciliation across source tables.

mod common;

use common::{listing, schema, three_table_union};
use oxide_tsql::introspect::ensure_shared_columns;
use oxide_tsql::types::{is_narrowing_conversion, normalize_type_code, type_code};
use oxide_tsql::{ResultType, Select, SharedColumn, UnionColumn};

fn shared_columns_text(sources: &[&str], into: &str) -> String {
    let mut listings: Vec<String> = sources.iter().map(|t| listing(t)).collect();
    listings.push(listing(into));
    let ids: Vec<String> = sources
        .iter()
        .map(|t| format!("OBJECT_ID(N'{t}')"))
        .collect();
    format!(
        "SELECT [__SubQuery__].[name], CAST(CASE WHEN [SC].[system_type_id] < (SELECT MAX([system_type_id]) \
         FROM [sys].[columns] WHERE [name] = [__SubQuery__].[name] AND [system_type_id] IN (175, 167, 35, 239, 231, 99) \
         AND [object_id] IN ({})) THEN 1 ELSE 0 END AS bit) AS [NarrowingConversion] FROM ({}) [__SubQuery__] \
         JOIN [sys].[columns] [SC] ON [__SubQuery__].[name] = [SC].[name] AND [SC].[object_id] = OBJECT_ID(N'{into}')",
        ids.join(", "),
        listings.join(" INTERSECT ")
    )
}

#[test]
fn union_columns_of_nested_queries() {
    let statement = schema()
        .union_columns_statement(&three_table_union())
        .unwrap();

    assert_eq!(statement.result, ResultType::Multiple);
    assert!(statement.parameters.is_empty());
    assert_eq!(
        statement.text,
        ["XLIST_1", "XLIST_2", "XLIST_3"]
            .map(listing)
            .join(" INTERSECT ")
    );
}

#[test]
fn union_columns_ignore_set_operands() {
    let select = Select::from_table("XLIST_1").except(Select::from_table("XLIST_2"));
    let statement = schema().union_columns_statement(&select).unwrap();
    assert_eq!(statement.text, listing("XLIST_1"));
}

#[test]
fn shared_columns_with_destination() {
    let statement = schema()
        .shared_columns_statement(&three_table_union(), "XLIST_4")
        .unwrap();

    assert_eq!(statement.result, ResultType::Multiple);
    assert!(statement.parameters.is_empty());
    assert_eq!(
        statement.text,
        shared_columns_text(&["XLIST_1", "XLIST_2", "XLIST_3"], "XLIST_4")
    );
}

#[test]
fn shared_columns_of_a_single_table() {
    let statement = schema()
        .shared_columns_statement(&Select::from_table("source"), "dest")
        .unwrap();
    assert_eq!(statement.text, shared_columns_text(&["source"], "dest"));
}

#[test]
fn legacy_text_codes_collapse_to_unicode() {
    assert_eq!(normalize_type_code(type_code::VARCHAR), type_code::NVARCHAR);
    assert_eq!(normalize_type_code(type_code::CHAR), type_code::NCHAR);
    assert_eq!(normalize_type_code(type_code::TEXT), type_code::NTEXT);
    assert_eq!(normalize_type_code(type_code::NVARCHAR), type_code::NVARCHAR);
    assert_eq!(normalize_type_code(56), 56);
}

#[test]
fn narrowing_is_monotonic_in_the_destination_code() {
    let sources = [type_code::VARCHAR, type_code::NVARCHAR];
    assert!(is_narrowing_conversion(type_code::VARCHAR, &sources));
    assert!(!is_narrowing_conversion(type_code::NVARCHAR, &sources));

    // Widening the destination never introduces narrowing.
    let mut codes = type_code::WIDE_FAMILY;
    codes.sort_unstable();
    let flags: Vec<bool> = codes
        .iter()
        .map(|code| is_narrowing_conversion(*code, &sources))
        .collect();
    assert!(flags.windows(2).all(|w| w[0] >= w[1]), "{flags:?}");
}

#[test]
fn non_text_sources_never_narrow() {
    assert!(!is_narrowing_conversion(type_code::VARCHAR, &[56, 127]));
    assert!(!is_narrowing_conversion(type_code::VARCHAR, &[]));
}

#[test]
fn rows_deserialize_from_catalog_results() {
    let union: Vec<UnionColumn> = serde_json::from_str(
        r#"[{"name":"Id","system_type_id":56,"user_type_id":56},
            {"name":"Name","system_type_id":231,"user_type_id":231}]"#,
    )
    .unwrap();
    assert_eq!(union[1].name, "Name");
    assert_eq!(union[1].system_type_id, type_code::NVARCHAR);

    let shared: Vec<SharedColumn> =
        serde_json::from_str(r#"[{"name":"Name","NarrowingConversion":false}]"#).unwrap();
    assert!(!shared[0].narrowing_conversion);
}

#[test]
fn no_shared_columns_is_a_schema_mismatch() {
    let err = ensure_shared_columns(Vec::<SharedColumn>::new(), &three_table_union()).unwrap_err();
    assert_eq!(err.tables, ["XLIST_1", "XLIST_2", "XLIST_3"]);
    let message = err.to_string();
    assert!(message.contains("XLIST_2"), "{message}");
}
