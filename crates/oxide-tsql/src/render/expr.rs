//! Predicate and value-expression rendering.
//!
//! Boolean connectives parenthesize both operands, so the output never
//! depends on operator precedence. Literal values are always bound as
//! parameters; identifiers are always quoted.

use super::SqlWriter;
use crate::dialect::Dialect;
use crate::error::{RenderError, Result};
use crate::model::{Comparison, Function, Operator, OrderByProjection, Projection};
use crate::types::physical_type;
use crate::value::SqlValue;

impl<D: Dialect> SqlWriter<'_, D> {
    /// Renders a predicate tree as a boolean condition.
    pub(crate) fn predicate(&mut self, operator: &Operator) -> Result<String> {
        match operator {
            Operator::Comparison { op, left, right } => self.comparison(*op, left, right),
            Operator::And(left, right) => {
                let left = self.predicate(left)?;
                let right = self.predicate(right)?;
                Ok(format!("({left}) AND ({right})"))
            }
            Operator::Or(left, right) => {
                let left = self.predicate(left)?;
                let right = self.predicate(right)?;
                Ok(format!("({left}) OR ({right})"))
            }
            Operator::Not(inner) => Ok(format!("NOT ({})", self.predicate(inner)?)),
            Operator::Predicate(projection) => self.boolean_projection(projection),
        }
    }

    fn comparison(
        &mut self,
        op: Comparison,
        left: &Projection,
        right: &Projection,
    ) -> Result<String> {
        let operand = match (left, right) {
            (_, Projection::Value(SqlValue::Null)) => Some(left),
            (Projection::Value(SqlValue::Null), _) => Some(right),
            _ => None,
        };
        if let Some(operand) = operand {
            let keyword = match op {
                Comparison::Equal => "IS NULL",
                Comparison::NotEqual => "IS NOT NULL",
                other => {
                    return Err(RenderError::unsupported_operator(format!(
                        "{} against NULL",
                        other.as_sql()
                    )))
                }
            };
            return Ok(format!("{} {keyword}", self.projection(operand)?));
        }

        let left = self.projection(left)?;
        let right = self.projection(right)?;
        Ok(format!("{left} {} {right}", op.as_sql()))
    }

    fn boolean_projection(&mut self, projection: &Projection) -> Result<String> {
        match projection {
            Projection::Field(name) => Ok(format!("{} = 1", self.quote(name))),
            Projection::Value(SqlValue::Bool(true)) => Ok(String::from("1 = 1")),
            Projection::Value(SqlValue::Bool(false)) => Ok(String::from("1 = 0")),
            Projection::Value(value) => Err(RenderError::unsupported_operator(format!(
                "{} is not a condition",
                value.to_sql_inline()
            ))),
            Projection::Function(function) if function.is_predicate() => {
                self.predicate_function(function)
            }
            Projection::Function(function) => Err(RenderError::unsupported_operator(format!(
                "{} is not a condition",
                function_name(function)
            ))),
        }
    }

    fn predicate_function(&mut self, function: &Function) -> Result<String> {
        match function {
            Function::StartsWith { text, value } => {
                let text = self.projection(text)?;
                let value = self.like_pattern(value)?;
                Ok(format!("{text} LIKE {value} + '%'"))
            }
            Function::EndsWith { text, value } => {
                let text = self.projection(text)?;
                let value = self.like_pattern(value)?;
                Ok(format!("{text} LIKE '%' + {value}"))
            }
            Function::Contains { text, value } => {
                let text = self.projection(text)?;
                let value = self.like_pattern(value)?;
                Ok(format!("{text} LIKE '%' + {value} + '%'"))
            }
            Function::In { projection, values } => {
                if values.is_empty() {
                    return Ok(String::from("1 = 0"));
                }
                let projection = self.projection(projection)?;
                let values = self.projections(values)?;
                Ok(format!("{projection} IN ({values})"))
            }
            other => Err(RenderError::unsupported_operator(format!(
                "{} is not a condition",
                function_name(other)
            ))),
        }
    }

    /// Renders the search term of a LIKE so its wildcards match literally.
    fn like_pattern(&mut self, value: &Projection) -> Result<String> {
        match value {
            Projection::Value(SqlValue::Text(text)) => {
                Ok(self.bind(SqlValue::Text(escape_like(text))))
            }
            other => {
                let value = self.projection(other)?;
                Ok(format!(
                    "REPLACE(REPLACE(REPLACE({value}, '[', '[[]'), '%', '[%]'), '_', '[_]')"
                ))
            }
        }
    }

    /// Renders a value expression.
    pub(crate) fn projection(&mut self, projection: &Projection) -> Result<String> {
        match projection {
            Projection::Field(name) => Ok(self.quote(name)),
            Projection::Value(SqlValue::Null) => Ok(String::from("NULL")),
            Projection::Value(value) => Ok(self.bind(value.clone())),
            Projection::Function(function) if function.is_predicate() => {
                let condition = self.predicate_function(function)?;
                Ok(format!("CAST(CASE WHEN {condition} THEN 1 ELSE 0 END AS bit)"))
            }
            Projection::Function(function) => self.function(function),
        }
    }

    fn projections(&mut self, projections: &[Projection]) -> Result<String> {
        let mut rendered = Vec::with_capacity(projections.len());
        for projection in projections {
            rendered.push(self.projection(projection)?);
        }
        Ok(rendered.join(", "))
    }

    fn function(&mut self, function: &Function) -> Result<String> {
        match function {
            Function::ToUpper(inner) => Ok(format!("UPPER({})", self.projection(inner)?)),
            Function::ToLower(inner) => Ok(format!("LOWER({})", self.projection(inner)?)),
            Function::Trim(inner) => Ok(format!("LTRIM(RTRIM({}))", self.projection(inner)?)),
            Function::Length(inner) => Ok(format!("LEN({})", self.projection(inner)?)),
            Function::Substring {
                text,
                start,
                length,
            } => {
                let text = self.projection(text)?;
                let start = self.projection(start)?;
                let length = match length {
                    Some(length) => self.projection(length)?,
                    None => format!("LEN({text})"),
                };
                Ok(format!("SUBSTRING({text}, {start} + 1, {length})"))
            }
            Function::Replace {
                text,
                search,
                replacement,
            } => {
                let text = self.projection(text)?;
                let search = self.projection(search)?;
                let replacement = self.projection(replacement)?;
                Ok(format!("REPLACE({text}, {search}, {replacement})"))
            }
            Function::IndexOf { text, value } => {
                // CHARINDEX takes the needle first.
                let text = self.projection(text)?;
                let value = self.projection(value)?;
                Ok(format!("(CHARINDEX({value}, {text}) - 1)"))
            }
            Function::Concat(parts) => self.variadic("CONCAT", parts),
            Function::Coalesce(parts) => self.variadic("COALESCE", parts),
            Function::Convert { projection, to } => {
                let target = physical_type(*to, None, None, None)?;
                Ok(format!("CAST({} AS {target})", self.projection(projection)?))
            }
            predicate => self.predicate_function(predicate),
        }
    }

    /// Both `CONCAT` and `COALESCE` need two arguments; one argument renders bare.
    fn variadic(&mut self, name: &str, parts: &[Projection]) -> Result<String> {
        match parts {
            [] => Err(RenderError::invalid_query(format!(
                "{name} needs at least one argument"
            ))),
            [single] => self.projection(single),
            _ => Ok(format!("{name}({})", self.projections(parts)?)),
        }
    }

    /// Renders an ORDER BY list.
    pub(crate) fn order_by(&mut self, terms: &[OrderByProjection]) -> Result<String> {
        let mut rendered = Vec::with_capacity(terms.len());
        for term in terms {
            let projection = self.projection(&term.projection)?;
            rendered.push(format!("{projection} {}", term.order.as_sql()));
        }
        Ok(rendered.join(", "))
    }
}

/// Brackets each LIKE wildcard character.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | '%' | '_') {
            escaped.push('[');
            escaped.push(c);
            escaped.push(']');
        } else {
            escaped.push(c);
        }
    }
    escaped
}

fn function_name(function: &Function) -> &'static str {
    match function {
        Function::ToUpper(_) => "UPPER",
        Function::ToLower(_) => "LOWER",
        Function::Trim(_) => "TRIM",
        Function::Length(_) => "LEN",
        Function::Substring { .. } => "SUBSTRING",
        Function::Replace { .. } => "REPLACE",
        Function::IndexOf { .. } => "CHARINDEX",
        Function::Concat(_) => "CONCAT",
        Function::Coalesce(_) => "COALESCE",
        Function::Convert { .. } => "CAST",
        Function::StartsWith { .. } => "StartsWith",
        Function::EndsWith { .. } => "EndsWith",
        Function::Contains { .. } => "Contains",
        Function::In { .. } => "IN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::TSqlDialect;
    use crate::types::ClrType;

    fn render(operator: &Operator) -> (String, Vec<SqlValue>) {
        let dialect = TSqlDialect::new();
        let mut writer = SqlWriter::new(&dialect);
        let sql = writer.predicate(operator).unwrap();
        let values = writer.into_parameters().into_iter().map(|p| p.value).collect();
        (sql, values)
    }

    fn render_err(operator: &Operator) -> RenderError {
        let dialect = TSqlDialect::new();
        SqlWriter::new(&dialect).predicate(operator).unwrap_err()
    }

    #[test]
    fn test_comparison_parameterizes_values() {
        let (sql, values) = render(&Projection::field("Age").gt_eq(18));
        assert_eq!(sql, "[Age] >= @p0");
        assert_eq!(values, vec![SqlValue::Int(18)]);
    }

    #[test]
    fn test_connectives_parenthesize_operands() {
        let condition = Projection::field("A")
            .eq(1)
            .and(Projection::field("B").eq(2).or(Projection::field("C").eq(3)))
            .not();
        let (sql, values) = render(&condition);
        assert_eq!(
            sql,
            "NOT (([A] = @p0) AND (([B] = @p1) OR ([C] = @p2)))"
        );
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_null_comparisons() {
        let (sql, values) = render(&Projection::field("Deleted").eq(None::<i32>));
        assert_eq!(sql, "[Deleted] IS NULL");
        assert!(values.is_empty());

        let (sql, _) = render(&Projection::field("Deleted").not_eq(None::<i32>));
        assert_eq!(sql, "[Deleted] IS NOT NULL");

        assert!(matches!(
            render_err(&Projection::field("Deleted").gt(None::<i32>)),
            RenderError::UnsupportedOperator(_)
        ));
    }

    #[test]
    fn test_boolean_projections() {
        assert_eq!(render(&Projection::field("Active").is_true()).0, "[Active] = 1");
        assert_eq!(render(&Projection::value(false).is_true()).0, "1 = 0");
        assert!(matches!(
            render_err(&Projection::value(3).is_true()),
            RenderError::UnsupportedOperator(_)
        ));
        assert!(matches!(
            render_err(&Projection::field("Name").to_upper().is_true()),
            RenderError::UnsupportedOperator(_)
        ));
    }

    #[test]
    fn test_like_predicates() {
        assert_eq!(
            render(&Projection::field("Name").starts_with("Jo")).0,
            "[Name] LIKE @p0 + '%'"
        );
        assert_eq!(
            render(&Projection::field("Name").ends_with("son")).0,
            "[Name] LIKE '%' + @p0"
        );
        let (sql, values) = render(&Projection::field("Name").to_lower().contains("o'b"));
        assert_eq!(sql, "LOWER([Name]) LIKE '%' + @p0 + '%'");
        assert_eq!(values, vec![SqlValue::Text(String::from("o'b"))]);
    }

    #[test]
    fn test_like_wildcards_match_literally() {
        let (sql, values) = render(&Projection::field("Name").contains("50%_[x]"));
        assert_eq!(sql, "[Name] LIKE '%' + @p0 + '%'");
        assert_eq!(values, vec![SqlValue::Text(String::from("50[%][_][[]x]"))]);

        let (sql, values) = render(&Operator::Predicate(Projection::Function(
            Function::StartsWith {
                text: Box::new(Projection::field("Name")),
                value: Box::new(Projection::field("Prefix")),
            },
        )));
        assert_eq!(
            sql,
            "[Name] LIKE REPLACE(REPLACE(REPLACE([Prefix], '[', '[[]'), '%', '[%]'), '_', '[_]') + '%'"
        );
        assert!(values.is_empty());
    }

    #[test]
    fn test_in_list() {
        let (sql, values) = render(&Projection::field("Id").in_list(vec![1, 2, 3]));
        assert_eq!(sql, "[Id] IN (@p0, @p1, @p2)");
        assert_eq!(values.len(), 3);

        assert_eq!(
            render(&Projection::field("Id").in_list(Vec::<i32>::new())).0,
            "1 = 0"
        );
    }

    #[test]
    fn test_value_functions() {
        let dialect = TSqlDialect::new();
        let mut writer = SqlWriter::new(&dialect);

        let substring = Projection::Function(Function::Substring {
            text: Box::new(Projection::field("Name")),
            start: Box::new(Projection::value(2)),
            length: None,
        });
        assert_eq!(
            writer.projection(&substring).unwrap(),
            "SUBSTRING([Name], @p0 + 1, LEN([Name]))"
        );

        let index_of = Projection::Function(Function::IndexOf {
            text: Box::new(Projection::field("Name")),
            value: Box::new(Projection::field("Needle")),
        });
        assert_eq!(
            writer.projection(&index_of).unwrap(),
            "(CHARINDEX([Needle], [Name]) - 1)"
        );

        let convert = Projection::Function(Function::Convert {
            projection: Box::new(Projection::field("Id")),
            to: ClrType::String.into(),
        });
        assert_eq!(
            writer.projection(&convert).unwrap(),
            "CAST([Id] AS nvarchar (MAX))"
        );

        let coalesce = Projection::Function(Function::Coalesce(vec![
            Projection::field("Nick"),
            Projection::field("Name"),
        ]));
        assert_eq!(
            writer.projection(&coalesce).unwrap(),
            "COALESCE([Nick], [Name])"
        );

        let trim = Projection::Function(Function::Trim(Box::new(Projection::field("Name"))));
        assert_eq!(writer.projection(&trim).unwrap(), "LTRIM(RTRIM([Name]))");
    }

    #[test]
    fn test_predicate_function_as_value() {
        let dialect = TSqlDialect::new();
        let mut writer = SqlWriter::new(&dialect);
        let starts = Projection::Function(Function::StartsWith {
            text: Box::new(Projection::field("Name")),
            value: Box::new(Projection::value("A")),
        });
        assert_eq!(
            writer.projection(&starts).unwrap(),
            "CAST(CASE WHEN [Name] LIKE @p0 + '%' THEN 1 ELSE 0 END AS bit)"
        );
    }

    #[test]
    fn test_empty_concat_is_invalid() {
        let dialect = TSqlDialect::new();
        let mut writer = SqlWriter::new(&dialect);
        assert!(matches!(
            writer.projection(&Projection::Function(Function::Concat(vec![]))),
            Err(RenderError::InvalidQuery(_))
        ));
    }
}
