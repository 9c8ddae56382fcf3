//! Translates `sqlparser`'s general SQL AST into the small statement set
//! this engine actually executes: CREATE TABLE, BEGIN/COMMIT/ROLLBACK,
//! INSERT, point/full SELECT, and point DELETE. There is no query planner;
//! anything outside this set is rejected at parse time.

use crate::schema::Column;
use crate::value::{ColumnType, Value};
use sqlparser::ast::{
    self, BinaryOperator, ColumnOption, Expr, SetExpr, TableFactor,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

#[derive(Debug)]
pub enum Statement {
    CreateTable {
        table: String,
        columns: Vec<Column>,
    },
    Begin,
    Commit,
    Rollback,
    Insert {
        table: String,
        values: Vec<Value>,
    },
    /// `filter` is `Some(pk_value)` for `WHERE pk = ...`, `None` for a bare
    /// `SELECT * FROM t` full-table scan.
    Select {
        table: String,
        filter: Option<Value>,
    },
    Delete {
        table: String,
        filter: Value,
    },
}

pub fn parse(sql: &str) -> Result<Statement, String> {
    let dialect = GenericDialect {};
    let mut parsed = Parser::parse_sql(&dialect, sql).map_err(|e| e.to_string())?;
    if parsed.len() != 1 {
        return Err("expected exactly one statement".to_string());
    }

    match parsed.remove(0) {
        ast::Statement::StartTransaction { .. } => Ok(Statement::Begin),
        ast::Statement::Commit { .. } => Ok(Statement::Commit),
        ast::Statement::Rollback { .. } => Ok(Statement::Rollback),

        ast::Statement::CreateTable { name, columns, .. } => {
            let table = name.0.first().ok_or("missing table name")?.value.clone();
            let columns = columns
                .into_iter()
                .map(convert_column)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Statement::CreateTable { table, columns })
        }

        ast::Statement::Insert {
            table_name, source, ..
        } => {
            let table = table_name.0.first().ok_or("missing table name")?.value.clone();
            let source = source.ok_or("INSERT must have a VALUES clause")?;
            let SetExpr::Values(values) = *source.body else {
                return Err("INSERT source must be VALUES".to_string());
            };
            if values.rows.len() != 1 {
                return Err("INSERT supports exactly one row at a time".to_string());
            }
            let row = values.rows.into_iter().next().unwrap();
            let values = row
                .into_iter()
                .map(convert_value_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Statement::Insert { table, values })
        }

        ast::Statement::Query(query) => {
            let SetExpr::Select(select) = *query.body else {
                return Err("only SELECT queries are supported".to_string());
            };
            let table = match select.from.first() {
                Some(item) => match &item.relation {
                    TableFactor::Table { name, .. } => {
                        name.0.first().ok_or("missing table name")?.value.clone()
                    }
                    _ => return Err("unsupported FROM clause".to_string()),
                },
                None => return Err("SELECT must have a FROM clause".to_string()),
            };
            let filter = match select.selection {
                Some(expr) => Some(convert_equality_filter(expr)?),
                None => None,
            };
            Ok(Statement::Select { table, filter })
        }

        ast::Statement::Delete { from, selection, .. } => {
            let tables = match from {
                ast::FromTable::WithFromKeyword(t) | ast::FromTable::WithoutKeyword(t) => t,
            };
            let table = tables
                .first()
                .and_then(|t| match &t.relation {
                    TableFactor::Table { name, .. } => name.0.first(),
                    _ => None,
                })
                .ok_or("missing table name")?
                .value
                .clone();
            let filter = convert_equality_filter(
                selection.ok_or("DELETE without WHERE is not supported")?,
            )?;
            Ok(Statement::Delete { table, filter })
        }

        other => Err(format!("unsupported statement: {other}")),
    }
}

fn convert_equality_filter(expr: Expr) -> Result<Value, String> {
    match expr {
        Expr::BinaryOp { op: BinaryOperator::Eq, right, .. } => match *right {
            Expr::Value(v) => convert_literal(v),
            _ => Err("filter value must be a literal".to_string()),
        },
        _ => Err("only column = literal filters are supported".to_string()),
    }
}

fn convert_column(col_def: ast::ColumnDef) -> Result<Column, String> {
    let ty = match col_def.data_type {
        ast::DataType::Int(_) | ast::DataType::Integer(_) => ColumnType::Int32,
        ast::DataType::Float(_) | ast::DataType::Real => ColumnType::Float32,
        ast::DataType::Varchar(len) => {
            let n = len
                .and_then(|l| match l {
                    ast::CharacterLength::IntegerLength { length, .. } => Some(length as u16),
                    _ => None,
                })
                .unwrap_or(crate::constants::MAX_VARCHAR_LEN as u16);
            ColumnType::Varchar(n)
        }
        other => return Err(format!("unsupported column type: {other}")),
    };
    let is_primary_key = col_def.options.iter().any(|o| {
        matches!(
            o.option,
            ColumnOption::Unique { is_primary: true, .. }
        )
    });
    Ok(Column::new(col_def.name.value, ty, is_primary_key))
}

fn convert_value_expr(expr: Expr) -> Result<Value, String> {
    match expr {
        Expr::Value(v) => convert_literal(v),
        Expr::UnaryOp { op: ast::UnaryOperator::Minus, expr } => match *expr {
            Expr::Value(ast::Value::Number(s, _)) => s
                .parse::<i32>()
                .map(|n| Value::Int32(-n))
                .map_err(|_| "invalid negative number literal".to_string()),
            _ => Err("unsupported negated expression".to_string()),
        },
        _ => Err("INSERT VALUES must be literals".to_string()),
    }
}

fn convert_literal(value: ast::Value) -> Result<Value, String> {
    match value {
        ast::Value::Number(s, _) => {
            if let Ok(n) = s.parse::<i32>() {
                Ok(Value::Int32(n))
            } else {
                s.parse::<f32>()
                    .map(Value::Float32)
                    .map_err(|_| format!("invalid numeric literal: {s}"))
            }
        }
        ast::Value::SingleQuotedString(s) => Ok(Value::Varchar(s)),
        ast::Value::Null => Ok(Value::Null),
        other => Err(format!("unsupported literal: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_table_with_primary_key() {
        let stmt = parse("CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(20))").unwrap();
        match stmt {
            Statement::CreateTable { table, columns } => {
                assert_eq!(table, "users");
                assert_eq!(columns.len(), 2);
                assert!(columns[0].is_primary_key);
                assert!(!columns[1].is_primary_key);
            }
            _ => panic!("expected CreateTable"),
        }
    }

    #[test]
    fn parses_insert() {
        let stmt = parse("INSERT INTO users VALUES (1, 'Alice')").unwrap();
        match stmt {
            Statement::Insert { table, values } => {
                assert_eq!(table, "users");
                assert_eq!(values, vec![Value::Int32(1), Value::Varchar("Alice".into())]);
            }
            _ => panic!("expected Insert"),
        }
    }

    #[test]
    fn parses_select_with_filter() {
        let stmt = parse("SELECT * FROM users WHERE id = 1").unwrap();
        match stmt {
            Statement::Select { table, filter } => {
                assert_eq!(table, "users");
                assert_eq!(filter, Some(Value::Int32(1)));
            }
            _ => panic!("expected Select"),
        }
    }

    #[test]
    fn parses_select_without_filter() {
        let stmt = parse("SELECT * FROM users").unwrap();
        match stmt {
            Statement::Select { table, filter } => {
                assert_eq!(table, "users");
                assert_eq!(filter, None);
            }
            _ => panic!("expected Select"),
        }
    }

    #[test]
    fn parses_delete() {
        let stmt = parse("DELETE FROM users WHERE id = 1").unwrap();
        match stmt {
            Statement::Delete { table, filter } => {
                assert_eq!(table, "users");
                assert_eq!(filter, Value::Int32(1));
            }
            _ => panic!("expected Delete"),
        }
    }

    #[test]
    fn parses_transaction_control() {
        assert!(matches!(parse("BEGIN").unwrap(), Statement::Begin));
        assert!(matches!(parse("COMMIT").unwrap(), Statement::Commit));
        assert!(matches!(parse("ROLLBACK").unwrap(), Statement::Rollback));
    }
}
