use super::connection::Database;
use super::value::Value;
use crate::error::{Result, RnaseqlError};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlparser::ast::visit_relations;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use std::ops::ControlFlow;
use tracing::info;

pub const DEFAULT_ROW_CEILING: usize = 50;

/// Textual deny-list for write and DDL statements. A best-effort guard, not
/// a parser and not a security boundary; the read-only connection is the
/// backstop.
static WRITE_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(INSERT|UPDATE|DELETE|DROP|ALTER|CREATE|ATTACH|DETACH|PRAGMA|VACUUM|REINDEX)\b",
    )
    .expect("write keyword pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLimit {
    Capped(usize),
    Unbounded,
}

impl Default for RowLimit {
    fn default() -> Self {
        RowLimit::Capped(DEFAULT_ROW_CEILING)
    }
}

/// Result of one successful execution. `rows` holds the retained prefix;
/// `total_rows` is the true count the statement produced, so truncation by
/// the row ceiling is always observable.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub total_rows: usize,
    pub sql: String,
    /// Tables the statement referenced, best-effort from the SQL text.
    pub tables: Vec<String>,
}

impl QueryResult {
    pub fn retained_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

pub struct QueryExecutor<'a> {
    db: &'a Database,
    ceiling: usize,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            ceiling: DEFAULT_ROW_CEILING,
        }
    }

    pub fn with_row_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = ceiling.max(1);
        self
    }

    /// Runs a single read-only SELECT, retaining at most the configured
    /// number of rows.
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.execute_with_limit(sql, RowLimit::Capped(self.ceiling))
    }

    /// Full export: every produced row is retained. Only used when the
    /// caller asked for it explicitly.
    pub fn execute_unbounded(&self, sql: &str) -> Result<QueryResult> {
        self.execute_with_limit(sql, RowLimit::Unbounded)
    }

    pub fn execute_with_limit(&self, sql: &str, limit: RowLimit) -> Result<QueryResult> {
        check_statement(sql)?;
        info!(sql = %sql, ?limit, "executing query");

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| RnaseqlError::QueryExecution(e.to_string()))?;

        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let column_count = columns.len();

        let mut rows = stmt
            .query([])
            .map_err(|e| RnaseqlError::QueryExecution(e.to_string()))?;

        let mut retained: Vec<Vec<Value>> = Vec::new();
        let mut total_rows = 0usize;

        while let Some(row) = rows
            .next()
            .map_err(|e| RnaseqlError::QueryExecution(e.to_string()))?
        {
            total_rows += 1;
            let keep = match limit {
                RowLimit::Capped(n) => retained.len() < n,
                RowLimit::Unbounded => true,
            };
            if keep {
                let mut record = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    let cell = row
                        .get_ref(i)
                        .map_err(|e| RnaseqlError::QueryExecution(e.to_string()))?;
                    record.push(Value::from(cell));
                }
                retained.push(record);
            }
        }

        info!(total_rows, retained = retained.len(), "query finished");

        Ok(QueryResult {
            columns,
            rows: retained,
            total_rows,
            sql: sql.to_string(),
            tables: referenced_tables(sql),
        })
    }
}

/// Precondition check: exactly one statement, shaped like a read-only
/// SELECT, with no write/DDL keyword anywhere in the text.
fn check_statement(sql: &str) -> Result<()> {
    let trimmed = sql.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() {
        return Err(RnaseqlError::UnsafeStatement(
            "empty statement".to_string(),
        ));
    }
    if trimmed.contains(';') {
        return Err(RnaseqlError::UnsafeStatement(
            "multiple statements are not allowed; submit one SELECT at a time".to_string(),
        ));
    }

    let head = trimmed.split_whitespace().next().unwrap_or("").to_uppercase();
    if head != "SELECT" && head != "WITH" {
        return Err(RnaseqlError::UnsafeStatement(format!(
            "only SELECT statements are allowed, got '{}'",
            head
        )));
    }

    if let Some(m) = WRITE_KEYWORDS.find(trimmed) {
        return Err(RnaseqlError::UnsafeStatement(format!(
            "statement contains forbidden keyword '{}'",
            m.as_str().to_uppercase()
        )));
    }

    Ok(())
}

/// Tables referenced by the statement, for the structured query description.
/// Parse failures yield an empty list; the engine is the authority on
/// whether the SQL is valid.
fn referenced_tables(sql: &str) -> Vec<String> {
    let Ok(statements) = Parser::parse_sql(&SQLiteDialect {}, sql) else {
        return Vec::new();
    };

    let mut tables: Vec<String> = Vec::new();
    let _ = visit_relations(&statements, |relation| {
        let name = relation.to_string();
        if !tables.contains(&name) {
            tables.push(name);
        }
        ControlFlow::<()>::Continue(())
    });
    tables
}
