//! A recording executor that answers catalog queries from a scripted
//! database state.

#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

use storm_core::SqlValue;
use storm_orm::{Executor, Result, Row, StormError};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Default)]
pub struct RecordingExecutor {
    tables: BTreeSet<String>,
    columns: BTreeSet<(String, String)>,
    sequences: BTreeSet<String>,
    rows: Mutex<VecDeque<Vec<Row>>>,
    fail_on: Option<String>,
    executed: Mutex<Vec<Call>>,
    queried: Mutex<Vec<Call>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an existing table with the given columns.
    pub fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
        self.tables.insert(table.to_string());
        for column in columns {
            self.columns.insert((table.to_string(), (*column).to_string()));
        }
        self
    }

    pub fn with_sequence(mut self, name: &str) -> Self {
        self.sequences.insert(name.to_string());
        self
    }

    /// Queues the rows returned by the next non-catalog query.
    pub fn returning(self, rows: Vec<Row>) -> Self {
        self.rows
            .lock()
            .unwrap()
            .push_back(rows);
        self
    }

    /// Fails every statement containing `fragment`.
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.to_string());
        self
    }

    pub fn executed(&self) -> Vec<Call> {
        self.executed.lock().unwrap().clone()
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.executed().into_iter().map(|call| call.sql).collect()
    }

    pub fn queried(&self) -> Vec<Call> {
        self.queried.lock().unwrap().clone()
    }

    fn check_failure(&self, sql: &str) -> Result<()> {
        match &self.fail_on {
            Some(fragment) if sql.contains(fragment.as_str()) => Err(StormError::Query {
                message: format!("relation rejected: {fragment}"),
                code: Some("42P07".into()),
            }),
            _ => Ok(()),
        }
    }

    fn catalog_answer(&self, sql: &str, params: &[SqlValue]) -> Option<bool> {
        let text = |index: usize| match params.get(index) {
            Some(SqlValue::Text(s)) => s.clone(),
            _ => String::new(),
        };
        let last = params.len().checked_sub(1)?;
        if sql.contains("information_schema.tables") {
            Some(self.tables.contains(&text(last)))
        } else if sql.contains("information_schema.columns") {
            let table = text(last.checked_sub(1)?);
            Some(self.columns.contains(&(table, text(last))))
        } else if sql.contains("information_schema.sequences") {
            Some(self.sequences.contains(&text(last)))
        } else {
            None
        }
    }
}

impl Executor for RecordingExecutor {
    async fn exec(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.check_failure(sql)?;
        self.executed.lock().unwrap().push(Call {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(1)
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        self.check_failure(sql)?;
        self.queried.lock().unwrap().push(Call {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if let Some(exists) = self.catalog_answer(sql, params) {
            return Ok(vec![Row::from_pairs([("exists", SqlValue::Bool(exists))])]);
        }
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }
}
