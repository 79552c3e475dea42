//! Executable-SQL handle and buffered result sets.

use crate::binding::Slot;
use crate::error::{CrudError, CrudResult};
use crate::value::Value;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Engine-reported id of the last inserted row, where the engine has one.
    pub last_insert_id: Option<i64>,
}

/// A handle that can run SQL.
///
/// Implemented for `rusqlite::Connection` / `rusqlite::Transaction` (feature `sqlite`)
/// and `postgres::Client` / `postgres::Transaction` (feature `postgres`). Pass a
/// transaction anywhere an `Executor` is expected to compose writes atomically.
pub trait Executor {
    /// Run a statement and report rows affected.
    fn execute(&mut self, sql: &str, params: &[Value]) -> CrudResult<ExecResult>;

    /// Run a query and buffer its rows.
    fn query(&mut self, sql: &str, params: &[Value]) -> CrudResult<RowSet>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, sql: &str, params: &[Value]) -> CrudResult<ExecResult> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> CrudResult<RowSet> {
        (**self).query(sql, params)
    }
}

/// Buffered query result with a row cursor.
///
/// The cursor starts before the first row; call [`RowSet::next_row`] to advance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    cursor: Option<usize>,
}

impl RowSet {
    /// Build a result set. Every row must have one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> CrudResult<Self> {
        if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(CrudError::shape(format!(
                "row has {} values but result has {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self {
            columns,
            rows,
            cursor: None,
        })
    }

    /// Column names as reported by the engine.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Advance to the next row. Returns `false` once the rows are exhausted.
    pub fn next_row(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.rows.len() {
            self.cursor = Some(next);
            true
        } else {
            self.cursor = Some(self.rows.len());
            false
        }
    }

    /// Values of the current row.
    pub fn current(&self) -> Option<&[Value]> {
        self.cursor
            .and_then(|c| self.rows.get(c))
            .map(Vec::as_slice)
    }

    /// Copy the current row into `slots`, one slot per column.
    ///
    /// `Discard` slots drop their value; an `Unbound` slot is an error.
    pub fn scan(&self, slots: &mut [Slot<'_>]) -> CrudResult<()> {
        let row = self
            .current()
            .ok_or_else(|| CrudError::shape("scan called without a current row"))?;
        if slots.len() != row.len() {
            return Err(CrudError::shape(format!(
                "{} slots for {} columns",
                slots.len(),
                row.len()
            )));
        }

        for ((column, value), slot) in self.columns.iter().zip(row).zip(slots.iter_mut()) {
            let result = match slot {
                Slot::Discard => Ok(()),
                Slot::Unbound => {
                    return Err(CrudError::shape(format!(
                        "column `{column}` has no destination"
                    )));
                }
                Slot::Field(field) => field.assign(value),
                Slot::Epoch(field) => field.assign_epoch(value),
            };
            result.map_err(|e| CrudError::decode(column, e.to_string()))?;
        }
        Ok(())
    }

    /// Consume the set, yielding column names and rows.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}
