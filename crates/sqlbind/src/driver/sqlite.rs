//! `rusqlite` support: value conversion and [`Executor`] for connections and transactions.

use crate::error::{CrudError, CrudResult};
use crate::exec::{ExecResult, Executor, RowSet};
use crate::value::Value;
use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqliteValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Bool(b) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*b))),
            Value::Timestamp(_) | Value::TimestampTz(_) => {
                ToSqlOutput::Owned(SqliteValue::Text(self.timestamp_text().unwrap_or_default()))
            }
        })
    }
}

fn from_value_ref(column: &str, value: ValueRef<'_>) -> CrudResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(
            String::from_utf8(bytes.to_vec())
                .map_err(|e| CrudError::decode(column, format!("invalid UTF-8: {e}")))?,
        ),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    })
}

fn run_execute(conn: &Connection, sql: &str, params: &[Value]) -> CrudResult<ExecResult> {
    let mut stmt = conn.prepare_cached(sql)?;
    let affected = stmt.execute(params_from_iter(params.iter()))?;
    Ok(ExecResult {
        rows_affected: affected as u64,
        last_insert_id: Some(conn.last_insert_rowid()),
    })
}

fn run_query(conn: &Connection, sql: &str, params: &[Value]) -> CrudResult<RowSet> {
    let mut stmt = conn.prepare_cached(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            values.push(from_value_ref(column, row.get_ref(i)?)?);
        }
        out.push(values);
    }
    RowSet::new(columns, out)
}

impl Executor for Connection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> CrudResult<ExecResult> {
        run_execute(self, sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> CrudResult<RowSet> {
        run_query(self, sql, params)
    }
}

impl Executor for rusqlite::Transaction<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> CrudResult<ExecResult> {
        run_execute(self, sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> CrudResult<RowSet> {
        run_query(self, sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, b BOOLEAN, at DATETIME, data BLOB)",
        )
        .unwrap();
        conn
    }

    #[test]
    fn execute_reports_last_insert_id() {
        let mut conn = conn();
        let result = Executor::execute(
            &mut conn,
            "INSERT INTO t (b) VALUES (?1)",
            &[Value::Bool(true)],
        )
        .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_insert_id, Some(1));
    }

    #[test]
    fn query_buffers_rows_with_column_names() {
        let mut conn = conn();
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        Executor::execute(
            &mut conn,
            "INSERT INTO t (b, at, data) VALUES (?1, ?2, ?3)",
            &[Value::Bool(false), Value::Timestamp(at), Value::Blob(vec![1, 2])],
        )
        .unwrap();

        let mut rows = Executor::query(&mut conn, r#"SELECT id AS "ID", b, at, data FROM t"#, &[]).unwrap();
        assert_eq!(rows.columns(), ["ID", "b", "at", "data"]);
        assert!(rows.next_row());
        assert_eq!(
            rows.current().unwrap(),
            [
                Value::Integer(1),
                Value::Integer(0),
                Value::Text("2024-01-02 03:04:05".into()),
                Value::Blob(vec![1, 2]),
            ]
        );
    }

    #[test]
    fn engine_errors_are_wrapped() {
        let mut conn = conn();
        let err = Executor::execute(&mut conn, "INSERT INTO missing VALUES (1)", &[]).unwrap_err();
        assert!(matches!(err, CrudError::Sqlite(_)));
        assert!(err.is_engine_error());
    }

    #[test]
    fn transactions_execute() {
        let mut conn = conn();
        let mut tx = conn.transaction().unwrap();
        Executor::execute(&mut tx, "INSERT INTO t (b) VALUES (?1)", &[Value::Null]).unwrap();
        tx.commit().unwrap();

        let rows = Executor::query(&mut conn, "SELECT id FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
