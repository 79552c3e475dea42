//! Blocking `postgres` support: value conversion and [`Executor`] for clients and
//! transactions.

use crate::error::{CrudError, CrudResult};
use crate::exec::{ExecResult, Executor, RowSet};
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use postgres::{Client, GenericClient, Row};

type BoxError = Box<dyn std::error::Error + Sync + Send>;

fn integer_to_sql(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::INT2 {
        i16::try_from(i)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(i)?.to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (i as f32).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (i as f64).to_sql(ty, out)
    } else if *ty == Type::BOOL {
        (i != 0).to_sql(ty, out)
    } else if *ty == Type::TIMESTAMPTZ || *ty == Type::TIMESTAMP {
        let t = DateTime::from_timestamp(i, 0).ok_or("epoch out of range")?;
        if *ty == Type::TIMESTAMP {
            t.naive_utc().to_sql(ty, out)
        } else {
            t.to_sql(ty, out)
        }
    } else {
        i.to_sql_checked(ty, out)
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Integer(i) => integer_to_sql(*i, ty, out),
            Value::Real(f) if *ty == Type::FLOAT4 => (*f as f32).to_sql(ty, out),
            Value::Real(f) => f.to_sql_checked(ty, out),
            Value::Text(s) => s.as_str().to_sql_checked(ty, out),
            Value::Blob(b) => b.as_slice().to_sql_checked(ty, out),
            Value::Bool(b) if *ty == Type::BOOL => b.to_sql(ty, out),
            Value::Bool(b) => integer_to_sql(i64::from(*b), ty, out),
            Value::Timestamp(t) if *ty == Type::TIMESTAMPTZ => t.and_utc().to_sql(ty, out),
            Value::Timestamp(t) => t.to_sql_checked(ty, out),
            Value::TimestampTz(t) if *ty == Type::TIMESTAMP => t.naive_utc().to_sql(ty, out),
            Value::TimestampTz(t) => t.to_sql_checked(ty, out),
        }
    }

    // The variant decides the wire type; unsupported pairs fail in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn column_value(row: &Row, index: usize, ty: &Type, name: &str) -> CrudResult<Value> {
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(index)?.map(Value::Bool)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(index)?
            .map(|v| Value::Integer(i64::from(v)))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(index)?
            .map(|v| Value::Integer(i64::from(v)))
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(index)?.map(Value::Integer)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(index)?
            .map(|v| Value::Real(f64::from(v)))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(index)?.map(Value::Real)
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN].contains(ty) {
        row.try_get::<_, Option<String>>(index)?.map(Value::Text)
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(index)?.map(Value::Blob)
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(index)?
            .map(Value::Timestamp)
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<Utc>>>(index)?
            .map(Value::TimestampTz)
    } else {
        return Err(CrudError::decode(
            name,
            format!("unsupported column type `{ty}`"),
        ));
    };
    Ok(value.unwrap_or(Value::Null))
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

fn run_execute<C: GenericClient>(
    client: &mut C,
    sql: &str,
    params: &[Value],
) -> CrudResult<ExecResult> {
    let rows_affected = GenericClient::execute(client, sql, &param_refs(params))?;
    Ok(ExecResult {
        rows_affected,
        last_insert_id: None,
    })
}

fn run_query<C: GenericClient>(client: &mut C, sql: &str, params: &[Value]) -> CrudResult<RowSet> {
    let stmt = client.prepare(sql)?;
    let columns: Vec<(String, Type)> = stmt
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.type_().clone()))
        .collect();
    let rows = GenericClient::query(client, &stmt, &param_refs(params))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut values = Vec::with_capacity(columns.len());
        for (index, (name, ty)) in columns.iter().enumerate() {
            values.push(column_value(row, index, ty, name)?);
        }
        out.push(values);
    }
    RowSet::new(columns.into_iter().map(|(name, _)| name).collect(), out)
}

impl Executor for Client {
    fn execute(&mut self, sql: &str, params: &[Value]) -> CrudResult<ExecResult> {
        run_execute(self, sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> CrudResult<RowSet> {
        run_query(self, sql, params)
    }
}

impl Executor for postgres::Transaction<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> CrudResult<ExecResult> {
        run_execute(self, sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> CrudResult<RowSet> {
        run_query(self, sql, params)
    }
}
