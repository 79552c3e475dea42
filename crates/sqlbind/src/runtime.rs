//! Dialect-independent scan, insert and update.

use crate::binding::{Bindable, Enumerable, Rebind, Slot};
use crate::error::{CrudError, CrudResult};
use crate::exec::{Executor, RowSet};
use crate::value::Value;

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[cfg(feature = "tracing")]
pub(crate) fn log_statement(op: &'static str, table: &str, stmt: &Statement) {
    tracing::debug!(
        target: "sqlbind.sql",
        op,
        table,
        param_count = stmt.params.len(),
        sql = %stmt.sql,
    );
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_statement(_op: &'static str, _table: &str, _stmt: &Statement) {}

fn lowercase_columns(rows: &RowSet) -> Vec<String> {
    rows.columns().iter().map(|c| c.to_lowercase()).collect()
}

fn discard_unbound(slots: &mut [Slot<'_>]) -> usize {
    let mut discarded = 0;
    for slot in slots.iter_mut().filter(|s| s.is_unbound()) {
        *slot = Slot::Discard;
        discarded += 1;
    }
    discarded
}

#[cfg(feature = "tracing")]
fn log_scan(columns: usize, discarded: usize) {
    tracing::trace!(
        target: "sqlbind.sql",
        bound = columns - discarded,
        discarded,
        "scan"
    );
}

#[cfg(not(feature = "tracing"))]
fn log_scan(_columns: usize, _discarded: usize) {}

/// Scan the current row of `rows` into one or more targets.
///
/// Each target claims the columns it knows. When two targets know the same column,
/// the first target in `targets` keeps it and later targets leave the matching field
/// untouched (a join of `foo` and `bar` on `foo_id` fills `foo_id` only in the first
/// target). Columns nobody claims are discarded. After the row is copied, every
/// target's `inflate` runs in order.
pub fn generic_scan(rows: &RowSet, targets: &mut [&mut dyn Bindable]) -> CrudResult<()> {
    let columns = lowercase_columns(rows);

    {
        let mut slots: Vec<Slot<'_>> = columns.iter().map(|_| Slot::Unbound).collect();
        for target in targets.iter_mut() {
            target.bind_fields(&columns, &mut slots);
        }
        let discarded = discard_unbound(&mut slots);
        log_scan(columns.len(), discarded);
        rows.scan(&mut slots)?;
    }

    for target in targets.iter_mut() {
        target.inflate()?;
    }
    Ok(())
}

/// Deflate, enumerate and resolve the pairs of `obj` into owned values.
fn enumerate_checked<T: Enumerable + ?Sized>(
    obj: &mut T,
) -> CrudResult<Vec<(&'static str, Value)>> {
    obj.deflate()?;
    let (names, args) = obj.enumerate_fields();
    if names.len() != args.len() {
        return Err(CrudError::LengthMismatch {
            names: names.len(),
            values: args.len(),
        });
    }
    Ok(names
        .into_iter()
        .zip(args.iter().map(|arg| arg.to_value()))
        .collect())
}

fn is_key(name: &str, key: &str) -> bool {
    !key.is_empty() && name.eq_ignore_ascii_case(key)
}

/// Build the INSERT for `obj`, leaving out the key column.
///
/// `placeholder` renders the 1-based parameter index (`?1`, `$1`, ...).
pub fn prepare_insert<P, T>(
    placeholder: P,
    table: &str,
    key: &str,
    obj: &mut T,
) -> CrudResult<Statement>
where
    P: Fn(usize) -> String,
    T: Enumerable + ?Sized,
{
    let (columns, params): (Vec<&str>, Vec<Value>) = enumerate_checked(obj)?
        .into_iter()
        .filter(|(name, _)| !is_key(name, key))
        .unzip();
    let placeholders: Vec<String> = (1..=columns.len()).map(placeholder).collect();

    Ok(Statement {
        sql: format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    })
}

/// Insert `obj` and return the engine's last insert id, or 0 when `key` is empty.
pub fn generic_insert<E, P, T>(
    db: &mut E,
    placeholder: P,
    table: &str,
    key: &str,
    obj: &mut T,
) -> CrudResult<i64>
where
    E: Executor + ?Sized,
    P: Fn(usize) -> String,
    T: Enumerable + ?Sized,
{
    let stmt = prepare_insert(placeholder, table, key, obj)?;
    log_statement("insert", table, &stmt);
    let result = db.execute(&stmt.sql, &stmt.params)?;
    if key.is_empty() {
        return Ok(0);
    }
    Ok(result.last_insert_id.unwrap_or(0))
}

/// Build the UPDATE for `obj`, keyed on its `key` column.
///
/// Fails with [`CrudError::UnsetPrimaryKey`] when `key` is empty or not enumerated.
pub fn prepare_update<P, T>(
    placeholder: P,
    table: &str,
    key: &str,
    obj: &mut T,
) -> CrudResult<Statement>
where
    P: Fn(usize) -> String,
    T: Enumerable + ?Sized,
{
    let mut key_value = None;
    let mut assignments = Vec::new();
    let mut params = Vec::new();

    for (name, value) in enumerate_checked(obj)? {
        if is_key(name, key) {
            if key_value.is_none() {
                key_value = Some(value);
            }
            continue;
        }
        params.push(value);
        assignments.push(format!("{name} = {}", placeholder(params.len())));
    }

    let Some(key_value) = key_value else {
        return Err(CrudError::UnsetPrimaryKey {
            table: table.to_string(),
            key: key.to_string(),
        });
    };
    params.push(key_value);

    Ok(Statement {
        sql: format!(
            "UPDATE {table} SET {} WHERE {key} = {}",
            assignments.join(", "),
            placeholder(params.len())
        ),
        params,
    })
}

/// Update `obj` by key and return the number of rows affected.
pub fn generic_update<E, P, T>(
    db: &mut E,
    placeholder: P,
    table: &str,
    key: &str,
    obj: &mut T,
) -> CrudResult<u64>
where
    E: Executor + ?Sized,
    P: Fn(usize) -> String,
    T: Enumerable + ?Sized,
{
    let stmt = prepare_update(placeholder, table, key, obj)?;
    log_statement("update", table, &stmt);
    Ok(db.execute(&stmt.sql, &stmt.params)?.rows_affected)
}

/// Scan every remaining row of `rows` into a fresh `T::default()`.
pub fn scan_all<T: Bindable + Default>(rows: &mut RowSet) -> CrudResult<Vec<T>> {
    let mut out = Vec::with_capacity(rows.len());
    while rows.next_row() {
        let mut item = T::default();
        generic_scan(rows, &mut [&mut item])?;
        out.push(item);
    }
    Ok(out)
}

/// Scan every remaining row into clones of `prototype`, binding by a plan computed
/// once for the result set.
pub fn scan_all_reusing<T: Rebind + Clone>(rows: &mut RowSet, prototype: &T) -> CrudResult<Vec<T>> {
    let columns = lowercase_columns(rows);
    let plan = T::plan(&columns);
    let mut out = Vec::with_capacity(rows.len());

    while rows.next_row() {
        let mut item = prototype.clone();
        {
            let mut slots: Vec<Slot<'_>> = columns.iter().map(|_| Slot::Unbound).collect();
            item.bind_planned(&plan, &mut slots);
            discard_unbound(&mut slots);
            rows.scan(&mut slots)?;
        }
        item.inflate()?;
        out.push(item);
    }
    Ok(out)
}

/// Run `sql` and scan the first row, if any.
pub fn fetch_one<T, E>(db: &mut E, sql: &str, params: &[Value]) -> CrudResult<Option<T>>
where
    T: Bindable + Default,
    E: Executor + ?Sized,
{
    let mut rows = db.query(sql, params)?;
    if !rows.next_row() {
        return Ok(None);
    }
    let mut item = T::default();
    generic_scan(&rows, &mut [&mut item])?;
    Ok(Some(item))
}

/// Run `sql` and scan every row.
pub fn fetch_all<T, E>(db: &mut E, sql: &str, params: &[Value]) -> CrudResult<Vec<T>>
where
    T: Bindable + Default,
    E: Executor + ?Sized,
{
    let mut rows = db.query(sql, params)?;
    scan_all(&mut rows)
}
