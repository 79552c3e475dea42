//! # sqlbind
//!
//! Derive-generated column bindings plus a small, dialect-aware persistence runtime.
//!
//! ## Features
//!
//! - **Explicit SQL**: you write the SELECTs; sqlbind maps result columns onto struct fields
//! - **Generated bindings**: `#[derive(Crud)]` emits a binder, an enumerator and table metadata
//! - **Generic writes**: INSERT / UPDATE statements built from the enumerated fields
//! - **Dialects**: SQLite (last insert id) and PostgreSQL (`RETURNING`) key retrieval
//! - **Hooks**: per-type `deflate` before writes and `inflate` after scans
//!
//! ## Example
//!
//! ```ignore
//! use sqlbind::prelude::*;
//!
//! #[derive(Debug, Default, Crud)]
//! #[crud(key = "foo_id")]
//! struct Foo {
//!     #[crud(column = "foo_id")]
//!     id: i64,
//!     #[crud(column = "foo_str")]
//!     s: String,
//! }
//!
//! let mut conn = rusqlite::Connection::open_in_memory()?;
//! let mut foo = Foo { id: 0, s: "hello".into() };
//! foo.id = sqlbind::insert_record(&mut conn, &mut foo)?;
//!
//! let all = Foo::fetch_all(&mut conn, "SELECT * FROM foo", &[])?;
//! ```

pub mod binding;
pub mod dialect;
mod driver;
pub mod error;
pub mod exec;
pub mod prelude;
pub mod runtime;
pub mod value;

pub use binding::{Arg, BindPlan, Bindable, Enumerable, Hooks, Rebind, Slot, Table};
pub use dialect::{Dialect, DialectKind, Postgres, Sqlite, default_dialect, set_default_dialect};
pub use error::{CrudError, CrudResult};
pub use exec::{ExecResult, Executor, RowSet};
pub use runtime::{
    Statement, fetch_all, fetch_one, generic_insert, generic_scan, generic_update,
    prepare_insert, prepare_update, scan_all, scan_all_reusing,
};
pub use value::{Assign, EpochTime, FromValue, ToValue, Value, ValueError};

#[cfg(feature = "derive")]
pub use sqlbind_derive::Crud;

/// Scan the current row into `targets` using the default dialect.
pub fn scan(rows: &RowSet, targets: &mut [&mut dyn Bindable]) -> CrudResult<()> {
    default_dialect().scan(rows, targets)
}

/// Insert `obj` into `table` using the default dialect; returns the generated key.
pub fn insert<E, T>(db: &mut E, table: &str, key: &str, obj: &mut T) -> CrudResult<i64>
where
    E: Executor + ?Sized,
    T: Enumerable + ?Sized,
{
    default_dialect().insert(db, table, key, obj)
}

/// Update `obj` in `table` by `key` using the default dialect.
pub fn update<E, T>(db: &mut E, table: &str, key: &str, obj: &mut T) -> CrudResult<u64>
where
    E: Executor + ?Sized,
    T: Enumerable + ?Sized,
{
    default_dialect().update(db, table, key, obj)
}

/// [`insert`] with the table and key taken from `T`'s [`Table`] impl.
pub fn insert_record<E, T>(db: &mut E, obj: &mut T) -> CrudResult<i64>
where
    E: Executor + ?Sized,
    T: Enumerable + Table,
{
    insert(db, T::NAME, T::KEY, obj)
}

/// [`update`] with the table and key taken from `T`'s [`Table`] impl.
pub fn update_record<E, T>(db: &mut E, obj: &mut T) -> CrudResult<u64>
where
    E: Executor + ?Sized,
    T: Enumerable + Table,
{
    update(db, T::NAME, T::KEY, obj)
}
