//! Convenient imports for typical `sqlbind` usage.
//!
//! ```ignore
//! use sqlbind::prelude::*;
//! ```

pub use crate::{
    Bindable, CrudError, CrudResult, Dialect, DialectKind, Enumerable, Executor, Hooks, Postgres,
    Rebind, RowSet, Sqlite, Table, Value,
};

#[cfg(feature = "derive")]
pub use crate::Crud;
