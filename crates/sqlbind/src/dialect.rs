//! SQL dialects and the process-wide default.
//!
//! Engines differ in how a generated primary key comes back from an INSERT:
//! SQLite reports a last insert id, PostgreSQL needs a `RETURNING` clause.

use crate::binding::{Bindable, Enumerable};
use crate::error::{CrudError, CrudResult};
use crate::exec::{Executor, RowSet};
use crate::runtime::{generic_insert, generic_scan, generic_update, log_statement, prepare_insert};
use crate::value::FromValue;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Engine-specific statement handling.
pub trait Dialect {
    /// Short engine name.
    fn name(&self) -> &'static str;

    /// Positional placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Scan the current row into `targets`. A column claimed by several targets goes
    /// to the first one.
    fn scan(&self, rows: &RowSet, targets: &mut [&mut dyn Bindable]) -> CrudResult<()> {
        generic_scan(rows, targets)
    }

    /// Insert `obj` and return its generated key (0 when `key` is empty).
    fn insert<E, T>(&self, db: &mut E, table: &str, key: &str, obj: &mut T) -> CrudResult<i64>
    where
        E: Executor + ?Sized,
        T: Enumerable + ?Sized;

    /// Update `obj` by `key` and return rows affected.
    fn update<E, T>(&self, db: &mut E, table: &str, key: &str, obj: &mut T) -> CrudResult<u64>
    where
        E: Executor + ?Sized,
        T: Enumerable + ?Sized,
    {
        generic_update(db, |i| self.placeholder(i), table, key, obj)
    }
}

/// SQLite: `?N` placeholders, keys from the engine's last insert id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }

    fn insert<E, T>(&self, db: &mut E, table: &str, key: &str, obj: &mut T) -> CrudResult<i64>
    where
        E: Executor + ?Sized,
        T: Enumerable + ?Sized,
    {
        generic_insert(db, |i| self.placeholder(i), table, key, obj)
    }
}

/// PostgreSQL: `$N` placeholders, keys via `RETURNING`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn insert<E, T>(&self, db: &mut E, table: &str, key: &str, obj: &mut T) -> CrudResult<i64>
    where
        E: Executor + ?Sized,
        T: Enumerable + ?Sized,
    {
        if key.is_empty() {
            return generic_insert(db, |i| self.placeholder(i), table, key, obj);
        }

        let mut stmt = prepare_insert(|i| self.placeholder(i), table, key, obj)?;
        stmt.sql.push_str(" RETURNING ");
        stmt.sql.push_str(key);
        log_statement("insert", table, &stmt);

        let mut rows = db.query(&stmt.sql, &stmt.params)?;
        if !rows.next_row() {
            return Err(CrudError::not_found(format!(
                "INSERT INTO {table} returned no row"
            )));
        }
        let value = rows
            .current()
            .and_then(|row| row.first())
            .ok_or_else(|| CrudError::shape("RETURNING produced no columns"))?;
        i64::from_value(value).map_err(|e| CrudError::decode(key, e.to_string()))
    }
}

/// Runtime-selectable dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DialectKind {
    #[default]
    Sqlite,
    Postgres,
}

impl DialectKind {
    /// Pick a dialect from a connection URL scheme (`sqlite:`, `file:`,
    /// `postgres://`, `postgresql://`).
    pub fn from_url(url: &str) -> CrudResult<Self> {
        let Some((scheme, _)) = url.split_once(':') else {
            return Err(CrudError::UnknownDialect(url.to_string()));
        };
        if scheme.eq_ignore_ascii_case("file") {
            return Ok(Self::Sqlite);
        }
        scheme
            .parse()
            .map_err(|_| CrudError::UnknownDialect(url.to_string()))
    }

    /// Read a dialect name or connection URL from the environment variable `var`.
    pub fn from_env(var: &str) -> CrudResult<Self> {
        let raw = std::env::var(var)
            .map_err(|e| CrudError::Other(format!("failed to read `{var}`: {e}")))?;
        let raw = raw.trim();
        raw.parse().or_else(|_| Self::from_url(raw))
    }
}

impl FromStr for DialectKind {
    type Err = CrudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(CrudError::UnknownDialect(s.to_string())),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Dialect for DialectKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Sqlite => Sqlite.name(),
            Self::Postgres => Postgres.name(),
        }
    }

    fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Sqlite => Sqlite.placeholder(index),
            Self::Postgres => Postgres.placeholder(index),
        }
    }

    fn scan(&self, rows: &RowSet, targets: &mut [&mut dyn Bindable]) -> CrudResult<()> {
        match self {
            Self::Sqlite => Sqlite.scan(rows, targets),
            Self::Postgres => Postgres.scan(rows, targets),
        }
    }

    fn insert<E, T>(&self, db: &mut E, table: &str, key: &str, obj: &mut T) -> CrudResult<i64>
    where
        E: Executor + ?Sized,
        T: Enumerable + ?Sized,
    {
        match self {
            Self::Sqlite => Sqlite.insert(db, table, key, obj),
            Self::Postgres => Postgres.insert(db, table, key, obj),
        }
    }

    fn update<E, T>(&self, db: &mut E, table: &str, key: &str, obj: &mut T) -> CrudResult<u64>
    where
        E: Executor + ?Sized,
        T: Enumerable + ?Sized,
    {
        match self {
            Self::Sqlite => Sqlite.update(db, table, key, obj),
            Self::Postgres => Postgres.update(db, table, key, obj),
        }
    }
}

static DEFAULT_DIALECT: OnceLock<DialectKind> = OnceLock::new();

/// Choose the process-wide default dialect.
///
/// Succeeds once; later calls succeed only if they repeat the same choice. Reading
/// the default with [`default_dialect`] first freezes it at `Sqlite`.
pub fn set_default_dialect(kind: DialectKind) -> CrudResult<()> {
    match DEFAULT_DIALECT.set(kind) {
        Ok(()) => Ok(()),
        Err(_) if default_dialect() == kind => Ok(()),
        Err(_) => Err(CrudError::DialectAlreadySet),
    }
}

/// The process-wide default dialect (`Sqlite` unless set beforehand).
pub fn default_dialect() -> DialectKind {
    *DEFAULT_DIALECT.get_or_init(DialectKind::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Arg;
    use crate::exec::ExecResult;
    use crate::runtime::testing::Recorder;
    use crate::value::Value;

    struct Row {
        id: i64,
        n: i64,
    }

    impl Enumerable for Row {
        fn enumerate_fields(&self) -> (Vec<&'static str>, Vec<Arg<'_>>) {
            (vec!["id", "n"], vec![Arg::Field(&self.id), Arg::Field(&self.n)])
        }
    }

    #[test]
    fn placeholders() {
        assert_eq!(Sqlite.placeholder(3), "?3");
        assert_eq!(Postgres.placeholder(3), "$3");
        assert_eq!(DialectKind::Postgres.placeholder(1), "$1");
    }

    #[test]
    fn names_parse() {
        assert_eq!("SQLite3".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        assert_eq!("pg".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert!(matches!(
            "mysql".parse::<DialectKind>(),
            Err(CrudError::UnknownDialect(_))
        ));
        assert_eq!(DialectKind::Postgres.to_string(), "postgres");
    }

    #[test]
    fn urls_parse() {
        assert_eq!(
            DialectKind::from_url("postgres://u:p@localhost/db").unwrap(),
            DialectKind::Postgres
        );
        assert_eq!(
            DialectKind::from_url("postgresql://localhost").unwrap(),
            DialectKind::Postgres
        );
        assert_eq!(DialectKind::from_url("sqlite::memory:").unwrap(), DialectKind::Sqlite);
        assert_eq!(DialectKind::from_url("file:test.db").unwrap(), DialectKind::Sqlite);
        assert!(DialectKind::from_url("mysql://localhost").is_err());
        assert!(DialectKind::from_url("no-scheme").is_err());
    }

    #[test]
    fn missing_env_var_is_an_error() {
        assert!(DialectKind::from_env("SQLBIND_TEST_SURELY_UNSET_VAR").is_err());
    }

    #[test]
    fn default_is_sqlite_and_frozen() {
        assert_eq!(default_dialect(), DialectKind::Sqlite);
        assert!(set_default_dialect(DialectKind::Sqlite).is_ok());
        assert!(matches!(
            set_default_dialect(DialectKind::Postgres),
            Err(CrudError::DialectAlreadySet)
        ));
    }

    #[test]
    fn postgres_insert_appends_returning() {
        let mut db = Recorder {
            rows: Some(
                RowSet::new(vec!["id".into()], vec![vec![Value::Integer(9)]]).unwrap(),
            ),
            ..Default::default()
        };
        let id = Postgres
            .insert(&mut db, "t", "id", &mut Row { id: 0, n: 4 })
            .unwrap();
        assert_eq!(id, 9);
        assert_eq!(
            db.statements[0].sql,
            "INSERT INTO t (n) VALUES ($1) RETURNING id"
        );
    }

    #[test]
    fn postgres_insert_without_returned_row_is_not_found() {
        let mut db = Recorder::default();
        let err = Postgres
            .insert(&mut db, "t", "id", &mut Row { id: 0, n: 4 })
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn postgres_insert_without_key_executes_plainly() {
        let mut db = Recorder::default();
        let id = Postgres
            .insert(&mut db, "t", "", &mut Row { id: 1, n: 4 })
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(db.statements[0].sql, "INSERT INTO t (id, n) VALUES ($1, $2)");
    }

    #[test]
    fn sqlite_insert_uses_last_insert_id() {
        let mut db = Recorder {
            exec_result: ExecResult {
                rows_affected: 1,
                last_insert_id: Some(17),
            },
            ..Default::default()
        };
        let id = Sqlite
            .insert(&mut db, "t", "id", &mut Row { id: 0, n: 4 })
            .unwrap();
        assert_eq!(id, 17);
        assert_eq!(db.statements[0].sql, "INSERT INTO t (n) VALUES (?1)");
    }

    #[test]
    fn update_is_shared() {
        let mut db = Recorder::default();
        DialectKind::Postgres
            .update(&mut db, "t", "id", &mut Row { id: 3, n: 4 })
            .unwrap();
        assert_eq!(db.statements[0].sql, "UPDATE t SET n = $1 WHERE id = $2");
        assert_eq!(db.statements[0].params, vec![Value::Integer(4), Value::Integer(3)]);
    }
}
