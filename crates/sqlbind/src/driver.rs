//! Driver adapters: [`Executor`](crate::Executor) and value conversion per engine.

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;
