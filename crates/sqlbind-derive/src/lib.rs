//! Derive macros for sqlbind
//!
//! Provides `#[derive(Crud)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derive column bindings for a struct.
///
/// # Example
///
/// ```ignore
/// use sqlbind::Crud;
///
/// #[derive(Crud, Default)]
/// #[crud(key = "foo_id")]
/// struct Foo {
///     #[crud(column = "foo_id")]
///     id: i64,
///     #[crud(column = "foo_str")]
///     s: String,
///     #[crud(column = "foo_seen", unix)]
///     seen: Option<DateTime<Utc>>,
///     cache: Vec<u8>,
/// }
/// ```
///
/// # Generated
///
/// - `sqlbind::Bindable`, `sqlbind::Enumerable`, `sqlbind::Rebind`, `sqlbind::Table`
/// - `fn fetch_one(db, sql, params)` / `fn fetch_all(db, sql, params)` (requires `Default`)
///
/// # Attributes
///
/// - `#[crud(table = "name")]` - Table name (defaults to the snake_case struct name)
/// - `#[crud(key = "column")]` - Primary-key column
/// - `#[crud(hooks)]` - Call the type's `sqlbind::Hooks` impl around writes and scans
/// - `#[crud(no_fetch)]` - Skip the fetch helpers
/// - `#[crud]` / `#[crud(column = "name")]` - Persist a field (unannotated fields are skipped)
/// - `#[crud(column = "name", unix)]` - Store a `DateTime<Utc>` as Unix seconds
#[proc_macro_derive(Crud, attributes(crud))]
pub fn derive_crud(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    sqlbind_codegen::TypeMeta::from_derive_input(&input)
        .map(|meta| sqlbind_codegen::expand(&meta))
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
