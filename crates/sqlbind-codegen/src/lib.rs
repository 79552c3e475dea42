//! Metadata extraction, deterministic ordering and binding code generation for sqlbind.
//!
//! `sqlbind-derive` calls [`TypeMeta::from_derive_input`] and [`expand`] for each
//! `#[derive(Crud)]`. Tools that write generated bindings to disk can use
//! [`generate_source`] to process a whole file at once.

mod attrs;
mod discover;
mod emit;
mod meta;
mod order;
mod syn_types;

pub use discover::discover;
pub use emit::{expand, render};
pub use meta::{FieldKind, FieldMeta, TimeEncoding, TypeMeta, TypeOptions};
pub use order::{sort_fields, sort_types};
pub use syn_types::option_inner;

/// Parse `source`, discover every `Crud` struct and render their bindings.
///
/// Output is byte-identical for identical input.
pub fn generate_source(source: &str) -> syn::Result<String> {
    let file = syn::parse_file(source)?;
    Ok(render(discover(&file)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
        #[derive(Crud, Default)]
        #[crud(key = "foo_id")]
        struct Foo {
            #[crud(column = "foo_id")] id: i64,
            #[crud(column = "foo_num")] num: i64,
        }

        #[derive(Crud, Default)]
        struct OptionalFoo {
            #[crud(column = "foo_num")] num: Option<i64>,
        }
    "#;

    #[test]
    fn generation_is_idempotent() {
        let first = generate_source(SOURCE).unwrap();
        let second = generate_source(SOURCE).unwrap();
        assert_eq!(first, second);
        assert!(first.find("for Foo").unwrap() < first.find("for OptionalFoo").unwrap());
    }

    #[test]
    fn parse_errors_surface() {
        assert!(generate_source("struct {").is_err());
    }

    #[test]
    fn file_without_crud_structs_renders_nothing() {
        assert_eq!(generate_source("struct Plain { x: i64 }").unwrap(), "");
    }
}
