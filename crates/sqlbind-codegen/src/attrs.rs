//! Attribute parsing for `#[crud(...)]`.
//!
//! Struct level: `#[crud(table = "...", key = "...", hooks, no_fetch)]`.
//! Field level: `#[crud]`, `#[crud(column = "...")]`, `#[crud(column = "...", unix)]`.

use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Attribute, Error, LitStr, Meta, Result};

/// Parsed field-level `#[crud]` attribute.
pub(crate) struct FieldAttr {
    pub column: Option<String>,
    pub unix: bool,
    pub span: Span,
}

/// Parsed struct-level `#[crud]` attributes.
#[derive(Default)]
pub(crate) struct TypeAttr {
    pub table: Option<String>,
    pub key: Option<(String, Span)>,
    pub hooks: bool,
    pub no_fetch: bool,
}

pub(crate) fn is_valid_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate and lowercase a column name.
pub(crate) fn parse_column_name(raw: &str, span: Span) -> Result<String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(Error::new(span, "column name must not be empty"));
    }
    if !is_valid_sql_ident(s) {
        return Err(Error::new(
            span,
            format!("column `{s}` must be a valid SQL identifier (expected [A-Za-z_][A-Za-z0-9_]*)"),
        ));
    }
    Ok(s.to_ascii_lowercase())
}

fn parse_table_name(lit: &LitStr) -> Result<String> {
    let raw = lit.value();
    let s = raw.trim();
    if s.is_empty() {
        return Err(Error::new(lit.span(), "table name must not be empty"));
    }
    if !s.split('.').all(is_valid_sql_ident) {
        return Err(Error::new(
            lit.span(),
            format!("table `{s}` must be a (dotted) SQL identifier"),
        ));
    }
    Ok(s.to_string())
}

/// Parse the `#[crud]` attribute of a field. `None` means the field is not persisted.
pub(crate) fn parse_field_attr(attrs: &[Attribute]) -> Result<Option<FieldAttr>> {
    let mut found: Option<FieldAttr> = None;

    for attr in attrs {
        if !attr.path().is_ident("crud") {
            continue;
        }
        if found.is_some() {
            return Err(Error::new_spanned(attr, "duplicate #[crud] attribute on field"));
        }

        let mut parsed = FieldAttr {
            column: None,
            unix: false,
            span: attr.span(),
        };

        // `#[crud]` alone binds the field under its own name.
        if !matches!(attr.meta, Meta::Path(_)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("column") {
                    let lit: LitStr = meta.value()?.parse()?;
                    parsed.column = Some(parse_column_name(&lit.value(), lit.span())?);
                    parsed.span = lit.span();
                    Ok(())
                } else if meta.path.is_ident("unix") {
                    parsed.unix = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported field option (expected `column = \"...\"` or `unix`)"))
                }
            })?;
        }

        found = Some(parsed);
    }

    Ok(found)
}

/// Parse and merge every struct-level `#[crud(...)]` attribute.
pub(crate) fn parse_type_attr(attrs: &[Attribute]) -> Result<TypeAttr> {
    let mut result = TypeAttr::default();

    for attr in attrs {
        if !attr.path().is_ident("crud") || matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                result.table = Some(parse_table_name(&lit)?);
            } else if meta.path.is_ident("key") {
                let lit: LitStr = meta.value()?.parse()?;
                let key = parse_column_name(&lit.value(), lit.span())?;
                result.key = Some((key, lit.span()));
            } else if meta.path.is_ident("hooks") {
                result.hooks = true;
            } else if meta.path.is_ident("no_fetch") {
                result.no_fetch = true;
            } else {
                return Err(meta.error(
                    "unsupported struct option (expected `table`, `key`, `hooks` or `no_fetch`)",
                ));
            }
            Ok(())
        })?;
    }

    Ok(result)
}
