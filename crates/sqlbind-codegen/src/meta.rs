//! Field and type metadata extracted from `#[crud]`-annotated structs.

use crate::attrs::{parse_field_attr, parse_type_attr};
use crate::syn_types::option_inner;
use heck::ToSnakeCase;
use proc_macro2::Span;
use std::collections::HashMap;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Error, Fields, Generics, Ident, Result, Type};

/// How a field is handed to the runtime by the enumerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Enumerated by address (`&self.field`).
    Plain,
    /// `Option<T>`: enumerated by value (`self.field.as_ref()`), already an indirection.
    Optional,
}

/// Alternate storage encoding for time-valued fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoding {
    /// Integer seconds since the Unix epoch instead of a native timestamp.
    Unix,
}

/// One persisted struct field.
#[derive(Clone)]
pub struct FieldMeta {
    /// Rust field identifier.
    pub name: Ident,
    /// Lowercased SQL column name.
    pub column: String,
    /// Declared field type.
    pub ty: Type,
    pub kind: FieldKind,
    pub encoding: Option<TimeEncoding>,
    pub(crate) span: Span,
}

/// Struct-level options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOptions {
    /// Table name; defaults to the snake_case struct name.
    pub table: String,
    /// Primary-key column; empty when the type has none.
    pub key: String,
    /// Call `sqlbind::Hooks` around writes and scans.
    pub hooks: bool,
    /// Emit `fetch_one` / `fetch_all`.
    pub fetch: bool,
}

/// One annotated struct and its persisted fields.
#[derive(Clone)]
pub struct TypeMeta {
    pub name: Ident,
    pub generics: Generics,
    /// Fields in declaration order. Emission sorts a copy by column.
    pub fields: Vec<FieldMeta>,
    pub options: TypeOptions,
}

impl FieldMeta {
    fn new(field: &syn::Field) -> Result<Option<Self>> {
        let Some(attr) = parse_field_attr(&field.attrs)? else {
            return Ok(None);
        };
        let Some(name) = field.ident.clone() else {
            return Err(Error::new(attr.span, "#[crud] requires a named field"));
        };

        let column = match attr.column {
            Some(column) => column,
            None => crate::attrs::parse_column_name(&name.unraw().to_string(), name.span())?,
        };
        let kind = if option_inner(&field.ty).is_some() {
            FieldKind::Optional
        } else {
            FieldKind::Plain
        };

        Ok(Some(Self {
            name,
            column,
            ty: field.ty.clone(),
            kind,
            encoding: attr.unix.then_some(TimeEncoding::Unix),
            span: attr.span,
        }))
    }
}

impl TypeMeta {
    /// Build metadata for a `#[derive(Crud)]` input.
    ///
    /// Fails on the first problem (unsupported shape, bad attribute, duplicate column)
    /// without returning partial metadata.
    pub fn from_derive_input(input: &DeriveInput) -> Result<Self> {
        let fields = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => Some(&fields.named),
                Fields::Unit => None,
                Fields::Unnamed(_) => {
                    return Err(Error::new_spanned(
                        input,
                        "Crud can only be derived for structs with named fields",
                    ));
                }
            },
            _ => {
                return Err(Error::new_spanned(
                    input,
                    "Crud can only be derived for structs",
                ));
            }
        };

        let attr = parse_type_attr(&input.attrs)?;

        let mut metas: Vec<FieldMeta> = Vec::new();
        let mut seen: HashMap<String, Ident> = HashMap::new();
        for field in fields.into_iter().flatten() {
            let Some(meta) = FieldMeta::new(field)? else {
                continue;
            };
            if let Some(previous) = seen.get(&meta.column) {
                return Err(Error::new(
                    meta.span,
                    format!(
                        "duplicate column `{}` (already bound by field `{}`)",
                        meta.column, previous
                    ),
                ));
            }
            seen.insert(meta.column.clone(), meta.name.clone());
            metas.push(meta);
        }

        let key = match attr.key {
            Some((key, span)) => {
                if !seen.contains_key(&key) {
                    return Err(Error::new(
                        span,
                        format!("key column `{key}` is not bound by any #[crud] field"),
                    ));
                }
                key
            }
            None => String::new(),
        };

        let table = attr
            .table
            .unwrap_or_else(|| input.ident.unraw().to_string().to_snake_case());

        Ok(Self {
            name: input.ident.clone(),
            generics: input.generics.clone(),
            fields: metas,
            options: TypeOptions {
                table,
                key,
                hooks: attr.hooks,
                fetch: !attr.no_fetch,
            },
        })
    }

    /// Column names in declaration order.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.column.as_str()).collect()
    }
}
