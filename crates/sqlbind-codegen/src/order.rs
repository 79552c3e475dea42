//! Deterministic ordering of generated output.
//!
//! Fields are ordered by column name, types by type name. Both sorts are stable so
//! equal keys keep their input order.

use crate::meta::{FieldMeta, TypeMeta};

/// Sort fields ascending by column name (byte order).
pub fn sort_fields(fields: &mut [FieldMeta]) {
    fields.sort_by(|a, b| a.column.cmp(&b.column));
}

/// Sort types ascending by type name (byte order).
pub fn sort_types(types: &mut [TypeMeta]) {
    types.sort_by_cached_key(|t| t.name.to_string());
}
