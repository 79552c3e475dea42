//! Discovery of `#[derive(Crud)]` structs in a parsed source file.

use crate::meta::TypeMeta;
use crate::syn_types::is_crud_path;
use syn::punctuated::Punctuated;
use syn::{DeriveInput, Item, ItemStruct, Path, Result, Token};

fn derives_crud(item: &ItemStruct) -> Result<bool> {
    for attr in &item.attrs {
        if !attr.path().is_ident("derive") {
            continue;
        }
        let paths = attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)?;
        if paths.iter().any(is_crud_path) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn collect(items: &[Item], out: &mut Vec<TypeMeta>) -> Result<()> {
    for item in items {
        match item {
            Item::Struct(s) if derives_crud(s)? => {
                let input = DeriveInput::from(s.clone());
                out.push(TypeMeta::from_derive_input(&input)?);
            }
            Item::Mod(m) => {
                if let Some((_, inner)) = &m.content {
                    collect(inner, out)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Collect metadata for every struct deriving `Crud`, including those in inline modules.
///
/// Returned in source order; the first invalid struct aborts discovery.
pub fn discover(file: &syn::File) -> Result<Vec<TypeMeta>> {
    let mut out = Vec::new();
    collect(&file.items, &mut out)?;
    Ok(out)
}
