//! Binder / enumerator emission.

use crate::meta::{FieldKind, FieldMeta, TimeEncoding, TypeMeta};
use crate::order::{sort_fields, sort_types};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

fn local(index: usize) -> proc_macro2::Ident {
    format_ident!("__field_{}", index)
}

/// Destination constructor for a field (`Slot::Field` or `Slot::Epoch`).
fn slot_ctor(field: &FieldMeta) -> TokenStream {
    match field.encoding {
        Some(TimeEncoding::Unix) => quote!(::sqlbind::Slot::Epoch),
        None => quote!(::sqlbind::Slot::Field),
    }
}

/// `let Self { a: __field_0, .. } = self;` followed by one `Option` per field so each
/// destination is handed out at most once.
fn destructure(fields: &[FieldMeta]) -> TokenStream {
    let names = fields.iter().map(|f| &f.name);
    let locals: Vec<_> = (0..fields.len()).map(local).collect();
    quote! {
        let Self { #(#names: #locals,)* .. } = self;
        #(let mut #locals = ::core::option::Option::Some(#locals);)*
    }
}

fn install(field: &FieldMeta, index: usize) -> TokenStream {
    let ctor = slot_ctor(field);
    let l = local(index);
    quote! {
        if let ::core::option::Option::Some(field) = #l.take() {
            *slot = #ctor(field);
        }
    }
}

fn emit_bindable(meta: &TypeMeta, fields: &[FieldMeta]) -> TokenStream {
    let name = &meta.name;
    let (impl_generics, ty_generics, where_clause) = meta.generics.split_for_impl();

    let body = if fields.is_empty() {
        quote!(let _ = (columns, slots);)
    } else {
        let bind = destructure(fields);
        let arms = fields.iter().enumerate().map(|(i, f)| {
            let column = &f.column;
            let install = install(f, i);
            quote!(#column => { #install })
        });
        quote! {
            #bind
            for (column, slot) in columns.iter().zip(slots.iter_mut()) {
                if !slot.is_unbound() {
                    continue;
                }
                match column.as_str() {
                    #(#arms)*
                    _ => {}
                }
            }
        }
    };

    let inflate = meta.options.hooks.then(|| {
        quote! {
            fn inflate(&mut self) -> ::sqlbind::CrudResult<()> {
                <Self as ::sqlbind::Hooks>::inflate(self)
            }
        }
    });

    quote! {
        impl #impl_generics ::sqlbind::Bindable for #name #ty_generics #where_clause {
            fn bind_fields<'__a>(
                &'__a mut self,
                columns: &[::std::string::String],
                slots: &mut [::sqlbind::Slot<'__a>],
            ) {
                #body
            }
            #inflate
        }
    }
}

fn emit_enumerable(meta: &TypeMeta, fields: &[FieldMeta]) -> TokenStream {
    let name = &meta.name;
    let (impl_generics, ty_generics, where_clause) = meta.generics.split_for_impl();

    let columns = fields.iter().map(|f| &f.column);
    let args = fields.iter().map(|f| {
        let ident = &f.name;
        match (f.encoding, f.kind) {
            (Some(TimeEncoding::Unix), _) => quote!(::sqlbind::Arg::Epoch(&self.#ident)),
            (None, FieldKind::Optional) => quote! {
                ::sqlbind::Arg::Nullable(
                    self.#ident.as_ref().map(|v| v as &dyn ::sqlbind::ToValue)
                )
            },
            (None, FieldKind::Plain) => quote!(::sqlbind::Arg::Field(&self.#ident)),
        }
    });

    let deflate = meta.options.hooks.then(|| {
        quote! {
            fn deflate(&mut self) -> ::sqlbind::CrudResult<()> {
                <Self as ::sqlbind::Hooks>::deflate(self)
            }
        }
    });

    quote! {
        impl #impl_generics ::sqlbind::Enumerable for #name #ty_generics #where_clause {
            fn enumerate_fields(
                &self,
            ) -> (
                ::std::vec::Vec<&'static str>,
                ::std::vec::Vec<::sqlbind::Arg<'_>>,
            ) {
                (
                    ::std::vec![#(#columns),*],
                    ::std::vec![#(#args),*],
                )
            }
            #deflate
        }
    }
}

fn emit_rebind(meta: &TypeMeta, fields: &[FieldMeta]) -> TokenStream {
    let name = &meta.name;
    let (impl_generics, ty_generics, where_clause) = meta.generics.split_for_impl();

    let lookup = if fields.is_empty() {
        quote!(|_| ::core::option::Option::None)
    } else {
        let arms = fields.iter().enumerate().map(|(i, f)| {
            let column = &f.column;
            let idx = Literal::usize_unsuffixed(i);
            quote!(#column => ::core::option::Option::Some(#idx),)
        });
        quote! {
            |column| match column {
                #(#arms)*
                _ => ::core::option::Option::None,
            }
        }
    };

    let body = if fields.is_empty() {
        quote!(let _ = (plan, slots);)
    } else {
        let bind = destructure(fields);
        let arms = fields.iter().enumerate().map(|(i, f)| {
            let idx = Literal::usize_unsuffixed(i);
            let install = install(f, i);
            quote!(::core::option::Option::Some(#idx) => { #install })
        });
        quote! {
            #bind
            for (index, slot) in plan.fields().zip(slots.iter_mut()) {
                if !slot.is_unbound() {
                    continue;
                }
                match index {
                    #(#arms)*
                    _ => {}
                }
            }
        }
    };

    quote! {
        impl #impl_generics ::sqlbind::Rebind for #name #ty_generics #where_clause {
            fn plan(columns: &[::std::string::String]) -> ::sqlbind::BindPlan {
                ::sqlbind::BindPlan::new(columns, #lookup)
            }

            fn bind_planned<'__a>(
                &'__a mut self,
                plan: &::sqlbind::BindPlan,
                slots: &mut [::sqlbind::Slot<'__a>],
            ) {
                #body
            }
        }
    }
}

fn emit_table(meta: &TypeMeta) -> TokenStream {
    let name = &meta.name;
    let (impl_generics, ty_generics, where_clause) = meta.generics.split_for_impl();
    let table = &meta.options.table;
    let key = &meta.options.key;

    quote! {
        impl #impl_generics ::sqlbind::Table for #name #ty_generics #where_clause {
            const NAME: &'static str = #table;
            const KEY: &'static str = #key;
        }
    }
}

fn emit_fetch(meta: &TypeMeta) -> TokenStream {
    if !meta.options.fetch {
        return TokenStream::new();
    }
    let name = &meta.name;
    let (impl_generics, ty_generics, where_clause) = meta.generics.split_for_impl();

    quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Run `sql` and scan the first row, if any.
            pub fn fetch_one<E: ::sqlbind::Executor + ?Sized>(
                db: &mut E,
                sql: &str,
                params: &[::sqlbind::Value],
            ) -> ::sqlbind::CrudResult<::core::option::Option<Self>> {
                ::sqlbind::fetch_one(db, sql, params)
            }

            /// Run `sql` and scan every row.
            pub fn fetch_all<E: ::sqlbind::Executor + ?Sized>(
                db: &mut E,
                sql: &str,
                params: &[::sqlbind::Value],
            ) -> ::sqlbind::CrudResult<::std::vec::Vec<Self>> {
                ::sqlbind::fetch_all(db, sql, params)
            }
        }
    }
}

/// Emit every impl for one type. Fields are emitted in column order regardless of
/// declaration order.
pub fn expand(meta: &TypeMeta) -> TokenStream {
    let mut fields = meta.fields.clone();
    sort_fields(&mut fields);

    let bindable = emit_bindable(meta, &fields);
    let enumerable = emit_enumerable(meta, &fields);
    let rebind = emit_rebind(meta, &fields);
    let table = emit_table(meta);
    let fetch = emit_fetch(meta);

    quote! {
        #bindable
        #enumerable
        #rebind
        #table
        #fetch
    }
}

/// Render a set of types as source text, sorted by type name.
pub fn render(mut types: Vec<TypeMeta>) -> String {
    sort_types(&mut types);
    let mut out = String::new();
    for meta in &types {
        out.push_str(&expand(meta).to_string());
        out.push('\n');
    }
    out
}
