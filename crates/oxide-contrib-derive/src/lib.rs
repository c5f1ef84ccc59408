//! Derive macro for mapping structs to tables.
//!
//! This crate provides `#[derive(Entity)]`, which implements
//! `oxide_contrib_core::Entity` for a struct with named fields.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta};

/// Derives the `Entity` trait for a struct.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Specifies the SQL table name (optional,
///   defaults to snake_case of struct name)
///
/// # Field Attributes
///
/// - `#[column(key)]` - Database-generated key, never inserted
/// - `#[column(explicit_key)]` - Caller-assigned key, inserted with the row
/// - `#[column(computed)]` - Read from the database but never written
/// - `#[column(ignore)]` - Not mapped; filled with `Default::default()` when
///   a row is read
/// - `#[column(name = "column_name")]` - Specifies the SQL column name
///   (optional, defaults to field name)
///
/// # Generated Items
///
/// - `descriptor()` returning a `TableDescriptor` built once per type
/// - `to_params()` binding every mapped field by column name
/// - `from_row()` reading every mapped field by column name
#[proc_macro_derive(Entity, attributes(table, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity derive only supports structs",
            ));
        }
    };

    let mut column_infos: Vec<ColumnInfo> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        let kinds = [attrs.key, attrs.explicit_key, attrs.computed, attrs.ignore];
        if kinds.iter().filter(|set| **set).count() > 1 {
            return Err(syn::Error::new_spanned(
                field,
                "a column can only be one of key, explicit_key, computed or ignore",
            ));
        }

        let kind = if attrs.ignore {
            ColumnKind::Ignored
        } else if attrs.key {
            ColumnKind::Key
        } else if attrs.explicit_key {
            ColumnKind::ExplicitKey
        } else if attrs.computed {
            ColumnKind::Computed
        } else {
            ColumnKind::Plain
        };

        column_infos.push(ColumnInfo {
            field_name: field_name.clone(),
            column_name: attrs.name.unwrap_or_else(|| field_name.to_string()),
            kind,
        });
    }

    let mapped: Vec<&ColumnInfo> = column_infos
        .iter()
        .filter(|c| c.kind != ColumnKind::Ignored)
        .collect();

    // Builder calls in declaration order
    let descriptor_calls: Vec<TokenStream2> = mapped
        .iter()
        .map(|info| {
            let column_name = &info.column_name;
            match info.kind {
                ColumnKind::Key => quote! { .key(#column_name) },
                ColumnKind::ExplicitKey => quote! { .explicit_key(#column_name) },
                ColumnKind::Computed => quote! { .computed(#column_name) },
                ColumnKind::Plain | ColumnKind::Ignored => quote! { .column(#column_name) },
            }
        })
        .collect();

    let param_inserts: Vec<TokenStream2> = mapped
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            let column_name = &info.column_name;
            quote! {
                params.insert(#column_name, ::core::clone::Clone::clone(&self.#field_name));
            }
        })
        .collect();

    let field_reads: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            let column_name = &info.column_name;
            if info.kind == ColumnKind::Ignored {
                quote! { #field_name: ::core::default::Default::default() }
            } else {
                quote! { #field_name: row.get_as(#column_name)? }
            }
        })
        .collect();

    let expanded = quote! {
        impl ::oxide_contrib_core::Entity for #struct_name {
            fn descriptor() -> &'static ::oxide_contrib_core::TableDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<::oxide_contrib_core::TableDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    ::oxide_contrib_core::TableDescriptor::new(#table_name)
                        #(#descriptor_calls)*
                })
            }

            fn to_params(&self) -> ::oxide_contrib_core::Params {
                let mut params = ::oxide_contrib_core::Params::new();
                #(#param_inserts)*
                params
            }

            fn from_row(
                row: &::oxide_contrib_core::Row,
            ) -> ::oxide_contrib_core::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#field_reads),*
                })
            }
        }
    };

    Ok(expanded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Key,
    ExplicitKey,
    Computed,
    Ignored,
    Plain,
}

struct ColumnInfo {
    field_name: Ident,
    column_name: String,
    kind: ColumnKind,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    key: bool,
    explicit_key: bool,
    computed: bool,
    ignore: bool,
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("table") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    table_name = Some(parse_str_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute, expected `name`"))
                }
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    // Default to snake_case of struct name
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    result.key = true;
                } else if meta.path.is_ident("explicit_key") {
                    result.explicit_key = true;
                } else if meta.path.is_ident("computed") {
                    result.computed = true;
                } else if meta.path.is_ident("ignore") {
                    result.ignore = true;
                } else if meta.path.is_ident("name") {
                    result.name = Some(parse_str_value(&meta)?);
                } else {
                    return Err(meta.error("unsupported column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

fn parse_str_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = &value {
        if let Lit::Str(s) = &lit.lit {
            return Ok(s.value());
        }
    }
    Err(syn::Error::new_spanned(value, "expected a string literal"))
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
