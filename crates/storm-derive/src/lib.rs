//! Derive macro for storm entities.
//!
//! This crate provides `#[derive(Entity)]`, which lists a struct's mapped
//! fields at compile time so that no runtime type inspection is needed.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta};

/// Derives `storm_core::Entity` for a struct with named fields.
///
/// # Attributes
///
/// - `#[entity(table = "table_name")]` - Specifies the SQL table name
///   (optional, defaults to the struct name lower-cased)
/// - `#[entity(schema = "schema_name")]` - Places the table in a schema
///   (optional, defaults to the connection's current schema)
///
/// # Field Attributes
///
/// - `#[column(display)]` - Maps the field as text rendered through its
///   `Display` implementation, for types without a `ColumnType` impl
///
/// # Field Selection
///
/// Fields whose name starts with `internal_` or `_` are not mapped. The
/// first mapped field is the primary key.
///
/// # Generated Items
///
/// - `impl storm_core::Entity` with `TABLE`, `SCHEMA`, `COLUMNS` and
///   `fields()`
#[proc_macro_derive(Entity, attributes(entity, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let EntityAttrs { table, schema } = parse_entity_attrs(&input.attrs, struct_name)?;
    let schema = match schema {
        Some(name) => quote! { ::std::option::Option::Some(#name) },
        None => quote! { ::std::option::Option::None },
    };

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

    let mut mapped: Vec<FieldInfo> = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let name = unraw(&ident);
        if is_excluded(&name) {
            continue;
        }
        let attrs = parse_column_attrs(&field.attrs)?;
        mapped.push(FieldInfo {
            ident,
            name,
            display: attrs.display,
        });
    }

    let column_names: Vec<String> = mapped.iter().map(|f| f.name.to_lowercase()).collect();

    let field_entries: Vec<TokenStream2> = mapped
        .iter()
        .enumerate()
        .map(|(position, info)| {
            let ident = &info.ident;
            let name = &info.name;
            let primary_key = position == 0;
            if info.display {
                quote! {
                    ::storm_core::Field::display(#name, &self.#ident, #primary_key)
                }
            } else {
                quote! {
                    ::storm_core::Field::new(#name, &self.#ident, #primary_key)
                }
            }
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::storm_core::Entity for #struct_name #ty_generics #where_clause {
            const TABLE: &'static str = #table;
            const SCHEMA: ::std::option::Option<&'static str> = #schema;
            const COLUMNS: &'static [&'static str] = &[#(#column_names),*];

            fn fields(&self) -> ::std::vec::Vec<::storm_core::Field<'_>> {
                ::std::vec![#(#field_entries),*]
            }
        }
    };

    Ok(expanded)
}

struct EntityAttrs {
    table: String,
    schema: Option<String>,
}

struct FieldInfo {
    ident: Ident,
    name: String,
    display: bool,
}

struct ColumnAttrs {
    display: bool,
}

fn is_excluded(name: &str) -> bool {
    name.starts_with("internal_") || name.starts_with('_')
}

fn unraw(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map_or_else(|| name.clone(), String::from)
}

fn parse_entity_attrs(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<EntityAttrs> {
    let mut table = None;
    let mut schema = None;

    for attr in attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                let target = if meta.path.is_ident("table") {
                    &mut table
                } else if meta.path.is_ident("schema") {
                    &mut schema
                } else {
                    return Err(meta.error("unsupported entity attribute"));
                };
                let value: Expr = meta.value()?.parse()?;
                if let Expr::Lit(lit) = value {
                    if let Lit::Str(s) = lit.lit {
                        *target = Some(s.value());
                    }
                }
                Ok(())
            })?;
        }
    }

    Ok(EntityAttrs {
        // Type name, lower-cased, no pluralization
        table: table.unwrap_or_else(|| struct_name.to_string().to_lowercase()),
        schema,
    })
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs { display: false };

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("display") {
                    result.display = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported column attribute"))
                }
            })?;
        }
    }

    Ok(result)
}
