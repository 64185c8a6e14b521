use crate::attrs::{parse_field_attrs, parse_struct_attrs};
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

struct MappedField {
    ident: syn::Ident,
    name: String,
    column: Option<String>,
    key: bool,
    ignore_on_insert: bool,
    ignore_on_update: bool,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let type_name = name.to_string();
    let attrs = parse_struct_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Mapped can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Mapped can only be derived for structs",
            ));
        }
    };

    let mut mapped = Vec::new();
    for field in fields {
        let field_attrs = parse_field_attrs(&field.attrs)?;
        if field_attrs.skip {
            continue;
        }
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let name = ident.unraw().to_string();
        let column = field_attrs
            .column
            .or_else(|| attrs.rename_all.map(|rule| rule.apply(&name)));
        mapped.push(MappedField {
            ident,
            name,
            column,
            key: field_attrs.key,
            ignore_on_insert: field_attrs.ignore_on_insert,
            ignore_on_update: field_attrs.ignore_on_update,
        });
    }

    if mapped.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "Mapped requires at least one field that is not skipped",
        ));
    }

    let table_call = attrs.table.as_ref().map(|t| quote! { .table(#t) });

    let field_mappings = mapped.iter().map(|f| {
        let field = &f.name;
        let column = match &f.column {
            Some(c) => quote! { ::core::option::Option::Some(::std::string::String::from(#c)) },
            None => quote! { ::core::option::Option::None },
        };
        let (key, ignore_on_insert, ignore_on_update) = (f.key, f.ignore_on_insert, f.ignore_on_update);
        quote! {
            .field(::tabula::FieldMapping {
                field: ::std::string::String::from(#field),
                column: #column,
                is_key: #key,
                ignore_on_insert: #ignore_on_insert,
                ignore_on_update: #ignore_on_update,
            })
        }
    });

    let record_fields = mapped.iter().map(|f| {
        let ident = &f.ident;
        let field = &f.name;
        let column = f.column.as_ref().map(|c| quote! { .column(#c) });
        let key = f.key.then(|| quote! { .key() });
        let ignore_on_insert = f.ignore_on_insert.then(|| quote! { .ignore_on_insert() });
        let ignore_on_update = f.ignore_on_update.then(|| quote! { .ignore_on_update() });
        quote! {
            .with_field(
                ::tabula::RecordField::new(
                    #field,
                    ::tabula::Value::from(::core::clone::Clone::clone(&self.#ident)),
                )
                #column #key #ignore_on_insert #ignore_on_update
            )
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // inventory needs a concrete type.
    let registration = input.generics.params.is_empty().then(|| {
        quote! {
            ::tabula::inventory::submit! {
                ::tabula::MappingRegistration {
                    type_name: #type_name,
                    mapping: <#name as ::tabula::Mapped>::mapping,
                }
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::tabula::Mapped for #name #ty_generics #where_clause {
            fn mapping() -> ::tabula::ClassMapping {
                ::tabula::ClassMapping::new(#type_name)
                    #table_call
                    #(#field_mappings)*
            }

            fn to_record(&self) -> ::tabula::Record {
                ::tabula::Record::new()
                    #(#record_fields)*
            }
        }

        #registration
    })
}
