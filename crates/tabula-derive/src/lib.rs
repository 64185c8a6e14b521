//! Derive macros for tabula
//!
//! Provides `#[derive(Mapped)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod mapped;

/// Derive `Mapped` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use tabula::Mapped;
///
/// #[derive(Clone, Mapped)]
/// #[tabula(table = "dbo.Customer")]
/// struct Customer {
///     #[tabula(key)]
///     id: Option<i32>,
///     name: String,
///     #[tabula(column = "Email")]
///     email_address: Option<String>,
///     #[tabula(skip)]
///     dirty: bool,
/// }
/// ```
///
/// # Generated
///
/// - `impl tabula::Mapped`: `mapping()` describes the fields, `to_record()`
///   copies them into a `Record` (each field type must convert into `tabula::Value`)
/// - an `inventory` registration, so `SchemaCache::validate_registered_mappings`
///   checks the type at startup (non-generic structs only)
///
/// # Attributes
///
/// Struct level:
/// - `#[tabula(table = "name")]` - Table or view, optionally schema-qualified.
///   Without it the table is found by naming convention.
/// - `#[tabula(rename_all = "PascalCase")]` - Column naming for fields without
///   an explicit column (`PascalCase`, `camelCase`, `snake_case`,
///   `SCREAMING_SNAKE_CASE`)
///
/// Field level:
/// - `#[tabula(column = "name")]` - Map field to a different column name
/// - `#[tabula(key)]` - Key used when the command asks for key attributes
/// - `#[tabula(ignore_on_insert)]`, `#[tabula(ignore_on_update)]`
/// - `#[tabula(skip)]` - Leave the field out entirely
#[proc_macro_derive(Mapped, attributes(tabula))]
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    mapped::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
