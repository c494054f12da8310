//! # zmlog Derive
//!
//! Derive macros for structured-logging marshalers.
//!
//! The expansion is produced by the same generator the `zmlog` CLI uses,
//! so derived and file-generated impls are identical. A derive only sees
//! its own declaration: named field types that are not primitives, time
//! values, maps or sequences are assumed to implement `ObjectMarshaler`
//! unless the field carries `#[zmlog(array)]`.

use proc_macro::TokenStream;
use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, parse_macro_input};
use zmlog_codegen::{CodegenError, Generator, GeneratorConfig};
use zmlog_schema::Capability;

/// Derives `ObjectMarshaler` for a struct with named fields.
///
/// # Example
/// ```ignore
/// #[derive(ObjectMarshaler)]
/// #[zmlog(nil = "null")]
/// struct Login<'a> {
///     user_name: &'a str,
///     #[zmlog(key = "ip")]
///     remote_addr: String,
///     #[zmlog(embed)]
///     session: Session,
///     #[zmlog(skip)]
///     password: String,
/// }
/// ```
#[proc_macro_derive(ObjectMarshaler, attributes(zmlog))]
pub fn derive_object_marshaler(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input, Capability::Object)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives `ArrayMarshaler` for a newtype over a sequence.
///
/// # Example
/// ```ignore
/// #[derive(ArrayMarshaler)]
/// struct Fills(Vec<Fill>);
/// ```
#[proc_macro_derive(ArrayMarshaler, attributes(zmlog))]
pub fn derive_array_marshaler(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input, Capability::Array)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput, capability: Capability) -> syn::Result<proc_macro2::TokenStream> {
    let decl = zmlog_schema::parser::parse_derive_input(input)
        .map_err(|e| syn::Error::new_spanned(&input.ident, e))?;
    if decl.skip {
        return Ok(proc_macro2::TokenStream::new());
    }

    match (capability, decl.is_sequence) {
        (Capability::Object, true) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "sequence newtypes implement ArrayMarshaler, use #[derive(ArrayMarshaler)]",
            ));
        }
        (Capability::Array, false) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "ArrayMarshaler can only be derived for a newtype over a sequence",
            ));
        }
        _ => {}
    }

    let mut generator = Generator::new(GeneratorConfig::default());
    generator
        .registry_mut()
        .set_fallback(Some(Capability::Object));

    let code = generator
        .generate_declaration(&decl)
        .map_err(|e| syn::Error::new(error_span(input, &e), e))?;
    code.parse()
        .map_err(|e| syn::Error::new_spanned(&input.ident, format!("invalid expansion: {e}")))
}

/// Points field errors at the offending field.
fn error_span(input: &DeriveInput, err: &CodegenError) -> Span {
    let field = match err {
        CodegenError::UnsupportedType { field, .. } => field.as_str(),
        CodegenError::Schema(zmlog_schema::SchemaError::DuplicateKey { second, .. }) => {
            second.as_str()
        }
        CodegenError::Schema(zmlog_schema::SchemaError::InvalidKey { field, .. })
        | CodegenError::Schema(zmlog_schema::SchemaError::InvalidEmbed { field, .. }) => {
            field.as_str()
        }
        _ => return input.ident.span(),
    };

    let Data::Struct(data) = &input.data else {
        return input.ident.span();
    };
    match &data.fields {
        Fields::Named(named) => named
            .named
            .iter()
            .find(|f| f.ident.as_ref().is_some_and(|i| syn::ext::IdentExt::unraw(i) == field))
            .map_or_else(|| input.ident.span(), Spanned::span),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .first()
            .map_or_else(|| input.ident.span(), Spanned::span),
        Fields::Unit => input.ident.span(),
    }
}
