//! Rust declaration loader.
//!
//! This module parses Rust source text into [`TypeDeclaration`]s and records
//! which types in the file already implement a marshaler, either by derive
//! or by a hand-written impl.

use crate::error::ParseError;
use crate::types::{Capability, NilPolicy, RawField, TypeDeclaration, TypeDesc, TypePath};
use quote::ToTokens;
use std::collections::BTreeSet;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Data, DeriveInput, Fields, GenericArgument, GenericParam, Generics, Ident, Item,
    ItemImpl, PathArguments, Token, Type, Visibility,
};

const ATTRIBUTE: &str = "zmlog";
const OBJECT_TRAIT: &str = "ObjectMarshaler";
const ARRAY_TRAIT: &str = "ArrayMarshaler";

/// Which declarations of a file to generate for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every struct without `#[zmlog(skip)]` or an existing marshaler impl.
    All,
    /// Only the named structs, in the given order.
    Named(Vec<String>),
}

/// A parsed source file.
#[derive(Debug, Default)]
pub struct SourceFile {
    /// Loaded struct declarations, in source order.
    pub declarations: Vec<TypeDeclaration>,
    /// Types with a derived or hand-written `ObjectMarshaler` impl.
    pub object_impls: BTreeSet<String>,
    /// Types with a derived or hand-written `ArrayMarshaler` impl.
    pub array_impls: BTreeSet<String>,
    /// Structs that could not be loaded, with the reason.
    invalid: Vec<(String, ParseError)>,
}

impl SourceFile {
    /// Looks up a loaded declaration by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Returns true if `name` already has a marshaler impl in this file.
    #[must_use]
    pub fn is_implemented(&self, name: &str) -> bool {
        self.object_impls.contains(name) || self.array_impls.contains(name)
    }

    /// Returns the names of structs that failed to load.
    pub fn invalid_names(&self) -> impl Iterator<Item = &str> {
        self.invalid.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the structs whose shape has no marshaler form, such as scalar
    /// newtypes or generic helpers, and that have no impl of their own.
    pub fn unsupported_shapes(&self) -> impl Iterator<Item = &ParseError> {
        self.invalid
            .iter()
            .filter(|(name, err)| {
                matches!(err, ParseError::UnsupportedDeclaration { .. })
                    && !self.is_implemented(name)
            })
            .map(|(_, err)| err)
    }

    /// Consumes the file and returns the declarations selected by `target`.
    ///
    /// Under `Target::All`, structs listed by [`Self::unsupported_shapes`]
    /// are left out; a named struct with such a shape is an error.
    ///
    /// # Errors
    /// Returns the load error of a selected struct, or
    /// `ParseError::DeclarationNotFound` for an absent name.
    pub fn into_selected(mut self, target: &Target) -> Result<Vec<TypeDeclaration>, ParseError> {
        match target {
            Target::All => {
                if let Some(pos) = self.invalid.iter().position(|(name, err)| {
                    !matches!(err, ParseError::UnsupportedDeclaration { .. })
                        && !self.is_implemented(name)
                }) {
                    return Err(self.invalid.swap_remove(pos).1);
                }
                let Self {
                    declarations,
                    object_impls,
                    array_impls,
                    ..
                } = self;
                Ok(declarations
                    .into_iter()
                    .filter(|d| {
                        !d.skip && !object_impls.contains(&d.name) && !array_impls.contains(&d.name)
                    })
                    .collect())
            }
            Target::Named(names) => {
                let mut selected = Vec::with_capacity(names.len());
                for name in names {
                    if let Some(decl) = self.get(name) {
                        selected.push(decl.clone());
                    } else if let Some(pos) = self.invalid.iter().position(|(n, _)| n == name) {
                        return Err(self.invalid.swap_remove(pos).1);
                    } else {
                        return Err(ParseError::DeclarationNotFound { name: name.clone() });
                    }
                }
                Ok(selected)
            }
        }
    }
}

/// Parses Rust source text.
///
/// Only top-level items are considered: structs become declarations, and
/// `#[derive(ObjectMarshaler)]`, `#[derive(ArrayMarshaler)]` and
/// `impl ObjectMarshaler for X` / `impl ArrayMarshaler for X` mark types as
/// already implemented.
///
/// # Errors
/// Returns `ParseError::Syntax` if the source is not valid Rust.
pub fn parse_source(src: &str) -> Result<SourceFile, ParseError> {
    let file = syn::parse_file(src)?;
    let mut source = SourceFile::default();

    for item in &file.items {
        match item {
            Item::Struct(item) => {
                let name = item.ident.to_string();
                let (object, array) = derived_marshalers(&item.attrs);
                if object {
                    source.object_impls.insert(name.clone());
                }
                if array {
                    source.array_impls.insert(name.clone());
                }

                let skipped = container_attrs(&item.attrs, &name).map(|attrs| attrs.skip);
                if let Ok(true) = skipped {
                    let mut decl = TypeDeclaration::new(name);
                    decl.skip = true;
                    source.declarations.push(decl);
                    continue;
                }

                match load_struct(&item.ident, &item.generics, &item.fields, &item.attrs) {
                    Ok(decl) => source.declarations.push(decl),
                    Err(err) => source.invalid.push((name, err)),
                }
            }
            Item::Impl(item) => collect_impl(item, &mut source),
            _ => {}
        }
    }

    Ok(source)
}

/// Loads the declaration behind a derive macro input.
///
/// # Errors
/// Returns `ParseError` for enums, unions, type parameters, unsupported
/// tuple shapes and malformed annotations.
pub fn parse_derive_input(input: &DeriveInput) -> Result<TypeDeclaration, ParseError> {
    match &input.data {
        Data::Struct(data) => load_struct(&input.ident, &input.generics, &data.fields, &input.attrs),
        Data::Enum(_) => Err(ParseError::unsupported(
            input.ident.to_string(),
            "enums have no fields to marshal",
        )),
        Data::Union(_) => Err(ParseError::unsupported(
            input.ident.to_string(),
            "unions cannot be marshaled safely",
        )),
    }
}

/// Converts a syn type into a descriptor.
#[must_use]
pub fn type_desc(ty: &Type) -> TypeDesc {
    match ty {
        Type::Group(group) => type_desc(&group.elem),
        Type::Paren(paren) => type_desc(&paren.elem),
        Type::Path(path) if path.qself.is_none() => TypeDesc::Path(type_path(&path.path)),
        Type::Reference(reference) => TypeDesc::Reference {
            lifetime: reference.lifetime.as_ref().map(ToString::to_string),
            mutable: reference.mutability.is_some(),
            inner: Box::new(type_desc(&reference.elem)),
        },
        Type::Slice(slice) => TypeDesc::Slice(Box::new(type_desc(&slice.elem))),
        Type::Array(array) => TypeDesc::Array {
            elem: Box::new(type_desc(&array.elem)),
            len: array.len.to_token_stream().to_string(),
        },
        Type::Tuple(tuple) => TypeDesc::Tuple(tuple.elems.iter().map(type_desc).collect()),
        Type::BareFn(_) => TypeDesc::BareFn(ty.to_token_stream().to_string()),
        Type::TraitObject(_) | Type::ImplTrait(_) => {
            TypeDesc::TraitObject(ty.to_token_stream().to_string())
        }
        _ => TypeDesc::Other(ty.to_token_stream().to_string()),
    }
}

fn type_path(path: &syn::Path) -> TypePath {
    let mut lifetimes = Vec::new();
    let mut args = Vec::new();

    if let Some(PathArguments::AngleBracketed(generic)) =
        path.segments.last().map(|segment| &segment.arguments)
    {
        for arg in &generic.args {
            match arg {
                GenericArgument::Lifetime(lt) => lifetimes.push(lt.to_string()),
                GenericArgument::Type(ty) => args.push(type_desc(ty)),
                other => args.push(TypeDesc::Other(other.to_token_stream().to_string())),
            }
        }
    }

    TypePath {
        leading_colon: path.leading_colon.is_some(),
        segments: path.segments.iter().map(|s| s.ident.to_string()).collect(),
        lifetimes,
        args,
    }
}

fn load_struct(
    ident: &Ident,
    generics: &Generics,
    fields: &Fields,
    attrs: &[Attribute],
) -> Result<TypeDeclaration, ParseError> {
    let name = ident.to_string();
    let options = container_attrs(attrs, &name)?;

    let mut decl = TypeDeclaration::new(name.clone());
    decl.skip = options.skip;
    decl.nil = options.nil;
    decl.crate_path = options.crate_path;

    for param in &generics.params {
        match param {
            GenericParam::Lifetime(lt) => decl.lifetimes.push(lt.lifetime.to_string()),
            GenericParam::Type(_) | GenericParam::Const(_) => {
                return Err(ParseError::unsupported(
                    name,
                    "type and const parameters are not supported",
                ));
            }
        }
    }

    match fields {
        Fields::Named(named) => {
            for field in &named.named {
                let Some(field_ident) = &field.ident else {
                    continue;
                };
                let field_name = field_ident.unraw().to_string();
                let target = format!("{name}.{field_name}");
                let attrs = field_attrs(&field.attrs, &target)?;

                decl.add_field(RawField {
                    name: field_name,
                    accessor: field_ident.to_string(),
                    ty: type_desc(&field.ty),
                    embedded: attrs.embed,
                    key_override: attrs.key,
                    skip: attrs.skip,
                    capability: attrs.capability,
                    exported: matches!(field.vis, Visibility::Public(_)),
                });
            }
        }
        Fields::Unnamed(unnamed) => {
            let only = match unnamed.unnamed.first() {
                Some(field) if unnamed.unnamed.len() == 1 => field,
                _ => {
                    return Err(ParseError::unsupported(
                        name,
                        "tuple structs must wrap exactly one sequence",
                    ));
                }
            };
            let ty = type_desc(&only.ty);
            if !ty.is_sequence() {
                return Err(ParseError::unsupported(
                    name,
                    format!("tuple struct wraps '{ty}', which is not a sequence"),
                ));
            }

            let mut field = RawField::new("0", ty);
            field.exported = matches!(only.vis, Visibility::Public(_));
            decl.add_field(field);
            decl.is_sequence = true;
        }
        Fields::Unit => {}
    }

    Ok(decl)
}

#[derive(Debug, Default)]
struct FieldAttrs {
    key: Option<String>,
    embed: bool,
    skip: bool,
    capability: Option<Capability>,
}

#[derive(Debug, Default)]
struct ContainerAttrs {
    skip: bool,
    nil: Option<NilPolicy>,
    crate_path: Option<String>,
}

fn field_attrs(attrs: &[Attribute], target: &str) -> Result<FieldAttrs, ParseError> {
    let mut out = FieldAttrs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident(ATTRIBUTE)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                out.key = Some(lit.value());
            } else if meta.path.is_ident("embed") {
                out.embed = true;
            } else if meta.path.is_ident("skip") {
                out.skip = true;
            } else if meta.path.is_ident("object") {
                out.capability = Some(Capability::Object);
            } else if meta.path.is_ident("array") {
                out.capability = Some(Capability::Array);
            } else {
                return Err(meta.error(
                    "expected `key = \"...\"`, `embed`, `skip`, `object` or `array`",
                ));
            }
            Ok(())
        })
        .map_err(|e| ParseError::invalid_attr(target, e.to_string()))?;
    }

    Ok(out)
}

fn container_attrs(attrs: &[Attribute], target: &str) -> Result<ContainerAttrs, ParseError> {
    let mut out = ContainerAttrs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident(ATTRIBUTE)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                out.skip = true;
            } else if meta.path.is_ident("nil") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                let policy = NilPolicy::parse(&lit.value())
                    .ok_or_else(|| meta.error("expected `omit`, `null` or `zero`"))?;
                out.nil = Some(policy);
            } else if meta.path.is_ident("crate") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                out.crate_path = Some(lit.value());
            } else {
                return Err(meta.error("expected `skip`, `nil = \"...\"` or `crate = \"...\"`"));
            }
            Ok(())
        })
        .map_err(|e| ParseError::invalid_attr(target, e.to_string()))?;
    }

    Ok(out)
}

/// Returns whether the attributes derive the object and array marshalers.
fn derived_marshalers(attrs: &[Attribute]) -> (bool, bool) {
    let mut object = false;
    let mut array = false;

    for attr in attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let Ok(paths) =
            attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
        else {
            continue;
        };
        for path in paths {
            match path.segments.last().map(|s| s.ident.to_string()).as_deref() {
                Some(OBJECT_TRAIT) => object = true,
                Some(ARRAY_TRAIT) => array = true,
                _ => {}
            }
        }
    }

    (object, array)
}

fn collect_impl(item: &ItemImpl, source: &mut SourceFile) {
    let Some((None, trait_path, _)) = &item.trait_ else {
        return;
    };
    let Type::Path(self_ty) = item.self_ty.as_ref() else {
        return;
    };
    let Some(name) = self_ty.path.segments.last().map(|s| s.ident.to_string()) else {
        return;
    };

    match trait_path.segments.last().map(|s| s.ident.to_string()).as_deref() {
        Some(OBJECT_TRAIT) => {
            source.object_impls.insert(name);
        }
        Some(ARRAY_TRAIT) => {
            source.array_impls.insert(name);
        }
        _ => {}
    }
}
