//! Encoding strategy resolution.
//!
//! Every field type is classified into an [`EncodeOp`] before any code is
//! written. Rules are tried in a fixed order; the first match wins:
//!
//! 1. one level of indirection (`Option`, `Box`, `&`, `Rc`, `Arc`)
//! 2. time values and durations
//! 3. byte sequences, encoded as binary
//! 4. primitive scalars, strings and complex numbers
//! 5. maps with string-like keys
//! 6. types with a known marshaler capability
//! 7. homogeneous sequences
//!
//! Anything left over is rejected with the offending field named.

use crate::error::CodegenError;
use std::collections::BTreeSet;
use zmlog_schema::{
    Capability, DeclarationIr, FieldSpec, NilPolicy, PointerKind, SourceFile, TypeDeclaration,
    TypeDesc, TypePath,
};

/// A scalar encoder call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// `bool`.
    Bool,
    /// `i8`.
    I8,
    /// `i16`.
    I16,
    /// `i32`.
    I32,
    /// `i64`.
    I64,
    /// `isize`.
    Isize,
    /// `u8`.
    U8,
    /// `u16`.
    U16,
    /// `u32`.
    U32,
    /// `u64`.
    U64,
    /// `usize`.
    Usize,
    /// `f32`.
    F32,
    /// `f64`.
    F64,
    /// `String`, `str` and their borrowed or boxed forms.
    Str,
    /// `Complex<f32>`, written as text.
    Complex32,
    /// `Complex<f64>`, written as text.
    Complex64,
    /// Byte sequences, written as base64.
    Binary,
}

impl ScalarKind {
    /// Maps a primitive type name.
    #[must_use]
    pub fn from_primitive(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "isize" => Self::Isize,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "usize" => Self::Usize,
            "f32" => Self::F32,
            "f64" => Self::F64,
            "str" => Self::Str,
            _ => return None,
        })
    }

    /// Encoder method suffix, as in `add_<suffix>` / `append_<suffix>`.
    #[must_use]
    pub const fn method(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Str => "string",
            Self::Complex32 => "complex32",
            Self::Complex64 => "complex64",
            Self::Binary => "binary",
        }
    }

    /// Returns true if the encoder takes the value by reference.
    #[must_use]
    pub const fn by_ref(self) -> bool {
        matches!(self, Self::Str | Self::Binary)
    }
}

/// Where the elements of an array come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArraySource {
    /// The value implements `ArrayMarshaler` itself.
    Delegate,
    /// The value is iterated and each element encoded with the inner op.
    Elements(Box<EncodeOp>),
}

/// Encoding strategy for one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeOp {
    /// A single encoder call.
    Scalar(ScalarKind),
    /// One level of indirection around another strategy.
    PointerWrap {
        /// Kind of indirection.
        pointer: PointerKind,
        /// Type directly inside the pointer, used for zero values.
        wrapped: TypeDesc,
        /// Strategy for the pointee.
        inner: Box<EncodeOp>,
    },
    /// A point in time, encoded as UTC.
    TimeValue,
    /// A `std::time::Duration`.
    DurationValue,
    /// Delegates to the value's `ObjectMarshaler`.
    NestedObject,
    /// An array.
    NestedArray(ArraySource),
    /// String-keyed map encoded as an object, values with the inner op.
    MapKV(Box<EncodeOp>),
}

impl EncodeOp {
    /// Returns the strategy behind any pointer levels.
    #[must_use]
    pub fn target(&self) -> &EncodeOp {
        match self {
            Self::PointerWrap { inner, .. } => inner.target(),
            other => other,
        }
    }

    /// Returns true if the value delegates to its own marshaler.
    #[must_use]
    pub fn is_delegate(&self) -> bool {
        matches!(
            self.target(),
            Self::NestedObject | Self::NestedArray(ArraySource::Delegate)
        )
    }
}

/// Names of types known to implement a marshaler.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    objects: BTreeSet<String>,
    arrays: BTreeSet<String>,
    fallback: Option<Capability>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type name.
    pub fn register(&mut self, name: impl Into<String>, capability: Capability) {
        match capability {
            Capability::Object => self.objects.insert(name.into()),
            Capability::Array => self.arrays.insert(name.into()),
        };
    }

    /// Registers the derived and hand-written impls of a parsed file.
    pub fn register_impls(&mut self, source: &SourceFile) {
        self.objects.extend(source.object_impls.iter().cloned());
        self.arrays.extend(source.array_impls.iter().cloned());
    }

    /// Registers declarations that will receive a generated marshaler.
    pub fn register_declarations<'d>(
        &mut self,
        declarations: impl IntoIterator<Item = &'d TypeDeclaration>,
    ) {
        for decl in declarations.into_iter().filter(|d| !d.skip) {
            let capability = if decl.is_sequence {
                Capability::Array
            } else {
                Capability::Object
            };
            self.register(decl.name.clone(), capability);
        }
    }

    /// Registers everything a context file provides: its impls, derives and
    /// every struct generated from it.
    pub fn register_source(&mut self, source: &SourceFile) {
        self.register_impls(source);
        self.register_declarations(&source.declarations);
    }

    /// Treats unknown named types as having `capability`.
    ///
    /// Used by the derive macros, which cannot see other declarations.
    pub fn set_fallback(&mut self, capability: Option<Capability>) {
        self.fallback = capability;
    }

    /// Looks up a type name.
    #[must_use]
    pub fn capability(&self, name: &str) -> Option<Capability> {
        if self.arrays.contains(name) {
            Some(Capability::Array)
        } else if self.objects.contains(name) {
            Some(Capability::Object)
        } else {
            None
        }
    }

    /// Returns the capability used for unknown types.
    #[must_use]
    pub const fn fallback(&self) -> Option<Capability> {
        self.fallback
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len() + self.arrays.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classifies field types.
pub struct Resolver<'a> {
    registry: &'a CapabilityRegistry,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over `registry`.
    #[must_use]
    pub fn new(registry: &'a CapabilityRegistry) -> Self {
        Self { registry }
    }

    /// Resolves the strategy of one field.
    ///
    /// # Errors
    /// Returns `CodegenError::UnsupportedType` naming the field if its type
    /// has no strategy, has more than one level of indirection, or is
    /// embedded without delegating to a marshaler.
    pub fn resolve_field(
        &self,
        declaration: &str,
        field: &FieldSpec,
    ) -> Result<EncodeOp, CodegenError> {
        let unsupported = |reason: String| {
            CodegenError::unsupported(declaration, &field.name, field.ty.to_string(), reason)
        };

        if field.pointer_depth > 1 {
            return Err(unsupported(format!(
                "{} levels of indirection, at most one is supported",
                field.pointer_depth
            )));
        }

        let op = self.resolve(&field.ty).map_err(unsupported)?;
        if field.embedded && !op.is_delegate() {
            return Err(unsupported(
                "embedded fields must implement ObjectMarshaler or ArrayMarshaler".to_string(),
            ));
        }
        Ok(op)
    }

    /// Resolves the strategy of a type.
    ///
    /// # Errors
    /// Returns the reason the type cannot be encoded.
    pub fn resolve(&self, ty: &TypeDesc) -> Result<EncodeOp, String> {
        if let Some((pointer, inner)) = ty.peel_pointer() {
            if inner.peel_pointer().is_some() {
                return Err("nested indirection is not supported".to_string());
            }
            let wrapped = match ty {
                TypeDesc::Path(p) if pointer.is_nullable() => p.arg(0).unwrap_or(inner).clone(),
                _ => inner.clone(),
            };
            return Ok(EncodeOp::PointerWrap {
                pointer,
                wrapped,
                inner: Box::new(self.resolve(inner)?),
            });
        }

        match ty {
            TypeDesc::Path(path) => self.resolve_path(path),
            TypeDesc::Slice(elem) | TypeDesc::Array { elem, .. } => self.resolve_sequence(elem, true),
            TypeDesc::Tuple(items) if items.is_empty() => {
                Err("the unit type carries no value".to_string())
            }
            TypeDesc::Tuple(_) => Err("tuples have no field names to use as keys".to_string()),
            TypeDesc::BareFn(_) => Err("function pointers cannot be logged".to_string()),
            TypeDesc::TraitObject(_) => Err("trait objects have no known encoding".to_string()),
            TypeDesc::Reference { .. } | TypeDesc::Other(_) => {
                Err("no encoding strategy for this type".to_string())
            }
        }
    }

    fn resolve_path(&self, path: &TypePath) -> Result<EncodeOp, String> {
        if is_time(path) {
            return Ok(EncodeOp::TimeValue);
        }
        if is_duration(path) {
            return Ok(EncodeOp::DurationValue);
        }
        if let Some(kind) = scalar_kind(path) {
            return Ok(EncodeOp::Scalar(kind));
        }
        if is_map(path) {
            let (key, value) = match (path.arg(0), path.arg(1)) {
                (Some(k), Some(v)) => (k, v),
                _ => return Err("map type arguments are missing".to_string()),
            };
            if !is_string_like(key) {
                return Err(format!("map keys must be string-like, found '{key}'"));
            }
            let value_op = self
                .resolve(value)
                .map_err(|reason| format!("map value '{value}': {reason}"))?;
            return Ok(EncodeOp::MapKV(Box::new(value_op)));
        }

        let name = path.ident();
        match self.registry.capability(name) {
            Some(Capability::Object) => return Ok(EncodeOp::NestedObject),
            Some(Capability::Array) => return Ok(EncodeOp::NestedArray(ArraySource::Delegate)),
            None => {}
        }

        if is_sequence_container(path) {
            let elem = path
                .arg(0)
                .ok_or_else(|| format!("'{name}' element type is missing"))?;
            let bytes_ok = path.is("Vec", &["std::vec", "alloc::vec"]);
            return self.resolve_sequence(elem, bytes_ok);
        }

        if path.args.is_empty() && !is_builtin(name) {
            match self.registry.fallback() {
                Some(Capability::Object) => return Ok(EncodeOp::NestedObject),
                Some(Capability::Array) => return Ok(EncodeOp::NestedArray(ArraySource::Delegate)),
                None => {}
            }
        }

        Err(format!(
            "'{name}' does not implement ObjectMarshaler or ArrayMarshaler"
        ))
    }

    fn resolve_sequence(&self, elem: &TypeDesc, bytes_ok: bool) -> Result<EncodeOp, String> {
        if bytes_ok && is_byte(elem) {
            return Ok(EncodeOp::Scalar(ScalarKind::Binary));
        }
        let op = self
            .resolve(elem)
            .map_err(|reason| format!("element '{elem}': {reason}"))?;
        Ok(EncodeOp::NestedArray(ArraySource::Elements(Box::new(op))))
    }
}

/// Resolved strategy of a whole declaration.
#[derive(Debug, Clone)]
pub struct EncodingPlan {
    /// Field model.
    pub declaration: DeclarationIr,
    /// Effective nil pointer policy.
    pub nil: NilPolicy,
    /// Field strategies, in declaration order.
    pub steps: Vec<(FieldSpec, EncodeOp)>,
}

impl EncodingPlan {
    /// Resolves every field of `declaration`.
    ///
    /// Field-level `#[zmlog(object)]` / `#[zmlog(array)]` hints extend the
    /// registry for this declaration only.
    ///
    /// # Errors
    /// Returns the first `CodegenError::UnsupportedType`, in field order.
    pub fn build(
        declaration: DeclarationIr,
        registry: &CapabilityRegistry,
        default_nil: NilPolicy,
    ) -> Result<Self, CodegenError> {
        let hinted;
        let registry = if declaration.fields.iter().any(|f| f.capability.is_some()) {
            let mut local = registry.clone();
            for field in &declaration.fields {
                if let (Some(capability), Some(name)) = (field.capability, field.ty.pointee().ident()) {
                    local.register(name, capability);
                }
            }
            hinted = local;
            &hinted
        } else {
            registry
        };

        let resolver = Resolver::new(registry);
        let mut steps = Vec::with_capacity(declaration.fields.len());
        for field in &declaration.fields {
            let op = resolver.resolve_field(&declaration.name, field)?;
            if declaration.is_sequence && sequence_elements(&op).is_none() {
                return Err(CodegenError::unsupported(
                    &declaration.name,
                    &field.name,
                    field.ty.to_string(),
                    "sequence types must wrap a collection of encodable elements",
                ));
            }
            steps.push((field.clone(), op));
        }

        Ok(Self {
            nil: declaration.nil.unwrap_or(default_nil),
            declaration,
            steps,
        })
    }
}

/// Returns the element strategy of a sequence, looking through `Box`-like
/// pointers.
#[must_use]
pub fn sequence_elements(op: &EncodeOp) -> Option<&EncodeOp> {
    match op {
        EncodeOp::NestedArray(ArraySource::Elements(elem)) => Some(elem),
        EncodeOp::PointerWrap {
            pointer: PointerKind::Boxed,
            inner,
            ..
        } => sequence_elements(inner),
        _ => None,
    }
}

fn is_time(path: &TypePath) -> bool {
    path.is("DateTime", &["chrono"])
        || path.is("NaiveDateTime", &["chrono", "chrono::naive"])
        || path.is("SystemTime", &["std::time"])
}

fn is_duration(path: &TypePath) -> bool {
    path.is("Duration", &["std::time", "core::time"])
}

fn scalar_kind(path: &TypePath) -> Option<ScalarKind> {
    let name = path.ident();
    if path.args.is_empty() {
        if path.is(name, &["std::primitive", "core::primitive"]) {
            if let Some(kind) = ScalarKind::from_primitive(name) {
                return Some(kind);
            }
        }
        if path.is("String", &["std::string", "alloc::string"]) {
            return Some(ScalarKind::Str);
        }
        if path.is("Complex64", &["num_complex", "zmlog::core::num_complex"]) {
            return Some(ScalarKind::Complex64);
        }
        if path.is("Complex32", &["num_complex", "zmlog::core::num_complex"]) {
            return Some(ScalarKind::Complex32);
        }
        return None;
    }

    if path.is("Complex", &["num_complex", "zmlog::core::num_complex"]) {
        return match path.arg(0).and_then(TypeDesc::ident) {
            Some("f64") => Some(ScalarKind::Complex64),
            Some("f32") => Some(ScalarKind::Complex32),
            _ => None,
        };
    }
    if path.is("Cow", &["std::borrow", "alloc::borrow"]) {
        return match path.arg(0)? {
            TypeDesc::Slice(elem) if is_byte(elem) => Some(ScalarKind::Binary),
            other if other.ident() == Some("str") => Some(ScalarKind::Str),
            _ => None,
        };
    }
    None
}

fn is_map(path: &TypePath) -> bool {
    path.is("HashMap", &["std::collections", "std::collections::hash_map"])
        || path.is("BTreeMap", &["std::collections", "std::collections::btree_map", "alloc::collections"])
        || path.is("IndexMap", &["indexmap"])
}

fn is_sequence_container(path: &TypePath) -> bool {
    path.is("Vec", &["std::vec", "alloc::vec"])
        || path.is("VecDeque", &["std::collections", "alloc::collections"])
        || path.is("HashSet", &["std::collections", "std::collections::hash_set"])
        || path.is("BTreeSet", &["std::collections", "alloc::collections"])
        || path.is("IndexSet", &["indexmap"])
}

fn is_string_like(ty: &TypeDesc) -> bool {
    let target = ty.peel_pointer().map_or(ty, |(pointer, inner)| {
        if pointer.is_nullable() { ty } else { inner }
    });
    match target.path() {
        Some(p) => {
            p.is("String", &["std::string", "alloc::string"])
                || (p.ident() == "str" && p.args.is_empty())
                || (p.is("Cow", &["std::borrow", "alloc::borrow"])
                    && p.arg(0).and_then(TypeDesc::ident) == Some("str"))
        }
        None => false,
    }
}

fn is_byte(ty: &TypeDesc) -> bool {
    ty.path()
        .is_some_and(|p| p.args.is_empty() && p.is("u8", &["std::primitive", "core::primitive"]))
}

fn is_builtin(name: &str) -> bool {
    ScalarKind::from_primitive(name).is_some()
        || matches!(name, "char" | "i128" | "u128" | "Self")
}
