//! Declaration and type descriptor definitions.
//!
//! These are the loader's output: a structural view of a Rust `struct` that
//! no longer depends on `syn`, so later stages can be driven from source
//! files and derive inputs alike.

use std::fmt;

/// A loaded type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    /// Type name.
    pub name: String,
    /// Lifetime parameters, including the leading apostrophe.
    pub lifetimes: Vec<String>,
    /// Fields in declaration order.
    pub fields: Vec<RawField>,
    /// True when the type is a newtype over a homogeneous sequence.
    pub is_sequence: bool,
    /// Set by `#[zmlog(skip)]` on the declaration.
    pub skip: bool,
    /// Nil pointer policy set by `#[zmlog(nil = "...")]`.
    pub nil: Option<NilPolicy>,
    /// Runtime crate path set by `#[zmlog(crate = "...")]`.
    pub crate_path: Option<String>,
}

impl TypeDeclaration {
    /// Creates an empty record declaration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lifetimes: Vec::new(),
            fields: Vec::new(),
            is_sequence: false,
            skip: false,
            nil: None,
            crate_path: None,
        }
    }

    /// Adds a field.
    pub fn add_field(&mut self, field: RawField) {
        self.fields.push(field);
    }

    /// Returns the generic parameter list, e.g. `<'a>`, or an empty string.
    #[must_use]
    pub fn generics(&self) -> String {
        if self.lifetimes.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.lifetimes.join(", "))
        }
    }

    /// Returns the wrapped sequence field of a sequence declaration.
    #[must_use]
    pub fn sequence_field(&self) -> Option<&RawField> {
        if self.is_sequence {
            self.fields.first()
        } else {
            None
        }
    }
}

/// A field as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    /// Declared name (`r#` stripped) or tuple index.
    pub name: String,
    /// Expression used to reach the field from `self`.
    pub accessor: String,
    /// Declared type.
    pub ty: TypeDesc,
    /// Set by `#[zmlog(embed)]`.
    pub embedded: bool,
    /// Explicit key from `#[zmlog(key = "...")]`.
    pub key_override: Option<String>,
    /// Set by `#[zmlog(skip)]`.
    pub skip: bool,
    /// Capability asserted by `#[zmlog(object)]` or `#[zmlog(array)]`.
    pub capability: Option<Capability>,
    /// True when the field is `pub`.
    pub exported: bool,
}

impl RawField {
    /// Creates a plain exported field whose accessor is its name.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        let name = name.into();
        Self {
            accessor: name.clone(),
            name,
            ty,
            embedded: false,
            key_override: None,
            skip: false,
            capability: None,
            exported: true,
        }
    }
}

/// A marshaling capability a named type can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Implements `ObjectMarshaler`.
    Object,
    /// Implements `ArrayMarshaler`.
    Array,
}

/// Policy for absent values behind a nullable pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NilPolicy {
    /// Leave the key out.
    #[default]
    Omit,
    /// Emit an explicit null.
    Null,
    /// Emit the pointee type's `Default` value.
    Zero,
}

impl NilPolicy {
    /// Parses a policy name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "omit" | "skip" => Some(Self::Omit),
            "null" | "nil" => Some(Self::Null),
            "zero" | "default" => Some(Self::Zero),
            _ => None,
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Omit => "omit",
            Self::Null => "null",
            Self::Zero => "zero",
        }
    }
}

/// One level of indirection in front of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// `Option<T>`.
    Nullable,
    /// `Option<Box<T>>`, `Option<&T>`, `Option<Rc<T>>`, `Option<Arc<T>>`.
    NullableBoxed,
    /// `Box<T>`, `&T`, `Rc<T>`, `Arc<T>`.
    Boxed,
}

impl PointerKind {
    /// Returns true if the pointer may be absent.
    #[must_use]
    pub const fn is_nullable(self) -> bool {
        matches!(self, Self::Nullable | Self::NullableBoxed)
    }
}

/// A path type such as `std::collections::HashMap<String, bool>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePath {
    /// True for `::`-rooted paths.
    pub leading_colon: bool,
    /// Path segments.
    pub segments: Vec<String>,
    /// Lifetime arguments of the last segment.
    pub lifetimes: Vec<String>,
    /// Type arguments of the last segment.
    pub args: Vec<TypeDesc>,
}

impl TypePath {
    /// Creates a single-segment path.
    #[must_use]
    pub fn simple(name: impl Into<String>, args: Vec<TypeDesc>) -> Self {
        Self {
            leading_colon: false,
            segments: vec![name.into()],
            lifetimes: Vec::new(),
            args,
        }
    }

    /// Returns the last segment.
    #[must_use]
    pub fn ident(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Returns the type argument at `index`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&TypeDesc> {
        self.args.get(index)
    }

    /// Returns true if the path names `ident`, either unqualified or under
    /// one of `modules` (e.g. `"std::time"`).
    #[must_use]
    pub fn is(&self, ident: &str, modules: &[&str]) -> bool {
        if self.ident() != ident {
            return false;
        }
        if self.segments.len() == 1 {
            return true;
        }
        let qualifier = self.segments[..self.segments.len() - 1].join("::");
        modules.iter().any(|m| *m == qualifier)
    }
}

/// Structural type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    /// Named type with optional generic arguments.
    Path(TypePath),
    /// `&'a T` / `&mut T`.
    Reference {
        /// Lifetime, if written.
        lifetime: Option<String>,
        /// True for `&mut`.
        mutable: bool,
        /// Referenced type.
        inner: Box<TypeDesc>,
    },
    /// `[T]`.
    Slice(Box<TypeDesc>),
    /// `[T; N]`.
    Array {
        /// Element type.
        elem: Box<TypeDesc>,
        /// Length expression text.
        len: String,
    },
    /// `(A, B)`; `()` is the empty tuple.
    Tuple(Vec<TypeDesc>),
    /// `fn(A) -> B`, kept as text.
    BareFn(String),
    /// `dyn Trait` / `impl Trait`, kept as text.
    TraitObject(String),
    /// Anything else, kept as text.
    Other(String),
}

impl TypeDesc {
    /// Shorthand for a single-segment path type.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Path(TypePath::simple(name, Vec::new()))
    }

    /// Shorthand for a single-segment generic path type.
    #[must_use]
    pub fn generic(name: impl Into<String>, args: Vec<TypeDesc>) -> Self {
        Self::Path(TypePath::simple(name, args))
    }

    /// Returns the path, if this is a path type.
    #[must_use]
    pub fn path(&self) -> Option<&TypePath> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the last path segment, if this is a path type.
    #[must_use]
    pub fn ident(&self) -> Option<&str> {
        self.path().map(TypePath::ident)
    }

    /// Removes one level of indirection.
    ///
    /// A box-like pointer directly inside `Option` belongs to the same
    /// level, so `Option<Box<T>>` peels to `T` in one step.
    #[must_use]
    pub fn peel_pointer(&self) -> Option<(PointerKind, &TypeDesc)> {
        match self {
            Self::Reference { inner, .. } => Some((PointerKind::Boxed, inner)),
            Self::Path(p) if p.is("Option", &["std::option", "core::option"]) => {
                let inner = p.arg(0)?;
                match inner.peel_box() {
                    Some(boxed) => Some((PointerKind::NullableBoxed, boxed)),
                    None => Some((PointerKind::Nullable, inner)),
                }
            }
            _ => self.peel_box().map(|inner| (PointerKind::Boxed, inner)),
        }
    }

    fn peel_box(&self) -> Option<&TypeDesc> {
        match self {
            Self::Reference { inner, .. } => Some(inner),
            Self::Path(p)
                if p.is("Box", &["std::boxed", "alloc::boxed"])
                    || p.is("Rc", &["std::rc", "alloc::rc"])
                    || p.is("Arc", &["std::sync", "alloc::sync"]) =>
            {
                p.arg(0)
            }
            _ => None,
        }
    }

    /// Counts indirection levels.
    #[must_use]
    pub fn pointer_depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some((_, inner)) = current.peel_pointer() {
            depth += 1;
            current = inner;
        }
        depth
    }

    /// Returns the type with every indirection level removed.
    #[must_use]
    pub fn pointee(&self) -> &TypeDesc {
        let mut current = self;
        while let Some((_, inner)) = current.peel_pointer() {
            current = inner;
        }
        current
    }

    /// Returns true for homogeneous sequence shapes: `Vec`, `VecDeque`,
    /// sets, arrays and slices, possibly behind a non-null pointer.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        match self {
            Self::Slice(_) | Self::Array { .. } => true,
            Self::Path(p) => {
                const SEQUENCES: [&str; 5] = ["Vec", "VecDeque", "BTreeSet", "HashSet", "IndexSet"];
                if SEQUENCES.contains(&p.ident()) {
                    return p.arg(0).is_some();
                }
                self.peel_box().is_some_and(TypeDesc::is_sequence)
            }
            Self::Reference { inner, .. } => inner.is_sequence(),
            _ => false,
        }
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.leading_colon {
            f.write_str("::")?;
        }
        f.write_str(&self.segments.join("::"))?;
        if self.lifetimes.is_empty() && self.args.is_empty() {
            return Ok(());
        }
        let params: Vec<String> = self
            .lifetimes
            .iter()
            .cloned()
            .chain(self.args.iter().map(ToString::to_string))
            .collect();
        write!(f, "<{}>", params.join(", "))
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => p.fmt(f),
            Self::Reference {
                lifetime,
                mutable,
                inner,
            } => {
                f.write_str("&")?;
                if let Some(lt) = lifetime {
                    write!(f, "{lt} ")?;
                }
                if *mutable {
                    f.write_str("mut ")?;
                }
                inner.fmt(f)
            }
            Self::Slice(elem) => write!(f, "[{elem}]"),
            Self::Array { elem, len } => write!(f, "[{elem}; {len}]"),
            Self::Tuple(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                if items.len() == 1 {
                    write!(f, "({},)", items[0])
                } else {
                    write!(f, "({})", items.join(", "))
                }
            }
            Self::BareFn(text) | Self::TraitObject(text) | Self::Other(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(inner: TypeDesc) -> TypeDesc {
        TypeDesc::generic("Option", vec![inner])
    }

    fn boxed(inner: TypeDesc) -> TypeDesc {
        TypeDesc::generic("Box", vec![inner])
    }

    #[test]
    fn test_peel_option() {
        let ty = option(TypeDesc::named("bool"));
        let (kind, inner) = ty.peel_pointer().unwrap();
        assert_eq!(kind, PointerKind::Nullable);
        assert_eq!(inner, &TypeDesc::named("bool"));
        assert_eq!(ty.pointer_depth(), 1);
    }

    #[test]
    fn test_option_box_is_one_level() {
        let ty = option(boxed(TypeDesc::named("BaseLog")));
        let (kind, inner) = ty.peel_pointer().unwrap();
        assert_eq!(kind, PointerKind::NullableBoxed);
        assert_eq!(inner.ident(), Some("BaseLog"));
        assert_eq!(ty.pointer_depth(), 1);
    }

    #[test]
    fn test_nested_options_count_twice() {
        let ty = option(option(TypeDesc::named("i64")));
        assert_eq!(ty.pointer_depth(), 2);
        assert_eq!(ty.pointee(), &TypeDesc::named("i64"));
    }

    #[test]
    fn test_reference_is_boxed() {
        let ty = TypeDesc::Reference {
            lifetime: Some("'a".to_string()),
            mutable: false,
            inner: Box::new(TypeDesc::named("str")),
        };
        assert_eq!(ty.peel_pointer().unwrap().0, PointerKind::Boxed);
        assert_eq!(ty.to_string(), "&'a str");
    }

    #[test]
    fn test_qualified_option_only_from_std() {
        let mut path = TypePath::simple("Option", vec![TypeDesc::named("u8")]);
        path.segments.insert(0, "mylib".to_string());
        assert!(TypeDesc::Path(path.clone()).peel_pointer().is_none());

        path.segments = vec!["std".into(), "option".into(), "Option".into()];
        assert!(TypeDesc::Path(path).peel_pointer().is_some());
    }

    #[test]
    fn test_is_sequence() {
        assert!(TypeDesc::generic("Vec", vec![TypeDesc::named("i64")]).is_sequence());
        assert!(
            TypeDesc::Array {
                elem: Box::new(TypeDesc::named("u16")),
                len: "4".to_string()
            }
            .is_sequence()
        );
        assert!(boxed(TypeDesc::Slice(Box::new(TypeDesc::named("i64")))).is_sequence());
        assert!(!TypeDesc::named("String").is_sequence());
        assert!(!option(TypeDesc::generic("Vec", vec![TypeDesc::named("i64")])).is_sequence());
    }

    #[test]
    fn test_display_generic_path() {
        let mut path = TypePath::simple(
            "HashMap",
            vec![TypeDesc::named("String"), TypeDesc::named("bool")],
        );
        path.segments.insert(0, "collections".to_string());
        path.segments.insert(0, "std".to_string());
        path.leading_colon = true;
        assert_eq!(
            TypeDesc::Path(path).to_string(),
            "::std::collections::HashMap<String, bool>"
        );
    }

    #[test]
    fn test_nil_policy_parse() {
        assert_eq!(NilPolicy::parse("omit"), Some(NilPolicy::Omit));
        assert_eq!(NilPolicy::parse("NULL"), Some(NilPolicy::Null));
        assert_eq!(NilPolicy::parse("zero"), Some(NilPolicy::Zero));
        assert_eq!(NilPolicy::parse("maybe"), None);
        assert_eq!(NilPolicy::default(), NilPolicy::Omit);
    }
}
