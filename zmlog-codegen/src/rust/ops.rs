//! Statement emission for encoding strategies.
//!
//! Each [`EncodeOp`] becomes one statement (or one block, for pointers,
//! maps and inline sequences) against a [`Sink`]: either a keyed
//! `ObjectEncoder` or an `ArrayEncoder`. Nested scopes use depth-suffixed
//! bindings (`v`, `v1`, `arr1`, ...) so generated names never shadow an
//! outer value still in use.

use crate::resolver::{ArraySource, EncodeOp};
use crate::rust::writer::CodeWriter;
use zmlog_schema::{NilPolicy, PointerKind};

/// How a value is reached in generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    expr: String,
    by_ref: bool,
}

impl Access {
    /// A field of `self`, as a place.
    #[must_use]
    pub fn field(accessor: &str) -> Self {
        Self {
            expr: format!("self.{accessor}"),
            by_ref: false,
        }
    }

    /// A binding that holds a reference.
    #[must_use]
    pub fn binding(name: impl Into<String>) -> Self {
        Self {
            expr: name.into(),
            by_ref: true,
        }
    }

    /// A local that holds the value itself.
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            expr: name.into(),
            by_ref: false,
        }
    }

    /// Expression yielding the value, for `Copy` types.
    #[must_use]
    pub fn value(&self) -> String {
        if self.by_ref {
            format!("*{}", self.expr)
        } else {
            self.expr.clone()
        }
    }

    /// Expression yielding a reference.
    #[must_use]
    pub fn reference(&self) -> String {
        if self.by_ref {
            self.expr.clone()
        } else {
            format!("&{}", self.expr)
        }
    }

    /// The place behind one `Box`-like pointer.
    #[must_use]
    pub fn deref(&self) -> Self {
        let stars = if self.by_ref { "**" } else { "*" };
        Self {
            expr: format!("{stars}{}", self.expr),
            by_ref: false,
        }
    }
}

/// Encoder receiving a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// `ObjectEncoder` binding and key expression.
    Object {
        /// Encoder binding.
        enc: String,
        /// Key expression (a literal or a `&str` binding).
        key: String,
    },
    /// `ArrayEncoder` binding.
    Array {
        /// Encoder binding.
        enc: String,
    },
}

impl Sink {
    /// An object sink with a literal key.
    #[must_use]
    pub fn object(enc: &str, key: &str) -> Self {
        Self::Object {
            enc: enc.to_string(),
            key: format!("{key:?}"),
        }
    }

    /// An array sink.
    #[must_use]
    pub fn array(enc: &str) -> Self {
        Self::Array {
            enc: enc.to_string(),
        }
    }

    /// Opening text of an encoder call, up to the value argument.
    fn prefix(&self, method: &str) -> String {
        match self {
            Self::Object { enc, key } => format!("{enc}.add_{method}({key}, "),
            Self::Array { enc } => format!("{enc}.append_{method}("),
        }
    }

    fn call(&self, method: &str, arg: &str) -> String {
        format!("{}{arg})", self.prefix(method))
    }

    fn null(&self) -> String {
        match self {
            Self::Object { enc, key } => format!("{enc}.add_null({key})"),
            Self::Array { enc } => format!("{enc}.append_null()"),
        }
    }
}

/// Renders statements for encoding strategies.
#[derive(Debug, Clone, Copy)]
pub struct OpEmitter<'a> {
    crate_path: &'a str,
    nil: NilPolicy,
}

impl<'a> OpEmitter<'a> {
    /// Creates an emitter referring to the runtime through `crate_path`.
    #[must_use]
    pub fn new(crate_path: &'a str, nil: NilPolicy) -> Self {
        Self { crate_path, nil }
    }

    /// Writes the statements encoding `access` into `sink`.
    pub fn emit(
        &self,
        w: &mut CodeWriter,
        sink: &Sink,
        op: &EncodeOp,
        access: &Access,
        depth: usize,
    ) {
        let cp = self.crate_path;
        match op {
            EncodeOp::Scalar(kind) => {
                let arg = if kind.by_ref() {
                    access.reference()
                } else {
                    access.value()
                };
                w.line(format!("{};", sink.call(kind.method(), &arg)));
            }
            EncodeOp::TimeValue => {
                let arg = format!("{cp}::core::LogTime::to_utc({})", access.reference());
                w.line(format!("{};", sink.call("time", &arg)));
            }
            EncodeOp::DurationValue => {
                w.line(format!("{};", sink.call("duration", &access.value())));
            }
            EncodeOp::NestedObject => {
                w.line(format!("{}?;", sink.call("object", &access.reference())));
            }
            EncodeOp::NestedArray(ArraySource::Delegate) => {
                w.line(format!("{}?;", sink.call("array", &access.reference())));
            }
            EncodeOp::NestedArray(ArraySource::Elements(elem)) => {
                let arr = scoped("arr", depth);
                w.open(format!(
                    "{}&{cp}::core::array_fn(|{arr}| {{",
                    sink.prefix("array")
                ));
                self.emit_elements(w, &arr, access, elem, depth);
                w.line("Ok(())");
                w.close("}))?;");
            }
            EncodeOp::MapKV(value) => {
                let obj = scoped("obj", depth);
                let k = scoped("k", depth);
                let v = scoped("v", depth);
                w.open(format!(
                    "{}&{cp}::core::object_fn(|{obj}| {{",
                    sink.prefix("object")
                ));
                w.open(format!("for ({k}, {v}) in {} {{", access.reference()));
                let entry = Sink::Object { enc: obj, key: k };
                self.emit(w, &entry, value, &Access::binding(v), depth + 1);
                w.close("}");
                w.line("Ok(())");
                w.close("}))?;");
            }
            EncodeOp::PointerWrap {
                pointer: PointerKind::Boxed,
                inner,
                ..
            } => self.emit(w, sink, inner, &access.deref(), depth),
            EncodeOp::PointerWrap {
                pointer,
                wrapped,
                inner,
            } => self.emit_nullable(w, sink, *pointer, &wrapped.to_string(), inner, access, depth),
        }
    }

    /// Writes a loop encoding every element of `access` into the array
    /// encoder bound to `arr`.
    pub fn emit_elements(
        &self,
        w: &mut CodeWriter,
        arr: &str,
        access: &Access,
        elem: &EncodeOp,
        depth: usize,
    ) {
        let v = scoped("v", depth);
        w.open(format!("for {v} in {} {{", access.reference()));
        self.emit(w, &Sink::array(arr), elem, &Access::binding(v), depth + 1);
        w.close("}");
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_nullable(
        &self,
        w: &mut CodeWriter,
        sink: &Sink,
        pointer: PointerKind,
        wrapped: &str,
        inner: &EncodeOp,
        access: &Access,
        depth: usize,
    ) {
        let v = scoped("v", depth);
        let present = match pointer {
            PointerKind::NullableBoxed => Access::binding(&v).deref(),
            _ => Access::binding(&v),
        };

        if self.nil == NilPolicy::Omit {
            w.open(format!("if let Some({v}) = {} {{", access.reference()));
            self.emit(w, sink, inner, &present, depth + 1);
            w.close("}");
            return;
        }

        w.open(format!("match {} {{", access.reference()));
        w.open(format!("Some({v}) => {{"));
        self.emit(w, sink, inner, &present, depth + 1);
        w.close("}");
        if self.nil == NilPolicy::Null {
            w.line(format!("None => {},", sink.null()));
        } else {
            w.open("None => {");
            w.line(format!(
                "let {v}: {wrapped} = ::core::default::Default::default();"
            ));
            let zero = match pointer {
                PointerKind::NullableBoxed => Access::local(&v).deref(),
                _ => Access::local(&v),
            };
            self.emit(w, sink, inner, &zero, depth + 1);
            w.close("}");
        }
        w.close("}");
    }
}

fn scoped(base: &str, depth: usize) -> String {
    if depth == 0 {
        base.to_string()
    } else {
        format!("{base}{depth}")
    }
}
