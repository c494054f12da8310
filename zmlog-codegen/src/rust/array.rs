//! `ArrayMarshaler` impl generation for sequence types.

use crate::resolver::{ArraySource, EncodeOp, EncodingPlan};
use crate::rust::ops::{Access, OpEmitter};
use crate::rust::writer::CodeWriter;
use zmlog_schema::PointerKind;

/// Generator for sequence marshalers.
pub struct ArrayGenerator<'a> {
    plan: &'a EncodingPlan,
    crate_path: &'a str,
}

impl<'a> ArrayGenerator<'a> {
    /// Creates a new array generator.
    #[must_use]
    pub fn new(plan: &'a EncodingPlan, crate_path: &'a str) -> Self {
        Self { plan, crate_path }
    }

    /// Generates the impl block.
    #[must_use]
    pub fn generate(&self) -> String {
        let decl = &self.plan.declaration;
        let cp = self.crate_path;
        let elements = self
            .plan
            .steps
            .first()
            .map(|(field, op)| unwrap_boxed(op, Access::field(&field.accessor)));
        let arr = if elements.is_some() { "arr" } else { "_arr" };
        let mut w = CodeWriter::new();

        w.line("#[automatically_derived]");
        w.open(format!(
            "impl{} {cp}::core::ArrayMarshaler for {} {{",
            decl.generics(),
            decl.self_type()
        ));
        w.open(format!(
            "fn marshal_log_array(&self, {arr}: &mut dyn {cp}::core::ArrayEncoder) -> {cp}::core::Result<()> {{"
        ));

        if let Some((access, Some(elem))) = elements {
            OpEmitter::new(cp, self.plan.nil).emit_elements(&mut w, "arr", &access, elem, 0);
        }

        w.line("Ok(())");
        w.close("}");
        w.close("}");
        w.finish()
    }
}

/// Looks through `Box`-like wrappers to the element strategy.
fn unwrap_boxed(op: &EncodeOp, access: Access) -> (Access, Option<&EncodeOp>) {
    match op {
        EncodeOp::PointerWrap {
            pointer: PointerKind::Boxed,
            inner,
            ..
        } => unwrap_boxed(inner, access.deref()),
        EncodeOp::NestedArray(ArraySource::Elements(elem)) => (access, Some(elem)),
        _ => (access, None),
    }
}
