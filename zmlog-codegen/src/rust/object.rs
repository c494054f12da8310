//! `ObjectMarshaler` impl generation for records.

use crate::resolver::EncodingPlan;
use crate::rust::ops::{Access, OpEmitter, Sink};
use crate::rust::writer::CodeWriter;

/// Generator for record marshalers.
pub struct ObjectGenerator<'a> {
    plan: &'a EncodingPlan,
    crate_path: &'a str,
}

impl<'a> ObjectGenerator<'a> {
    /// Creates a new object generator.
    #[must_use]
    pub fn new(plan: &'a EncodingPlan, crate_path: &'a str) -> Self {
        Self { plan, crate_path }
    }

    /// Generates the impl block.
    #[must_use]
    pub fn generate(&self) -> String {
        let decl = &self.plan.declaration;
        let cp = self.crate_path;
        let enc = if self.plan.steps.is_empty() { "_enc" } else { "enc" };
        let mut w = CodeWriter::new();

        w.line("#[automatically_derived]");
        w.open(format!(
            "impl{} {cp}::core::ObjectMarshaler for {} {{",
            decl.generics(),
            decl.self_type()
        ));
        w.open(format!(
            "fn marshal_log_object(&self, {enc}: &mut dyn {cp}::core::ObjectEncoder) -> {cp}::core::Result<()> {{"
        ));

        let emitter = OpEmitter::new(cp, self.plan.nil);
        for (field, op) in &self.plan.steps {
            emitter.emit(
                &mut w,
                &Sink::object("enc", &field.key),
                op,
                &Access::field(&field.accessor),
                0,
            );
        }

        w.line("Ok(())");
        w.close("}");
        w.close("}");
        w.finish()
    }
}
