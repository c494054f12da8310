//! File-level code generation.
//!
//! [`Generator`] drives the pipeline for every selected declaration of a
//! source file: field model, strategy resolution, emission. Output for a
//! file is the generated-file header followed by one impl per declaration,
//! in source order, separated by blank lines.

use crate::error::CodegenError;
use crate::resolver::{CapabilityRegistry, EncodingPlan};
use crate::rust::{ArrayGenerator, ObjectGenerator};
use zmlog_schema::{
    BuildOptions, Capability, DeclarationIr, NilPolicy, SourceFile, Target, TypeDeclaration,
};

/// Default path of the runtime crate in generated code.
pub const DEFAULT_CRATE_PATH: &str = "::zmlog";

const HEADER: &str = "// Code generated by zmlog. DO NOT EDIT.";

/// Generation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Path generated code uses to reach the runtime.
    pub crate_path: String,
    /// Policy for absent nullable values.
    pub nil_policy: NilPolicy,
    /// Only encode `pub` fields.
    pub exported_only: bool,
    /// Declarations to generate.
    pub target: Target,
    /// Extra type names known to implement `ObjectMarshaler`.
    pub objects: Vec<String>,
    /// Extra type names known to implement `ArrayMarshaler`.
    pub arrays: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            crate_path: DEFAULT_CRATE_PATH.to_string(),
            nil_policy: NilPolicy::default(),
            exported_only: false,
            target: Target::All,
            objects: Vec::new(),
            arrays: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime crate path.
    #[must_use]
    pub fn with_crate_path(mut self, path: impl Into<String>) -> Self {
        self.crate_path = path.into();
        self
    }

    /// Sets the nil pointer policy.
    #[must_use]
    pub fn with_nil_policy(mut self, policy: NilPolicy) -> Self {
        self.nil_policy = policy;
        self
    }

    /// Restricts encoding to `pub` fields.
    #[must_use]
    pub fn with_exported_only(mut self, exported_only: bool) -> Self {
        self.exported_only = exported_only;
        self
    }

    /// Restricts generation to the named declarations.
    ///
    /// An empty list selects every declaration.
    #[must_use]
    pub fn with_types(mut self, names: Vec<String>) -> Self {
        self.target = if names.is_empty() {
            Target::All
        } else {
            Target::Named(names)
        };
        self
    }

    /// Declares an external type as implementing `ObjectMarshaler`.
    #[must_use]
    pub fn with_object(mut self, name: impl Into<String>) -> Self {
        self.objects.push(name.into());
        self
    }

    /// Declares an external type as implementing `ArrayMarshaler`.
    #[must_use]
    pub fn with_array(mut self, name: impl Into<String>) -> Self {
        self.arrays.push(name.into());
        self
    }
}

/// Marshaler code generator.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    registry: CapabilityRegistry,
}

impl Generator {
    /// Creates a generator whose registry holds the configured names.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        let mut registry = CapabilityRegistry::new();
        for name in &config.objects {
            registry.register(name.clone(), Capability::Object);
        }
        for name in &config.arrays {
            registry.register(name.clone(), Capability::Array);
        }
        Self { config, registry }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the capability registry.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Returns the capability registry for modification.
    pub fn registry_mut(&mut self) -> &mut CapabilityRegistry {
        &mut self.registry
    }

    /// Registers the capabilities a context file provides.
    pub fn register_source(&mut self, source: &SourceFile) {
        self.registry.register_source(source);
    }

    /// Builds the encoding plan of one declaration.
    ///
    /// # Errors
    /// Returns `CodegenError::Schema` for key problems and
    /// `CodegenError::UnsupportedType` for fields with no strategy.
    pub fn plan(&self, decl: &TypeDeclaration) -> Result<EncodingPlan, CodegenError> {
        let options = BuildOptions {
            exported_only: self.config.exported_only,
        };
        let ir = DeclarationIr::from_declaration(decl, &options)?;
        let plan = EncodingPlan::build(ir, &self.registry, self.config.nil_policy)?;
        tracing::debug!(
            declaration = %decl.name,
            fields = plan.steps.len(),
            nil = plan.nil.as_str(),
            "planned declaration"
        );
        Ok(plan)
    }

    /// Renders a plan as an impl block.
    #[must_use]
    pub fn render(&self, plan: &EncodingPlan) -> String {
        let crate_path = plan
            .declaration
            .crate_path
            .as_deref()
            .unwrap_or(&self.config.crate_path);
        if plan.declaration.is_sequence {
            ArrayGenerator::new(plan, crate_path).generate()
        } else {
            ObjectGenerator::new(plan, crate_path).generate()
        }
    }

    /// Generates the impl block of one declaration.
    ///
    /// # Errors
    /// Returns `CodegenError` if the declaration cannot be planned.
    pub fn generate_declaration(&self, decl: &TypeDeclaration) -> Result<String, CodegenError> {
        let plan = self.plan(decl)?;
        Ok(self.render(&plan))
    }

    /// Generates the marshalers of a parsed file.
    ///
    /// The file's impls and the selected declarations are registered first,
    /// so selected declarations may refer to each other regardless of order.
    /// Structs left out of the selection are not registered.
    ///
    /// # Arguments
    /// * `source` - Parsed source file
    /// * `source_name` - File name recorded in the header, if any
    ///
    /// # Errors
    /// Returns the first error of any selected declaration; nothing is
    /// returned for the other declarations in that case.
    pub fn generate(
        &self,
        source: SourceFile,
        source_name: Option<&str>,
    ) -> Result<String, CodegenError> {
        let label = source_name.unwrap_or("<input>");
        if self.config.target == Target::All {
            for err in source.unsupported_shapes() {
                tracing::warn!(source = label, reason = %err, "skipping struct with no marshaler form");
            }
        }

        let mut registry = self.registry.clone();
        registry.register_impls(&source);
        let declarations = source.into_selected(&self.config.target)?;
        registry.register_declarations(&declarations);
        let scoped = Self {
            config: self.config.clone(),
            registry,
        };

        if declarations.is_empty() {
            tracing::warn!(source = label, "no declarations to generate");
        }

        let mut output = String::from(HEADER);
        output.push('\n');
        if let Some(name) = source_name {
            output.push_str(&format!("// source: {name}\n"));
        }

        for decl in &declarations {
            if decl.skip {
                tracing::warn!(declaration = %decl.name, "skipping declaration marked #[zmlog(skip)]");
                continue;
            }
            let code = scoped.generate_declaration(decl).inspect_err(|e| {
                tracing::error!(declaration = %decl.name, error = %e, "generation failed");
            })?;
            output.push('\n');
            output.push_str(&code);
        }

        Ok(output)
    }
}
