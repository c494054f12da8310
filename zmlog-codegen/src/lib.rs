//! # zmlog Codegen
//!
//! Marshaler code generation from Rust declarations.
//!
//! This crate provides:
//! - Encoding strategy resolution for field types
//! - `ObjectMarshaler` / `ArrayMarshaler` impl generation
//! - File-level generation with a capability registry
//! - Output helpers for build scripts and the CLI
//!
//! Generated files contain only impl blocks and are meant to be pulled
//! into the declaring module with `include!`.

pub mod error;
pub mod generator;
pub mod resolver;
pub mod rust;

pub use error::CodegenError;
pub use generator::{DEFAULT_CRATE_PATH, Generator, GeneratorConfig};
pub use resolver::{ArraySource, CapabilityRegistry, EncodeOp, EncodingPlan, Resolver, ScalarKind};

use std::path::{Path, PathBuf};

/// Suffix appended to the input file stem for generated files.
pub const OUTPUT_SUFFIX: &str = "_zmlog.rs";

/// Generates marshalers for the declarations in a source string.
///
/// # Arguments
/// * `src` - Rust source text
/// * `config` - Generation settings
///
/// # Returns
/// Generated Rust code as a string.
///
/// # Errors
/// Returns `CodegenError` if parsing or generation fails.
pub fn generate_from_source(src: &str, config: &GeneratorConfig) -> Result<String, CodegenError> {
    let source = zmlog_schema::parse_source(src)?;
    Generator::new(config.clone()).generate(source, None)
}

/// Generates marshalers for the declarations in a source file.
///
/// # Arguments
/// * `path` - Rust source file
/// * `config` - Generation settings
/// * `context` - Files whose types the generated code may refer to
///
/// # Returns
/// Generated Rust code as a string.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, or generation fails.
pub fn generate_from_file(
    path: &Path,
    config: &GeneratorConfig,
    context: &[PathBuf],
) -> Result<String, CodegenError> {
    let mut generator = Generator::new(config.clone());
    for extra in context {
        let src = std::fs::read_to_string(extra)?;
        generator.register_source(&zmlog_schema::parse_source(&src)?);
    }

    let src = std::fs::read_to_string(path)?;
    let source = zmlog_schema::parse_source(&src)?;
    let name = path.file_name().and_then(|n| n.to_str());
    generator.generate(source, name)
}

/// Returns `<stem>_zmlog.rs` next to `input`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "generated".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}"))
}

/// Writes generated code to `path`.
///
/// # Errors
/// Returns `CodegenError::Write` if the file cannot be written.
pub fn write_output(path: &Path, code: &str) -> Result<(), CodegenError> {
    std::fs::write(path, code).map_err(|source| CodegenError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = code.len(), "wrote generated marshalers");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("src/events.rs")),
            PathBuf::from("src/events_zmlog.rs")
        );
    }

    #[test]
    fn test_generate_from_file_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.rs");
        let events = dir.path().join("events.rs");
        std::fs::write(&base, "pub struct Base { pub val: i64 }").unwrap();
        std::fs::write(&events, "pub struct Event { #[zmlog(embed)] pub base: Base }").unwrap();

        assert!(generate_from_file(&events, &GeneratorConfig::default(), &[]).is_err());

        let code = generate_from_file(&events, &GeneratorConfig::default(), &[base]).unwrap();
        assert!(code.contains("// source: events.rs"));
        assert!(code.contains("enc.add_object(\"base\", &self.base)?;"));
    }

    #[test]
    fn test_write_output_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing").join("out_zmlog.rs");
        let err = write_output(&missing, "// empty\n").unwrap_err();
        assert!(matches!(err, CodegenError::Write { .. }));

        let ok = dir.path().join("out_zmlog.rs");
        write_output(&ok, "// empty\n").unwrap();
        assert_eq!(std::fs::read_to_string(ok).unwrap(), "// empty\n");
    }
}
