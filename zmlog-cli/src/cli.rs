//! Command-line interface: source files in, `<stem>_zmlog.rs` files out.

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use zmlog_codegen::{DEFAULT_CRATE_PATH, GeneratorConfig, default_output_path, write_output};
use zmlog_schema::NilPolicy;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate ObjectMarshaler / ArrayMarshaler impls for the structs in Rust source files
#[derive(Parser, Debug)]
#[command(name = "zmlog", version)]
pub struct CommandLineInterface {
    /// one or more Rust source files
    #[arg(short = 'f', long = "file", num_args = 1.., required = true)]
    files: Vec<PathBuf>,

    /// only generate for these types (default: every struct without an impl)
    #[arg(short = 't', long = "type")]
    types: Vec<String>,

    /// extra source files whose types the generated code may refer to
    #[arg(long = "with")]
    with: Vec<PathBuf>,

    /// external type known to implement ObjectMarshaler
    #[arg(long = "object")]
    objects: Vec<String>,

    /// external type known to implement ArrayMarshaler
    #[arg(long = "array")]
    arrays: Vec<String>,

    /// what to emit for absent Option values
    #[arg(long, value_enum, default_value_t = NilArg::Omit)]
    nil: NilArg,

    /// path of the zmlog crate in generated code
    #[arg(long, default_value = DEFAULT_CRATE_PATH)]
    crate_path: String,

    /// only encode `pub` fields
    #[arg(long, default_value_t = false)]
    exported_only: bool,

    /// print generated code instead of writing files
    #[arg(long, conflicts_with = "out")]
    stdout: bool,

    /// output file (single input only; default `<stem>_zmlog.rs` next to the input)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum NilArg {
    /// leave the key out
    Omit,
    /// emit null
    Null,
    /// emit the type's default value
    Zero,
}

impl From<NilArg> for NilPolicy {
    fn from(value: NilArg) -> Self {
        match value {
            NilArg::Omit => Self::Omit,
            NilArg::Null => Self::Null,
            NilArg::Zero => Self::Zero,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    fn config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::new()
            .with_crate_path(self.crate_path.clone())
            .with_nil_policy(self.nil.into())
            .with_exported_only(self.exported_only)
            .with_types(self.types.clone());
        for name in &self.objects {
            config = config.with_object(name.clone());
        }
        for name in &self.arrays {
            config = config.with_array(name.clone());
        }
        config
    }

    fn output_path(&self, input: &Path) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| default_output_path(input))
    }

    pub fn run(&self) -> anyhow::Result<()> {
        if self.out.is_some() && self.files.len() > 1 {
            bail!("--out can only be used with a single input file");
        }

        let config = self.config();
        let generated: Vec<(&PathBuf, anyhow::Result<String>)> = self
            .files
            .par_iter()
            .map(|file| {
                let code = zmlog_codegen::generate_from_file(file, &config, &self.with)
                    .with_context(|| format!("failed to generate marshalers for {}", file.display()));
                (file, code)
            })
            .collect();

        let mut failed = 0usize;
        for (file, code) in generated {
            let result = code.and_then(|code| self.emit(file, &code));
            if let Err(error) = result {
                tracing::error!("{error:#}");
                failed += 1;
            }
        }

        if failed > 0 {
            bail!("{failed} of {} input files failed", self.files.len());
        }
        Ok(())
    }

    fn emit(&self, input: &Path, code: &str) -> anyhow::Result<()> {
        if self.stdout {
            print!("{code}");
            return Ok(());
        }

        let out = self.output_path(input);
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        write_output(&out, code)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: &str = r#"
// zmlog: generate
pub struct Login {
    pub user: String,
    pub attempts: Option<u32>,
}

pub struct Logins(pub Vec<Login>);
"#;

    fn cli(args: &[&str]) -> CommandLineInterface {
        CommandLineInterface::try_parse_from(std::iter::once("zmlog").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = cli(&[
            "-f", "a.rs", "--type", "Login", "--object", "Peer", "--array", "Tags", "--nil",
            "zero", "--crate-path", "crate::zm", "--exported-only",
        ]);
        let config = cli.config();
        assert_eq!(config.nil_policy, NilPolicy::Zero);
        assert_eq!(config.crate_path, "crate::zm");
        assert!(config.exported_only);
        assert_eq!(config.objects, vec!["Peer".to_string()]);
        assert_eq!(config.arrays, vec!["Tags".to_string()]);
        assert_eq!(
            config.target,
            zmlog_schema::Target::Named(vec!["Login".to_string()])
        );
    }

    #[test]
    fn test_requires_input() {
        assert!(CommandLineInterface::try_parse_from(["zmlog"]).is_err());
        assert!(CommandLineInterface::try_parse_from(["zmlog", "-f", "a.rs", "--nil", "maybe"]).is_err());
        assert!(
            CommandLineInterface::try_parse_from(["zmlog", "-f", "a.rs", "--stdout", "-o", "b.rs"])
                .is_err()
        );
    }

    #[test]
    fn test_writes_default_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.rs");
        std::fs::write(&input, EVENTS).unwrap();

        cli(&["-f", input.to_str().unwrap()]).run().unwrap();

        let generated = std::fs::read_to_string(dir.path().join("events_zmlog.rs")).unwrap();
        assert!(generated.starts_with("// Code generated by zmlog. DO NOT EDIT."));
        assert!(generated.contains("impl ::zmlog::core::ObjectMarshaler for Login {"));
        assert!(generated.contains("impl ::zmlog::core::ArrayMarshaler for Logins {"));
    }

    #[test]
    fn test_explicit_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.rs");
        let out = dir.path().join("gen").join("logs.rs");
        std::fs::write(&input, EVENTS).unwrap();

        cli(&["-f", input.to_str().unwrap(), "-o", out.to_str().unwrap()])
            .run()
            .unwrap();
        assert!(out.exists());
        assert!(!dir.path().join("events_zmlog.rs").exists());
    }

    #[test]
    fn test_failed_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.rs");
        let bad = dir.path().join("bad.rs");
        std::fs::write(&good, EVENTS).unwrap();
        std::fs::write(&bad, "pub struct Job { pub run: fn() }").unwrap();

        let err = cli(&["-f", good.to_str().unwrap(), bad.to_str().unwrap()])
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
        assert!(dir.path().join("good_zmlog.rs").exists());
        assert!(!dir.path().join("bad_zmlog.rs").exists());
    }

    #[test]
    fn test_context_files_resolve_types() {
        let dir = tempfile::tempdir().unwrap();
        let common = dir.path().join("common.rs");
        let input = dir.path().join("session.rs");
        std::fs::write(&common, "pub struct Peer { pub addr: String }").unwrap();
        std::fs::write(&input, "pub struct Session { pub peer: Peer }").unwrap();

        assert!(cli(&["-f", input.to_str().unwrap()]).run().is_err());
        cli(&["-f", input.to_str().unwrap(), "--with", common.to_str().unwrap()])
            .run()
            .unwrap();
        let generated = std::fs::read_to_string(dir.path().join("session_zmlog.rs")).unwrap();
        assert!(generated.contains("enc.add_object(\"peer\", &self.peer)?;"));
    }

    #[test]
    fn test_out_rejects_multiple_inputs() {
        let err = cli(&["-f", "a.rs", "b.rs", "-o", "out.rs"]).run().unwrap_err();
        assert!(err.to_string().contains("single input"));
    }
}
