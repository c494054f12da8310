//! `zmlog` - generate structured-logging marshalers for Rust types.
//!
//! Conventionally triggered by a `// zmlog: generate` comment in the
//! source file, e.g. from a build script or a pre-commit hook:
//!
//! ```text
//! zmlog -f src/events.rs --with src/common.rs
//! ```

mod cli;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli::CommandLineInterface::load().run()
}
