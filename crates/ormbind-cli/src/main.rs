//! ORMBIND Command-Line Tool
//!
//! Binds JSON mapping documents and replays audit scripts.

mod error;
mod formatter;
mod script;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ormbind_core::binding::{BinderConfig, EntityBinder};
use ormbind_core::MappingDocument;
use tracing::info;

use crate::error::{CliError, Result};
use crate::formatter::OutputFormat;
use crate::script::AuditScript;

/// ORMBIND Command-Line Tool
#[derive(Parser, Debug)]
#[command(name = "ormbind")]
#[command(version, about = "ORMBIND mapping and audit tool")]
pub struct Args {
    /// Output format
    #[arg(long, default_value = "table", value_enum, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bind a mapping document and print the resolved attributes
    Bind {
        /// Mapping document (JSON)
        document: PathBuf,

        /// Stop binding an entity at its first mapping error
        #[arg(long)]
        fail_fast: bool,

        /// Fail entities that declare no identifier
        #[arg(long)]
        require_identifier: bool,
    },

    /// Replay an audit script and print the audit rows it produces
    Audit {
        /// Audit script (JSON)
        script: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ormbind=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let formatter = formatter::create_formatter(args.format);
    match args.command {
        Command::Bind {
            document,
            fail_fast,
            require_identifier,
        } => {
            let config = BinderConfig::new()
                .with_fail_fast(fail_fast)
                .with_require_identifier(require_identifier);
            let output = run_bind(&document, config, &*formatter)?;
            println!("{}", output);
            Ok(())
        }
        Command::Audit { script } => {
            let output = run_audit(&script, &*formatter)?;
            println!("{}", output);
            Ok(())
        }
    }
}

/// Bind every entity of a document.
fn run_bind(path: &Path, config: BinderConfig, formatter: &dyn formatter::Formatter) -> Result<String> {
    let document = MappingDocument::from_path(path)?;
    let binder = EntityBinder::new(config);
    let binding = document.bind(&binder);
    info!(
        entities = binding.bindings.len(),
        errors = binding.error_count(),
        "document bound"
    );

    let mut output = formatter.format_bindings(&binding.bindings);
    if !binding.is_success() {
        output.push_str(&formatter.format_failures(&binding.failures));
        eprintln!("{}", output);
        return Err(CliError::Binding {
            entities: binding.failures.len(),
            errors: binding.error_count(),
        });
    }
    Ok(output)
}

/// Replay an audit script against an in-memory sink.
fn run_audit(path: &Path, formatter: &dyn formatter::Formatter) -> Result<String> {
    let script = AuditScript::from_path(path)?;
    let replay = script.replay()?;
    info!(
        records = replay.records.len(),
        commits = replay.commits.len(),
        "audit script replayed"
    );
    Ok(formatter.format_records(&replay.records))
}
