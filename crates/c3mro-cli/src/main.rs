//! C3 linearization CLI.
//!
//! Provides the `c3mro` binary, which loads a JSON hierarchy document and
//! prints unit orderings, the units contributing to a combined method call, or
//! a consistency report over the whole hierarchy.
//!
//! Method bodies are irrelevant here, so documents are built into a
//! `Hierarchy<()>` and queried through the same `Linearizer` and
//! `MethodResolver` the library combinator uses.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use c3mro_core::{CoreError, Hierarchy, HierarchyDocument, HierarchySource, LinearizeError, Linearizer};
use c3mro_dispatch::{DigestScope, MethodResolver, MixinMode, ResolveError, UnitNameScope};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "C3MRO_LOG";

/// C3 method resolution order tools.
#[derive(Parser)]
#[command(name = "c3mro", about = "C3 method resolution order tools")]
struct Cli {
    /// Output format.
    #[arg(long, value_enum, global = true, default_value = "text")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the C3 ordering of a unit.
    Linearize {
        /// Path to the hierarchy document.
        file: PathBuf,

        /// Unit to linearize.
        unit: String,
    },

    /// Print the units whose own declarations a combined call would run.
    Methods {
        /// Path to the hierarchy document.
        file: PathBuf,

        /// Unit the call starts from.
        unit: String,

        /// Method name.
        method: String,

        /// Let mixin-declared methods take part.
        #[arg(long)]
        include_mixins: bool,

        /// How mixin method scopes are derived.
        #[arg(long, value_enum, default_value = "name")]
        scope: ScopeArg,
    },

    /// Linearize every unit and report each failure.
    Check {
        /// Path to the hierarchy document.
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    /// The mixin's own name.
    Name,
    /// Truncated blake3 digest of the mixin's name.
    Digest,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid document: {0}")]
    Document(CoreError),

    #[error(transparent)]
    Unit(CoreError),

    #[error(transparent)]
    Linearize(#[from] LinearizeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{failures} of {total} unit(s) cannot be linearized")]
    Inconsistent { failures: usize, total: usize },
}

impl CliError {
    /// 0 = success, 1 = hierarchy failure, 2 = invalid document, 3 = I/O error.
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Io { .. } => 3,
            CliError::Document(_) => 2,
            CliError::Unit(_)
            | CliError::Linearize(_)
            | CliError::Resolve(_)
            | CliError::Inconsistent { .. } => 1,
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Linearize { file, unit } => run_linearize(&file, &unit, cli.format),
        Commands::Methods {
            file,
            unit,
            method,
            include_mixins,
            scope,
        } => run_methods(&file, &unit, &method, include_mixins, scope, cli.format),
        Commands::Check { file } => run_check(&file, cli.format),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        process::exit(err.exit_code());
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads and builds a hierarchy document.
fn load(path: &Path) -> Result<Arc<Linearizer<Hierarchy<()>>>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let doc = HierarchyDocument::from_json(&text).map_err(CliError::Document)?;
    let hierarchy = doc.build(|_, _| ()).map_err(CliError::Document)?;
    tracing::debug!(path = %path.display(), units = hierarchy.len(), "loaded hierarchy");
    Ok(Arc::new(Linearizer::new(Arc::new(hierarchy))))
}

fn run_linearize(file: &Path, unit: &str, format: Format) -> Result<(), CliError> {
    let lin = load(file)?;
    let id = lin.source().resolve(&unit.into()).map_err(CliError::Unit)?;
    let ordering = lin.ordering_names(id)?;
    print_ordering(unit, &ordering, format);
    Ok(())
}

fn run_methods(
    file: &Path,
    unit: &str,
    method: &str,
    include_mixins: bool,
    scope: ScopeArg,
    format: Format,
) -> Result<(), CliError> {
    let lin = load(file)?;
    let id = lin.source().resolve(&unit.into()).map_err(CliError::Unit)?;

    let mode = if include_mixins {
        MixinMode::Include
    } else {
        MixinMode::Exclude
    };
    let resolver = MethodResolver::new(Arc::clone(&lin), mode);
    let resolver = match scope {
        ScopeArg::Name => resolver.with_scope(UnitNameScope),
        ScopeArg::Digest => resolver.with_scope(DigestScope),
    };

    let set = resolver.method_set(id, method)?;
    let units: Vec<String> = set
        .iter()
        .map(|entry| lin.source().display_name(entry.unit))
        .collect();

    match format {
        Format::Text => {
            for name in &units {
                println!("{}", name);
            }
        }
        Format::Json => print_json(&json!({
            "unit": unit,
            "method": method,
            "include_mixins": include_mixins,
            "units": units,
        })),
    }
    Ok(())
}

fn run_check(file: &Path, format: Format) -> Result<(), CliError> {
    let lin = load(file)?;
    let report = check_all(&lin);
    let failures = report.iter().filter(|(_, result)| result.is_err()).count();

    match format {
        Format::Text => {
            for (name, result) in &report {
                match result {
                    Ok(ordering) => println!("ok     {}: {}", name, ordering.join(", ")),
                    Err(err) => println!("error  {}: {}", name, err),
                }
            }
        }
        Format::Json => {
            let units: Vec<Value> = report
                .iter()
                .map(|(name, result)| match result {
                    Ok(ordering) => json!({ "unit": name, "ordering": ordering }),
                    Err(err) => json!({ "unit": name, "error": err.to_string() }),
                })
                .collect();
            print_json(&json!({ "units": units, "failures": failures }));
        }
    }

    if failures > 0 {
        return Err(CliError::Inconsistent {
            failures,
            total: report.len(),
        });
    }
    Ok(())
}

/// Every unit's ordering, in declaration order.
fn check_all(lin: &Linearizer<Hierarchy<()>>) -> Vec<(String, Result<Vec<String>, LinearizeError>)> {
    lin.source()
        .units()
        .map(|unit| (unit.name.clone(), lin.ordering_names(unit.id)))
        .collect()
}

fn print_ordering(unit: &str, ordering: &[String], format: Format) {
    match format {
        Format::Text => println!("{}", ordering.join(" -> ")),
        Format::Json => print_json(&json!({ "unit": unit, "ordering": ordering })),
    }
}

fn print_json(value: &Value) {
    let text = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", text);
}
