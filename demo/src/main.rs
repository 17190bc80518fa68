//! vouch — Demo CLI
//!
//! Validates a JSON document against a TOML schema file and prints either the
//! cleaned output or the first violation.
//!
//! Usage:
//!   cargo run -p vouch-demo -- check --schema demo/data/signup.toml --input demo/data/signup.json
//!   cargo run -p vouch-demo -- check --schema demo/data/signup.toml --input demo/data/signups.json --many
//!   cargo run -p vouch-demo -- check ... --lang zh
//!   cargo run -p vouch-demo -- catalog

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use vouch_contracts::{message, MessageCatalog, Value, VouchError, VouchResult};
use vouch_schema::{HookRegistry, SchemaLoader};
use vouch_verify::Verifier;

// ── CLI definition ────────────────────────────────────────────────────────────

/// vouch — declarative validation and coercion of structured input.
#[derive(Parser)]
#[command(
    name = "vouch-demo",
    about = "Validate JSON input against a vouch TOML schema",
    long_about = "Loads a TOML schema, validates a JSON document against it, and prints\n\
                  the coerced output or the first rule violation."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a JSON document against a schema file.
    Check {
        /// TOML schema file.
        #[arg(long)]
        schema: PathBuf,
        /// JSON input file.
        #[arg(long)]
        input: PathBuf,
        /// The input is an array; validate every element.
        #[arg(long)]
        many: bool,
        /// Message overrides, a TOML table of `name = "template"`.
        #[arg(long)]
        messages: Option<PathBuf>,
        /// Built-in message language.
        #[arg(long, value_enum, default_value_t = Lang::En)]
        lang: Lang,
    },
    /// Print the English message catalog as TOML.
    Catalog,
}

#[derive(Clone, Copy, ValueEnum)]
enum Lang {
    En,
    Zh,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check {
            schema,
            input,
            many,
            messages,
            lang,
        } => run_check(&schema, &input, many, messages.as_deref(), lang),
        Command::Catalog => print_catalog(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(VouchError::Invalid(violation)) => {
            eprintln!("invalid input: {}", violation.message);
            eprintln!("  key:   {}", violation.key);
            eprintln!("  kind:  {}", violation.kind);
            eprintln!("  value: {}", violation.value);
            if let Some((name, value)) = &violation.param {
                eprintln!("  {name}: {value}");
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_check(
    schema_path: &Path,
    input_path: &Path,
    many: bool,
    messages: Option<&Path>,
    lang: Lang,
) -> VouchResult<()> {
    let mut catalog = match lang {
        Lang::En => MessageCatalog::english(),
        Lang::Zh => MessageCatalog::chinese(),
    };
    if let Some(path) = messages {
        catalog = catalog.overlay_file(path)?;
    }
    message::install(catalog);

    let schema = SchemaLoader::with_hooks(demo_hooks()).load_file(schema_path)?;
    info!(fields = schema.len(), "schema loaded");

    let text = std::fs::read_to_string(input_path).map_err(|e| VouchError::ConfigError {
        reason: format!("failed to read input '{}': {}", input_path.display(), e),
    })?;
    let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| VouchError::ConfigError {
        reason: format!("input '{}' is not valid JSON: {}", input_path.display(), e),
    })?;
    debug!(many, "validating input");

    let output = Verifier::new().verify_data(&Value::from(json), &schema, many)?;
    let pretty = serde_json::to_string_pretty(&output).map_err(|e| VouchError::ConfigError {
        reason: format!("failed to render output: {e}"),
    })?;
    println!("{pretty}");
    Ok(())
}

fn print_catalog() -> VouchResult<()> {
    let catalog = MessageCatalog::english();
    let rendered = toml::to_string(&catalog.entries()).map_err(|e| VouchError::ConfigError {
        reason: format!("failed to render catalog: {e}"),
    })?;
    print!("{rendered}");
    Ok(())
}

/// Hooks schema files may refer to by name.
fn demo_hooks() -> HookRegistry {
    let mut hooks = HookRegistry::new();
    hooks.register("redact", |_, v| {
        Ok(match v {
            Value::Str(s) => Value::Str("*".repeat(s.chars().count())),
            other => other,
        })
    });
    hooks
}
