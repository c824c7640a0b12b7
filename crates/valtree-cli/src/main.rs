//! `valtree` CLI: read, check and write value-tree text from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Read text as a list of Points (schema from file), print JSON
//! valtree parse --schema shapes.json --type '[Point]' -i points.txt
//!
//! # Builtin types need no schema
//! echo '[1, 2, 3]' | valtree parse --type '[int]'
//!
//! # Write JSON back out as text, one element per line
//! valtree encode --schema shapes.json --type '[Point]' --pretty -i points.json
//!
//! # Validate a file and report how many heap objects it builds
//! valtree check --schema shapes.json --type '[Point]' -i points.txt
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;
use valtree_core::{
    encode, encode_pretty, from_json, parse_value, to_json, HeapFactory, Object, RefHeap,
    Schema, TypeId, TypeRegistry, Value,
};

#[derive(Parser)]
#[command(
    name = "valtree",
    version,
    about = "Schema-directed reader for value-tree text"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args)]
struct TypeArgs {
    /// Type of the whole value, e.g. `int`, `[string]`, `[Point]`
    #[arg(short, long = "type")]
    ty: String,
    /// JSON schema file declaring struct types
    #[arg(short, long)]
    schema: Option<String>,
    /// Input file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse text and print it as pretty JSON
    Parse {
        #[command(flatten)]
        args: TypeArgs,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Convert JSON to text
    Encode {
        #[command(flatten)]
        args: TypeArgs,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// One element per line instead of a single line
        #[arg(long)]
        pretty: bool,
    },
    /// Parse text and report whether it is valid
    Check {
        #[command(flatten)]
        args: TypeArgs,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { args, output } => {
            let (types, ty) = load_types(&args)?;
            let text = read_input(args.input.as_deref())?;
            let mut heap = RefHeap::new();
            let value = read_value(&mut heap, &types, ty, &text)?;
            let json = to_json(&heap, &types, &value)?;
            heap.decref(value);
            let pretty = serde_json::to_string_pretty(&json)?;
            write_output(output.as_deref(), &pretty)?;
        }
        Commands::Encode {
            args,
            output,
            pretty,
        } => {
            let (types, ty) = load_types(&args)?;
            let input = read_input(args.input.as_deref())?;
            let json: serde_json::Value =
                serde_json::from_str(&input).context("Failed to parse input JSON")?;
            let mut heap = RefHeap::new();
            let value = from_json(&mut heap, &types, ty, &json)
                .with_context(|| format!("Input does not fit type {}", args.ty))?;
            let text = if pretty {
                encode_pretty(&heap, &types, &value)?
            } else {
                encode(&heap, &types, &value)?
            };
            heap.decref(value);
            write_output(output.as_deref(), &text)?;
        }
        Commands::Check { args } => {
            let (types, ty) = load_types(&args)?;
            let text = read_input(args.input.as_deref())?;
            let mut heap = RefHeap::new();
            let value = read_value(&mut heap, &types, ty, &text)?;
            let objects = heap.live_objects();
            let summary = describe(&heap, &types, &value);
            heap.decref(value);
            if heap.live_objects() != 0 {
                anyhow::bail!(
                    "{} heap objects still alive after release",
                    heap.live_objects()
                );
            }
            println!("ok: {summary} ({objects} heap objects)");
        }
    }

    Ok(())
}

/// Follows plasmite's serve setup, but logs to stderr so stdout stays clean.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Build the registry from `--schema` (if any) and resolve `--type`.
fn load_types(args: &TypeArgs) -> Result<(TypeRegistry, TypeId)> {
    let mut types = match &args.schema {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read schema: {}", path))?;
            Schema::from_json(&json)
                .and_then(|schema| schema.build_registry())
                .with_context(|| format!("Invalid schema: {}", path))?
        }
        None => TypeRegistry::new(),
    };
    let ty = types
        .parse_type(&args.ty)
        .with_context(|| format!("Invalid --type: {}", args.ty))?;
    tracing::debug!(ty = %types.type_name(ty), "resolved top-level type");
    Ok((types, ty))
}

fn read_value(heap: &mut RefHeap, types: &TypeRegistry, ty: TypeId, text: &str) -> Result<Value> {
    parse_value(heap, types, ty, text).context("Failed to parse input")
}

/// One-line summary of a value's shape for `check`.
fn describe(heap: &RefHeap, types: &TypeRegistry, value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Int(_) => "int".to_string(),
        Value::Float(_) => "float".to_string(),
        Value::Str(_) => "string".to_string(),
        Value::Vector(obj) => match heap.get(*obj) {
            Some(Object::Container { ty, elems }) => {
                format!("{} with {} elements", types.type_name(*ty), elems.len())
            }
            _ => "container".to_string(),
        },
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
