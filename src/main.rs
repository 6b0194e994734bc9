mod error;
mod replay;
mod snap;

use std::fs;

use clap::{Args, Parser, Subcommand};
use designer::geometry::Point;
use designer::guides::SnapThresholds;
use designer::hit::ResizeAnchor;
use formcache::{FormDefinition, SortMode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use wire::ErrorCode;

use crate::error::CliError;
use crate::replay::BatchFile;

#[derive(Parser, Debug)]
#[command(name = "formsync", about = "Replay designer edit batches and snap queries offline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a form cache, apply recorded batches, print the final tree.
    Replay(ReplayArgs),
    /// Run one snap query against measured element boxes.
    Snap(SnapArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// JSON map of component specification name to client-side spec.
    #[arg(long)]
    specs: String,
    /// JSON form definition: name, size, responsive, parts.
    #[arg(long)]
    form: String,
    #[arg(long, env = "FORMSYNC_SORT_MODE", default_value = "stable")]
    sort_mode: SortMode,
    /// JSONL files, one edit batch per line.
    #[arg(required = true)]
    batches: Vec<String>,
}

#[derive(Args, Debug)]
struct SnapArgs {
    /// JSON array of measured element boxes, in document order.
    #[arg(long)]
    elements: String,
    #[arg(long)]
    x: f64,
    #[arg(long)]
    y: f64,
    /// Resize anchor (`n`, `se`, ...); omit for a move.
    #[arg(long)]
    resizing: Option<ResizeAnchor>,
    #[arg(long, env = "FORMSYNC_SNAP_ALIGNMENT", default_value_t = 5.0)]
    alignment: f64,
    #[arg(long, env = "FORMSYNC_SNAP_DISTANCE", default_value_t = 5.0)]
    distance: f64,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Replay(args) => run_replay(args),
        Command::Snap(args) => run_snap(args),
    };
    if let Err(e) = &result {
        tracing::error!(code = e.error_code(), error = %e, "formsync failed");
    }
    result
}

fn run_replay(args: ReplayArgs) -> Result<(), CliError> {
    let specs: Value = read_json(&args.specs)?;
    let form: FormDefinition = read_json(&args.form)?;
    let texts = args.batches.iter().map(|path| read_text(path)).collect::<Result<Vec<_>, _>>()?;
    let files: Vec<BatchFile<'_>> =
        args.batches.iter().zip(&texts).map(|(path, text)| BatchFile { path, text }).collect();

    let outcome = replay::replay(&specs, &form, &files, args.sort_mode)?;
    tracing::info!(
        batches = outcome.reports.len(),
        queued = outcome.outgoing.len(),
        orphans_dropped = outcome.orphans_dropped,
        "replay finished"
    );
    print_json(&json!({
        "batches": outcome.reports.len(),
        "orphansDropped": outcome.orphans_dropped,
        "form": outcome.snapshot,
    }))
}

fn run_snap(args: SnapArgs) -> Result<(), CliError> {
    let elements: Value = read_json(&args.elements)?;
    let thresholds = SnapThresholds { alignment: args.alignment, distance: args.distance };
    let reply = snap::snap(elements, Point::new(args.x, args.y), args.resizing, thresholds)?;
    let value = reply.to_value().map_err(|e| CliError::Output(std::io::Error::other(e)))?;
    print_json(&value)
}

fn read_text(path: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_owned(), source })
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, CliError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| CliError::Json { path: path.to_owned(), source })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).map_err(|e| CliError::Output(std::io::Error::other(e)))?;
    println!("{rendered}");
    Ok(())
}
