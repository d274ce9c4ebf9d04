//! # Inspect Subcommand
//!
//! Compiles a bundle document and lists what it declares, so broken
//! schemas surface before a route is wired up.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use gatecheck_core::SchemaBundle;
use gatecheck_schema::{load_bundle, JsonSchemaEngine, SegmentSchema};
use serde::Serialize;

/// Arguments for the `gatecheck inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Bundle document (JSON or YAML).
    #[arg(value_name = "BUNDLE")]
    pub bundle: PathBuf,

    /// Print machine-readable JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// One declared segment in an inspected bundle.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SegmentSummary {
    pub segment: String,
    /// `x-context` pointers the schema compares against.
    pub context_refs: Vec<String>,
}

/// Execute the inspect subcommand. A bundle that compiles exits 0.
pub fn run_inspect(args: &InspectArgs) -> Result<u8> {
    let engine = JsonSchemaEngine::new();
    let bundle = load_bundle(&engine, &args.bundle)
        .with_context(|| format!("failed to load bundle {}", args.bundle.display()))?;
    let summary = summarize(&bundle);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if summary.is_empty() {
        println!("{}: no segments declared", args.bundle.display());
    } else {
        println!("{}:", args.bundle.display());
        for entry in &summary {
            if entry.context_refs.is_empty() {
                println!("  {}", entry.segment);
            } else {
                println!("  {} (context: {})", entry.segment, entry.context_refs.join(", "));
            }
        }
    }
    Ok(0)
}

/// Declared segments in validation order.
pub fn summarize(bundle: &SchemaBundle<SegmentSchema>) -> Vec<SegmentSummary> {
    bundle
        .declared()
        .map(|(segment, schema)| SegmentSummary {
            segment: segment.as_str().to_string(),
            context_refs: schema
                .context_refs()
                .iter()
                .map(|r| r.pointer.clone())
                .collect(),
        })
        .collect()
}
