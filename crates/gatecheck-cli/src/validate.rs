//! # Validate Subcommand
//!
//! Runs a request snapshot through a bundle document offline, the same
//! way the guard would for a live request.
//!
//! A snapshot is a JSON or YAML document:
//!
//! ```yaml
//! method: POST
//! path: /users/7
//! params: { id: "7" }
//! body: { name: ada }
//! ```
//!
//! Missing segments default to `{}`; `method` and `path` default to
//! `GET` and `/`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use gatecheck_core::{
    check_segments, CheckOptions, RequestSegments, SegmentError, Segment, ValidatedSegments,
    ValidationOptions,
};
use gatecheck_schema::{load_bundle, read_document, JsonSchemaEngine};
use serde_json::Value;

/// Arguments for the `gatecheck validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Bundle document (JSON or YAML) mapping segment names to schemas.
    #[arg(long, short)]
    pub bundle: PathBuf,

    /// Request snapshot to validate (JSON or YAML).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Pass the whole snapshot as validation context.
    #[arg(long)]
    pub req_context: bool,

    /// Report every violation instead of the first.
    #[arg(long)]
    pub all_errors: bool,

    /// Do not coerce string input to schema types.
    #[arg(long)]
    pub no_convert: bool,

    /// Drop keys the schema does not declare.
    #[arg(long)]
    pub strip_unknown: bool,

    /// Print machine-readable JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

impl ValidateArgs {
    fn options(&self) -> ValidationOptions {
        ValidationOptions::default()
            .abort_early(!self.all_errors)
            .convert(!self.no_convert)
            .strip_unknown(self.strip_unknown)
    }

    fn check(&self) -> CheckOptions {
        CheckOptions {
            req_context: self.req_context,
        }
    }
}

/// Outcome of one offline validation.
pub type Outcome = std::result::Result<ValidatedSegments, SegmentError>;

/// Execute the validate subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let outcome = validate_files(args)?;
    println!("{}", render(&outcome, args.json)?);
    Ok(if outcome.is_ok() { 0 } else { 1 })
}

/// Load the bundle and snapshot named by `args` and validate.
pub fn validate_files(args: &ValidateArgs) -> Result<Outcome> {
    let engine = JsonSchemaEngine::new();
    let bundle = load_bundle(&engine, &args.bundle)
        .with_context(|| format!("failed to load bundle {}", args.bundle.display()))?;
    let snapshot = load_snapshot(&args.input)?;

    tracing::debug!(
        method = %snapshot.method,
        path = %snapshot.path,
        segments = bundle.declared().count(),
        "validating snapshot"
    );

    Ok(check_segments(
        &engine,
        &bundle,
        &snapshot,
        &args.options(),
        &args.check(),
    ))
}

/// Read a snapshot document from disk.
pub fn load_snapshot(path: &Path) -> Result<RequestSegments> {
    let doc = read_document(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    parse_snapshot(&doc).with_context(|| format!("invalid snapshot {}", path.display()))
}

/// Build [`RequestSegments`] from a snapshot document.
pub fn parse_snapshot(doc: &Value) -> Result<RequestSegments> {
    let Value::Object(entries) = doc else {
        bail!("snapshot must be an object");
    };

    let mut snapshot = RequestSegments::default();
    for (key, value) in entries {
        match key.as_str() {
            "method" => {
                snapshot.method = value
                    .as_str()
                    .context("method must be a string")?
                    .to_ascii_uppercase();
            }
            "path" => {
                snapshot.path = value.as_str().context("path must be a string")?.to_string();
            }
            name => {
                let segment: Segment = name.parse()?;
                snapshot.set(segment, value.clone());
            }
        }
    }
    Ok(snapshot)
}

/// Format an outcome for the terminal.
pub fn render(outcome: &Outcome, json: bool) -> Result<String> {
    if json {
        let value = match outcome {
            Ok(validated) => serde_json::json!({"valid": true, "segments": validated.to_json()}),
            Err(err) => serde_json::json!({"valid": false, "error": err}),
        };
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    Ok(match outcome {
        Ok(validated) => {
            let names: Vec<&str> = validated.segments().map(|s| s.as_str()).collect();
            if names.is_empty() {
                "PASS (no segments declared)".to_string()
            } else {
                format!("PASS: {}", names.join(", "))
            }
        }
        Err(err) => {
            let mut out = format!("FAIL: {}", err.segment());
            for violation in err.details.violations() {
                out.push_str(&format!("\n  {violation}"));
            }
            out
        }
    })
}
