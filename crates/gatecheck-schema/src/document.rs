//! # Bundle Documents
//!
//! Schema bundles kept on disk as JSON (`.json`) or YAML (`.yaml`/`.yml`):
//!
//! ```yaml
//! params:
//!   type: object
//!   properties:
//!     id: { type: integer }
//! body:
//!   type: object
//!   required: [name]
//! ```
//!
//! Top-level keys are segment names; anything else is rejected.

use std::path::Path;

use gatecheck_core::SchemaBundle;
use serde_json::{Map, Number, Value};

use crate::validate::{JsonSchemaEngine, SchemaError, SegmentSchema};

/// Read a JSON or YAML document, chosen by file extension.
///
/// Extensions other than `yaml`/`yml` are read as JSON.
///
/// # Errors
///
/// [`SchemaError::DocumentLoad`] when the file cannot be read or parsed.
pub fn read_document(path: &Path) -> Result<Value, SchemaError> {
    let load_err = |reason: String| SchemaError::DocumentLoad {
        path: path.display().to_string(),
        reason,
    };

    let content =
        std::fs::read_to_string(path).map_err(|e| load_err(format!("cannot read file: {e}")))?;

    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "yaml" | "yml" => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|e| load_err(format!("invalid YAML: {e}")))?;
            yaml_to_json(&yaml).map_err(|e| load_err(format!("YAML-to-JSON conversion failed: {e}")))
        }
        _ => serde_json::from_str(&content).map_err(|e| load_err(format!("invalid JSON: {e}"))),
    }
}

/// Load and compile a bundle document.
///
/// # Errors
///
/// Any [`read_document`] error, plus the errors of
/// [`JsonSchemaEngine::compile_bundle`].
pub fn load_bundle(
    engine: &JsonSchemaEngine,
    path: &Path,
) -> Result<SchemaBundle<SegmentSchema>, SchemaError> {
    let doc = read_document(path)?;
    let bundle = engine.compile_bundle(&doc)?;
    tracing::info!(
        path = %path.display(),
        segments = bundle.declared().count(),
        "loaded schema bundle"
    );
    Ok(bundle)
}

/// Convert YAML into JSON. Tags are dropped; scalar keys are stringified.
fn yaml_to_json(yaml: &serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                let f = n.as_f64().ok_or_else(|| format!("unsupported number {n}"))?;
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("{f} has no JSON representation"))?
            }
        }
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(items) => {
            Value::Array(items.iter().map(yaml_to_json).collect::<Result<_, _>>()?)
        }
        Yaml::Mapping(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (k, v) in entries {
                let key = match k {
                    Yaml::String(s) => s.clone(),
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported map key {other:?}")),
                };
                map.insert(key, yaml_to_json(v)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(&tagged.value)?,
    })
}
