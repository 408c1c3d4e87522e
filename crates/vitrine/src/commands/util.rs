//! Shared helpers for command handlers.

use std::path::Path;

use vitrine_core::{CrudConfig, Draft, FieldKind, Value};

use crate::cli::FieldArgs;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Typed value for a `--set key=value` pair, guided by the field kind.
///
/// Values that don't parse stay text so form validation can report them.
pub fn coerce(config: &CrudConfig, key: &str, raw: &str) -> Value {
    match config.field(key).map(|f| f.kind) {
        Some(FieldKind::Number) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map_or_else(|| Value::from(raw), Value::from),
        Some(FieldKind::Checkbox | FieldKind::Toggle) => {
            parse_flag(raw).map_or_else(|| Value::from(raw), Value::from)
        }
        Some(FieldKind::Text | FieldKind::Email | FieldKind::Password | FieldKind::Textarea) => {
            Value::from(raw)
        }
        _ => Value::from(serde_json::Value::String(raw.to_owned())),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Assemble a draft from `--from-file` (first) and `--set` pairs.
pub fn build_draft(config: &CrudConfig, args: &FieldArgs) -> Result<Draft, CliError> {
    let mut draft = Draft::new();

    if let Some(ref path) = args.from_file {
        match read_json_file(path)? {
            serde_json::Value::Object(map) => {
                for (key, value) in map {
                    draft.set(key, Value::from(value));
                }
            }
            _ => {
                return Err(CliError::Validation {
                    field: "from-file".into(),
                    reason: "expected a JSON object of field values".into(),
                });
            }
        }
    }

    for (key, raw) in &args.set {
        draft.set(key.clone(), coerce(config, key, raw));
    }

    if draft.is_empty() {
        return Err(CliError::Validation {
            field: "set".into(),
            reason: "no field values given (use --set key=value or --from-file)".into(),
        });
    }
    Ok(draft)
}
