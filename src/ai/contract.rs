//! Typed response contracts for every AI task.
//!
//! Each task parses the raw completion text into its own outcome type or a
//! [`ContractViolation`]. Nothing from the decoded JSON is trusted without
//! going through these parsers.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::{
    Map,
    Value,
};
use thiserror::Error;

use crate::dictionary::{
    Dictionary,
    TreeError,
    flatten,
};

/// The five task kinds the client can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    RefactorFile,
    TranslateText,
    TranslateBatch,
    ExtractBuildErrors,
    FixCompileError,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RefactorFile => "refactor-file",
            Self::TranslateText => "translate-text",
            Self::TranslateBatch => "translate-batch",
            Self::ExtractBuildErrors => "extract-build-errors",
            Self::FixCompileError => "fix-compile-error",
        };
        f.write_str(name)
    }
}

/// Why a completion was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("response is not a JSON object: {0}")]
    NotJson(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    InvalidField { field: &'static str, expected: &'static str },

    #[error("needsUpdate is true but updatedCode is empty")]
    EmptyUpdate,

    #[error("translation is empty")]
    EmptyTranslation,

    #[error("returned keys differ from requested keys (missing: {missing:?}, unexpected: {unexpected:?})")]
    StructuralMismatch { missing: Vec<String>, unexpected: Vec<String> },

    #[error("malformed dictionary: {0}")]
    Malformed(#[from] TreeError),
}

/// Outcome of a refactor-file task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefactorOutcome {
    /// The file needs no change.
    Unchanged,
    /// Full replacement content plus the proposed `key -> original text` map.
    Updated { code: String, translations: Dictionary },
}

/// One error reported by an extract-build-errors task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    pub file_path: String,
    pub error_type: String,
    pub error_description: String,
}

/// Outcome of a fix-compile-error task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFix {
    pub explanation: String,
    pub updated_code: String,
}

/// Removes a surrounding Markdown code fence (with optional language tag).
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string ("json", "tsx", ...) on the opening line
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses `{ needsUpdate, updatedCode, translations }`.
///
/// # Errors
/// Returns a [`ContractViolation`] for any deviation from the schema.
pub fn parse_refactor(raw: &str) -> Result<RefactorOutcome, ContractViolation> {
    let object = parse_object(raw)?;

    let needs_update = match object.get("needsUpdate") {
        Some(Value::Bool(flag)) => *flag,
        Some(_) => {
            return Err(ContractViolation::InvalidField {
                field: "needsUpdate",
                expected: "a boolean",
            });
        }
        None => return Err(ContractViolation::MissingField("needsUpdate")),
    };
    if !needs_update {
        return Ok(RefactorOutcome::Unchanged);
    }

    let code = string_field(&object, "updatedCode")?;
    let code = strip_code_fences(code);
    if code.is_empty() {
        return Err(ContractViolation::EmptyUpdate);
    }

    let translations = match object.get("translations") {
        None | Some(Value::Null) => Dictionary::new(),
        Some(value @ Value::Object(_)) => Dictionary::from_json(value)?,
        Some(_) => {
            return Err(ContractViolation::InvalidField {
                field: "translations",
                expected: "an object",
            });
        }
    };

    Ok(RefactorOutcome::Updated { code: code.to_string(), translations })
}

/// Parses the bare translated string of a translate-text task.
///
/// A JSON string literal or a `{ "translation": "..." }` envelope is unwrapped
/// as well, since models add those despite instructions.
///
/// # Errors
/// Returns [`ContractViolation::EmptyTranslation`] for blank output.
pub fn parse_translated_text(raw: &str) -> Result<String, ContractViolation> {
    let text = strip_code_fences(raw);
    let text = match serde_json::from_str::<Value>(text) {
        Ok(Value::String(inner)) => inner,
        Ok(Value::Object(object)) => match object.get("translation") {
            Some(Value::String(inner)) => inner.clone(),
            _ => {
                return Err(ContractViolation::InvalidField {
                    field: "translation",
                    expected: "a string",
                });
            }
        },
        _ => text.to_string(),
    };

    if text.trim().is_empty() {
        return Err(ContractViolation::EmptyTranslation);
    }
    Ok(text)
}

/// Parses a translate-batch response and checks it against the request.
///
/// The flattened key set of the response must equal that of `requested`,
/// and every leaf must be non-empty.
///
/// # Errors
/// - [`ContractViolation::StructuralMismatch`] if key sets differ
/// - [`ContractViolation::Malformed`] if the response is not a string tree
pub fn parse_translated_batch(
    raw: &str,
    requested: &Dictionary,
    separator: &str,
) -> Result<Dictionary, ContractViolation> {
    let object = parse_object(raw)?;
    let translated = Dictionary::from_json(&Value::Object(object))?;

    let requested_keys: BTreeSet<String> =
        flatten(requested, separator).into_iter().map(|(key, _)| key).collect();
    let translated_flat = flatten(&translated, separator);
    let translated_keys: BTreeSet<String> =
        translated_flat.iter().map(|(key, _)| key.clone()).collect();

    if requested_keys != translated_keys {
        return Err(ContractViolation::StructuralMismatch {
            missing: requested_keys.difference(&translated_keys).cloned().collect(),
            unexpected: translated_keys.difference(&requested_keys).cloned().collect(),
        });
    }
    if translated_flat.iter().any(|(_, text)| text.trim().is_empty()) {
        return Err(ContractViolation::EmptyTranslation);
    }

    Ok(translated)
}

/// Parses `{ extractedErrors: [{ filePath, errorType, errorDescription }] }`.
///
/// # Errors
/// Returns a [`ContractViolation`] for any deviation from the schema.
pub fn parse_build_errors(raw: &str) -> Result<Vec<BuildError>, ContractViolation> {
    let object = parse_object(raw)?;
    let entries = match object.get("extractedErrors") {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(ContractViolation::InvalidField {
                field: "extractedErrors",
                expected: "an array",
            });
        }
        None => return Err(ContractViolation::MissingField("extractedErrors")),
    };

    entries
        .iter()
        .map(|entry| {
            let Value::Object(entry) = entry else {
                return Err(ContractViolation::InvalidField {
                    field: "extractedErrors",
                    expected: "an array of objects",
                });
            };
            Ok(BuildError {
                file_path: string_field(entry, "filePath")?.to_string(),
                error_type: string_field(entry, "errorType")?.to_string(),
                error_description: string_field(entry, "errorDescription")?.to_string(),
            })
        })
        .collect()
}

/// Parses `{ fixExplanation, updatedCode }`.
///
/// # Errors
/// Returns a [`ContractViolation`] for any deviation from the schema.
pub fn parse_compile_fix(raw: &str) -> Result<CompileFix, ContractViolation> {
    let object = parse_object(raw)?;
    let explanation = string_field(&object, "fixExplanation")?.to_string();
    let updated_code = strip_code_fences(string_field(&object, "updatedCode")?);
    if updated_code.is_empty() {
        return Err(ContractViolation::EmptyUpdate);
    }

    Ok(CompileFix { explanation, updated_code: updated_code.to_string() })
}

/// Strips fences and decodes a single JSON object.
fn parse_object(raw: &str) -> Result<Map<String, Value>, ContractViolation> {
    let text = strip_code_fences(raw);
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ContractViolation::NotJson("expected an object".to_string())),
        Err(e) => Err(ContractViolation::NotJson(e.to_string())),
    }
}

/// Reads a required string field.
fn string_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ContractViolation> {
    match object.get(field) {
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(ContractViolation::InvalidField { field, expected: "a string" }),
        None => Err(ContractViolation::MissingField(field)),
    }
}
