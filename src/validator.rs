//! Structural validation of JSON:API documents.
//!
//! Documents are checked against an embedded JSON Schema covering the
//! top-level members, resource objects, relationship entries and links.
//! Every violation is collected, each with a JSON Pointer to the offending
//! member.

use std::path::Path;
use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{DocumentError, ValidateError};
use crate::loader::load_document;

/// Validate a document against the JSON:API structure.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` with every violation found, or
/// `ValidateError::InvalidSchema` if the embedded schema fails to compile.
pub fn validate_document(document: &Value) -> Result<(), ValidateError> {
    let validator = document_validator()?;

    let errors: Vec<DocumentError> = validator
        .iter_errors(document)
        .map(|e| DocumentError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    debug!(errors = errors.len(), "validated document");

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

/// Load a document from `path` and validate it.
///
/// # Errors
///
/// Returns `ValidateError::Load` if the file cannot be read or parsed, or
/// any error of [`validate_document`].
pub fn validate_document_file(path: &Path) -> Result<(), ValidateError> {
    let document = load_document(path)?;
    validate_document(&document)
}

// --- Internal implementation ---

/// The compiled document schema, built on first use.
fn document_validator() -> Result<&'static Validator, ValidateError> {
    static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();
    VALIDATOR
        .get_or_init(|| {
            debug!("compiling document schema");
            jsonschema::validator_for(&document_schema()).map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|message| ValidateError::InvalidSchema {
            message: message.clone(),
        })
}

fn document_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "anyOf": [
            { "required": ["data"] },
            { "required": ["errors"] },
            { "required": ["meta"] }
        ],
        "not": { "required": ["data", "errors"] },
        "dependentRequired": { "included": ["data"] },
        "properties": {
            "data": {
                "oneOf": [
                    { "type": "null" },
                    { "$ref": "#/$defs/resource" },
                    { "type": "array", "items": { "$ref": "#/$defs/resource" } }
                ]
            },
            "included": { "type": "array", "items": { "$ref": "#/$defs/resource" } },
            "links": { "$ref": "#/$defs/links" },
            "errors": { "type": "array", "items": { "type": "object" } },
            "meta": { "type": "object" },
            "jsonapi": { "type": "object" }
        },
        "additionalProperties": false,
        "$defs": {
            "resource": {
                "type": "object",
                "required": ["type", "id"],
                "properties": {
                    "type": { "type": "string", "minLength": 1 },
                    "id": { "type": "string", "minLength": 1 },
                    "attributes": {
                        "type": "object",
                        "not": {
                            "anyOf": [
                                { "required": ["relationships"] },
                                { "required": ["links"] }
                            ]
                        }
                    },
                    "relationships": {
                        "type": "object",
                        "additionalProperties": { "$ref": "#/$defs/relationship" }
                    },
                    "links": { "$ref": "#/$defs/links" },
                    "meta": { "type": "object" }
                },
                "additionalProperties": false
            },
            "relationship": {
                "type": "object",
                "anyOf": [
                    { "required": ["data"] },
                    { "required": ["links"] },
                    { "required": ["meta"] }
                ],
                "properties": {
                    "data": {
                        "oneOf": [
                            { "type": "null" },
                            { "$ref": "#/$defs/identifier" },
                            { "type": "array", "items": { "$ref": "#/$defs/identifier" } }
                        ]
                    },
                    "links": { "$ref": "#/$defs/links" },
                    "meta": { "type": "object" }
                },
                "additionalProperties": false
            },
            "identifier": {
                "type": "object",
                "required": ["type", "id"],
                "properties": {
                    "type": { "type": "string", "minLength": 1 },
                    "id": { "type": "string", "minLength": 1 },
                    "meta": { "type": "object" }
                },
                "additionalProperties": false
            },
            "links": {
                "type": "object",
                "additionalProperties": {
                    "oneOf": [
                        { "type": "string" },
                        { "type": "null" },
                        {
                            "type": "object",
                            "required": ["href"],
                            "properties": {
                                "href": { "type": "string" },
                                "meta": { "type": "object" }
                            }
                        }
                    ]
                }
            }
        }
    })
}
