//! Top-level schema checks for Docling JSON.
//!
//! The validator only looks at the fields needed to recognise a document:
//! `schema_name` and `version`. Everything below the top level is the
//! [`DocumentBuilder`](crate::document::DocumentBuilder)'s business.
//!
//! Missing fields are collected exhaustively so the caller gets one error that
//! names every problem at once.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::json::ParsedValue;

/// Schema identifier every loadable document must carry.
pub const EXPECTED_SCHEMA_NAME: &str = "DoclingDocument";

/// Fields that must be present at the top level, in reporting order.
pub const REQUIRED_FIELDS: &[&str] = &["schema_name", "version"];

/// Versions known to load cleanly. Others are accepted with a warning.
pub const SUPPORTED_VERSIONS: &[&str] = &["1.0.0", "1.2.0", "1.3.0", "1.4.0"];

/// Reasons a parsed value is not a valid document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// The top-level value is not a JSON object.
    #[error("expected a JSON object at the top level, got {actual}")]
    NotAnObject { actual: String },

    /// One or more required fields are absent.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// `schema_name` names a different schema.
    #[error("expected schema_name '{expected}', got '{actual}'")]
    WrongSchemaName { expected: String, actual: String },

    /// A required field has the wrong JSON type.
    #[error("field '{field}' must be a {expected}")]
    WrongFieldType { field: String, expected: String },

    /// The document builder rejected the body of the document.
    #[error("invalid document: {}", .details.join("; "))]
    InvalidDocument { details: Vec<String> },
}

/// Validates the top-level shape of a parsed document.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    expected_schema_name: String,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::docling()
    }
}

impl SchemaValidator {
    /// Create a validator expecting the given schema name.
    pub fn new(expected_schema_name: impl Into<String>) -> Self {
        Self {
            expected_schema_name: expected_schema_name.into(),
        }
    }

    /// Validator for Docling documents.
    pub fn docling() -> Self {
        Self::new(EXPECTED_SCHEMA_NAME)
    }

    /// The schema name this validator accepts.
    pub fn expected_schema_name(&self) -> &str {
        &self.expected_schema_name
    }

    /// Check the top-level fields of `value`.
    pub fn validate(&self, value: &ParsedValue) -> Result<(), SchemaViolation> {
        let object = value.as_object().ok_or_else(|| SchemaViolation::NotAnObject {
            actual: JsonKind(value).to_string(),
        })?;

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !object.contains_key(**field))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaViolation::MissingFields(missing));
        }

        match &object["schema_name"] {
            Value::String(name) if *name == self.expected_schema_name => {}
            Value::String(name) => {
                return Err(SchemaViolation::WrongSchemaName {
                    expected: self.expected_schema_name.clone(),
                    actual: name.clone(),
                });
            }
            other => {
                return Err(SchemaViolation::WrongSchemaName {
                    expected: self.expected_schema_name.clone(),
                    actual: other.to_string(),
                });
            }
        }

        let version = object["version"]
            .as_str()
            .ok_or_else(|| SchemaViolation::WrongFieldType {
                field: "version".to_string(),
                expected: "string".to_string(),
            })?;

        if !SUPPORTED_VERSIONS.contains(&version) {
            tracing::warn!(
                version,
                supported = ?SUPPORTED_VERSIONS,
                "Document version is not in the supported set, loading may be incomplete"
            );
        }

        Ok(())
    }
}

/// Human-readable name of a JSON value's type.
struct JsonKind<'a>(&'a Value);

impl fmt::Display for JsonKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.0 {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        };
        f.write_str(kind)
    }
}
