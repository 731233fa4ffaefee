//! Input validation and categorical encoding.
//!
//! Turns a caller-supplied `field name → raw string` mapping into the
//! numeric feature vector a classifier consumes. The output order is the
//! schema order, regardless of how the caller collected the fields.
//! No range clamping happens here: advisory hints belong to the UI.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{DiseaseSchema, FeatureKind, FeatureSpec};

/// Raw form values keyed by feature name. Selections are their labels.
pub type RawInputs = HashMap<String, String>;

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    NotNumeric,
    UnmappedCategory,
}

impl ValidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotNumeric => "not numeric",
            Self::UnmappedCategory => "unmapped category",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw input that could not be encoded. `value` is `None` when the
/// field was absent.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Invalid value for '{field}': {reason}{}", missing_suffix(.value))]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
    pub value: Option<String>,
}

impl ValidationError {
    fn new(field: &str, reason: ValidationReason, value: Option<&str>) -> Self {
        Self {
            field: field.to_string(),
            reason,
            value: value.map(str::to_string),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}

/// Ordered numeric encoding of one schema's inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Encode `raw` against `schema`. Fails on the first field, in schema
/// order, that cannot be encoded; no partial vector is produced.
pub fn encode(schema: &DiseaseSchema, raw: &RawInputs) -> Result<FeatureVector, ValidationError> {
    schema
        .features()
        .iter()
        .map(|feature| encode_feature(feature, raw.get(&feature.name).map(String::as_str)))
        .collect::<Result<Vec<f64>, _>>()
        .map(FeatureVector)
}

/// Encode a single field. Empty or whitespace-only input counts as absent.
pub fn encode_feature(feature: &FeatureSpec, raw: Option<&str>) -> Result<f64, ValidationError> {
    let value = raw.map(str::trim).filter(|v| !v.is_empty());

    let Some(value) = value else {
        return match feature.default {
            Some(default) if !feature.required => Ok(default),
            _ => Err(ValidationError::new(&feature.name, missing_reason(feature), None)),
        };
    };

    match &feature.kind {
        FeatureKind::Numeric => value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                ValidationError::new(&feature.name, ValidationReason::NotNumeric, Some(value))
            }),
        FeatureKind::Categorical { encoding } => encoding
            .iter()
            .find(|c| c.label == value)
            .map(|c| c.code as f64)
            .ok_or_else(|| {
                ValidationError::new(&feature.name, ValidationReason::UnmappedCategory, Some(value))
            }),
    }
}

/// Inverse of the categorical encoding: code → label.
pub fn decode_category(feature: &FeatureSpec, code: i64) -> Option<&str> {
    feature
        .encoding()?
        .iter()
        .find(|c| c.code == code)
        .map(|c| c.label.as_str())
}

fn missing_suffix(value: &Option<String>) -> &'static str {
    if value.is_none() {
        " (missing)"
    } else {
        ""
    }
}

fn missing_reason(feature: &FeatureSpec) -> ValidationReason {
    if feature.is_categorical() {
        ValidationReason::UnmappedCategory
    } else {
        ValidationReason::NotNumeric
    }
}
