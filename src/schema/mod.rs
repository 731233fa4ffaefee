//! Disease schema registry.
//!
//! A `DiseaseSchema` declares, in training column order, every feature a
//! disease classifier expects. Schemas are validated when they are defined
//! and are immutable afterwards; the registry is populated once at startup
//! and then shared read-only.
//!
//! Feature order is load-bearing: the encoder emits values in exactly this
//! order, and a reordered schema corrupts predictions without any error.

pub mod builtin;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// A disease id that no registry knows about.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown disease: {disease_id}")]
pub struct UnknownDiseaseError {
    pub disease_id: String,
}

impl UnknownDiseaseError {
    pub fn new(disease_id: impl Into<String>) -> Self {
        Self {
            disease_id: disease_id.into(),
        }
    }
}

/// Definition-time schema problems.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Disease id must not be empty")]
    EmptyDiseaseId,

    #[error("Schema '{0}' declares no features")]
    NoFeatures(String),

    #[error("Duplicate feature '{feature}' in schema '{disease_id}'")]
    DuplicateFeature { disease_id: String, feature: String },

    #[error("Categorical feature '{0}' has an empty encoding map")]
    EmptyEncoding(String),

    #[error("Categorical feature '{feature}' repeats label '{label}'")]
    DuplicateCategoryLabel { feature: String, label: String },

    #[error("Categorical feature '{feature}' repeats code {code}")]
    DuplicateCategoryCode { feature: String, code: i64 },

    #[error("Optional feature '{0}' has no default value")]
    MissingDefault(String),

    #[error("Feature '{feature}' has an invalid range hint: min {min} > max {max}")]
    InvalidRange { feature: String, min: f64, max: f64 },

    #[error("Schema '{0}' is already registered")]
    DuplicateDisease(String),
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// One label → integer code pair of a categorical encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCode {
    pub label: String,
    pub code: i64,
}

/// How a raw input value becomes a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    /// Ordered encoding map; order is the option order shown to users.
    Categorical { encoding: Vec<CategoryCode> },
}

/// Advisory input hint for UI collaborators. Never enforced by the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputHint {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

/// Declaration of a single model input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Field name used as the key in raw input mappings.
    pub name: String,
    /// Display label for input forms.
    pub label: String,
    pub kind: FeatureKind,
    pub required: bool,
    /// Value encoded when an optional feature is absent.
    pub default: Option<f64>,
    pub hint: Option<InputHint>,
}

impl FeatureSpec {
    /// A required numeric feature labelled with its own name.
    pub fn numeric(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            kind: FeatureKind::Numeric,
            required: true,
            default: None,
            hint: None,
        }
    }

    /// A required categorical feature. `encoding` order is preserved.
    pub fn categorical(name: &str, encoding: &[(&str, i64)]) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            kind: FeatureKind::Categorical {
                encoding: encoding
                    .iter()
                    .map(|(label, code)| CategoryCode {
                        label: (*label).to_string(),
                        code: *code,
                    })
                    .collect(),
            },
            required: true,
            default: None,
            hint: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Make the feature optional; absent values encode to `default`.
    pub fn optional(mut self, default: f64) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    pub fn with_hint(mut self, min: Option<f64>, max: Option<f64>, step: Option<f64>) -> Self {
        self.hint = Some(InputHint { min, max, step });
        self
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, FeatureKind::Categorical { .. })
    }

    /// Encoding map for categorical features, `None` for numeric ones.
    pub fn encoding(&self) -> Option<&[CategoryCode]> {
        match &self.kind {
            FeatureKind::Categorical { encoding } => Some(encoding),
            FeatureKind::Numeric => None,
        }
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if let FeatureKind::Categorical { encoding } = &self.kind {
            if encoding.is_empty() {
                return Err(SchemaError::EmptyEncoding(self.name.clone()));
            }
            let mut labels = HashSet::new();
            let mut codes = HashSet::new();
            for entry in encoding {
                if !labels.insert(entry.label.as_str()) {
                    return Err(SchemaError::DuplicateCategoryLabel {
                        feature: self.name.clone(),
                        label: entry.label.clone(),
                    });
                }
                if !codes.insert(entry.code) {
                    return Err(SchemaError::DuplicateCategoryCode {
                        feature: self.name.clone(),
                        code: entry.code,
                    });
                }
            }
        }

        if !self.required && self.default.is_none() {
            return Err(SchemaError::MissingDefault(self.name.clone()));
        }

        if let Some(InputHint {
            min: Some(min),
            max: Some(max),
            ..
        }) = self.hint
        {
            if min > max {
                return Err(SchemaError::InvalidRange {
                    feature: self.name.clone(),
                    min,
                    max,
                });
            }
        }

        Ok(())
    }
}

/// Ordered feature declaration for one disease.
///
/// Fields are private so a schema can only be obtained through
/// [`DiseaseSchema::new`], which validates it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseSchema {
    disease_id: String,
    title: String,
    features: Vec<FeatureSpec>,
    note: Option<String>,
}

impl DiseaseSchema {
    pub fn new(
        disease_id: &str,
        title: &str,
        features: Vec<FeatureSpec>,
    ) -> Result<Self, SchemaError> {
        if disease_id.trim().is_empty() {
            return Err(SchemaError::EmptyDiseaseId);
        }
        if features.is_empty() {
            return Err(SchemaError::NoFeatures(disease_id.to_string()));
        }

        let mut names = HashSet::new();
        for feature in &features {
            if !names.insert(feature.name.as_str()) {
                return Err(SchemaError::DuplicateFeature {
                    disease_id: disease_id.to_string(),
                    feature: feature.name.clone(),
                });
            }
            feature.validate()?;
        }

        Ok(Self {
            disease_id: disease_id.to_string(),
            title: title.to_string(),
            features,
            note: None,
        })
    }

    /// Attach informational text shown alongside the input form.
    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    pub fn disease_id(&self) -> &str {
        &self.disease_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Features in training column order.
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureSpec> {
        self.features.iter().find(|f| f.name == name)
    }
}

// ═══════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════

/// Disease id → schema. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, DiseaseSchema>,
    order: Vec<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in assessments.
    pub fn builtin() -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        for schema in builtin::all()? {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, schema: DiseaseSchema) -> Result<(), SchemaError> {
        let id = schema.disease_id().to_string();
        if self.schemas.contains_key(&id) {
            return Err(SchemaError::DuplicateDisease(id));
        }
        self.order.push(id.clone());
        self.schemas.insert(id, schema);
        Ok(())
    }

    pub fn get(&self, disease_id: &str) -> Result<&DiseaseSchema, UnknownDiseaseError> {
        self.schemas
            .get(disease_id)
            .ok_or_else(|| UnknownDiseaseError::new(disease_id))
    }

    /// Disease ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Schemas in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DiseaseSchema> {
        self.order.iter().filter_map(|id| self.schemas.get(id))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
