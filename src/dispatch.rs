//! Prediction dispatcher.
//!
//! Coordinates: schema lookup → encode → model lookup → predict →
//! interpret → record. Only the final step mutates anything, and only the
//! one result entry for the requested disease, so a failed prediction
//! leaves the session's existing results exactly as they were.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::encoder::{encode, RawInputs, ValidationError, ValidationReason};
use crate::model::{ModelError, ModelRegistry};
use crate::schema::{SchemaRegistry, UnknownDiseaseError};
use crate::session::ResultStore;

pub const POSITIVE_DIAGNOSIS: &str = "Positive Diagnosis";
pub const NEGATIVE_DIAGNOSIS: &str = "Negative Diagnosis";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Binary classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisLabel {
    Negative,
    Positive,
}

impl DiagnosisLabel {
    /// Interpret a raw model output. Only exactly `0` and `1` are labels.
    pub fn from_output(output: f64) -> Option<Self> {
        if output == 0.0 {
            Some(Self::Negative)
        } else if output == 1.0 {
            Some(Self::Positive)
        } else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Negative => NEGATIVE_DIAGNOSIS,
            Self::Positive => POSITIVE_DIAGNOSIS,
        }
    }
}

/// Outcome of one successful prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionResult {
    pub disease_id: String,
    pub label: DiagnosisLabel,
    pub diagnosis_text: String,
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// The model raised, or answered outside the binary contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Model for {disease_id} failed: {source}")]
    Model {
        disease_id: String,
        #[source]
        source: ModelError,
    },

    #[error("Model for {disease_id} returned {output}, expected 0 or 1")]
    OutOfContract { disease_id: String, output: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    UnknownDisease(#[from] UnknownDiseaseError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl DispatchError {
    /// Message suitable for showing to the clinician entering the data.
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::Validation(e) if e.is_missing() => {
                format!("Please fill in '{}'.", e.field)
            }
            DispatchError::Validation(e) => match e.reason {
                ValidationReason::NotNumeric => {
                    format!("Please enter a valid numeric value for '{}'.", e.field)
                }
                ValidationReason::UnmappedCategory => {
                    format!("Please choose one of the listed options for '{}'.", e.field)
                }
            },
            DispatchError::UnknownDisease(e) => {
                format!("The {} assessment is not available.", e.disease_id)
            }
            DispatchError::Inference(_) => {
                "The prediction could not be completed. Please try again.".to_string()
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Dispatcher
// ═══════════════════════════════════════════════════════════

/// Stateless orchestrator over the shared, read-only registries.
#[derive(Debug, Clone)]
pub struct PredictionDispatcher {
    schemas: Arc<SchemaRegistry>,
    models: Arc<ModelRegistry>,
}

impl PredictionDispatcher {
    pub fn new(schemas: Arc<SchemaRegistry>, models: Arc<ModelRegistry>) -> Self {
        Self { schemas, models }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Run a prediction without touching any result store.
    pub fn predict(
        &self,
        disease_id: &str,
        raw: &RawInputs,
    ) -> Result<PredictionResult, DispatchError> {
        let schema = self.schemas.get(disease_id)?;
        let model = self.models.get(disease_id)?;

        let features = encode(schema, raw)?;

        let output = model.predict(&features).map_err(|source| InferenceError::Model {
            disease_id: disease_id.to_string(),
            source,
        })?;
        let label = DiagnosisLabel::from_output(output).ok_or_else(|| {
            InferenceError::OutOfContract {
                disease_id: disease_id.to_string(),
                output,
            }
        })?;

        Ok(PredictionResult {
            disease_id: disease_id.to_string(),
            label,
            diagnosis_text: label.text().to_string(),
        })
    }

    /// Predict and record the diagnosis in `store`, returning its text.
    ///
    /// On error the store is not touched.
    pub fn dispatch(
        &self,
        disease_id: &str,
        raw: &RawInputs,
        store: &mut ResultStore,
    ) -> Result<String, DispatchError> {
        match self.predict(disease_id, raw) {
            Ok(result) => {
                tracing::info!(
                    disease_id,
                    label = result.label.as_u8(),
                    "Prediction recorded"
                );
                store.record(&result.disease_id, &result.diagnosis_text);
                Ok(result.diagnosis_text)
            }
            Err(e) => {
                match &e {
                    DispatchError::Validation(v) => {
                        tracing::warn!(disease_id, field = %v.field, reason = %v.reason, "Input rejected")
                    }
                    DispatchError::UnknownDisease(_) => {
                        tracing::error!(disease_id, "Dispatch for unregistered disease")
                    }
                    DispatchError::Inference(i) => {
                        tracing::error!(disease_id, error = %i, "Inference failed")
                    }
                }
                Err(e)
            }
        }
    }
}
