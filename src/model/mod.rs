//! Model registry: one trained binary classifier per disease.
//!
//! Classifiers are opaque. The registry only relies on the `predict`
//! capability and never inspects a model's internals. It is populated once
//! at startup (from a manifest of artifacts, or by injecting classifiers
//! directly) and shared read-only afterwards, so concurrent sessions can
//! use one instance without locking.

pub mod artifact;
pub mod manifest;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::encoder::FeatureVector;
use crate::schema::UnknownDiseaseError;

pub use artifact::{ArtifactDefinition, ArtifactSource, ModelArtifact};
pub use manifest::{ManifestEntry, ModelManifest};

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Raised by a classifier while predicting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Model failure: {0}")]
    Failed(String),
}

/// A classifier artifact that could not be loaded.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Model artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Cannot read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model artifact {origin}: {reason}")]
    Malformed { origin: String, reason: String },

    #[error("Malformed model manifest {}: {reason}", .path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("Failed to load model for {disease_id}: {source}")]
    ForDisease {
        disease_id: String,
        #[source]
        source: Box<ModelLoadError>,
    },
}

impl ModelLoadError {
    pub(crate) fn malformed(origin: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            origin: origin.to_string(),
            reason: reason.into(),
        }
    }

    fn for_disease(disease_id: &str, source: ModelLoadError) -> Self {
        Self::ForDisease {
            disease_id: disease_id.to_string(),
            source: Box::new(source),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Classifier capability
// ═══════════════════════════════════════════════════════════

/// Opaque trained binary classifier.
///
/// Implementations return the predicted class as a number. Anything other
/// than exactly `0.0` or `1.0` is treated as out of contract by the
/// dispatcher.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

impl<F> Classifier for F
where
    F: Fn(&FeatureVector) -> Result<f64, ModelError> + Send + Sync,
{
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        self(features)
    }
}

// ═══════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════

/// Disease id → classifier.
#[derive(Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn Classifier>>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.ids().collect();
        ids.sort_unstable();
        f.debug_struct("ModelRegistry").field("models", &ids).finish()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject an already-constructed classifier. Replaces any previous
    /// model for the same disease.
    pub fn insert<C>(&mut self, disease_id: &str, model: C)
    where
        C: Classifier + 'static,
    {
        self.models.insert(disease_id.to_string(), Arc::new(model));
    }

    /// Load a classifier artifact for `disease_id`.
    pub fn load(&mut self, disease_id: &str, source: &ArtifactSource) -> Result<(), ModelLoadError> {
        let artifact = ModelArtifact::load(source)
            .map_err(|e| ModelLoadError::for_disease(disease_id, e))?;
        tracing::info!(
            disease_id,
            origin = %source,
            format = artifact.format_name(),
            features = artifact.feature_count(),
            "Loaded model"
        );
        self.insert(disease_id, artifact);
        Ok(())
    }

    /// Load every manifest entry. A failing entry disables only its own
    /// disease; its error is logged and returned.
    pub fn load_manifest(&mut self, manifest: &ModelManifest, base_dir: &Path) -> Vec<ModelLoadError> {
        let mut failures = Vec::new();
        for entry in &manifest.models {
            let source = ArtifactSource::Path(entry.resolve(base_dir));
            if let Err(e) = self.load(&entry.disease, &source) {
                tracing::error!(disease_id = %entry.disease, error = %e, "Model unavailable");
                failures.push(e);
            }
        }
        failures
    }

    /// Read a manifest file and load its entries relative to its directory.
    pub fn from_manifest_file(path: &Path) -> Result<(Self, Vec<ModelLoadError>), ModelLoadError> {
        let manifest = ModelManifest::read(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut registry = Self::new();
        let failures = registry.load_manifest(&manifest, base_dir);
        Ok((registry, failures))
    }

    pub fn get(&self, disease_id: &str) -> Result<&dyn Classifier, UnknownDiseaseError> {
        self.models
            .get(disease_id)
            .map(|model| model.as_ref())
            .ok_or_else(|| UnknownDiseaseError::new(disease_id))
    }

    pub fn contains(&self, disease_id: &str) -> bool {
        self.models.contains_key(disease_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct AlwaysPositive;

    impl Classifier for AlwaysPositive {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            Ok(1.0)
        }
    }

    const LOGISTIC: &str = r#"{
        "format": "logistic_regression",
        "feature_count": 2,
        "coefficients": [0.05, 2.0],
        "intercept": -3.0
    }"#;

    #[test]
    fn traits_are_object_safe() {
        fn _assert_classifier(_: &dyn Classifier) {}
    }

    #[test]
    fn injected_model_is_returned() {
        let mut registry = ModelRegistry::new();
        registry.insert("Kidney", AlwaysPositive);
        let model = registry.get("Kidney").unwrap();
        assert_eq!(model.predict(&vec![1.0].into()).unwrap(), 1.0);
        assert!(registry.contains("Kidney"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn closures_are_classifiers() {
        let mut registry = ModelRegistry::new();
        registry.insert("Stroke", |fv: &FeatureVector| {
            Ok::<f64, ModelError>(if fv.as_slice()[0] > 50.0 { 1.0 } else { 0.0 })
        });
        let model = registry.get("Stroke").unwrap();
        assert_eq!(model.predict(&vec![70.0].into()).unwrap(), 1.0);
        assert_eq!(model.predict(&vec![20.0].into()).unwrap(), 0.0);
    }

    #[test]
    fn unknown_disease_lookup_fails() {
        let registry = ModelRegistry::new();
        let err = registry.get("Liver").err().unwrap();
        assert_eq!(err.disease_id, "Liver");
    }

    #[test]
    fn load_from_bytes() {
        let mut registry = ModelRegistry::new();
        registry
            .load("Kidney", &ArtifactSource::Bytes(LOGISTIC.as_bytes().to_vec()))
            .unwrap();
        let model = registry.get("Kidney").unwrap();
        assert_eq!(model.predict(&vec![45.0, 1.0].into()).unwrap(), 1.0);
    }

    #[test]
    fn missing_artifact_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ModelRegistry::new();
        let err = registry
            .load("Kidney", &ArtifactSource::Path(dir.path().join("nope.json")))
            .unwrap_err();
        match err {
            ModelLoadError::ForDisease { disease_id, source } => {
                assert_eq!(disease_id, "Kidney");
                assert!(matches!(*source, ModelLoadError::Missing(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn manifest_failure_disables_only_that_disease() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("kidney.json"), LOGISTIC).unwrap();
        fs::write(dir.path().join("stroke.json"), "{ not json").unwrap();
        fs::write(
            dir.path().join("models.json"),
            r#"{"models": [
                {"disease": "Kidney", "artifact": "kidney.json"},
                {"disease": "Stroke", "artifact": "stroke.json"},
                {"disease": "Diabetes", "artifact": "diabetes.json"}
            ]}"#,
        )
        .unwrap();

        let (registry, failures) =
            ModelRegistry::from_manifest_file(&dir.path().join("models.json")).unwrap();

        assert!(registry.contains("Kidney"));
        assert!(!registry.contains("Stroke"));
        assert!(!registry.contains("Diabetes"));
        assert_eq!(failures.len(), 2);
        assert!(failures[0].to_string().contains("Stroke"));
        assert!(failures[1].to_string().contains("Diabetes"));
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        let mut registry = ModelRegistry::new();
        registry.insert("Kidney", AlwaysPositive);
        let shared = Arc::new(registry);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&shared);
                std::thread::spawn(move || {
                    registry.get("Kidney").unwrap().predict(&vec![0.0].into()).unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1.0);
        }
    }
}
