//! Model manifest: which artifact backs which disease.
//!
//! ```json
//! { "models": [ { "disease": "Kidney", "artifact": "kidney.json" } ] }
//! ```
//!
//! Relative artifact paths resolve against the manifest's own directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ModelLoadError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub disease: String,
    pub artifact: PathBuf,
}

impl ManifestEntry {
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        if self.artifact.is_absolute() {
            self.artifact.clone()
        } else {
            base_dir.join(&self.artifact)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub models: Vec<ManifestEntry>,
}

impl ModelManifest {
    pub fn read(path: &Path) -> Result<Self, ModelLoadError> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ModelLoadError::Missing(path.to_path_buf()),
            _ => ModelLoadError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let manifest: Self =
            serde_json::from_slice(&bytes).map_err(|e| ModelLoadError::Manifest {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut seen = std::collections::HashSet::new();
        for entry in &manifest.models {
            if entry.disease.trim().is_empty() {
                return Err(ModelLoadError::Manifest {
                    path: path.to_path_buf(),
                    reason: "entry with empty disease id".into(),
                });
            }
            if !seen.insert(entry.disease.as_str()) {
                return Err(ModelLoadError::Manifest {
                    path: path.to_path_buf(),
                    reason: format!("disease '{}' listed twice", entry.disease),
                });
            }
        }
        Ok(manifest)
    }
}
