use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "ClinRisk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that overrides the models directory.
pub const MODELS_DIR_ENV: &str = "CLINIRISK_MODELS_DIR";

/// File name of the model manifest inside the models directory.
pub const MANIFEST_FILE: &str = "models.json";

/// Get the application data directory
/// ~/ClinRisk/ on all platforms. Falls back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the models directory (trained classifier artifacts + manifest).
pub fn models_dir() -> PathBuf {
    match std::env::var_os(MODELS_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => app_data_dir().join("models"),
    }
}

/// Default location of the model manifest.
pub fn manifest_path() -> PathBuf {
    models_dir().join(MANIFEST_FILE)
}

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinirisk=info"
}
