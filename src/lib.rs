pub mod config;
pub mod schema; // Disease schema registry
pub mod encoder; // Input validation + categorical encoding
pub mod model; // Classifier registry + artifacts
pub mod dispatch; // Prediction dispatcher
pub mod session; // Session context + result store
pub mod report; // PDF session report
pub mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use dispatch::{DiagnosisLabel, DispatchError, InferenceError, PredictionDispatcher, PredictionResult};
pub use encoder::{encode, FeatureVector, RawInputs, ValidationError};
pub use model::{Classifier, ModelError, ModelLoadError, ModelRegistry};
pub use report::{ReportDocument, ReportError, ReportGenerator};
pub use schema::{DiseaseSchema, FeatureSpec, SchemaRegistry, UnknownDiseaseError};
pub use session::{AssessmentSession, ResultSnapshot, ResultStore};

/// Binary entry point. Returns the process exit code.
pub fn run() -> i32 {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let cli = cli::Cli::parse();
    let stdout = std::io::stdout();
    match cli::execute(cli, &mut stdout.lock()) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            1
        }
    }
}
