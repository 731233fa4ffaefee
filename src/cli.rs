//! Command-line front end.
//!
//! `schema` exports the built-in input forms as JSON; `assess` runs a batch
//! of assessments through one session and optionally writes the report.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;
use crate::dispatch::PredictionDispatcher;
use crate::encoder::RawInputs;
use crate::model::{ModelLoadError, ModelRegistry};
use crate::report::{ReportError, ReportGenerator, DEFAULT_FILENAME};
use crate::schema::{SchemaError, SchemaRegistry, UnknownDiseaseError};
use crate::session::AssessmentSession;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    UnknownDisease(#[from] UnknownDiseaseError),

    #[error("Model loading failed: {0}")]
    ModelLoad(#[from] ModelLoadError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid assessments file {}: {reason}", .path.display())]
    Inputs { path: PathBuf, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Parser)]
#[command(name = "clinirisk", version, about = "Disease-risk assessments and session reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print built-in input schemas as JSON.
    Schema {
        /// Only this disease (default: all).
        disease: Option<String>,
    },
    /// Run assessments from a JSON file and optionally write the PDF report.
    Assess {
        /// Model manifest (default: models dir / models.json).
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// JSON array of {"disease": ..., "inputs": {...}}.
        #[arg(long)]
        inputs: PathBuf,
        /// Directory to write the PDF report into.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Report file name.
        #[arg(long, default_value = DEFAULT_FILENAME)]
        filename: String,
    },
}

/// One requested assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub disease: String,
    pub inputs: RawInputs,
}

/// Per-assessment outcome printed to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentOutcome {
    pub disease: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentSummary {
    pub session_id: String,
    pub outcomes: Vec<AssessmentOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

pub fn execute(cli: Cli, out: &mut impl Write) -> Result<(), CliError> {
    match cli.command {
        Command::Schema { disease } => print_schemas(disease.as_deref(), out),
        Command::Assess {
            manifest,
            inputs,
            report,
            filename,
        } => {
            let manifest = manifest.unwrap_or_else(config::manifest_path);
            let (models, failures) = ModelRegistry::from_manifest_file(&manifest)?;
            if !failures.is_empty() {
                tracing::warn!(failed = failures.len(), "Some assessments are unavailable");
            }
            let dispatcher = PredictionDispatcher::new(
                Arc::new(SchemaRegistry::builtin()?),
                Arc::new(models),
            );
            let requests = read_requests(&inputs)?;
            let summary = run_assessments(&dispatcher, &requests, report.as_deref(), &filename)?;
            serde_json::to_writer_pretty(&mut *out, &summary)?;
            writeln!(out)?;
            Ok(())
        }
    }
}

fn print_schemas(disease: Option<&str>, out: &mut impl Write) -> Result<(), CliError> {
    let registry = SchemaRegistry::builtin()?;
    match disease {
        Some(id) => serde_json::to_writer_pretty(&mut *out, registry.get(id)?)?,
        None => {
            let all: Vec<_> = registry.iter().collect();
            serde_json::to_writer_pretty(&mut *out, &all)?
        }
    }
    writeln!(out)?;
    Ok(())
}

pub fn read_requests(path: &Path) -> Result<Vec<AssessmentRequest>, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| CliError::Inputs {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Run every request through one session. Failures are reported per
/// assessment and never stop the rest of the batch.
pub fn run_assessments(
    dispatcher: &PredictionDispatcher,
    requests: &[AssessmentRequest],
    report_dir: Option<&Path>,
    filename: &str,
) -> Result<AssessmentSummary, CliError> {
    let mut session = AssessmentSession::new();
    let mut outcomes = Vec::with_capacity(requests.len());

    for request in requests {
        let outcome = match dispatcher.dispatch(&request.disease, &request.inputs, session.results_mut()) {
            Ok(diagnosis) => AssessmentOutcome {
                disease: request.disease.clone(),
                diagnosis: Some(diagnosis),
                error: None,
            },
            Err(e) => AssessmentOutcome {
                disease: request.disease.clone(),
                diagnosis: None,
                error: Some(e.user_message()),
            },
        };
        outcomes.push(outcome);
    }

    let report = match report_dir {
        Some(dir) if !session.results().is_empty() => {
            let document = ReportGenerator::new().generate_named(&session.results().snapshot(), filename)?;
            Some(document.save_to(dir)?)
        }
        Some(_) => {
            tracing::warn!("No successful assessments; report skipped");
            None
        }
        None => None,
    };

    let session_id = session.id().to_string();
    session.end();

    Ok(AssessmentSummary {
        session_id,
        outcomes,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FeatureVector;
    use crate::model::ModelError;
    use crate::schema::builtin::{KIDNEY, STROKE};

    fn dispatcher() -> PredictionDispatcher {
        let mut models = ModelRegistry::new();
        // Positive when age > 60.
        models.insert(KIDNEY, |fv: &FeatureVector| {
            Ok::<f64, ModelError>(if fv.as_slice()[0] > 60.0 { 1.0 } else { 0.0 })
        });
        PredictionDispatcher::new(
            Arc::new(SchemaRegistry::builtin().unwrap()),
            Arc::new(models),
        )
    }

    fn kidney_inputs(age: &str) -> RawInputs {
        [
            ("Age", age),
            ("SystolicBP", "130"),
            ("DiastolicBP", "85"),
            ("BMI", "27.5"),
            ("FamilyHistoryKidneyDisease", "0"),
            ("Smoking", "1"),
            ("FastingBloodSugar", "99"),
            ("ProteinInUrine", "0.2"),
            ("MedicalCheckupsFrequency", "2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn batch_reports_success_and_failure_per_assessment() {
        let requests = vec![
            AssessmentRequest {
                disease: KIDNEY.into(),
                inputs: kidney_inputs("72"),
            },
            AssessmentRequest {
                disease: STROKE.into(),
                inputs: RawInputs::new(),
            },
            AssessmentRequest {
                disease: KIDNEY.into(),
                inputs: kidney_inputs("seventy"),
            },
        ];

        let summary = run_assessments(&dispatcher(), &requests, None, DEFAULT_FILENAME).unwrap();

        assert_eq!(summary.outcomes.len(), 3);
        assert_eq!(summary.outcomes[0].diagnosis.as_deref(), Some("Positive Diagnosis"));
        assert_eq!(
            summary.outcomes[1].error.as_deref(),
            Some("The Stroke assessment is not available.")
        );
        assert_eq!(
            summary.outcomes[2].error.as_deref(),
            Some("Please enter a valid numeric value for 'Age'.")
        );
        assert!(summary.report.is_none());
    }

    #[test]
    fn report_written_when_results_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let requests = vec![AssessmentRequest {
            disease: KIDNEY.into(),
            inputs: kidney_inputs("40"),
        }];

        let summary =
            run_assessments(&dispatcher(), &requests, Some(tmp.path()), "kidney.pdf").unwrap();

        let path = summary.report.unwrap();
        assert_eq!(path, tmp.path().join("kidney.pdf"));
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn report_filename_cannot_leave_report_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let reports = tmp.path().join("reports");
        let requests = vec![AssessmentRequest {
            disease: KIDNEY.into(),
            inputs: kidney_inputs("40"),
        }];

        let err = run_assessments(&dispatcher(), &requests, Some(&reports), "../escaped.pdf")
            .unwrap_err();
        assert!(matches!(err, CliError::Report(ReportError::InvalidFilename(_))));
        assert!(!tmp.path().join("escaped.pdf").exists());
    }

    #[test]
    fn report_skipped_without_results() {
        let tmp = tempfile::tempdir().unwrap();
        let requests = vec![AssessmentRequest {
            disease: KIDNEY.into(),
            inputs: RawInputs::new(),
        }];
        let summary =
            run_assessments(&dispatcher(), &requests, Some(tmp.path()), DEFAULT_FILENAME).unwrap();
        assert!(summary.report.is_none());
        assert!(!tmp.path().join(DEFAULT_FILENAME).exists());
    }

    #[test]
    fn reads_request_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("assessments.json");
        std::fs::write(
            &path,
            r#"[{"disease": "Stroke", "inputs": {"gender": "Male", "age": "67"}}]"#,
        )
        .unwrap();
        let requests = read_requests(&path).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].inputs["gender"], "Male");
    }

    #[test]
    fn malformed_request_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("assessments.json");
        std::fs::write(&path, r#"{"disease": "Stroke"}"#).unwrap();
        assert!(matches!(read_requests(&path), Err(CliError::Inputs { .. })));
    }

    #[test]
    fn schema_command_prints_single_schema() {
        let mut out = Vec::new();
        let cli = Cli::parse_from(["clinirisk", "schema", "Stroke"]);
        execute(cli, &mut out).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["disease_id"], "Stroke");
        assert_eq!(json["features"][0]["name"], "gender");
        assert_eq!(json["features"][0]["kind"]["kind"], "categorical");
    }

    #[test]
    fn schema_command_unknown_disease() {
        let mut out = Vec::new();
        let cli = Cli::parse_from(["clinirisk", "schema", "Liver"]);
        assert!(matches!(execute(cli, &mut out), Err(CliError::UnknownDisease(_))));
    }

    #[test]
    fn assess_command_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("kidney.json"),
            r#"{"format": "logistic_regression", "feature_count": 9,
                "coefficients": [0.1, 0, 0, 0, 0, 0, 0, 0, 0], "intercept": -6.0}"#,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("models.json"),
            r#"{"models": [{"disease": "Kidney", "artifact": "kidney.json"}]}"#,
        )
        .unwrap();
        let requests = vec![AssessmentRequest {
            disease: KIDNEY.into(),
            inputs: kidney_inputs("75"),
        }];
        std::fs::write(
            tmp.path().join("inputs.json"),
            serde_json::to_vec(&requests).unwrap(),
        )
        .unwrap();

        let manifest = tmp.path().join("models.json");
        let inputs = tmp.path().join("inputs.json");
        let reports = tmp.path().join("reports");
        let args: Vec<std::ffi::OsString> = vec![
            "clinirisk".into(),
            "assess".into(),
            "--manifest".into(),
            manifest.into_os_string(),
            "--inputs".into(),
            inputs.into_os_string(),
            "--report".into(),
            reports.clone().into_os_string(),
        ];
        let cli = Cli::parse_from(args);

        let mut out = Vec::new();
        execute(cli, &mut out).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        // z = 7.5 - 6 = 1.5 → positive
        assert_eq!(json["outcomes"][0]["diagnosis"], "Positive Diagnosis");
        assert!(reports.join(DEFAULT_FILENAME).exists());
    }
}
