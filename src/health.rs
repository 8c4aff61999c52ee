//! Artifact diagnostics
//!
//! Checks an artifact file the way a serving instance would use it:
//! - File presence and size
//! - Header, version and checksum
//! - Label set and encoder/classifier consistency
//! - A sample prediction on empty text

use crate::artifact::{Artifact, EvaluationSource, FORMAT_VERSION};
use crate::error::IntentError;
use crate::service::InferenceService;
use crate::types::PredictionRequest;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Severity of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// What a check looks at, in the order checks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactCheck {
    FileReadable,
    Format,
    LabelSet,
    LabelSupport,
    RecordedAccuracy,
    SamplePrediction,
}

impl std::fmt::Display for ArtifactCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ArtifactCheck::FileReadable => "file_readable",
            ArtifactCheck::Format => "format",
            ArtifactCheck::LabelSet => "label_set",
            ArtifactCheck::LabelSupport => "label_support",
            ArtifactCheck::RecordedAccuracy => "recorded_accuracy",
            ArtifactCheck::SamplePrediction => "sample_prediction",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one artifact check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: ArtifactCheck,
    pub status: CheckStatus,
    pub message: String,
    /// Labels the check is about, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Underlying error text for failed checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn new(check: ArtifactCheck, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            check,
            status,
            message: message.into(),
            labels: Vec::new(),
            error: None,
        }
    }

    fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// Every check run against one artifact file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactReport {
    pub path: PathBuf,
    /// Worst status among the checks
    pub status: CheckStatus,
    /// Size of the file, when it could be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    pub checks: Vec<CheckResult>,
}

impl ArtifactReport {
    fn finish(path: &Path, bytes: Option<usize>, checks: Vec<CheckResult>) -> Self {
        let status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(CheckStatus::Pass);
        Self {
            path: path.to_path_buf(),
            status,
            bytes,
            checks,
        }
    }

    /// Number of checks that ended with `status`
    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    /// Result of one check, if it ran
    pub fn get(&self, check: ArtifactCheck) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.check == check)
    }
}

/// Run all artifact checks
///
/// Later checks are skipped once the file cannot be read or decoded.
pub fn run_artifact_checks(path: &Path) -> ArtifactReport {
    use ArtifactCheck::*;
    use CheckStatus::*;

    info!("Checking artifact {}", path.display());
    let mut checks = Vec::new();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => {
            checks.push(CheckResult::new(
                FileReadable,
                Pass,
                format!("Read {} bytes", bytes.len()),
            ));
            bytes
        }
        Err(e) => {
            checks.push(
                CheckResult::new(FileReadable, Fail, format!("Cannot read {}", path.display()))
                    .with_error(e),
            );
            return ArtifactReport::finish(path, None, checks);
        }
    };
    let size = Some(bytes.len());

    let started = Instant::now();
    let artifact = match Artifact::from_bytes(&bytes) {
        Ok(artifact) => {
            checks.push(CheckResult::new(
                Format,
                Pass,
                format!(
                    "Format version {} decoded in {}ms, checksum verified",
                    FORMAT_VERSION,
                    started.elapsed().as_millis()
                ),
            ));
            artifact
        }
        Err(IntentError::ArtifactFormat(reason)) => {
            checks.push(CheckResult::new(Format, Fail, "Artifact is not usable").with_error(reason));
            return ArtifactReport::finish(path, size, checks);
        }
        Err(e) => {
            checks.push(CheckResult::new(Format, Fail, "Artifact could not be decoded").with_error(e));
            return ArtifactReport::finish(path, size, checks);
        }
    };

    checks.push(check_label_set(&artifact));
    checks.push(check_label_support(&artifact));
    checks.push(check_recorded_accuracy(&artifact));
    checks.push(check_sample_prediction(artifact));

    ArtifactReport::finish(path, size, checks)
}

fn check_label_set(artifact: &Artifact) -> CheckResult {
    debug!("Checking label set...");
    let labels = artifact.labels.iter();

    if artifact.labels.len() == 1 {
        CheckResult::new(
            ArtifactCheck::LabelSet,
            CheckStatus::Warn,
            "Artifact knows a single intent; every prediction will be the same",
        )
        .with_labels(labels)
    } else {
        CheckResult::new(
            ArtifactCheck::LabelSet,
            CheckStatus::Pass,
            format!("{} intents", artifact.labels.len()),
        )
        .with_labels(labels)
    }
}

fn check_label_support(artifact: &Artifact) -> CheckResult {
    let sparse: Vec<&String> = artifact
        .metadata
        .label_counts
        .iter()
        .filter(|(_, count)| **count < 2)
        .map(|(label, _)| label)
        .collect();

    if sparse.is_empty() {
        CheckResult::new(
            ArtifactCheck::LabelSupport,
            CheckStatus::Pass,
            "Every intent has at least two training examples",
        )
    } else {
        CheckResult::new(
            ArtifactCheck::LabelSupport,
            CheckStatus::Warn,
            format!("{} intent(s) trained from a single example", sparse.len()),
        )
        .with_labels(sparse.into_iter().cloned())
    }
}

fn check_recorded_accuracy(artifact: &Artifact) -> CheckResult {
    let metadata = &artifact.metadata;
    let percent = metadata.accuracy * 100.0;

    match metadata.evaluation_source {
        EvaluationSource::Holdout => CheckResult::new(
            ArtifactCheck::RecordedAccuracy,
            CheckStatus::Pass,
            format!(
                "Hold-out accuracy {:.2}% on {} examples",
                percent, metadata.evaluation_examples
            ),
        ),
        EvaluationSource::TrainingSet | EvaluationSource::External => CheckResult::new(
            ArtifactCheck::RecordedAccuracy,
            CheckStatus::Warn,
            format!(
                "Accuracy {:.2}% on {} examples was not measured on a hold-out split ({})",
                percent, metadata.evaluation_examples, metadata.evaluation_source
            ),
        ),
    }
}

fn check_sample_prediction(artifact: Artifact) -> CheckResult {
    debug!("Running sample prediction...");
    let service = InferenceService::new(artifact);
    let request = PredictionRequest {
        text: String::new(),
    };

    match service.predict(&request) {
        Ok(result) if service.labels().contains(&result.intent) => CheckResult::new(
            ArtifactCheck::SamplePrediction,
            CheckStatus::Pass,
            format!("Empty text resolves to '{}'", result.intent),
        ),
        Ok(result) => CheckResult::new(
            ArtifactCheck::SamplePrediction,
            CheckStatus::Fail,
            "Prediction is outside the label set",
        )
        .with_labels([result.intent]),
        Err(e) => CheckResult::new(
            ArtifactCheck::SamplePrediction,
            CheckStatus::Fail,
            "Prediction on empty text failed",
        )
        .with_error(e),
    }
}

/// Print an artifact report to the console
pub fn print_artifact_report(report: &ArtifactReport, verbose: bool) {
    println!("Intent Artifact Check: {}", report.path.display());
    if let Some(bytes) = report.bytes {
        println!("Size: {} bytes", bytes);
    }
    println!();

    for check in &report.checks {
        let status_text = match check.status {
            CheckStatus::Pass => "PASS",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        };
        println!("[{}] {}", status_text, check.check);

        if verbose || check.status != CheckStatus::Pass {
            println!("   {}", check.message);
            if !check.labels.is_empty() {
                println!("   Labels: {}", check.labels.join(", "));
            }
            if let Some(error) = &check.error {
                println!("   Error: {}", error);
            }
        }
    }

    println!();
    println!(
        "Overall: {} ({} passed, {} warnings, {} errors)",
        match report.status {
            CheckStatus::Pass => "HEALTHY",
            CheckStatus::Warn => "WARNINGS",
            CheckStatus::Fail => "ERRORS",
        },
        report.count(CheckStatus::Pass),
        report.count(CheckStatus::Warn),
        report.count(CheckStatus::Fail)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntentConfig;
    use crate::dataset::ExampleStore;
    use crate::training::TrainingPipeline;
    use crate::types::TrainingExample;

    fn write_artifact(dir: &Path) -> PathBuf {
        let store = ExampleStore::new(vec![
            TrainingExample::new("reset my password", "password_reset"),
            TrainingExample::new("what is your refund policy", "refund_policy"),
        ])
        .unwrap();
        let path = dir.join("model.artifact");
        TrainingPipeline::new(IntentConfig::default())
            .run(&store, Some(path.clone()))
            .unwrap();
        path
    }

    #[test]
    fn test_missing_artifact_fails() {
        let report = run_artifact_checks(Path::new("/nonexistent/model.artifact"));
        assert_eq!(report.status, CheckStatus::Fail);
        assert_eq!(report.checks.len(), 1);
        assert!(report.bytes.is_none());
        assert!(report.get(ArtifactCheck::FileReadable).unwrap().error.is_some());
    }

    #[test]
    fn test_valid_artifact_has_no_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path());

        let report = run_artifact_checks(&path);
        assert_eq!(report.count(CheckStatus::Fail), 0);
        // Single-example intents and training-set accuracy are warnings
        assert_eq!(report.status, CheckStatus::Warn);
        assert_eq!(
            report.get(ArtifactCheck::LabelSupport).unwrap().labels,
            vec!["password_reset", "refund_policy"]
        );
        assert_eq!(
            report.get(ArtifactCheck::SamplePrediction).unwrap().status,
            CheckStatus::Pass
        );
    }

    #[test]
    fn test_corrupt_artifact_fails_format_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path());
        let mut bytes = std::fs::read(&path).unwrap();
        let middle = bytes.len() / 2;
        bytes[middle] ^= 0x55;
        std::fs::write(&path, bytes).unwrap();

        let report = run_artifact_checks(&path);
        assert_eq!(report.status, CheckStatus::Fail);
        let format = report.get(ArtifactCheck::Format).unwrap();
        assert_eq!(format.status, CheckStatus::Fail);
        assert!(format.error.is_some());
        assert!(report.get(ArtifactCheck::SamplePrediction).is_none());
    }

    #[test]
    fn test_report_serializes_check_names() {
        let report = run_artifact_checks(Path::new("/nonexistent/model.artifact"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "fail");
        assert_eq!(json["checks"][0]["check"], "file_readable");
    }
}
