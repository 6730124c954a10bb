//! Routing of subject output between the diagnostic and artifact paths.
//!
//! A compiler under test prints either a diagnostic (`line 3: unexpected token`)
//! or an intermediate artifact such as LLVM IR. Diagnostics are compared as-is.
//! Artifacts are written to a side file and executed by a secondary interpreter,
//! whose output is what gets compared.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::discovery::TestCase;
use crate::errors::{HarnessError, ProcessError};
use crate::process::{Invocation, ProcessRunner, StderrPolicy};

/// Default marker: `line` followed by a numeric locator and a colon, e.g. `line 3:` or `line 3:14:`.
/// It may appear anywhere in the output, not only at the start of a line.
pub const DEFAULT_DIAGNOSTIC_PATTERN: &str = r"\bline\s+\d+(?::\d+)*\s*:";

static DEFAULT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(DEFAULT_DIAGNOSTIC_PATTERN).expect("default diagnostic pattern is valid")
});

/// Decides whether subject output is a final diagnostic.
pub trait DiagnosticPredicate: Send + Sync {
    fn is_diagnostic(&self, text: &str) -> bool;
}

impl<F> DiagnosticPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_diagnostic(&self, text: &str) -> bool {
        self(text)
    }
}

/// Regex-based diagnostic marker.
#[derive(Debug, Clone)]
pub struct MarkerPattern {
    regex: Regex,
}

impl MarkerPattern {
    pub fn new(pattern: &str) -> Result<Self, HarnessError> {
        let regex = Regex::new(pattern).map_err(|source| HarnessError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for MarkerPattern {
    fn default() -> Self {
        Self {
            regex: DEFAULT_MARKER.clone(),
        }
    }
}

impl DiagnosticPredicate for MarkerPattern {
    fn is_diagnostic(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Subject output, tagged by how it must be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryOutput {
    Diagnostic(String),
    Artifact(String),
}

pub fn classify(text: String, predicate: &dyn DiagnosticPredicate) -> PrimaryOutput {
    if predicate.is_diagnostic(&text) {
        PrimaryOutput::Diagnostic(text)
    } else {
        PrimaryOutput::Artifact(text)
    }
}

/// Which path produced a case's actual output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// No secondary stage is configured.
    Direct,
    Diagnostic,
    Interpreted,
    /// The interpreter exited abnormally; the output is a synthesized error report.
    InterpreterFailed,
}

/// Text to compare against the expected output, plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualOutput {
    pub text: String,
    pub route: Route,
}

/// A second external program run on artifact output.
pub struct SecondaryStage {
    pub interpreter: String,
    /// Appended to the input path to name the side file, e.g. `t1.in.ll`.
    pub artifact_suffix: String,
    predicate: Box<dyn DiagnosticPredicate>,
}

impl std::fmt::Debug for SecondaryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondaryStage")
            .field("interpreter", &self.interpreter)
            .field("artifact_suffix", &self.artifact_suffix)
            .finish_non_exhaustive()
    }
}

impl SecondaryStage {
    pub fn new(
        interpreter: impl Into<String>,
        artifact_suffix: impl Into<String>,
        predicate: impl DiagnosticPredicate + 'static,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            artifact_suffix: artifact_suffix.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Side file for `case`. Unique per input path.
    pub fn artifact_path(&self, case: &TestCase) -> PathBuf {
        let mut path = OsString::from(case.input.as_os_str());
        path.push(&self.artifact_suffix);
        PathBuf::from(path)
    }

    /// Header of the synthesized report, e.g. `LLI ERROR:` for `lli`.
    pub fn error_header(&self) -> String {
        let stem = Path::new(&self.interpreter)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.interpreter.clone());
        format!("{} ERROR:", stem.to_uppercase())
    }

    /// Turns the subject's captured output into the text to compare.
    #[tracing::instrument(skip_all, fields(case = %case.name))]
    pub async fn resolve(
        &self,
        runner: &ProcessRunner,
        case: &TestCase,
        primary: String,
    ) -> Result<ActualOutput, ProcessError> {
        let artifact = match classify(primary, self.predicate.as_ref()) {
            PrimaryOutput::Diagnostic(text) => {
                tracing::debug!("diagnostic output, secondary stage skipped");
                return Ok(ActualOutput {
                    text,
                    route: Route::Diagnostic,
                });
            }
            PrimaryOutput::Artifact(text) => text,
        };

        let path = self.artifact_path(case);
        tokio::fs::write(&path, artifact).await.map_err(|e| {
            ProcessError::io(format!("failed to write artifact '{}'", path.display()), e)
        })?;

        // The error report needs stderr on its own, whatever the subject's policy.
        let runner = ProcessRunner {
            stderr: StderrPolicy::Separate,
            ..runner.clone()
        };
        let result = runner
            .run(&Invocation::new(&self.interpreter).arg(&path))
            .await?;

        if result.success() {
            Ok(ActualOutput {
                text: result.stdout,
                route: Route::Interpreted,
            })
        } else {
            tracing::debug!(status = %result.status(), "secondary stage failed");
            Ok(ActualOutput {
                text: format!("{}\n{}", self.error_header(), result.stderr),
                route: Route::InterpreterFailed,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_locator_is_a_diagnostic() {
        let marker = MarkerPattern::default();
        assert!(marker.is_diagnostic("line 3: unexpected token"));
        assert!(marker.is_diagnostic("line 1: bad character '@'"));
        assert!(marker.is_diagnostic("ok so far\nline 12:4: undefined id"));
    }

    #[test]
    fn ir_is_an_artifact() {
        let marker = MarkerPattern::default();
        let ir = "define i32 @main() { ret i32 0 }".to_string();
        assert_eq!(classify(ir.clone(), &marker), PrimaryOutput::Artifact(ir));
        assert!(!marker.is_diagnostic("baseline 3: not a locator"));
        assert!(!marker.is_diagnostic("line: missing number"));
    }

    #[test]
    fn closures_can_route() {
        let always = |_: &str| true;
        assert_eq!(
            classify("anything".to_string(), &always),
            PrimaryOutput::Diagnostic("anything".to_string())
        );
    }

    #[test]
    fn marker_matches_inside_a_line() {
        let marker = MarkerPattern::default();
        assert!(marker.is_diagnostic("parser: error at line 12:4: unexpected ')'"));
        assert!(!marker.is_diagnostic("inline 3 items"));
        assert!(!marker.is_diagnostic("line: 3"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = MarkerPattern::new("line (").unwrap_err();
        assert!(matches!(err, HarnessError::InvalidPattern { .. }));
    }

    #[test]
    fn error_header_uses_interpreter_stem() {
        let stage = SecondaryStage::new("/usr/bin/lli", ".ll", MarkerPattern::default());
        assert_eq!(stage.error_header(), "LLI ERROR:");
    }

    #[test]
    fn artifact_path_extends_input_path() {
        let stage = SecondaryStage::new("lli", ".ll", MarkerPattern::default());
        let case = TestCase {
            name: "t1".to_string(),
            input: PathBuf::from("tests/t1.in"),
            expected: PathBuf::from("tests/t1.out"),
            result: None,
        };
        assert_eq!(stage.artifact_path(&case), PathBuf::from("tests/t1.in.ll"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn artifact_is_persisted_and_interpreted() {
        let dir = tempfile::tempdir().unwrap();
        let case = TestCase {
            name: "ir".to_string(),
            input: dir.path().join("ir.in"),
            expected: dir.path().join("ir.out"),
            result: None,
        };
        let stage = SecondaryStage::new("cat", ".ll", MarkerPattern::default());
        let ir = "define i32 @main() { ret i32 0 }".to_string();

        let actual = stage
            .resolve(&ProcessRunner::default(), &case, ir.clone())
            .await
            .unwrap();
        assert_eq!(actual.route, Route::Interpreted);
        assert_eq!(actual.text, ir);
        assert_eq!(std::fs::read_to_string(stage.artifact_path(&case)).unwrap(), ir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn diagnostics_never_reach_the_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let case = TestCase {
            name: "err".to_string(),
            input: dir.path().join("err.in"),
            expected: dir.path().join("err.out"),
            result: None,
        };
        let stage = SecondaryStage::new("./no-such-interpreter", ".ll", MarkerPattern::default());

        let actual = stage
            .resolve(&ProcessRunner::default(), &case, "line 3: unexpected token".to_string())
            .await
            .unwrap();
        assert_eq!(actual.route, Route::Diagnostic);
        assert_eq!(actual.text, "line 3: unexpected token");
        assert!(!stage.artifact_path(&case).exists());
    }
}
