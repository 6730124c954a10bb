//! The orchestration loop.
//!
//! A run goes through these phases:
//! 1. **Build**: optional external build command; failure aborts the run
//! 2. **Resolve**: the subject executable must exist before any case runs
//! 3. **Discovery**: input/expected pairs found by naming convention
//! 4. **Execution**: each case in order, subject then the optional secondary stage
//! 5. **Comparison**: normalized equality against the expected output
//! 6. **Reporting**: streamed per case, then a final tally
//!
//! Only phases 1–3 can fail the run as a whole. Anything that goes wrong inside
//! a case becomes that case's [`Outcome`].

use std::path::{Path, PathBuf};

use crate::compare::{compare, Outcome};
use crate::config::HarnessConfig;
use crate::discovery::{CaseDiscoverer, TestCase};
use crate::dispatch::{ActualOutput, Route, SecondaryStage};
use crate::errors::{HarnessError, ProcessError};
use crate::process::{resolve_program, Invocation, ProcessRunner};
use crate::report::{Reporter, RunSummary};

pub struct Harness {
    tests_dir: PathBuf,
    subject: String,
    build: Option<Vec<String>>,
    discoverer: CaseDiscoverer,
    runner: ProcessRunner,
    secondary: Option<SecondaryStage>,
}

impl Harness {
    pub fn from_config(config: &HarnessConfig) -> Result<Self, HarnessError> {
        Ok(Self {
            tests_dir: config.tests_dir.clone(),
            subject: config.subject.clone(),
            build: config.build.clone(),
            discoverer: config.discoverer()?,
            runner: config.runner(),
            secondary: config.secondary_stage()?,
        })
    }

    /// Runs every discovered case and returns the final summary.
    pub async fn run(&self, mut reporter: Reporter) -> Result<RunSummary, HarnessError> {
        self.build().await?;
        let subject = self.resolve_subject()?;
        let cases = self.discoverer.discover(&self.tests_dir)?;

        reporter.start(cases.len());
        for case in &cases {
            let outcome = self.run_case(&subject, case).await;
            reporter.record(case.name.clone(), outcome);
        }
        Ok(reporter.finish())
    }

    /// Runs the configured build command, if any.
    #[tracing::instrument(skip_all)]
    pub async fn build(&self) -> Result<(), HarnessError> {
        let Some(argv) = &self.build else {
            return Ok(());
        };
        let (program, args) = argv.split_first().ok_or(HarnessError::EmptyBuild)?;
        let command = argv.join(" ");

        let invocation = args
            .iter()
            .fold(Invocation::new(program), |inv, arg| inv.arg(arg));
        // Builds are not subject to the per-case deadline.
        let runner = ProcessRunner {
            timeout: None,
            ..self.runner.clone()
        };
        let result = runner
            .run(&invocation)
            .await
            .map_err(|source| HarnessError::BuildSpawn {
                command: command.clone(),
                source,
            })?;

        if !result.success() {
            let log = if result.stderr.trim().is_empty() {
                result.stdout.trim()
            } else {
                result.stderr.trim()
            };
            return Err(HarnessError::BuildFailed {
                command,
                status: result.status(),
                output: (!log.is_empty()).then(|| log.to_string()),
            });
        }
        tracing::info!("build finished");
        Ok(())
    }

    pub fn resolve_subject(&self) -> Result<PathBuf, HarnessError> {
        resolve_program(&self.subject).ok_or_else(|| HarnessError::SubjectNotFound {
            program: self.subject.clone(),
        })
    }

    /// Runs one case. Never fails: every problem becomes an [`Outcome`].
    #[tracing::instrument(skip_all, fields(case = %case.name))]
    pub async fn run_case(&self, subject: &Path, case: &TestCase) -> Outcome {
        if !case.has_expected() {
            return Outcome::Skip {
                reason: format!("missing expected output {}", case.expected.display()),
            };
        }

        let expected = match tokio::fs::read_to_string(&case.expected).await {
            Ok(text) => text,
            Err(e) => {
                return Outcome::ExecutionError {
                    message: format!(
                        "failed to read expected output '{}': {e}",
                        case.expected.display()
                    ),
                }
            }
        };

        let actual = match self.actual_output(subject, case).await {
            Ok(actual) => actual,
            Err(e) => {
                return Outcome::ExecutionError {
                    message: e.to_string(),
                }
            }
        };
        tracing::debug!(route = ?actual.route, "actual output captured");

        if let Some(path) = &case.result {
            if let Err(e) = tokio::fs::write(path, &actual.text).await {
                tracing::warn!("failed to write result file {}: {e}", path.display());
            }
        }

        compare(&expected, &actual.text)
    }

    async fn actual_output(
        &self,
        subject: &Path,
        case: &TestCase,
    ) -> Result<ActualOutput, ProcessError> {
        let primary = self
            .runner
            .run(&Invocation::new(subject).stdin_from(&case.input))
            .await?;
        if !primary.success() {
            tracing::debug!(status = %primary.status(), "subject exited abnormally");
        }

        match &self.secondary {
            Some(stage) => stage.resolve(&self.runner, case, primary.stdout).await,
            None => Ok(ActualOutput {
                text: primary.stdout,
                route: Route::Direct,
            }),
        }
    }
}
