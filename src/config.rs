//! Run configuration: defaults, the optional `goldrun.yaml` file, and the
//! components built from it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use termcolor::ColorChoice;

use crate::compare::DEFAULT_MAX_DIFF_LINES;
use crate::discovery::CaseDiscoverer;
use crate::dispatch::{MarkerPattern, SecondaryStage, DEFAULT_DIAGNOSTIC_PATTERN};
use crate::errors::HarnessError;
use crate::process::{ProcessRunner, StderrPolicy};
use crate::report::SkipPolicy;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Colored, human-readable lines
    #[default]
    Human,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Color when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto | ColorMode::Never => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
        }
    }
}

/// The interpreter run on artifact output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecondaryConfig {
    pub interpreter: String,
    pub artifact_suffix: String,
    /// Regex that marks subject output as a diagnostic.
    pub diagnostic_pattern: String,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            interpreter: "lli".to_string(),
            artifact_suffix: ".ll".to_string(),
            diagnostic_pattern: DEFAULT_DIAGNOSTIC_PATTERN.to_string(),
        }
    }
}

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub tests_dir: PathBuf,
    pub subject: String,
    pub input_suffixes: Vec<String>,
    pub output_suffix: String,
    pub result_suffix: Option<String>,
    pub recursive: bool,
    pub merge_stderr: bool,
    /// Per-invocation limit; `0` disables it.
    pub timeout_secs: u64,
    /// Command run once before discovery, e.g. `["make"]`.
    pub build: Option<Vec<String>>,
    pub secondary: Option<SecondaryConfig>,
    pub skip_policy: SkipPolicy,
    pub max_diff_lines: usize,
    pub show_full: bool,
    pub format: OutputFormat,
    pub color: ColorMode,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let discoverer = CaseDiscoverer::default();
        Self {
            tests_dir: PathBuf::from("tests"),
            subject: "./compiler".to_string(),
            input_suffixes: discoverer.input_suffixes,
            output_suffix: discoverer.output_suffix,
            result_suffix: None,
            recursive: false,
            merge_stderr: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            build: None,
            secondary: None,
            skip_policy: SkipPolicy::default(),
            max_diff_lines: DEFAULT_MAX_DIFF_LINES,
            show_full: false,
            format: OutputFormat::default(),
            color: ColorMode::default(),
        }
    }
}

impl HarnessConfig {
    pub const DEFAULT_FILE: &'static str = "goldrun.yaml";

    pub fn from_yaml(name: &str, source: &str) -> Result<Self, HarnessError> {
        serde_yaml::from_str(source).map_err(|e| HarnessError::config_parse(name, source, &e))
    }

    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let source = fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&path.display().to_string(), &source)
    }

    /// Loads `explicit` if given, else `goldrun.yaml` when present, else defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, HarnessError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = Path::new(Self::DEFAULT_FILE);
        if fallback.is_file() {
            tracing::debug!("using {}", Self::DEFAULT_FILE);
            return Self::load(fallback);
        }
        Ok(Self::default())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn discoverer(&self) -> Result<CaseDiscoverer, HarnessError> {
        let discoverer = CaseDiscoverer {
            input_suffixes: self.input_suffixes.clone(),
            output_suffix: self.output_suffix.clone(),
            result_suffix: self.result_suffix.clone(),
            recursive: self.recursive,
        };
        discoverer.validate()?;
        Ok(discoverer)
    }

    pub fn runner(&self) -> ProcessRunner {
        let stderr = if self.merge_stderr {
            StderrPolicy::Merge
        } else {
            StderrPolicy::Separate
        };
        ProcessRunner::new(self.timeout(), stderr)
    }

    pub fn secondary_stage(&self) -> Result<Option<SecondaryStage>, HarnessError> {
        let Some(secondary) = &self.secondary else {
            return Ok(None);
        };
        let marker = MarkerPattern::new(&secondary.diagnostic_pattern)?;
        Ok(Some(SecondaryStage::new(
            secondary.interpreter.clone(),
            secondary.artifact_suffix.clone(),
            marker,
        )))
    }
}
