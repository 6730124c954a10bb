//! Defines the command-line arguments and subcommands for the goldrun CLI.
//!
//! Flags given here override values from the config file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ColorMode, HarnessConfig, OutputFormat};
use crate::report::SkipPolicy;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "goldrun",
    version,
    about = "Golden-output test orchestrator for compiler-stage executables."
)]
pub struct GoldrunArgs {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover and run all golden-output cases in a directory.
    Run(RunArgs),
    /// Write input fixtures from a YAML list of strings.
    Scaffold(ScaffoldArgs),
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Directory containing the input/expected-output pairs
    pub dir: Option<PathBuf>,

    /// Config file (defaults to goldrun.yaml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subject executable under test
    #[arg(short, long, value_name = "PROGRAM")]
    pub subject: Option<String>,

    /// Recognized input suffix, highest priority first (repeatable)
    #[arg(long = "input-suffix", value_name = "SUFFIX")]
    pub input_suffixes: Vec<String>,

    /// Suffix of expected-output files
    #[arg(long, value_name = "SUFFIX")]
    pub output_suffix: Option<String>,

    /// Write each case's actual output next to its input with this suffix
    #[arg(long, value_name = "SUFFIX")]
    pub write_results: Option<String>,

    /// Descend into sub-directories
    #[arg(long)]
    pub recursive: bool,

    /// Append the subject's stderr to its stdout before comparing
    #[arg(long)]
    pub merge_stderr: bool,

    /// Per-invocation timeout in seconds, 0 to disable
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Build command run before discovery, e.g. "make -j4"
    #[arg(long, value_name = "CMD")]
    pub build: Option<String>,

    /// Interpreter run on non-diagnostic subject output, e.g. lli
    #[arg(long, value_name = "PROGRAM")]
    pub interpreter: Option<String>,

    /// Suffix appended to the input path for the interpreter's side file
    #[arg(long, value_name = "SUFFIX")]
    pub artifact_suffix: Option<String>,

    /// Regex that marks subject output as a diagnostic
    #[arg(long, value_name = "REGEX")]
    pub diagnostic_pattern: Option<String>,

    /// Whether skipped cases fail the run
    #[arg(long, value_enum)]
    pub skip_policy: Option<SkipPolicy>,

    /// Maximum diff lines shown per failure
    #[arg(long, value_name = "N")]
    pub max_diff_lines: Option<usize>,

    /// Print full expected and actual output on failure
    #[arg(long)]
    pub show_full: bool,

    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,
}

impl RunArgs {
    /// Overlays the flags that were given onto `config`.
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(dir) = &self.dir {
            config.tests_dir = dir.clone();
        }
        if let Some(subject) = &self.subject {
            config.subject = subject.clone();
        }
        if !self.input_suffixes.is_empty() {
            config.input_suffixes = self.input_suffixes.clone();
        }
        if let Some(suffix) = &self.output_suffix {
            config.output_suffix = suffix.clone();
        }
        if let Some(suffix) = &self.write_results {
            config.result_suffix = Some(suffix.clone());
        }
        config.recursive |= self.recursive;
        config.merge_stderr |= self.merge_stderr;
        config.show_full |= self.show_full;
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
        if let Some(build) = &self.build {
            config.build = Some(build.split_whitespace().map(str::to_string).collect());
        }

        if self.interpreter.is_some()
            || self.artifact_suffix.is_some()
            || self.diagnostic_pattern.is_some()
        {
            let secondary = config.secondary.get_or_insert_with(Default::default);
            if let Some(interpreter) = &self.interpreter {
                secondary.interpreter = interpreter.clone();
            }
            if let Some(suffix) = &self.artifact_suffix {
                secondary.artifact_suffix = suffix.clone();
            }
            if let Some(pattern) = &self.diagnostic_pattern {
                secondary.diagnostic_pattern = pattern.clone();
            }
        }

        if let Some(policy) = self.skip_policy {
            config.skip_policy = policy;
        }
        if let Some(max) = self.max_diff_lines {
            config.max_diff_lines = max;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(color) = self.color {
            config.color = color;
        }
    }
}

#[derive(Debug, Args)]
pub struct ScaffoldArgs {
    /// YAML file holding a list of fixture strings
    pub list: PathBuf,

    /// Directory to write fixtures into
    #[arg(short, long, default_value = "tests")]
    pub dir: PathBuf,

    /// File name prefix; files are named <PREFIX>_<N><SUFFIX>
    #[arg(long, default_value = "output")]
    pub prefix: String,

    #[arg(long, default_value = ".in")]
    pub suffix: String,

    /// Overwrite existing fixtures
    #[arg(long)]
    pub force: bool,
}
