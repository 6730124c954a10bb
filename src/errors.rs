//! Error types for the goldrun harness.
//!
//! Two families exist:
//!
//! - [`HarnessError`] is the configuration class. It aborts the run before any
//!   case executes and is rendered through `miette`.
//! - [`ProcessError`] describes a single failed invocation. The orchestration
//!   loop converts it into a per-case outcome; it never ends the run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors that prevent a run from starting.
#[derive(Error, Diagnostic, Debug)]
pub enum HarnessError {
    #[error("test directory '{}' does not exist", .path.display())]
    #[diagnostic(
        code(goldrun::config::missing_directory),
        help("pass an existing directory with --dir or set `tests_dir` in the config file")
    )]
    MissingDirectory { path: PathBuf },

    #[error("failed to walk test directory '{}'", .path.display())]
    #[diagnostic(code(goldrun::config::unreadable_directory))]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("no input files ending in {suffixes} found in '{}'", .path.display())]
    #[diagnostic(
        code(goldrun::config::no_cases),
        help("check the directory and the configured input suffixes")
    )]
    NoCases { path: PathBuf, suffixes: String },

    #[error("subject executable '{program}' not found")]
    #[diagnostic(
        code(goldrun::config::subject_not_found),
        help("build the subject first, or pass its path with --subject")
    )]
    SubjectNotFound { program: String },

    #[error("build command `{command}` could not be started")]
    #[diagnostic(code(goldrun::build::spawn))]
    BuildSpawn {
        command: String,
        #[source]
        source: ProcessError,
    },

    #[error("build command `{command}` failed ({status})")]
    #[diagnostic(code(goldrun::build::failed))]
    BuildFailed {
        command: String,
        status: String,
        #[help]
        output: Option<String>,
    },

    #[error("build command is empty")]
    #[diagnostic(code(goldrun::config::empty_build))]
    EmptyBuild,

    #[error("failed to read '{}'", .path.display())]
    #[diagnostic(code(goldrun::config::read))]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {message}")]
    #[diagnostic(code(goldrun::config::parse))]
    ConfigParse {
        message: String,
        #[source_code]
        src: Arc<NamedSource<String>>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("invalid diagnostic pattern '{pattern}'")]
    #[diagnostic(
        code(goldrun::config::pattern),
        help("the pattern is a regular expression matched against the subject's output")
    )]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("empty input suffix")]
    #[diagnostic(
        code(goldrun::config::empty_suffix),
        help("an empty suffix would match every file; remove it from input_suffixes")
    )]
    EmptySuffix,

    #[error("failed to write fixture '{}'", .path.display())]
    #[diagnostic(code(goldrun::scaffold::write))]
    FixtureWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to overwrite {count} existing fixture(s)")]
    #[diagnostic(code(goldrun::scaffold::exists))]
    FixturesExist {
        count: usize,
        #[help]
        help: String,
    },
}

impl HarnessError {
    /// Builds a parse error that points into the offending config source.
    pub fn config_parse(name: &str, source: &str, err: &serde_yaml::Error) -> Self {
        let span = err
            .location()
            .map(|loc| SourceSpan::from((loc.index(), 1)));
        HarnessError::ConfigParse {
            message: err.to_string(),
            src: Arc::new(NamedSource::new(name, source.to_string())),
            span,
        }
    }
}

/// Failure of a single external invocation.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("executable '{program}' not found")]
    NotFound { program: String },

    #[error("'{program}' timed out after {}s and was killed", .after.as_secs_f64())]
    TimedOut { program: String, after: Duration },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ProcessError::Io {
            context: context.into(),
            source,
        }
    }
}

// ============================================================================
// ERROR FORMATTING
// ============================================================================

/// Prints a [`HarnessError`] to stderr with full miette diagnostics.
pub fn print_error(error: HarnessError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
