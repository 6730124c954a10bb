//! goldrun: golden-output test orchestration for compiler-stage executables.
//!
//! Cases are pairs of files in a directory: an input fed to the subject on stdin
//! and the expected output it should print. Optionally, output that is not a
//! diagnostic is handed to a secondary interpreter whose output is compared instead.

pub use crate::compare::Outcome;
pub use crate::config::HarnessConfig;
pub use crate::errors::{HarnessError, ProcessError};
pub use crate::harness::Harness;
pub use crate::report::{Reporter, RunSummary, SkipPolicy};

pub mod cli;
pub mod compare;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod errors;
pub mod fixtures;
pub mod harness;
pub mod normalize;
pub mod process;
pub mod report;
