use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::HarnessError;

/// One input/expected-output pair found on disk.
///
/// Only the input is known to exist. Whether the expected output is present is
/// decided by the orchestration loop, which reports a missing one as a skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Input path relative to the test directory, minus the recognized suffix.
    pub name: String,
    pub input: PathBuf,
    pub expected: PathBuf,
    /// Where the actual output is written after execution, if enabled.
    pub result: Option<PathBuf>,
}

impl TestCase {
    pub fn has_expected(&self) -> bool {
        self.expected.is_file()
    }
}

/// Finds test cases in a directory by file naming convention.
#[derive(Debug, Clone)]
pub struct CaseDiscoverer {
    /// Recognized input suffixes in priority order. The first match wins.
    pub input_suffixes: Vec<String>,
    pub output_suffix: String,
    pub result_suffix: Option<String>,
    pub recursive: bool,
}

impl Default for CaseDiscoverer {
    fn default() -> Self {
        Self {
            input_suffixes: vec![".in.txt".to_string(), ".in".to_string()],
            output_suffix: ".out".to_string(),
            result_suffix: None,
            recursive: false,
        }
    }
}

impl CaseDiscoverer {
    /// Rejects an empty input suffix, which would match every file.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.input_suffixes.iter().any(String::is_empty) {
            return Err(HarnessError::EmptySuffix);
        }
        Ok(())
    }

    /// Scans `root` for input files and pairs each one with its expected output path.
    ///
    /// The returned cases are sorted by input path so run order is deterministic.
    #[tracing::instrument(skip_all, fields(root = %root.display()))]
    pub fn discover(&self, root: &Path) -> Result<Vec<TestCase>, HarnessError> {
        self.validate()?;
        if !root.is_dir() {
            return Err(HarnessError::MissingDirectory {
                path: root.to_path_buf(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut cases = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).max_depth(max_depth) {
            let entry = entry.map_err(|source| HarnessError::UnreadableDirectory {
                path: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(case) = self.case_for(root, entry.path()) {
                cases.push(case);
            }
        }

        if cases.is_empty() {
            return Err(HarnessError::NoCases {
                path: root.to_path_buf(),
                suffixes: self.input_suffixes.join(", "),
            });
        }

        cases.sort_by(|a, b| a.input.cmp(&b.input));
        tracing::debug!(count = cases.len(), "discovered cases");
        Ok(cases)
    }

    /// Returns the first recognized suffix of `file_name`, if any.
    pub fn matching_suffix(&self, file_name: &str) -> Option<&str> {
        self.input_suffixes
            .iter()
            .map(String::as_str)
            .find(|suffix| file_name.len() > suffix.len() && file_name.ends_with(suffix))
    }

    fn case_for(&self, root: &Path, input: &Path) -> Option<TestCase> {
        let file_name = input.file_name()?.to_str()?;
        let suffix = self.matching_suffix(file_name)?;
        let base = &file_name[..file_name.len() - suffix.len()];
        let dir = input.parent()?;

        let relative = input.strip_prefix(root).unwrap_or(input);
        let name = match relative.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                format!("{}/{}", parent.display(), base)
            }
            _ => base.to_string(),
        };

        Some(TestCase {
            name,
            input: input.to_path_buf(),
            expected: dir.join(format!("{base}{}", self.output_suffix)),
            result: self
                .result_suffix
                .as_ref()
                .map(|suffix| dir.join(format!("{base}{suffix}"))),
        })
    }
}
