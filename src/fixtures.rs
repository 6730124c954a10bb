//! Writing input fixtures from a YAML list of strings.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::HarnessError;

/// Reads a YAML sequence of strings, one per fixture.
pub fn load_fixture_list(path: &Path) -> Result<Vec<String>, HarnessError> {
    let source = fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&source)
        .map_err(|e| HarnessError::config_parse(&path.display().to_string(), &source, &e))
}

/// Writes fixtures as `<dir>/<prefix>_<n><suffix>`, numbered from 1.
#[derive(Debug, Clone)]
pub struct FixtureWriter {
    pub dir: PathBuf,
    pub prefix: String,
    pub suffix: String,
    /// Overwrite fixtures that already exist.
    pub force: bool,
}

impl FixtureWriter {
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}_{}{}", self.prefix, index + 1, self.suffix))
    }

    /// Writes every fixture, or nothing if one would clobber an existing file without `force`.
    pub fn write_all(&self, fixtures: &[String]) -> Result<Vec<PathBuf>, HarnessError> {
        let paths: Vec<PathBuf> = (0..fixtures.len()).map(|i| self.path_for(i)).collect();

        if !self.force {
            let existing: Vec<String> = paths
                .iter()
                .filter(|p| p.exists())
                .map(|p| p.display().to_string())
                .collect();
            if !existing.is_empty() {
                return Err(HarnessError::FixturesExist {
                    count: existing.len(),
                    help: format!("pass --force to overwrite: {}", existing.join(", ")),
                });
            }
        }

        fs::create_dir_all(&self.dir).map_err(|source| HarnessError::FixtureWrite {
            path: self.dir.clone(),
            source,
        })?;
        for (path, text) in paths.iter().zip(fixtures) {
            fs::write(path, text).map_err(|source| HarnessError::FixtureWrite {
                path: path.clone(),
                source,
            })?;
        }
        tracing::debug!(count = paths.len(), dir = %self.dir.display(), "fixtures written");
        Ok(paths)
    }
}
