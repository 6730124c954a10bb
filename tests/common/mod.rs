//! Shared fixtures for the integration tests: a temporary suite directory with
//! shell-script stand-ins for the compiler and interpreter.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub struct Suite {
    root: TempDir,
}

impl Suite {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("tests")).unwrap();
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.root.path().join("tests")
    }

    /// Writes an executable `/bin/sh` script named `name` at the suite root.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Adds `<stem>.in`, plus `<stem>.out` when `expected` is given.
    pub fn case(&self, stem: &str, input: &str, expected: Option<&str>) {
        let dir = self.tests_dir();
        fs::write(dir.join(format!("{stem}.in")), input).unwrap();
        if let Some(expected) = expected {
            fs::write(dir.join(format!("{stem}.out")), expected).unwrap();
        }
    }
}

/// A subject that echoes its input back.
pub const ECHO: &str = "cat";

/// A subject that reports a lexer diagnostic for `@` and otherwise emits "IR".
pub const COMPILER: &str = r#"input=$(cat)
case "$input" in
  *@*) echo "line 1: bad character '@'" ;;
  *) echo "; module"; echo "$input" ;;
esac"#;

/// An interpreter that crashes on "crash" and otherwise prints the program's last line.
pub const INTERPRETER: &str = r#"if grep -q crash "$1"; then
  echo "segmentation fault" >&2
  exit 1
fi
tail -n 1 "$1""#;
