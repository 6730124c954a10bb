//! Running external programs with captured output and a deadline.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::errors::ProcessError;

/// How captured standard error relates to captured standard output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StderrPolicy {
    #[default]
    Separate,
    /// Stderr is appended to stdout after the process exits.
    Merge,
}

/// Captured result of one finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// A program, its arguments, and where its stdin comes from.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    /// Fed to the program's stdin; stdin is closed when absent.
    pub stdin: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdin_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    fn display_program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// Runs invocations one at a time, killing any that exceed the deadline.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    pub timeout: Option<Duration>,
    pub stderr: StderrPolicy,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>, stderr: StderrPolicy) -> Self {
        Self { timeout, stderr }
    }

    /// Runs `invocation` to completion and captures its output.
    ///
    /// A non-zero exit is not an error here; callers inspect
    /// [`ExecutionResult::exit_code`] themselves.
    ///
    /// On unix the program leads its own process group, and the whole group is
    /// killed at the deadline, so helpers forked by a script subject die with it.
    #[tracing::instrument(skip_all, fields(program = %invocation.display_program()))]
    pub async fn run(&self, invocation: &Invocation) -> Result<ExecutionResult, ProcessError> {
        let program = invocation.display_program();
        let stdin = match &invocation.stdin {
            Some(path) => File::open(path).map(Stdio::from).map_err(|e| {
                ProcessError::io(format!("failed to open input '{}'", path.display()), e)
            })?,
            None => Stdio::null(),
        };

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ProcessError::NotFound {
                    program: program.clone(),
                },
                _ => ProcessError::io(format!("failed to start '{program}'"), e),
            })?;

        let pid = child.id();
        // Dropping the wait future on expiry drops the child, which kills it.
        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    kill_process_group(pid).await;
                    return Err(ProcessError::TimedOut {
                        program,
                        after: limit,
                    });
                }
            },
            None => child.wait_with_output().await,
        };
        let output =
            waited.map_err(|e| ProcessError::io(format!("failed to wait for '{program}'"), e))?;

        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if self.stderr == StderrPolicy::Merge {
            stdout.push_str(&stderr);
        }

        let result = ExecutionResult {
            stdout,
            stderr,
            exit_code: output.status.code(),
        };
        tracing::debug!(status = %result.status(), "process finished");
        Ok(result)
    }
}

/// Kills what is left of a timed-out program's process group.
#[cfg(unix)]
async fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    let killed = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -KILL -- -{pid}"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = killed {
        tracing::debug!("failed to kill process group {pid}: {e}");
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pid: Option<u32>) {}

/// Locates an executable the way a shell would, with a `.exe` fallback.
///
/// Names containing a path separator are checked as paths; bare names are
/// searched for in `PATH`.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 || path.is_absolute() {
        return with_exe_fallback(path).into_iter().find(|p| p.is_file());
    }
    let search = env::var_os("PATH")?;
    env::split_paths(&search)
        .flat_map(|dir| with_exe_fallback(&dir.join(program)))
        .find(|p| p.is_file())
}

fn with_exe_fallback(path: &Path) -> [PathBuf; 2] {
    let mut exe = path.as_os_str().to_owned();
    exe.push(OsStr::new(".exe"));
    [path.to_path_buf(), PathBuf::from(exe)]
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn runner() -> ProcessRunner {
        ProcessRunner::new(Some(Duration::from_secs(10)), StderrPolicy::Separate)
    }

    #[tokio::test]
    async fn feeds_input_file_to_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("t1.in");
        fs::write(&input, "0 102").unwrap();

        let result = runner()
            .run(&Invocation::new("cat").stdin_from(&input))
            .await
            .unwrap();
        assert_eq!(result.stdout, "0 102");
        assert!(result.success());
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let err = runner()
            .run(&Invocation::new("./no-such-subject-program"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::NotFound { .. }));
    }

    #[tokio::test]
    async fn unreadable_input_is_an_io_error() {
        let err = runner()
            .run(&Invocation::new("cat").stdin_from("/no/such/input.in"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Io { .. }));
    }

    #[tokio::test]
    async fn abnormal_exit_is_captured_not_raised() {
        let result = runner()
            .run(&Invocation::new("sh").arg("-c").arg("echo oops >&2; exit 3"))
            .await
            .unwrap();
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stderr, "oops\n");
        assert!(result.stdout.is_empty());
    }

    #[tokio::test]
    async fn merge_policy_appends_stderr() {
        let runner = ProcessRunner::new(None, StderrPolicy::Merge);
        let result = runner
            .run(&Invocation::new("sh").arg("-c").arg("echo out; echo err >&2"))
            .await
            .unwrap();
        assert_eq!(result.stdout, "out\nerr\n");
    }

    #[tokio::test]
    async fn hung_program_is_killed_at_deadline() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(200)), StderrPolicy::Separate);
        let err = runner
            .run(&Invocation::new("sleep").arg("30"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn deadline_kills_forked_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("helper.pid");
        let script = format!("sleep 30 & echo $! > '{}'; wait", pid_file.display());

        let runner = ProcessRunner::new(Some(Duration::from_millis(500)), StderrPolicy::Separate);
        let err = runner
            .run(&Invocation::new("sh").arg("-c").arg(script))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));

        let pid = fs::read_to_string(&pid_file).unwrap();
        let stat = PathBuf::from(format!("/proc/{}/stat", pid.trim()));
        let mut gone = false;
        for _ in 0..50 {
            // A killed helper is either reaped already or a zombie awaiting its reaper.
            gone = match fs::read_to_string(&stat) {
                Err(_) => true,
                Ok(line) => line.rsplit(')').next().unwrap().trim_start().starts_with('Z'),
            };
            if gone {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(gone, "helper {} survived the deadline", pid.trim());
    }

    #[test]
    fn resolves_paths_and_path_search() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("hw3.exe");
        fs::write(&exe, "").unwrap();

        let bare = dir.path().join("hw3");
        assert_eq!(resolve_program(bare.to_str().unwrap()), Some(exe));
        assert!(resolve_program("sh").is_some());
        assert_eq!(resolve_program("./surely-missing-subject"), None);
    }
}
