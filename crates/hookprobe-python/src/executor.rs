//! Running queries in a fresh child interpreter
//!
//! Each query spawns its own interpreter, so importing a package never
//! touches the host process. The child sees the inherited `PYTHONPATH`
//! followed by the configured search paths; the override lasts only for
//! the spawn.

use crate::env_override::{self, with_override};
use crate::errors::ProbeError;
use crate::query::Query;
use hookprobe_logger as logger;
use std::env;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

pub const PYTHONPATH: &str = "PYTHONPATH";

/// Name of the directory holding the bundled helper scripts
pub const SCRIPT_DIR_NAME: &str = "subproc";

/// Where bundled helper scripts live when nothing else is configured
///
/// Looked up next to the running executable first (`<bin>/subproc`, then
/// `<prefix>/share/hookprobe/subproc`), then in the source tree the crate
/// was built from.
pub fn default_script_dir() -> PathBuf {
    let exe = env::current_exe().ok();
    script_dir_for(exe.as_deref())
}

fn script_dir_for(exe: Option<&Path>) -> PathBuf {
    let build_tree = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(SCRIPT_DIR_NAME);
    let Some(bin_dir) = exe.and_then(Path::parent) else {
        return build_tree;
    };

    let mut candidates = vec![bin_dir.join(SCRIPT_DIR_NAME)];
    if let Some(prefix) = bin_dir.parent() {
        candidates.push(prefix.join("share").join("hookprobe").join(SCRIPT_DIR_NAME));
    }
    candidates
        .into_iter()
        .find(|dir| dir.is_dir())
        .unwrap_or(build_tree)
}

/// Something that can answer a [`Query`] with captured standard output
///
/// [`PythonExecutor`] is the real implementation; tests substitute canned
/// answers.
pub trait Interpreter {
    /// Run `query` with `extra_paths` appended to the module search path
    fn run_with_paths(&self, query: &Query, extra_paths: &[PathBuf]) -> Result<String, ProbeError>;

    fn run(&self, query: &Query) -> Result<String, ProbeError> {
        self.run_with_paths(query, &[])
    }
}

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Appended to the inherited module search path of every child
    pub search_paths: Vec<PathBuf>,
    /// The only directory scripts may be run from
    pub script_dir: PathBuf,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        ExecutorOptions {
            search_paths: Vec::new(),
            script_dir: default_script_dir(),
            timeout: Some(Duration::from_secs(hookprobe_config::DEFAULT_TIMEOUT_SECS)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PythonExecutor {
    interpreter: PathBuf,
    options: ExecutorOptions,
}

impl PythonExecutor {
    pub fn new(interpreter: impl Into<PathBuf>, options: ExecutorOptions) -> Self {
        PythonExecutor {
            interpreter: interpreter.into(),
            options,
        }
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Run inline program text and return its trimmed standard output
    pub fn run_statement(&self, code: &str) -> Result<String, ProbeError> {
        self.run(&Query::statement(code))
    }

    /// Run a script from the script directory with `args`
    ///
    /// The script directory is also put on the child's search path so
    /// helper scripts can import their siblings.
    pub fn run_script(&self, script: impl AsRef<Path>, args: &[String]) -> Result<String, ProbeError> {
        self.script_with_paths(script.as_ref(), args, &[])
    }

    fn script_with_paths(
        &self,
        script: &Path,
        args: &[String],
        extra_paths: &[PathBuf],
    ) -> Result<String, ProbeError> {
        if !self.options.script_dir.is_dir() {
            return Err(ProbeError::ExecutionFailed {
                command: script.display().to_string(),
                reason: format!(
                    "script directory {} does not exist",
                    self.options.script_dir.display()
                ),
            });
        }
        let script_path = self.authorize_script(script)?;
        let mut argv = vec![script_path.into_os_string()];
        argv.extend(args.iter().map(OsString::from));
        let mut paths = vec![self.options.script_dir.clone()];
        paths.extend(extra_paths.iter().cloned());
        self.spawn(&argv, &paths)
    }

    /// Map a script name to its file in the script directory
    ///
    /// A bare basename is looked up in the script directory. A path is only
    /// accepted when its parent is the script directory itself.
    pub fn authorize_script(&self, script: &Path) -> Result<PathBuf, ProbeError> {
        let unauthorized = || ProbeError::UnauthorizedScript(script.to_path_buf());
        let file_name = script.file_name().ok_or_else(unauthorized)?;

        if let Some(parent) = script.parent().filter(|p| !p.as_os_str().is_empty()) {
            let same_dir = match (parent.canonicalize(), self.options.script_dir.canonicalize()) {
                (Ok(parent), Ok(script_dir)) => parent == script_dir,
                _ => false,
            };
            if !same_dir {
                return Err(unauthorized());
            }
        }

        let candidate = self.options.script_dir.join(file_name);
        if candidate.is_file() {
            Ok(candidate)
        } else {
            Err(unauthorized())
        }
    }

    fn compose_search_path(&self, extra: &[PathBuf]) -> Result<OsString, ProbeError> {
        let mut entries: Vec<PathBuf> = match env::var_os(PYTHONPATH) {
            Some(inherited) if !inherited.is_empty() => env::split_paths(&inherited).collect(),
            _ => Vec::new(),
        };
        entries.extend(self.options.search_paths.iter().cloned());
        entries.extend(extra.iter().cloned());

        env::join_paths(entries).map_err(|e| ProbeError::ExecutionFailed {
            command: self.interpreter.display().to_string(),
            reason: format!("invalid search path entry: {}", e),
        })
    }

    fn command_line(&self, args: &[OsString]) -> String {
        let mut line = self.interpreter.display().to_string();
        for arg in args {
            let arg = arg.to_string_lossy();
            let first = arg.lines().next().unwrap_or("");
            line.push(' ');
            if first.len() < arg.len() {
                line.push_str(&format!("{}...", first));
            } else {
                line.push_str(first);
            }
        }
        line
    }

    fn spawn(&self, args: &[OsString], extra_paths: &[PathBuf]) -> Result<String, ProbeError> {
        let command = self.command_line(args);
        let failed = |reason: String| ProbeError::ExecutionFailed {
            command: command.clone(),
            reason,
        };

        // The override only needs to last until the child has copied the environment
        let child = {
            let _lock = env_override::lock();
            let search_path = self.compose_search_path(extra_paths)?;
            with_override(PYTHONPATH, &search_path, || self.start(args))
        }
        .map_err(failed)?;
        let output = self.finish(child).map_err(failed)?;

        logger::capture_output(&command, &output);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(ProbeError::ExecutionFailed {
                command,
                reason: format!("{}: {}", output.status, last_line.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn start(&self, args: &[OsString]) -> Result<Child, String> {
        Command::new(&self.interpreter)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to start {}: {}", self.interpreter.display(), e))
    }

    /// Wait for the child and its output, all within one timeout
    ///
    /// Output is read until the pipes close, which a background process
    /// left behind by the child can delay past the child's own exit.
    fn finish(&self, mut child: Child) -> Result<Output, String> {
        let deadline = self.options.timeout.map(|limit| (Instant::now() + limit, limit));
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match deadline {
            Some((_, limit)) => match child.wait_timeout(limit).map_err(|e| e.to_string())? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(timed_out(limit));
                }
            },
            None => child.wait().map_err(|e| e.to_string())?,
        };

        Ok(Output {
            status,
            stdout: collect(&stdout, deadline)?,
            stderr: collect(&stderr, deadline)?,
        })
    }
}

fn timed_out(limit: Duration) -> String {
    format!("timed out after {}s", limit.as_secs_f64())
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<io::Result<Vec<u8>>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let result = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buffer).map(|_| buffer),
            None => Ok(buffer),
        };
        let _ = sender.send(result);
    });
    receiver
}

fn collect(
    reader: &Receiver<io::Result<Vec<u8>>>,
    deadline: Option<(Instant, Duration)>,
) -> Result<Vec<u8>, String> {
    let received = match deadline {
        Some((at, limit)) => reader
            .recv_timeout(at.saturating_duration_since(Instant::now()))
            .map_err(|e| match e {
                RecvTimeoutError::Timeout => {
                    format!("{} waiting for output to close", timed_out(limit))
                }
                RecvTimeoutError::Disconnected => "output reader stopped".to_string(),
            })?,
        None => reader.recv().map_err(|_| "output reader stopped".to_string())?,
    };
    received.map_err(|e| format!("failed to read output: {}", e))
}

impl Interpreter for PythonExecutor {
    fn run_with_paths(&self, query: &Query, extra_paths: &[PathBuf]) -> Result<String, ProbeError> {
        logger::debug(&format!("Running {}", query.describe()));
        match query {
            Query::Statement(code) => {
                let args = vec![OsString::from("-c"), OsString::from(code)];
                self.spawn(&args, extra_paths)
            }
            Query::Script { name, args } => {
                self.script_with_paths(Path::new(name), args, extra_paths)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // `sh -c <code>` and `sh <script> <args>` follow the same calling
    // convention as a Python interpreter.
    fn shell_executor(script_dir: &Path, timeout: Option<Duration>) -> PythonExecutor {
        PythonExecutor::new(
            "/bin/sh",
            ExecutorOptions {
                search_paths: vec![PathBuf::from("/opt/hookprobe-extra")],
                script_dir: script_dir.to_path_buf(),
                timeout,
            },
        )
    }

    #[test]
    fn test_statement_output_is_trimmed() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let executor = shell_executor(temp_dir.path(), None);
        let result = executor.run_statement("echo '  hello  '; echo");
        assert!(result.is_ok_and(|out| out == "hello"));
    }

    #[test]
    fn test_child_sees_search_paths_and_parent_is_restored() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let before = env::var_os(PYTHONPATH);
        let executor = shell_executor(temp_dir.path(), None);

        let result = executor.run(&Query::statement("echo \"$PYTHONPATH\""));

        assert!(result.is_ok_and(|out| out.ends_with("/opt/hookprobe-extra")));
        assert_eq!(env::var_os(PYTHONPATH), before);
    }

    #[test]
    fn test_nonzero_exit_is_execution_failure() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let executor = shell_executor(temp_dir.path(), None);
        let result = executor.run_statement("echo 'ModuleNotFoundError: foo' >&2; exit 1");
        assert!(matches!(
            result,
            Err(ProbeError::ExecutionFailed { ref reason, .. }) if reason.contains("ModuleNotFoundError")
        ));
    }

    #[test]
    fn test_script_runs_with_arguments() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        if fs::write(temp_dir.path().join("finder.sh"), "echo \"$1-$2\"\n").is_err() {
            return;
        }
        let executor = shell_executor(temp_dir.path(), None);

        let query = Query::script("finder.sh", ["a", "b"]);
        assert!(executor.run(&query).is_ok_and(|out| out == "a-b"));
    }

    #[test]
    fn test_script_outside_script_dir_is_rejected() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let executor = shell_executor(temp_dir.path(), None);

        for script in ["/etc/passwd", "../finder.sh", "missing.sh", ".."] {
            let result = executor.run(&Query::script(script, Vec::<String>::new()));
            assert!(
                matches!(result, Err(ProbeError::UnauthorizedScript(_))),
                "{} should be rejected",
                script
            );
        }
    }

    #[test]
    fn test_full_path_inside_script_dir_is_accepted() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let script = temp_dir.path().join("finder.sh");
        if fs::write(&script, "echo ok\n").is_err() {
            return;
        }
        let executor = shell_executor(temp_dir.path(), None);
        assert!(executor.authorize_script(&script).is_ok());
        assert!(executor.run_script(&script, &[]).is_ok_and(|out| out == "ok"));
    }

    #[test]
    fn test_timeout_kills_child() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let executor = shell_executor(temp_dir.path(), Some(Duration::from_millis(200)));
        let result = executor.run_statement("sleep 5");
        assert!(matches!(
            result,
            Err(ProbeError::ExecutionFailed { ref reason, .. }) if reason.contains("timed out")
        ));
    }

    #[test]
    fn test_missing_interpreter_is_execution_failure() {
        let executor = PythonExecutor::new("/nonexistent/python", ExecutorOptions::default());
        assert!(matches!(
            executor.run_statement("print(1)"),
            Err(ProbeError::ExecutionFailed { .. })
        ));
    }

    #[test]
    fn test_background_process_cannot_outlive_timeout() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let executor = shell_executor(temp_dir.path(), Some(Duration::from_millis(300)));
        let started = Instant::now();
        let result = executor.run_statement("sleep 4 & echo hi");

        assert!(matches!(
            result,
            Err(ProbeError::ExecutionFailed { ref reason, .. }) if reason.contains("timed out")
        ));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_read_error_fails_collection() {
        let (sender, receiver) = mpsc::channel();
        let _ = sender.send(Err(io::Error::other("broken pipe")));
        let result = collect(&receiver, None);
        assert!(result.is_err_and(|reason| reason.contains("broken pipe")));
    }

    #[test]
    fn test_missing_script_dir_is_execution_failure() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let executor = shell_executor(&temp_dir.path().join("not-installed"), None);
        let result = executor.run_script("django_import_finder.py", &[]);
        assert!(matches!(
            result,
            Err(ProbeError::ExecutionFailed { ref reason, .. }) if reason.contains("does not exist")
        ));
    }

    #[test]
    fn test_script_dir_found_next_to_executable() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let bin = temp_dir.path().join("bin");
        let shared = temp_dir.path().join("share/hookprobe").join(SCRIPT_DIR_NAME);
        if fs::create_dir_all(&bin).is_err() || fs::create_dir_all(&shared).is_err() {
            return;
        }
        let exe = bin.join("hookprobe");
        assert_eq!(script_dir_for(Some(&exe)), shared);

        if fs::create_dir_all(bin.join(SCRIPT_DIR_NAME)).is_err() {
            return;
        }
        assert_eq!(script_dir_for(Some(&exe)), bin.join(SCRIPT_DIR_NAME));
    }

    #[test]
    fn test_script_dir_falls_back_to_build_tree() {
        let expected = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(SCRIPT_DIR_NAME);
        assert_eq!(script_dir_for(None), expected);
        assert_eq!(script_dir_for(Some(Path::new("/nonexistent/bin/hookprobe"))), expected);
    }
}
