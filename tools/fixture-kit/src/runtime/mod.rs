use crate::errors::FixtureError;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

pub trait ProcessRunner: Send + Sync {
    fn spawn(&self, request: ProcessRequest) -> Result<u64, FixtureError>;
    fn wait(&self, handle: u64) -> Result<ProcessOutput, FixtureError>;

    fn run(&self, request: ProcessRequest) -> Result<ProcessOutput, FixtureError> {
        let handle = self.spawn(request)?;
        self.wait(handle)
    }
}

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, FixtureError>;
    fn write_string(&self, path: &Path, contents: &str) -> Result<(), FixtureError>;
    fn create_dir_all(&self, path: &Path) -> Result<(), FixtureError>;
}

pub trait Terminal: Send + Sync {
    /// Shows `prompt` and reads one line without its terminator.
    /// Returns `None` once input is exhausted.
    fn read_line(&self, prompt: &str) -> Result<Option<String>, FixtureError>;
    fn write_line(&self, line: &str) -> Result<(), FixtureError>;
    fn write_diagnostic(&self, text: &str) -> Result<(), FixtureError>;
}

pub struct ProductionClock;

impl Clock for ProductionClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, FixtureError> {
        std::fs::read_to_string(path)
            .map_err(|e| FixtureError::Io(format!("{}: {e}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), FixtureError> {
        std::fs::write(path, contents)
            .map_err(|e| FixtureError::Io(format!("{}: {e}", path.display())))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FixtureError> {
        std::fs::create_dir_all(path).map_err(|e| FixtureError::Io(e.to_string()))
    }
}

#[derive(Default)]
struct ProcessState {
    next_handle: u64,
    children: HashMap<u64, std::process::Child>,
}

pub struct ProductionProcessRunner {
    state: Mutex<ProcessState>,
}

impl ProductionProcessRunner {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProcessState::default()),
        }
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, ProcessState>, FixtureError> {
        self.state
            .lock()
            .map_err(|_| FixtureError::Process("process lock poisoned".to_string()))
    }
}

impl Default for ProductionProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for ProductionProcessRunner {
    fn spawn(&self, request: ProcessRequest) -> Result<u64, FixtureError> {
        let mut cmd = std::process::Command::new(&request.program);
        cmd.args(&request.args);
        if let Some(cwd) = &request.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|e| FixtureError::Process(format!("{}: {e}", request.program)))?;
        let mut state = self.lock_state()?;
        let handle = state.next_handle;
        state.next_handle += 1;
        state.children.insert(handle, child);
        Ok(handle)
    }

    fn wait(&self, handle: u64) -> Result<ProcessOutput, FixtureError> {
        let child = self.lock_state()?.children.remove(&handle);
        let child =
            child.ok_or_else(|| FixtureError::Process(format!("unknown handle {handle}")))?;
        let output = child
            .wait_with_output()
            .map_err(|e| FixtureError::Process(e.to_string()))?;
        Ok(ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

pub struct ProductionTerminal;

impl Terminal for ProductionTerminal {
    fn read_line(&self, prompt: &str) -> Result<Option<String>, FixtureError> {
        use std::io::{BufRead, Write};
        let mut out = std::io::stdout();
        write!(out, "{prompt}")
            .and_then(|()| out.flush())
            .map_err(|e| FixtureError::Io(e.to_string()))?;

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| FixtureError::Io(e.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        let line = line.strip_suffix('\n').unwrap_or(&line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        Ok(Some(line.to_string()))
    }

    fn write_line(&self, line: &str) -> Result<(), FixtureError> {
        use std::io::Write;
        let mut out = std::io::stdout();
        writeln!(out, "{line}").map_err(|e| FixtureError::Io(e.to_string()))
    }

    fn write_diagnostic(&self, text: &str) -> Result<(), FixtureError> {
        use std::io::Write;
        let mut err = std::io::stderr();
        write!(err, "{text}")
            .and_then(|()| err.flush())
            .map_err(|e| FixtureError::Io(e.to_string()))
    }
}

pub struct Runtime {
    pub clock: Arc<dyn Clock>,
    pub file_system: Arc<dyn FileSystem>,
    pub process_runner: Arc<dyn ProcessRunner>,
    pub terminal: Arc<dyn Terminal>,
}

impl Runtime {
    pub fn production() -> Self {
        Self {
            clock: Arc::new(ProductionClock),
            file_system: Arc::new(ProductionFileSystem),
            process_runner: Arc::new(ProductionProcessRunner::new()),
            terminal: Arc::new(ProductionTerminal),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::production()
    }
}

/// Advances by `step` on every read so durations are deterministic.
#[derive(Clone)]
pub struct FakeClock {
    now: Arc<Mutex<SystemTime>>,
    step: std::time::Duration,
}

impl FakeClock {
    pub fn new(now: SystemTime, step: std::time::Duration) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            step,
        }
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH, std::time::Duration::ZERO)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        let mut now = self.now.lock().expect("clock lock");
        let current = *now;
        *now = current + self.step;
        current
    }
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    dirs: Arc<Mutex<Vec<PathBuf>>>,
    fail_next: Arc<Mutex<Option<FixtureError>>>,
}

impl FakeFileSystem {
    pub fn with_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let fs = Self::default();
        fs.files
            .lock()
            .expect("files lock")
            .insert(path.into(), contents.into());
        fs
    }

    pub fn set_fail_next(&self, error: FixtureError) {
        *self.fail_next.lock().expect("fail lock") = Some(error);
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .lock()
            .expect("files lock")
            .get(path.as_ref())
            .cloned()
    }

    pub fn created_dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().expect("dirs lock").clone()
    }

    fn maybe_fail(&self) -> Result<(), FixtureError> {
        if let Some(err) = self.fail_next.lock().expect("fail lock").take() {
            return Err(err);
        }
        Ok(())
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, FixtureError> {
        self.maybe_fail()?;
        self.file(path)
            .ok_or_else(|| FixtureError::Io(format!("missing file {}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), FixtureError> {
        self.maybe_fail()?;
        self.files
            .lock()
            .expect("files lock")
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FixtureError> {
        self.maybe_fail()?;
        self.dirs
            .lock()
            .expect("dirs lock")
            .push(path.to_path_buf());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct FakeTerminal {
    input: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    writes: Arc<Mutex<Vec<String>>>,
    diagnostics: Arc<Mutex<Vec<String>>>,
}

impl FakeTerminal {
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terminal = Self::default();
        terminal
            .input
            .lock()
            .expect("input lock")
            .extend(lines.into_iter().map(Into::into));
        terminal
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }

    pub fn written_lines(&self) -> Vec<String> {
        self.writes.lock().expect("writes lock").clone()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.lock().expect("diagnostics lock").clone()
    }

    pub fn diagnostic_text(&self) -> String {
        self.diagnostics().concat()
    }
}

impl Terminal for FakeTerminal {
    fn read_line(&self, prompt: &str) -> Result<Option<String>, FixtureError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());
        Ok(self.input.lock().expect("input lock").pop_front())
    }

    fn write_line(&self, line: &str) -> Result<(), FixtureError> {
        self.writes
            .lock()
            .expect("writes lock")
            .push(line.to_string());
        Ok(())
    }

    fn write_diagnostic(&self, text: &str) -> Result<(), FixtureError> {
        self.diagnostics
            .lock()
            .expect("diagnostics lock")
            .push(text.to_string());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct FakeProcessRunner {
    responses: Arc<Mutex<Vec<Result<ProcessOutput, FixtureError>>>>,
    spawned: Arc<Mutex<Vec<ProcessRequest>>>,
    waits: Arc<Mutex<Vec<u64>>>,
    next_handle: Arc<Mutex<u64>>,
}

impl FakeProcessRunner {
    pub fn push_response(&self, output: Result<ProcessOutput, FixtureError>) {
        self.responses.lock().expect("responses lock").push(output);
    }

    /// Queues a successful run whose stdout is `stdout`.
    pub fn push_stdout(&self, stdout: impl Into<String>) {
        self.push_response(Ok(ProcessOutput {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }));
    }

    pub fn spawned(&self) -> Vec<ProcessRequest> {
        self.spawned.lock().expect("spawned lock").clone()
    }

    pub fn waits(&self) -> Vec<u64> {
        self.waits.lock().expect("waits lock").clone()
    }
}

impl ProcessRunner for FakeProcessRunner {
    fn spawn(&self, request: ProcessRequest) -> Result<u64, FixtureError> {
        self.spawned.lock().expect("spawned lock").push(request);
        let mut next = self.next_handle.lock().expect("next lock");
        let handle = *next;
        *next += 1;
        Ok(handle)
    }

    fn wait(&self, handle: u64) -> Result<ProcessOutput, FixtureError> {
        self.waits.lock().expect("waits lock").push(handle);
        let mut responses = self.responses.lock().expect("responses lock");
        if responses.is_empty() {
            return Err(FixtureError::Process(
                "no fake response queued".to_string(),
            ));
        }
        responses.remove(0)
    }
}
