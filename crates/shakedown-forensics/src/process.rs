//! Process execution with a hard timeout.
//!
//! [`ProcessRunner`] is the seam the forensic runner drives; tests swap in a
//! scripted implementation. [`NativeRunner`] spawns the command directly
//! (argv, no shell), captures both streams and, on timeout, kills the whole
//! process group so helpers the command forked die with it.

use std::ffi::OsString;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use shakedown_core::errors::RunnerError;

/// How long to wait for the process and its pipes after the group was killed.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// A command given as discrete argv elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(OsString, OsString)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    #[must_use]
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// The program name, lossily converted for logs.
    pub fn program_display(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Space-joined argv for log headers. Not shell-quoted.
    pub fn display_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command.envs(self.env.iter().map(|(k, v)| (k, v)));
        command
    }
}

/// Captured result of one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub timed_out: bool,
}

impl ProcessOutput {
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }
}

/// Runs one command to completion or until `timeout` elapses.
///
/// A timeout is not an error: implementations return the output captured so
/// far with `timed_out` set. `Err(RunnerError::Spawn)` means the command
/// could not be started at all.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, RunnerError>;
}

/// Runs commands as native child processes.
///
/// Each stream is drained by its own reader thread into a shared buffer, so
/// bytes read before a kill survive even when a process that left the group
/// keeps the pipe open. Such readers are detached after [`KILL_GRACE`] and
/// tracked until they finish; see [`NativeRunner::lingering_readers`].
#[derive(Debug, Default)]
pub struct NativeRunner {
    lingering: Mutex<Vec<JoinHandle<()>>>,
}

impl NativeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader threads from earlier runs still blocked on an open pipe.
    pub fn lingering_readers(&self) -> usize {
        let mut lingering = self.lingering.lock().unwrap_or_else(PoisonError::into_inner);
        lingering.retain(|handle| !handle.is_finished());
        lingering.len()
    }

    fn linger(&self, handles: Vec<JoinHandle<()>>) {
        let mut lingering = self.lingering.lock().unwrap_or_else(PoisonError::into_inner);
        lingering.retain(|handle| !handle.is_finished());
        lingering.extend(handles);
    }
}

impl ProcessRunner for NativeRunner {
    fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, RunnerError> {
        let program = cmd.program_display();
        let deadline = Instant::now().checked_add(timeout);

        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // New process group with pgid == child pid.
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|source| RunnerError::Spawn {
            program: program.clone(),
            source,
        })?;
        let pid = child.id();
        let io_error = |message: String| RunnerError::ProcessIo {
            program: program.clone(),
            message,
        };

        let stdout = SharedBuffer::default();
        let stderr = SharedBuffer::default();
        let (done_tx, done_rx) = crossbeam_channel::bounded(2);
        let mut readers = Vec::with_capacity(2);
        if let Some(pipe) = child.stdout.take() {
            readers.push(spawn_reader("stdout", pid, pipe, stdout.clone(), done_tx.clone()));
        }
        if let Some(pipe) = child.stderr.take() {
            readers.push(spawn_reader("stderr", pid, pipe, stderr.clone(), done_tx.clone()));
        }
        drop(done_tx);
        let readers = match readers.into_iter().collect::<std::io::Result<Vec<_>>>() {
            Ok(readers) => readers,
            Err(e) => {
                terminate_group(pid);
                let _ = child.wait();
                return Err(io_error(format!("cannot start reader thread: {e}")));
            }
        };

        let (status_tx, status_rx) = crossbeam_channel::bounded(1);
        let waiter = thread::Builder::new()
            .name(format!("shakedown-wait-{pid}"))
            .spawn(move || {
                let _ = status_tx.send(child.wait());
            })
            .map_err(|e| {
                terminate_group(pid);
                io_error(format!("cannot start waiter thread: {e}"))
            })?;

        let mut timed_out = false;
        let status = match recv_until(&status_rx, deadline) {
            Ok(status) => status,
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(pid, timeout_secs = timeout.as_secs(), "timeout, killing process group");
                timed_out = true;
                terminate_group(pid);
                status_rx
                    .recv_timeout(KILL_GRACE)
                    .map_err(|_| io_error("process did not exit after kill".to_string()))?
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(io_error("waiter thread terminated unexpectedly".to_string()));
            }
        };
        let _ = waiter.join();
        let status = status.map_err(|e| io_error(e.to_string()))?;

        // The leader is gone; anything it left in its group may still hold
        // the pipes until the deadline.
        if !timed_out && !drained(&done_rx, readers.len(), deadline) {
            tracing::debug!(pid, "output still open at deadline, killing process group");
            timed_out = true;
            terminate_group(pid);
        }
        let grace = Instant::now().checked_add(KILL_GRACE);
        if drained(&done_rx, readers.len(), grace) {
            for reader in readers {
                let _ = reader.join();
            }
        } else {
            tracing::warn!(
                program = %program,
                pid,
                "output pipes still open after kill, keeping partial output"
            );
            self.linger(readers);
        }

        Ok(ProcessOutput {
            stdout: stdout.snapshot(),
            stderr: stderr.snapshot(),
            exit_code: status.code(),
            signal: exit_signal(&status),
            timed_out,
        })
    }
}

/// Bytes captured from one stream, shared with its reader thread.
#[derive(Debug, Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn append(&self, bytes: &[u8]) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
    }

    fn snapshot(&self) -> Vec<u8> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

fn spawn_reader<R>(
    stream: &str,
    pid: u32,
    mut pipe: R,
    buffer: SharedBuffer,
    done: Sender<()>,
) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("shakedown-{stream}-{pid}"))
        .spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => buffer.append(&chunk[..n]),
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(_) => break,
                }
            }
            let _ = done.send(());
        })
}

/// `recv` bounded by `deadline`; `None` waits forever.
fn recv_until<T>(rx: &Receiver<T>, deadline: Option<Instant>) -> Result<T, RecvTimeoutError> {
    match deadline {
        Some(deadline) => rx.recv_deadline(deadline),
        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
    }
}

/// Whether `readers` reader threads reported EOF before `deadline`.
fn drained(done: &Receiver<()>, readers: usize, deadline: Option<Instant>) -> bool {
    let mut finished = 0;
    while finished < readers {
        match recv_until(done, deadline) {
            Ok(()) => finished += 1,
            Err(RecvTimeoutError::Disconnected) => return true,
            Err(RecvTimeoutError::Timeout) => return false,
        }
    }
    true
}

#[cfg(unix)]
fn terminate_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) with a negative pid signals the process group the
    // child leads; it touches no memory owned by this process.
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn terminate_group(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}
