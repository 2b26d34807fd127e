//!
//! The running launch.
//!

use std::process::Child;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use crate::error::Error;

use super::output::Chunk;
use super::output::Stream;
use super::result::LaunchResult;
use super::result::Status;

///
/// The cancellation handle of a running launch.
///
/// Can be cloned and triggered from any thread, including a signal handler.
///
#[derive(Debug, Clone, Default)]
pub struct Canceller {
    /// Set once the termination has been requested.
    requested: Arc<AtomicBool>,
}

impl Canceller {
    ///
    /// Requests the subprocess termination.
    ///
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    ///
    /// Whether the termination has been requested.
    ///
    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

///
/// The running launch.
///
/// Consumed by [`Launch::wait`], which is the only way to obtain the result. Dropping
/// a launch that has not been waited for terminates the subprocess group and reaps the subprocess.
///
#[derive(Debug)]
pub struct Launch {
    /// The subprocess.
    child: Child,
    /// The output chunks sent by the reader threads.
    receiver: mpsc::Receiver<Chunk>,
    /// The stdout and stderr reader threads.
    readers: Vec<JoinHandle<()>>,
    /// The cancellation handle.
    canceller: Canceller,
    /// The spawn time.
    started: Instant,
    /// Whether the subprocess has been reaped.
    reaped: bool,
}

impl Launch {
    /// How long the waiting thread blocks on output before checking the subprocess.
    pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// How long the remaining output is awaited after the subprocess exit.
    pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

    /// How long the subprocess group may take to exit after the terminate signal before it is killed.
    pub const TERMINATE_GRACE_PERIOD: Duration = Duration::from_secs(2);

    ///
    /// A shortcut constructor.
    ///
    pub(crate) fn new(
        child: Child,
        receiver: mpsc::Receiver<Chunk>,
        readers: Vec<JoinHandle<()>>,
        started: Instant,
    ) -> Self {
        Self {
            child,
            receiver,
            readers,
            canceller: Canceller::default(),
            started,
            reaped: false,
        }
    }

    ///
    /// Returns the OS process identifier.
    ///
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    ///
    /// Returns a handle which terminates the subprocess when triggered.
    ///
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    ///
    /// Forwards the output to `sink` until the subprocess exits, and returns the result.
    ///
    /// A non-zero exit code or a requested termination is a regular result. Errors are
    /// only returned if the OS fails to report the subprocess state.
    ///
    pub fn wait<F>(mut self, mut sink: F) -> Result<LaunchResult, Error>
    where
        F: FnMut(&Chunk),
    {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut capture = |chunk: Chunk| {
            sink(&chunk);
            match chunk.stream {
                Stream::Stdout => stdout.extend(chunk.data),
                Stream::Stderr => stderr.extend(chunk.data),
            }
        };

        let mut kill_deadline = None;
        let mut kill_sent = false;
        let exit_status = loop {
            match self.receiver.recv_timeout(Self::POLL_INTERVAL) {
                Ok(chunk) => capture(chunk),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    std::thread::sleep(Self::POLL_INTERVAL)
                }
            }

            if kill_deadline.is_none() && self.canceller.is_cancelled() {
                tracing::debug!(pid = self.child.id(), "terminating subprocess group");
                self.terminate()?;
                kill_deadline = Some(Instant::now() + Self::TERMINATE_GRACE_PERIOD);
            }
            if !kill_sent && kill_deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                tracing::warn!(
                    pid = self.child.id(),
                    "subprocess group is still running after the terminate signal, killing"
                );
                self.kill()?;
                kill_sent = true;
            }

            if let Some(exit_status) = self.child.try_wait()? {
                self.reaped = true;
                break exit_status;
            }
        };
        let cancelled = kill_deadline.is_some();
        if cancelled {
            // The group outlives its reaped leader while forked processes remain.
            if let Err(error) = self.kill() {
                tracing::warn!(%error, "subprocess group killing error");
            }
        }

        let mut drained = false;
        loop {
            match self.receiver.recv_timeout(Self::DRAIN_TIMEOUT) {
                Ok(chunk) => capture(chunk),
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    drained = true;
                    break;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => break,
            }
        }
        if drained {
            for reader in std::mem::take(&mut self.readers).into_iter() {
                let _ = reader.join();
            }
        } else {
            tracing::warn!("subprocess output is still open after exit, detaching the readers");
        }

        let exit_code = super::result::exit_code(&exit_status);
        let status = if cancelled && exit_code != 0 {
            Status::Terminated
        } else if exit_code == 0 {
            Status::Completed
        } else {
            Status::ProcessFailed(exit_code)
        };
        let duration = self.started.elapsed();
        tracing::debug!(%status, exit_code, ?duration, "subprocess finished");

        Ok(LaunchResult {
            status,
            exit_code,
            stdout,
            stderr,
            duration,
        })
    }

    ///
    /// Sends the terminate signal to the subprocess group.
    ///
    fn terminate(&mut self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            self.signal_group(libc::SIGTERM)
        }
        #[cfg(not(unix))]
        {
            self.kill()
        }
    }

    ///
    /// Kills the subprocess group, including the processes left behind by an exited subprocess.
    ///
    fn kill(&mut self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            self.signal_group(libc::SIGKILL)
        }
        #[cfg(not(unix))]
        {
            match self.child.kill() {
                Err(error) if error.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
                result => result,
            }
        }
    }

    ///
    /// Sends `signal` to every process in the subprocess group.
    ///
    /// The subprocess leads its own group, so the group identifier is its PID. An empty group
    /// is not an error.
    ///
    #[cfg(unix)]
    fn signal_group(&self, signal: libc::c_int) -> std::io::Result<()> {
        let group = self.child.id() as libc::pid_t;
        // SAFETY: `killpg` only reads its integer arguments.
        if unsafe { libc::killpg(group, signal) } == 0 {
            return Ok(());
        }
        let error = std::io::Error::last_os_error();
        match error.raw_os_error() {
            Some(libc::ESRCH) => Ok(()),
            _ => Err(error),
        }
    }
}

impl Drop for Launch {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        let _ = self.terminate();
        let deadline = Instant::now() + Self::TERMINATE_GRACE_PERIOD;
        while Instant::now() < deadline {
            match self.child.try_wait() {
                Ok(None) => std::thread::sleep(Self::POLL_INTERVAL),
                Ok(Some(_)) | Err(_) => break,
            }
        }
        let _ = self.kill();
        let _ = self.child.wait();
    }
}
