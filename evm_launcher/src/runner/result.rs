//!
//! The launch result.
//!

use std::process::ExitStatus;
use std::time::Duration;

///
/// The launch final status.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The subprocess exited with code 0.
    Completed,
    /// The subprocess exited with a non-zero code, which is passed through.
    ProcessFailed(i32),
    /// The subprocess was terminated on request and exited with a non-zero code.
    Terminated,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::ProcessFailed(code) => write!(f, "failed with exit code {code}"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

///
/// The launch result.
///
/// Returned for every subprocess that has been spawned, whatever its exit code.
///
#[derive(Debug, Clone)]
pub struct LaunchResult {
    /// The final status.
    pub status: Status,
    /// The subprocess exit code.
    pub exit_code: i32,
    /// The captured standard output.
    pub stdout: Vec<u8>,
    /// The captured standard error.
    pub stderr: Vec<u8>,
    /// The wall-clock time between spawning and reaping.
    pub duration: Duration,
}

impl LaunchResult {
    /// The exit code of a subprocess that has honored the terminate request, `128 + SIGTERM`.
    ///
    /// A subprocess killed after the grace period reports `128 + SIGKILL` instead.
    pub const EXIT_CODE_TERMINATED: i32 = 143;

    ///
    /// Whether the subprocess exited with code 0.
    ///
    pub fn is_successful(&self) -> bool {
        self.status == Status::Completed
    }
}

///
/// Converts the OS exit status into an exit code.
///
/// Signal-terminated subprocesses are reported with the shell convention `128 + signal`.
///
pub(crate) fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    LaunchResult::EXIT_CODE_TERMINATED
}
