//!
//! The process runner tests.
//!
//! Shell utilities stand in for the EVM runner.
//!

#![cfg(test)]
#![cfg(unix)]

use std::path::Path;
use std::time::Duration;
use std::time::Instant;

use tempfile::NamedTempFile;

use crate::descriptor::password::Password;
use crate::descriptor::validation::Error as ValidationError;
use crate::descriptor::Descriptor;
use crate::error::Error;

use super::config::Config;
use super::output::Stream;
use super::result::LaunchResult;
use super::result::Status;
use super::Runner;

fn wallet() -> NamedTempFile {
    NamedTempFile::new().expect("Temporary wallet creation failed")
}

fn descriptor(wallet_path: &Path) -> Descriptor {
    Descriptor::new("Foo", "bar", wallet_path, Password::new("p"))
}

fn shell(script: &str) -> Runner {
    Runner::new(Config::new("sh").with_arguments(["-c", script, "sh"]))
}

fn is_alive(pid: u32) -> bool {
    // Zombies only wait for their parent to reap them.
    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        return stat
            .rsplit(')')
            .next()
            .map(|fields| !fields.trim_start().starts_with(&['Z', 'X'][..]))
            .unwrap_or(false);
    }
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn is_gone_eventually(pid: u32) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if !is_alive(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}

fn read_pid(path: &Path) -> u32 {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(pid) = std::fs::read_to_string(path)
            .ok()
            .and_then(|data| data.trim().parse().ok())
        {
            return pid;
        }
        assert!(Instant::now() < deadline, "The PID file {path:?} has not been written");
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn forking_shell(pid_file: &Path) -> Runner {
    let mut config = Config::new("sh").with_arguments([
        "-c",
        r#"sleep 300 & echo $! > "$PID_FILE"; wait"#,
        "sh",
    ]);
    config.environment.insert(
        "PID_FILE".to_owned(),
        pid_file.to_string_lossy().to_string(),
    );
    Runner::new(config)
}

#[test]
fn arguments_order() {
    let wallet = wallet();
    let runner = Runner::new(Config::new("echo"));

    let result = runner
        .run(&descriptor(wallet.path()), |_| {})
        .expect("Launch failed");

    assert_eq!(result.status, Status::Completed);
    assert_eq!(result.exit_code, 0);
    assert_eq!(
        String::from_utf8_lossy(result.stdout.as_slice()),
        format!("Foo bar {} p\n", wallet.path().display())
    );
    assert!(result.is_successful());
}

#[test]
fn leading_arguments() {
    let wallet = wallet();
    let runner = shell(r#"printf '%s|' "$@""#);

    let result = runner
        .run(&descriptor(wallet.path()), |_| {})
        .expect("Launch failed");

    assert_eq!(
        String::from_utf8_lossy(result.stdout.as_slice()),
        format!("Foo|bar|{}|p|", wallet.path().display())
    );
}

#[test]
fn exit_code_passthrough() {
    let wallet = wallet();
    let runner = shell("echo reverted >&2; exit 2");

    let result = runner
        .run(&descriptor(wallet.path()), |_| {})
        .expect("A failed subprocess must still yield a result");

    assert_eq!(result.status, Status::ProcessFailed(2));
    assert_eq!(result.exit_code, 2);
    assert_eq!(result.stderr, b"reverted\n".to_vec());
    assert!(!result.is_successful());
}

#[test]
fn environment() {
    let wallet = wallet();
    let mut config =
        Config::new("sh").with_arguments(["-c", r#"printf '%s' "$EVM_NETWORK""#, "sh"]);
    config
        .environment
        .insert("EVM_NETWORK".to_owned(), "local".to_owned());

    let result = Runner::new(config)
        .run(&descriptor(wallet.path()), |_| {})
        .expect("Launch failed");

    assert_eq!(result.stdout, b"local".to_vec());
}

#[test]
fn database_directory_argument() {
    let wallet = wallet();
    let mut config = Config::new("echo").with_arguments(["org.web3j.evm.Runner"]);
    config.database_directory = Some("/var/evm/db".into());

    let result = Runner::new(config)
        .run(&descriptor(wallet.path()), |_| {})
        .expect("Launch failed");

    assert_eq!(
        String::from_utf8_lossy(result.stdout.as_slice()),
        format!(
            "-Devm.database.dir=/var/evm/db org.web3j.evm.Runner Foo bar {} p\n",
            wallet.path().display()
        )
    );
}

#[test]
fn invalid_descriptor_is_not_spawned() {
    let marker_directory = tempfile::tempdir().expect("Temporary directory creation failed");
    let marker = marker_directory.path().join("spawned");
    let mut config = Config::new("sh").with_arguments(["-c", r#"touch "$MARKER""#, "sh"]);
    config.environment.insert(
        "MARKER".to_owned(),
        marker.to_string_lossy().to_string(),
    );
    let runner = Runner::new(config);

    for descriptor in [
        Descriptor::new("", "bar", "/tmp/w", Password::new("p")),
        Descriptor::new("Foo", "", "/tmp/w", Password::new("p")),
        Descriptor::new("Foo", "bar", "", Password::new("p")),
    ] {
        match runner.run(&descriptor, |_| {}) {
            Err(Error::InvalidDescriptor(errors)) => assert!(!errors.is_empty()),
            other => panic!("Expected an invalid descriptor error, found {other:?}"),
        }
    }
    assert!(!marker.exists());
}

#[test]
fn wallet_not_found() {
    let runner = Runner::new(Config::new("echo"));
    let path = Path::new("/nonexistent/evm-launcher/wallet.json");

    match runner.run(&descriptor(path), |_| {}) {
        Err(Error::WalletNotFound(found)) => assert_eq!(found, path),
        other => panic!("Expected a wallet not found error, found {other:?}"),
    }
}

#[test]
fn wallet_not_found_with_other_errors() {
    let runner = Runner::new(Config::new("echo"));
    let path = Path::new("/nonexistent/evm-launcher/wallet.json");
    let descriptor = Descriptor::new("", "bar", path, Password::new("p"));

    match runner.run(&descriptor, |_| {}) {
        Err(Error::InvalidDescriptor(errors)) => assert_eq!(
            errors,
            vec![
                ValidationError::MissingContract,
                ValidationError::WalletNotFound(path.to_owned()),
            ]
        ),
        other => panic!("Expected an invalid descriptor error, found {other:?}"),
    }
}

#[test]
fn spawn_error() {
    let wallet = wallet();
    let runner = Runner::new(Config::new("/nonexistent/evm-launcher/evm-runner"));

    let error = runner
        .run(&descriptor(wallet.path()), |_| {})
        .expect_err("The executable does not exist");
    match error {
        Error::ProcessSpawn { error, .. } => {
            assert_eq!(error.kind(), std::io::ErrorKind::NotFound)
        }
        other => panic!("Expected a spawn error, found {other:?}"),
    }
}

#[test]
fn spawn_error_not_executable() {
    let wallet = wallet();
    let executable = NamedTempFile::new()
        .expect("Temporary executable creation failed")
        .into_temp_path();
    let runner = Runner::new(Config::new(executable.to_path_buf()));

    let error = runner
        .run(&descriptor(wallet.path()), |_| {})
        .expect_err("The executable has no execute permission");
    match error {
        Error::ProcessSpawn { executable: path, error } => {
            assert_eq!(path, executable.to_path_buf());
            assert_eq!(error.kind(), std::io::ErrorKind::PermissionDenied);
        }
        other => panic!("Expected a spawn error, found {other:?}"),
    }
}

#[test]
fn relative_executable_in_working_directory() {
    let wallet = wallet();
    let directory = tempfile::tempdir().expect("Temporary directory creation failed");
    let echo = which::which("echo").expect("The `echo` executable is not installed");
    std::os::unix::fs::symlink(
        echo.parent().expect("Always has a parent"),
        directory.path().join("bin"),
    )
    .expect("Symlink creation failed");
    let mut config = Config::new("bin/echo");
    config.working_directory = Some(directory.path().to_owned());

    let result = Runner::new(config)
        .run(&descriptor(wallet.path()), |_| {})
        .expect("Launch failed");

    assert_eq!(
        String::from_utf8_lossy(result.stdout.as_slice()),
        format!("Foo bar {} p\n", wallet.path().display())
    );
}

#[test]
fn password_is_not_leaked_in_errors() {
    let runner = Runner::new(Config::new("/nonexistent/evm-launcher/evm-runner"));
    let wallet = wallet();

    for descriptor in [
        Descriptor::new("", "", "", Password::new("hunter2")),
        Descriptor::new("Foo", "bar", wallet.path(), Password::new("hunter2")),
    ] {
        let error = runner
            .run(&descriptor, |_| {})
            .expect_err("The launch must fail");
        assert!(!error.to_string().contains("hunter2"));
        assert!(!format!("{error:?}").contains("hunter2"));
    }
}

#[test]
fn output_is_streamed() {
    let wallet = wallet();
    let runner = shell("echo first; exec sleep 30");
    let launch = runner
        .spawn(&descriptor(wallet.path()))
        .expect("Launch failed");
    let canceller = launch.canceller();

    let mut chunks = Vec::new();
    let result = launch
        .wait(|chunk| {
            chunks.push(chunk.to_owned());
            canceller.cancel();
        })
        .expect("Launch failed");

    assert_eq!(chunks.first().map(|chunk| chunk.stream), Some(Stream::Stdout));
    assert_eq!(result.stdout, b"first\n".to_vec());
    assert_eq!(result.status, Status::Terminated);
    assert!(result.duration < Duration::from_secs(10));
}

#[test]
fn cancellation() {
    let wallet = wallet();
    let runner = shell("exec sleep 30");
    let launch = runner
        .spawn(&descriptor(wallet.path()))
        .expect("Launch failed");
    let pid = launch.id();
    let canceller = launch.canceller();

    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        canceller.cancel();
    });
    let result = launch.wait(|_| {}).expect("Launch failed");
    handle.join().expect("Canceller thread panicked");

    assert_eq!(result.status, Status::Terminated);
    assert_eq!(result.exit_code, LaunchResult::EXIT_CODE_TERMINATED);
    assert!(result.duration < Duration::from_secs(10));
    assert!(!is_alive(pid));
}

#[test]
fn cancellation_terminates_forked_children() {
    let wallet = wallet();
    let directory = tempfile::tempdir().expect("Temporary directory creation failed");
    let pid_file = directory.path().join("sleep.pid");
    let launch = forking_shell(pid_file.as_path())
        .spawn(&descriptor(wallet.path()))
        .expect("Launch failed");
    let canceller = launch.canceller();

    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        canceller.cancel();
    });
    let result = launch.wait(|_| {}).expect("Launch failed");
    handle.join().expect("Canceller thread panicked");

    assert_eq!(result.status, Status::Terminated);
    assert!(result.duration < Duration::from_secs(10));
    assert!(is_gone_eventually(read_pid(pid_file.as_path())));
}

#[test]
fn cancellation_after_exit() {
    let wallet = wallet();
    let runner = Runner::new(Config::new("true"));
    let launch = runner
        .spawn(&descriptor(wallet.path()))
        .expect("Launch failed");
    launch.canceller().cancel();

    let result = launch.wait(|_| {}).expect("Launch failed");

    assert!(matches!(result.status, Status::Completed | Status::Terminated));
}

#[test]
fn drop_kills_subprocess() {
    let wallet = wallet();
    let runner = shell("exec sleep 30");
    let launch = runner
        .spawn(&descriptor(wallet.path()))
        .expect("Launch failed");
    let pid = launch.id();

    drop(launch);

    assert!(!is_alive(pid));
}

#[test]
fn drop_terminates_forked_children() {
    let wallet = wallet();
    let directory = tempfile::tempdir().expect("Temporary directory creation failed");
    let pid_file = directory.path().join("sleep.pid");
    let launch = forking_shell(pid_file.as_path())
        .spawn(&descriptor(wallet.path()))
        .expect("Launch failed");
    let grandchild = read_pid(pid_file.as_path());

    drop(launch);

    assert!(is_gone_eventually(grandchild));
}
