//!
//! The EVM runner subprocess wrapper.
//!

pub mod config;
pub mod launch;
pub mod output;
pub mod result;
mod tests;

use std::io::Read;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Instant;

use crate::descriptor::validation::Error as ValidationError;
use crate::descriptor::Descriptor;
use crate::error::Error;

use self::config::Config;
use self::launch::Launch;
use self::output::Chunk;
use self::output::Stream;
use self::result::LaunchResult;

///
/// The EVM runner subprocess wrapper.
///
/// Every launch spawns one subprocess:
/// `<executable> [arguments...] <contract> <method> <wallet path> <wallet password>`.
///
#[derive(Debug, Clone)]
pub struct Runner {
    /// The runner configuration.
    config: Config,
}

impl Runner {
    /// The output reader buffer size.
    const READ_BUFFER_SIZE: usize = 8192;

    ///
    /// A shortcut constructor.
    ///
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    ///
    /// Runs the descriptor to completion, forwarding the output to `sink` as it arrives.
    ///
    pub fn run<F>(&self, descriptor: &Descriptor, sink: F) -> Result<LaunchResult, Error>
    where
        F: FnMut(&Chunk),
    {
        self.spawn(descriptor)?.wait(sink)
    }

    ///
    /// Validates the descriptor and spawns the subprocess.
    ///
    /// Nothing is spawned if the descriptor is invalid.
    ///
    pub fn spawn(&self, descriptor: &Descriptor) -> Result<Launch, Error> {
        let errors = descriptor.validate();
        match errors.as_slice() {
            [] => {}
            [ValidationError::WalletNotFound(path)] => {
                return Err(Error::WalletNotFound(path.to_owned()))
            }
            _ => return Err(Error::InvalidDescriptor(errors)),
        }

        let executable = self.executable();

        let mut command = Command::new(executable.as_path());
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.args(self.config.database_directory_argument());
        command.args(self.config.arguments.iter());
        command.arg(descriptor.contract());
        command.arg(descriptor.method());
        command.arg(descriptor.wallet_path());
        command.arg(descriptor.wallet_password().expose());
        if let Some(working_directory) = self.config.working_directory.as_ref() {
            command.current_dir(working_directory);
        }
        command.envs(self.config.environment.iter());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;

            // The subprocess leads its own group, which is signalled as a whole on cancellation.
            command.process_group(0);
        }

        tracing::info!(
            executable = ?executable,
            contract = descriptor.contract(),
            method = descriptor.method(),
            wallet = ?descriptor.wallet_path(),
            "spawning EVM runner"
        );
        let started = Instant::now();
        let mut child = command.spawn().map_err(|error| Error::ProcessSpawn {
            executable: executable.clone(),
            error,
        })?;

        let (sender, receiver) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(Self::forward(stdout, Stream::Stdout, sender.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(Self::forward(stderr, Stream::Stderr, sender));
        }

        Ok(Launch::new(child, receiver, readers, started))
    }

    ///
    /// Resolves the executable through `${PATH}`, or against the working directory if it is a
    /// relative path.
    ///
    /// Falls back to the configured value, so the spawn error reports the actual OS cause,
    /// such as a missing file or a missing execute permission.
    ///
    fn executable(&self) -> PathBuf {
        let executable = self.config.executable.as_path();
        let base = match self.config.working_directory.as_ref() {
            Some(directory) => directory.to_owned(),
            None => std::env::current_dir().unwrap_or_default(),
        };
        match which::which_in(executable, std::env::var_os("PATH"), base.as_path()) {
            Ok(resolved) => resolved,
            Err(error) => {
                tracing::debug!(?executable, %error, "executable lookup failed");
                if executable.is_relative() && executable.components().count() > 1 {
                    base.join(executable)
                } else {
                    executable.to_owned()
                }
            }
        }
    }

    ///
    /// Starts a thread sending everything read from `reader` as chunks.
    ///
    fn forward<R>(mut reader: R, stream: Stream, sender: mpsc::Sender<Chunk>) -> JoinHandle<()>
    where
        R: Read + Send + 'static,
    {
        std::thread::spawn(move || {
            let mut buffer = [0u8; Self::READ_BUFFER_SIZE];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(size) => {
                        if sender.send(Chunk::new(stream, buffer[..size].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(error) => {
                        tracing::warn!(?stream, %error, "subprocess output reading error");
                        break;
                    }
                }
            }
        })
    }
}
