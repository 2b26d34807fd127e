//!
//! The EVM launcher binary.
//!

pub(crate) mod arguments;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;

use self::arguments::Arguments;
use self::arguments::Command;

///
/// The application entry point.
///
fn main() {
    let exit_code = match Arguments::try_parse()
        .map_err(|error| anyhow::anyhow!(error))
        .and_then(main_inner)
    {
        Ok(exit_code) => exit_code,
        Err(error) => {
            eprintln!("{error:?}");
            evm_launcher::EXIT_CODE_FAILURE
        }
    };
    std::process::exit(exit_code);
}

///
/// The entry point wrapper used for proper error handling.
///
/// Returns the exit code of the EVM runner for the launching commands.
///
fn main_inner(arguments: Arguments) -> anyhow::Result<i32> {
    init_tracing(arguments.verbose);

    let mut config = match arguments.config.as_ref() {
        Some(path) => evm_launcher::Config::try_from(path.as_path())?,
        None if Path::new(evm_launcher::Config::DEFAULT_PATH).exists() => {
            evm_launcher::Config::try_from(Path::new(evm_launcher::Config::DEFAULT_PATH))?
        }
        None => evm_launcher::Config::default(),
    };
    if let Some(path) = arguments.store {
        config.store.path = path;
    }
    if let Some(policy) = arguments.password_policy {
        config.store.password_policy = policy;
    }
    if let Some(executable) = arguments.evm {
        config.runner.executable = executable;
    }
    if let Some(database_directory) = arguments.database_directory {
        config.runner.database_directory = Some(database_directory);
    }
    if let Some(working_directory) = arguments.working_directory {
        config.runner.working_directory = Some(working_directory);
    }
    tracing::debug!(?config, "configuration loaded");

    let store = Arc::new(evm_launcher::Store::open(
        config.store.path.clone(),
        config.store.password_policy,
    )?);
    let runner = evm_launcher::Runner::new(config.runner.clone());
    let registry = evm_launcher::Registry::new(store.clone(), runner.clone());
    let quiet = arguments.quiet;

    match arguments.command {
        Command::Save { name, descriptor } => {
            let descriptor = evm_launcher::Descriptor::from(descriptor);
            if !quiet
                && !descriptor.wallet_password().is_empty()
                && config.store.password_policy == evm_launcher::PasswordPolicy::Discard
            {
                eprintln!(
                    "Warning: The wallet password is not stored with the `{}` policy. Pass it to `run` via `--wallet-password` or ${{{}}}.",
                    evm_launcher::PasswordPolicy::Discard,
                    arguments::ENV_WALLET_PASSWORD,
                );
            }
            store.save(name.as_str(), descriptor)?;
            if !quiet {
                if let Some(path) = store.path() {
                    println!(
                        "       {} `{}` to {:?}",
                        "Saved".bright_green().bold(),
                        name,
                        path
                    );
                }
            }
        }
        Command::Show { name } => {
            let descriptor = store.load(name.as_str())?;
            println!("contract:        {}", descriptor.contract());
            println!("method:          {}", descriptor.method());
            println!("wallet path:     {}", descriptor.wallet_path().display());
            println!(
                "wallet password: {}",
                if descriptor.wallet_password().is_empty() {
                    "(not stored)".to_owned()
                } else {
                    descriptor.wallet_password().to_string()
                }
            );
        }
        Command::List => {
            let names = store.list();
            if names.is_empty() && !quiet {
                if let Some(path) = store.path() {
                    println!("No launch descriptors found in {path:?}");
                }
            }
            for name in names.into_iter() {
                println!("{name}");
            }
        }
        Command::Delete { name } => {
            store.delete(name.as_str())?;
            if !quiet {
                println!("     {} `{}`", "Deleted".bright_green().bold(), name);
            }
        }
        Command::Run {
            name,
            wallet_password,
        } => {
            let launch = registry.spawn_by_name(
                name.as_str(),
                wallet_password.map(evm_launcher::Password::new),
            )?;
            return supervise(launch, name.as_str(), &config.runner.executable, quiet);
        }
        Command::Exec { descriptor } => {
            let descriptor = evm_launcher::Descriptor::from(descriptor);
            let name = format!("{}::{}", descriptor.contract(), descriptor.method());
            let launch = runner.spawn(&descriptor)?;
            return supervise(launch, name.as_str(), &config.runner.executable, quiet);
        }
    }

    Ok(evm_launcher::EXIT_CODE_SUCCESS)
}

///
/// Forwards the launch output to the terminal and reports the outcome.
///
/// Ctrl-C terminates the EVM runner instead of the launcher.
///
fn supervise(
    launch: evm_launcher::Launch,
    name: &str,
    executable: &Path,
    quiet: bool,
) -> anyhow::Result<i32> {
    let canceller = launch.canceller();
    ctrlc::set_handler(move || {
        tracing::debug!("received interrupt signal, terminating the EVM runner");
        canceller.cancel();
    })
    .map_err(|error| anyhow::anyhow!("Interrupt handler setting error: {error}"))?;

    if !quiet {
        println!(
            "     {} `{}` with {:?} (pid {})",
            "Running".bright_green().bold(),
            name,
            executable,
            launch.id(),
        );
    }

    let result = launch.wait(|chunk| {
        let written = match chunk.stream {
            evm_launcher::OutputStream::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(chunk.data.as_slice())
                    .and_then(|()| stdout.flush())
            }
            evm_launcher::OutputStream::Stderr => {
                let mut stderr = std::io::stderr().lock();
                stderr
                    .write_all(chunk.data.as_slice())
                    .and_then(|()| stderr.flush())
            }
        };
        if let Err(error) = written {
            tracing::warn!(%error, "terminal output error");
        }
    })?;

    if !quiet {
        let elapsed = result.duration.as_secs();
        let verb = match result.status {
            evm_launcher::LaunchStatus::Completed => format!("{:>12}", "Finished").bright_green(),
            evm_launcher::LaunchStatus::ProcessFailed(_) => format!("{:>12}", "Failed").bright_red(),
            evm_launcher::LaunchStatus::Terminated => {
                format!("{:>12}", "Terminated").bright_yellow()
            }
        };
        println!(
            "{} `{}` ({}) in {}m{:02}s",
            verb.bold(),
            name,
            result.status,
            elapsed / 60,
            elapsed % 60,
        );
    }

    Ok(result.exit_code)
}

///
/// Initializes the diagnostics subscriber.
///
/// `RUST_LOG` takes precedence over the `--verbose` flag.
///
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
