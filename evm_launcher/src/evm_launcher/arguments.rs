//!
//! The EVM launcher arguments.
//!

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

/// The environment variable the wallet password can be passed through.
pub const ENV_WALLET_PASSWORD: &str = "EVM_WALLET_PASSWORD";

///
/// The EVM launcher arguments.
///
#[derive(Debug, Parser)]
#[command(about, long_about = None, arg_required_else_help = true)]
pub struct Arguments {
    /// Enables the debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppresses the launcher status output.
    /// The EVM runner output is still forwarded.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the JSON configuration file.
    /// Is set to `./evm-launcher.json` by default, if the file exists.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the descriptor store file.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Whether the wallet passwords are stored: `discard` or `plaintext`.
    #[arg(long, global = true)]
    pub password_policy: Option<evm_launcher::PasswordPolicy>,

    /// Path to the EVM runner executable.
    /// Is set to `evm-runner` by default.
    #[arg(long, global = true)]
    pub evm: Option<PathBuf>,

    /// The EVM database directory passed to the runner.
    #[arg(long, global = true)]
    pub database_directory: Option<PathBuf>,

    /// The subprocess working directory.
    #[arg(long, global = true)]
    pub working_directory: Option<PathBuf>,

    /// The action to perform.
    #[command(subcommand)]
    pub command: Command,
}

///
/// The launcher action.
///
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Saves a launch descriptor under the name, replacing the existing one.
    Save {
        /// The descriptor name.
        name: String,
        /// The descriptor fields.
        #[command(flatten)]
        descriptor: DescriptorArguments,
    },
    /// Prints the stored launch descriptor.
    Show {
        /// The descriptor name.
        name: String,
    },
    /// Prints the stored descriptor names.
    List,
    /// Deletes the stored launch descriptor, if any.
    Delete {
        /// The descriptor name.
        name: String,
    },
    /// Runs the stored launch descriptor.
    Run {
        /// The descriptor name.
        name: String,
        /// The wallet password, replacing the stored one.
        #[arg(long, env = ENV_WALLET_PASSWORD, hide_env_values = true)]
        wallet_password: Option<String>,
    },
    /// Runs a launch descriptor without storing it.
    Exec {
        /// The descriptor fields.
        #[command(flatten)]
        descriptor: DescriptorArguments,
    },
}

///
/// The launch descriptor fields.
///
#[derive(Debug, Args)]
pub struct DescriptorArguments {
    /// The fully-qualified contract identifier.
    #[arg(long)]
    pub contract: String,

    /// The contract method to invoke.
    #[arg(long)]
    pub method: String,

    /// Path to the wallet file.
    #[arg(long)]
    pub wallet_path: PathBuf,

    /// The wallet password.
    #[arg(long, env = ENV_WALLET_PASSWORD, hide_env_values = true)]
    pub wallet_password: Option<String>,
}

impl From<DescriptorArguments> for evm_launcher::Descriptor {
    fn from(arguments: DescriptorArguments) -> Self {
        Self::new(
            arguments.contract,
            arguments.method,
            arguments.wallet_path,
            evm_launcher::Password::new(arguments.wallet_password.unwrap_or_default()),
        )
    }
}
