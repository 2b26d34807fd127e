//!
//! The EVM launcher library.
//!

pub(crate) mod config;
pub(crate) mod descriptor;
pub(crate) mod error;
pub(crate) mod registry;
pub(crate) mod runner;
pub(crate) mod store;

pub use self::config::Config;
pub use self::config::StoreConfig;
pub use self::descriptor::password::Password;
pub use self::descriptor::validation::Error as ValidationError;
pub use self::descriptor::Descriptor;
pub use self::error::Error;
pub use self::registry::Registry;
pub use self::runner::config::Config as RunnerConfig;
pub use self::runner::launch::Canceller;
pub use self::runner::launch::Launch;
pub use self::runner::output::Chunk as OutputChunk;
pub use self::runner::output::Stream as OutputStream;
pub use self::runner::result::LaunchResult;
pub use self::runner::result::Status as LaunchStatus;
pub use self::runner::Runner;
pub use self::store::password_policy::PasswordPolicy;
pub use self::store::Store;

/// The successful exit code.
pub const EXIT_CODE_SUCCESS: i32 = 0;

/// The generic failure exit code.
pub const EXIT_CODE_FAILURE: i32 = 1;
