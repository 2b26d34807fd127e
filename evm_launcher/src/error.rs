//!
//! The launcher error.
//!

use std::path::PathBuf;

use crate::descriptor::validation::Error as ValidationError;

///
/// The launcher error.
///
/// None of the variants carries the wallet password, so every error is safe to print.
///
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The descriptor did not pass validation.
    #[error("Invalid launch descriptor: {}", ValidationError::join(.0.as_slice()))]
    InvalidDescriptor(Vec<ValidationError>),
    /// No descriptor is stored under the name.
    #[error("Launch descriptor `{0}` not found")]
    NotFound(String),
    /// The wallet file does not exist at launch time.
    #[error("Wallet file {0:?} not found")]
    WalletNotFound(PathBuf),
    /// The runner executable could not be started.
    #[error("The {executable:?} subprocess spawning error: {error}")]
    ProcessSpawn {
        /// The executable name or path.
        executable: PathBuf,
        /// The underlying error.
        error: std::io::Error,
    },
    /// The descriptor name is empty.
    #[error("Launch descriptor name must not be empty")]
    InvalidName,
    /// Reading or writing the store file failed.
    #[error("Descriptor store {path:?} I/O error: {error}")]
    Store {
        /// The store file path.
        path: PathBuf,
        /// The underlying error.
        error: std::io::Error,
    },
    /// The store file is malformed.
    #[error("Descriptor store {path:?} parsing error: {error}")]
    StoreFormat {
        /// The store file path.
        path: PathBuf,
        /// The underlying error.
        error: serde_json::Error,
    },
    /// Waiting for the subprocess failed.
    #[error("The subprocess I/O error: {0}")]
    Io(#[from] std::io::Error),
}
