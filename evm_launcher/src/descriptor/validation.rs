//!
//! The launch descriptor validation error.
//!

use std::path::PathBuf;

///
/// The field-level validation error.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The contract identifier is empty.
    MissingContract,
    /// The method name is empty.
    MissingMethod,
    /// The wallet path is empty.
    MissingWallet,
    /// The wallet file does not exist.
    WalletNotFound(PathBuf),
}

impl Error {
    ///
    /// Joins the errors into a single comma-separated line.
    ///
    pub fn join(errors: &[Self]) -> String {
        errors
            .iter()
            .map(|error| error.to_string())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingContract => write!(f, "contract is not specified"),
            Self::MissingMethod => write!(f, "method is not specified"),
            Self::MissingWallet => write!(f, "wallet path is not specified"),
            Self::WalletNotFound(path) => write!(f, "wallet file {path:?} does not exist"),
        }
    }
}
