//!
//! The launch descriptor.
//!

pub mod password;
pub mod validation;

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use self::password::Password;
use self::validation::Error as ValidationError;

///
/// The launch descriptor.
///
/// The minimal data needed to start one run session. Descriptors are immutable:
/// a changed descriptor is a new value saved over the old one.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// The fully-qualified contract identifier.
    contract: String,
    /// The method to invoke.
    method: String,
    /// The wallet file path.
    wallet_path: PathBuf,
    /// The wallet password.
    #[serde(default, skip_serializing_if = "Password::is_empty")]
    wallet_password: Password,
}

impl Descriptor {
    ///
    /// A shortcut constructor.
    ///
    /// Nothing is checked here. The wallet file may be created after the descriptor.
    ///
    pub fn new(
        contract: impl Into<String>,
        method: impl Into<String>,
        wallet_path: impl Into<PathBuf>,
        wallet_password: Password,
    ) -> Self {
        Self {
            contract: contract.into(),
            method: method.into(),
            wallet_path: wallet_path.into(),
            wallet_password,
        }
    }

    ///
    /// Returns a copy with the password replaced.
    ///
    pub fn with_password(&self, wallet_password: Password) -> Self {
        Self {
            wallet_password,
            ..self.clone()
        }
    }

    ///
    /// Returns a copy without the password.
    ///
    pub fn without_password(&self) -> Self {
        self.with_password(Password::default())
    }

    pub fn contract(&self) -> &str {
        self.contract.as_str()
    }

    pub fn method(&self) -> &str {
        self.method.as_str()
    }

    pub fn wallet_path(&self) -> &Path {
        self.wallet_path.as_path()
    }

    pub fn wallet_password(&self) -> &Password {
        &self.wallet_password
    }

    ///
    /// Checks the descriptor and returns every problem found.
    ///
    /// An empty vector means the descriptor can be launched. The wallet existence is only
    /// probed once the path itself is present.
    ///
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::with_capacity(3);
        if self.contract.trim().is_empty() {
            errors.push(ValidationError::MissingContract);
        }
        if self.method.trim().is_empty() {
            errors.push(ValidationError::MissingMethod);
        }
        if self.wallet_path.as_os_str().to_string_lossy().trim().is_empty() {
            errors.push(ValidationError::MissingWallet);
        } else if !self.wallet_path.exists() {
            errors.push(ValidationError::WalletNotFound(self.wallet_path.clone()));
        }
        errors
    }
}
