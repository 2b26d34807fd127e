//!
//! The wallet password.
//!

use serde::Deserialize;
use serde::Serialize;

///
/// The wallet password.
///
/// Formatting never reveals the value. The only way to read it is [`Password::expose`],
/// which is called when the runner builds the subprocess arguments.
///
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// The placeholder printed instead of the value.
    pub const REDACTED: &'static str = "<redacted>";

    ///
    /// A shortcut constructor.
    ///
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    ///
    /// Returns the secret value.
    ///
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    ///
    /// Whether the password is empty.
    ///
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Self::REDACTED)
    }
}

impl std::fmt::Display for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Self::REDACTED)
    }
}
