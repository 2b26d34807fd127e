//!
//! The process runner configuration.
//!

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

use serde::Deserialize;

///
/// The process runner configuration.
///
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The EVM runner executable name or path.
    pub executable: PathBuf,
    /// The arguments passed before the descriptor ones.
    pub arguments: Vec<String>,
    /// The subprocess working directory.
    pub working_directory: Option<PathBuf>,
    /// The extra subprocess environment variables.
    pub environment: BTreeMap<String, String>,
    /// The EVM database directory, passed as the first argument `-Devm.database.dir=<path>`.
    pub database_directory: Option<PathBuf>,
}

impl Config {
    /// The default EVM runner executable name.
    pub const DEFAULT_EXECUTABLE_NAME: &'static str = "evm-runner";

    /// The runner property the database directory is passed through.
    pub const DATABASE_DIRECTORY_PROPERTY: &'static str = "evm.database.dir";

    ///
    /// A shortcut constructor.
    ///
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            ..Self::default()
        }
    }

    ///
    /// Sets the arguments passed before the descriptor ones.
    ///
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    ///
    /// Returns the database directory argument, if the directory is set.
    ///
    pub fn database_directory_argument(&self) -> Option<OsString> {
        let directory = self.database_directory.as_ref()?;
        let mut argument = OsString::from(format!("-D{}=", Self::DATABASE_DIRECTORY_PROPERTY));
        argument.push(directory.as_os_str());
        Some(argument)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(Self::DEFAULT_EXECUTABLE_NAME),
            arguments: vec![],
            working_directory: None,
            environment: BTreeMap::new(),
            database_directory: None,
        }
    }
}
