//!
//! The launcher configuration file.
//!

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::runner::config::Config as RunnerConfig;
use crate::store::password_policy::PasswordPolicy;

///
/// The descriptor store section.
///
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// The store file path.
    pub path: PathBuf,
    /// The password persistence policy.
    pub password_policy: PasswordPolicy,
}

impl StoreConfig {
    /// The default store file path.
    pub const DEFAULT_PATH: &'static str = "./evm-launcher-store.json";
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(Self::DEFAULT_PATH),
            password_policy: PasswordPolicy::default(),
        }
    }
}

///
/// The launcher configuration file.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The process runner section.
    pub runner: RunnerConfig,
    /// The descriptor store section.
    pub store: StoreConfig,
}

impl Config {
    /// The default configuration file path.
    pub const DEFAULT_PATH: &'static str = "./evm-launcher.json";
}

impl TryFrom<&Path> for Config {
    type Error = anyhow::Error;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let data = std::fs::read_to_string(path)
            .map_err(|error| anyhow::anyhow!("Configuration file {path:?} reading: {error}"))?;
        let config = serde_json::from_str(data.as_str())
            .map_err(|error| anyhow::anyhow!("Configuration file {path:?} parsing: {error}"))?;
        Ok(config)
    }
}
