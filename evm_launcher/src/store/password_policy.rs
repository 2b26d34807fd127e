//!
//! The wallet password persistence policy.
//!

use serde::Deserialize;

///
/// The wallet password persistence policy.
///
/// Storing secrets in plaintext is a deployment decision, so it must be opted in.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordPolicy {
    /// The password is dropped before writing and must be supplied at run time.
    #[default]
    Discard,
    /// The password is written as is.
    Plaintext,
}

impl std::str::FromStr for PasswordPolicy {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string.to_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "plaintext" => Ok(Self::Plaintext),
            string => anyhow::bail!(
                "Unknown password policy `{}`. Supported policies: {}",
                string,
                [Self::Discard, Self::Plaintext]
                    .into_iter()
                    .map(|element| element.to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
        }
    }
}

impl std::fmt::Display for PasswordPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repr = match self {
            Self::Discard => "discard",
            Self::Plaintext => "plaintext",
        };
        f.write_str(repr)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::PasswordPolicy;

    #[test]
    fn parse() {
        assert_eq!(
            PasswordPolicy::from_str("Plaintext").expect("Always valid"),
            PasswordPolicy::Plaintext
        );
        assert_eq!(
            PasswordPolicy::from_str("discard").expect("Always valid"),
            PasswordPolicy::Discard
        );
        assert!(PasswordPolicy::from_str("keychain").is_err());
    }
}
