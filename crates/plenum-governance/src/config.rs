//! Deployment configuration.
//!
//! Handles loading and validation of governor and token parameters from
//! TOML files. Token amounts are written as decimal strings because they
//! routinely exceed the 64-bit integers TOML can represent.

use plenum_types::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Voting period used when none is configured (about a week of 12s blocks).
pub const DEFAULT_VOTING_PERIOD: u64 = 50_400;
/// Heights between proposal creation and the opening of the vote.
pub const DEFAULT_VOTING_DELAY: u64 = 1;
/// Quorum in percentage points of total supply.
pub const DEFAULT_QUORUM_NUMERATOR: u128 = 4;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Governor parameters, fixed per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Governor name
    pub name: String,
    /// Heights between creation and the opening of the vote
    pub voting_delay: u64,
    /// Heights the vote stays open
    pub voting_period: u64,
    /// Quorum numerator over a denominator of 100
    #[serde(with = "amount")]
    pub quorum_numerator: u128,
    /// Minimum past votes needed to propose
    #[serde(with = "amount")]
    pub proposal_threshold: u128,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            name: "PlenumGovernor".to_string(),
            voting_delay: DEFAULT_VOTING_DELAY,
            voting_period: DEFAULT_VOTING_PERIOD,
            quorum_numerator: DEFAULT_QUORUM_NUMERATOR,
            proposal_threshold: 0,
        }
    }
}

/// Governance token parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Supply minted at deployment
    #[serde(with = "amount")]
    pub initial_supply: u128,
    /// Receiver of the initial supply
    pub initial_recipient: Option<Address>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "PlenumToken".to_string(),
            symbol: "PLM".to_string(),
            decimals: 18,
            initial_supply: 1_000 * 10u128.pow(18),
            initial_recipient: Some(Address::from_label("deployer")),
        }
    }
}

/// Complete deployment configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub governor: GovernorConfig,
    pub token: TokenConfig,
}

impl DeploymentConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from file.
    /// Path is validated to prevent directory traversal.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        reject_traversal(path)?;
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Save configuration to file.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        reject_traversal(path)?;
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.governor.voting_period == 0 {
            return Err(ConfigError::Invalid("voting_period cannot be 0".to_string()));
        }

        if self.governor.quorum_numerator > crate::tally::QUORUM_DENOMINATOR {
            return Err(ConfigError::Invalid(format!(
                "quorum_numerator {} exceeds denominator {}",
                self.governor.quorum_numerator,
                crate::tally::QUORUM_DENOMINATOR
            )));
        }

        if self.token.initial_supply > 0 {
            match self.token.initial_recipient {
                None => {
                    return Err(ConfigError::Invalid(
                        "initial_supply requires initial_recipient".to_string(),
                    ))
                }
                Some(recipient) if recipient.is_zero() => {
                    return Err(ConfigError::Invalid(
                        "initial_recipient cannot be the null account".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }

        if self.token.symbol.is_empty() {
            return Err(ConfigError::Invalid("token symbol cannot be empty".to_string()));
        }

        Ok(())
    }
}

fn reject_traversal(path: &Path) -> Result<(), ConfigError> {
    let path_str = path.to_string_lossy();
    if path_str.contains("..") {
        return Err(ConfigError::InvalidPath(format!(
            "directory traversal detected in '{}'",
            path_str
        )));
    }
    Ok(())
}

/// `u128` as a decimal string, also accepting plain integers on input.
pub mod amount {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Int(v) => Ok(v as u128),
            Repr::Text(s) => s
                .replace('_', "")
                .parse::<u128>()
                .map_err(serde::de::Error::custom),
        }
    }
}
