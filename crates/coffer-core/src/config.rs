//! Treasury configuration.
//!
//! Handles loading and validation of the configuration from TOML files.

use coffer_types::{Address, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Three days, the default voting window.
pub const DEFAULT_VOTING_DURATION_SECS: u64 = 3 * 24 * 60 * 60;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CofferConfig {
    /// Initial administrators
    pub admins: Vec<Address>,
    /// Governance parameters
    #[serde(default)]
    pub governance: GovernanceConfig,
    /// Treasury ledger configuration
    #[serde(default)]
    pub treasury: TreasuryConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CofferConfig {
    pub fn with_admins(admins: impl IntoIterator<Item = Address>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
            governance: GovernanceConfig::default(),
            treasury: TreasuryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from file.
    /// Path is validated to prevent directory traversal.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if path.to_string_lossy().contains("..") {
            anyhow::bail!("Invalid path: directory traversal detected");
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config = Self::from_toml_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: CofferConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        if path.to_string_lossy().contains("..") {
            anyhow::bail!("Invalid path: directory traversal detected");
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|e| anyhow::anyhow!("Failed to write config file '{}': {}", path.display(), e))?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.admins.iter().all(Address::is_zero) {
            anyhow::bail!("At least one non-zero administrator is required");
        }

        if u64::from(self.governance.quorum_bps) > BPS_DENOMINATOR {
            anyhow::bail!(
                "Quorum {} bps exceeds {} bps",
                self.governance.quorum_bps,
                BPS_DENOMINATOR
            );
        }

        if self.governance.voting_duration_secs == 0 {
            anyhow::bail!("Voting duration cannot be 0");
        }

        if self.governance.max_options < 2 {
            anyhow::bail!("A proposal needs room for at least 2 options");
        }

        if self.treasury.executor.is_some_and(|e| e.is_zero()) {
            anyhow::bail!("Executor address cannot be zero");
        }

        Ok(())
    }
}

/// Governance parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Voting window length in seconds
    pub voting_duration_secs: u64,
    /// Quorum as basis points of the member count snapshot
    pub quorum_bps: u16,
    /// Initial member count snapshot for quorum arithmetic
    pub member_count: u64,
    /// Maximum number of options on a proposal
    pub max_options: u32,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            voting_duration_secs: DEFAULT_VOTING_DURATION_SECS,
            quorum_bps: 5_000, // 50%
            member_count: 0,
            max_options: 16,
        }
    }
}

/// Treasury ledger configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasuryConfig {
    /// Address of the execution coordinator; derived when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor: Option<Address>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level / `EnvFilter` directive
    pub level: String,
    /// Log format (json|pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}
