//! Signing Configuration
//!
//! Domain parameters and logging switches for the authentication flow:
//! - chain presets (Polygon mainnet, Amoy testnet)
//! - environment overrides
//! - runtime updates with validation warnings

use std::sync::RwLock;

use crate::eip712::{ClobAuth, Eip712Domain, CLOB_AUTH_MESSAGE, CLOB_DOMAIN_NAME, CLOB_DOMAIN_VERSION};
use crate::error::{AuthError, AuthResult};
use crate::types::Address;
use crate::utils::logging;
use crate::{log_error, log_warn};

/// Polygon mainnet chain id
pub const POLYGON: u64 = 137;

/// Polygon Amoy testnet chain id
pub const AMOY: u64 = 80002;

/// Environment variable overriding the chain id
pub const ENV_CHAIN_ID: &str = "CLOB_CHAIN_ID";
/// Environment variable overriding the domain name
pub const ENV_DOMAIN_NAME: &str = "CLOB_AUTH_DOMAIN";
/// Environment variable overriding the domain version
pub const ENV_DOMAIN_VERSION: &str = "CLOB_AUTH_VERSION";
/// Environment variable enabling debug logging
pub const ENV_DEBUG: &str = "CLOB_AUTH_DEBUG";

/// Chain presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Polygon,
    Amoy,
    Custom(u64),
}

impl Chain {
    pub fn chain_id(self) -> u64 {
        match self {
            Chain::Polygon => POLYGON,
            Chain::Amoy => AMOY,
            Chain::Custom(id) => id,
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Self {
        match chain_id {
            POLYGON => Chain::Polygon,
            AMOY => Chain::Amoy,
            other => Chain::Custom(other),
        }
    }
}

/// Signing settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// EIP-712 domain name
    pub domain_name: String,
    /// EIP-712 domain version
    pub domain_version: String,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Attestation text placed in every ClobAuth message
    pub attestation: String,
    /// Redact sensitive data in logs
    pub redact_logs: bool,
    /// Emit debug-level log entries
    pub debug_logging: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self::for_chain(Chain::Polygon)
    }
}

impl AuthSettings {
    /// Preset for a chain
    pub fn for_chain(chain: Chain) -> Self {
        Self {
            domain_name: CLOB_DOMAIN_NAME.to_string(),
            domain_version: CLOB_DOMAIN_VERSION.to_string(),
            chain_id: chain.chain_id(),
            attestation: CLOB_AUTH_MESSAGE.to_string(),
            redact_logs: true,
            debug_logging: false,
        }
    }

    pub fn chain(&self) -> Chain {
        Chain::from_chain_id(self.chain_id)
    }

    /// Defaults overlaid with `CLOB_*` environment variables
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup(ENV_CHAIN_ID) {
            settings.chain_id = raw.trim().parse().map_err(|_| {
                AuthError::Config(format!("{} is not a chain id: {:?}", ENV_CHAIN_ID, raw))
            })?;
        }
        if let Some(name) = lookup(ENV_DOMAIN_NAME) {
            settings.domain_name = name;
        }
        if let Some(version) = lookup(ENV_DOMAIN_VERSION) {
            settings.domain_version = version;
        }
        if let Some(flag) = lookup(ENV_DEBUG) {
            settings.debug_logging = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(settings)
    }

    /// The signing domain these settings describe
    pub fn domain(&self) -> Eip712Domain {
        Eip712Domain::new(self.domain_name.clone(), self.domain_version.clone(), self.chain_id)
    }

    /// The ClobAuth message these settings sign and verify
    pub fn clob_auth(&self, address: Address, timestamp: impl Into<String>, nonce: u64) -> ClobAuth {
        ClobAuth::new(address, timestamp, nonce).with_message(self.attestation.clone())
    }

    /// Push the logging switches into the global logger
    pub fn apply_logging(&self) {
        if self.debug_logging {
            logging::enable_debug();
        } else {
            logging::disable_debug();
        }
        logging::set_redaction(self.redact_logs);
    }

    /// Validate settings consistency
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.domain_name.is_empty() {
            warnings.push("Warning: Empty domain name".to_string());
        }

        if self.chain_id == 0 {
            warnings.push("Warning: Chain id 0 is not replay-protected".to_string());
        }

        if self.attestation != CLOB_AUTH_MESSAGE {
            warnings.push(
                "Warning: Non-standard attestation text will not verify server-side".to_string()
            );
        }

        if !self.redact_logs && self.debug_logging {
            warnings.push(
                "Warning: Debug logging enabled without log redaction".to_string()
            );
        }

        warnings
    }
}

/// Shared, runtime-updatable settings
pub struct AuthConfig {
    config: RwLock<AuthSettings>,
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::with_settings(AuthSettings::default())
    }

    pub fn with_settings(settings: AuthSettings) -> Self {
        Self {
            config: RwLock::new(settings),
        }
    }

    /// Get current settings
    pub fn settings(&self) -> AuthSettings {
        self.config.read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Update settings, returning validation warnings
    pub fn update<F>(&self, updater: F) -> Vec<String>
    where
        F: FnOnce(&mut AuthSettings),
    {
        let Ok(mut config) = self.config.write() else {
            log_error!("config", "Settings lock poisoned, update dropped");
            return vec!["Failed to acquire config lock".to_string()];
        };
        updater(&mut config);

        let warnings = config.validate();
        for warning in &warnings {
            log_warn!("config", "Settings updated with warning", detail = warning);
        }
        warnings
    }

    /// Current signing domain
    pub fn domain(&self) -> Eip712Domain {
        self.settings().domain()
    }

    pub fn chain_id(&self) -> u64 {
        self.config.read()
            .map(|c| c.chain_id)
            .unwrap_or(POLYGON)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}
