//! Centralized configuration for dynmount.
//!
//! This module provides the mount-point constants and the registry-wide
//! override policy.

use serde::{Deserialize, Serialize};

use crate::error::{MountError, Result};

/// Mount-point level constants.
pub struct MountConfig;

impl MountConfig {
    /// Name used when a host or a load does not specify one.
    pub const DEFAULT_MOUNT_NAME: &'static str = "default";
}

/// Registry-wide registration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryConfig {
    /// Allow a registration to replace an active handle. Callers must still
    /// request the override explicitly.
    pub allow_override: bool,
    /// Only consulted while `allow_override` is false. When set, a name
    /// collision is an error instead of a logged warning.
    pub throw_on_override_violation: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allow_override: false,
            throw_on_override_violation: true,
        }
    }
}

impl RegistryConfig {
    /// Parse a registry policy from JSON. Missing fields keep their defaults.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: RegistryConfig =
            serde_json::from_str(content).map_err(|e| MountError::Json {
                message: format!("Failed to parse registry config: {}", e),
                source: Some(e),
            })?;
        Ok(config)
    }

    /// Serialize this policy to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
