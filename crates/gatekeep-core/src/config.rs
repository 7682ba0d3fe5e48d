//! Engine configuration.
//!
//! Loaded from TOML, then overridden by `GATEKEEP_*` environment variables,
//! then validated.

use crate::privilege::{is_valid_privilege_for_kind, Privilege};
use crate::securable::SecurableKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_PREFIX: &str = "GATEKEEP_";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Config file path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// File is not valid TOML for this schema
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Environment override could not be applied
    #[error("Invalid value for {key}: {message}")]
    Env {
        /// Environment variable
        key: String,
        /// What was wrong
        message: String,
    },
    /// Semantically invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatekeepConfig {
    /// Catalog a sentinel resolves to when the request names no parent catalog
    pub default_catalog: String,
    /// Audit pipeline settings
    pub audit: AuditConfig,
    /// State seeded at startup
    pub bootstrap: BootstrapConfig,
}

impl Default for GatekeepConfig {
    fn default() -> Self {
        Self {
            default_catalog: "main".to_string(),
            audit: AuditConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

/// Audit pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Write through the background channel writer instead of inline
    pub async_writer: bool,
    /// Mirror every audit record to `tracing`
    pub mirror_to_tracing: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            async_writer: false,
            mirror_to_tracing: true,
        }
    }
}

/// State seeded at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Principals flagged as admins in the grant store
    pub admins: Vec<String>,
    /// Catalogs attached at startup
    pub catalogs: Vec<String>,
    /// Grants issued at startup
    pub grants: Vec<GrantSpec>,
    /// Group memberships recorded at startup
    pub memberships: Vec<MembershipSpec>,
}

/// One `member in group` edge in the bootstrap section. Members may
/// themselves be groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MembershipSpec {
    /// Principal or group joining the group
    pub member: String,
    /// Group name, as used in grants
    pub group: String,
}

/// One grant in the bootstrap section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrantSpec {
    /// Grantee
    pub principal: String,
    /// Securable kind
    pub securable_type: SecurableKind,
    /// Securable id (catalog name for catalogs)
    pub securable_id: String,
    /// Privilege
    pub privilege: Privilege,
}

impl GatekeepConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from file, apply process environment overrides, validate.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.merge_with_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GATEKEEP_*` overrides from the given variables.
    pub fn merge_with_env(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "DEFAULT_CATALOG" => self.default_catalog = value,
                "AUDIT_ASYNC_WRITER" => self.audit.async_writer = parse_bool(&key, &value)?,
                "AUDIT_MIRROR_TO_TRACING" => {
                    self.audit.mirror_to_tracing = parse_bool(&key, &value)?
                }
                "BOOTSTRAP_ADMINS" => {
                    self.bootstrap.admins = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect();
                }
                _ => tracing::debug!(key = %key, "ignoring unknown gatekeep env override"),
            }
        }
        Ok(())
    }

    /// Validate cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_catalog.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_catalog must not be empty".to_string(),
            ));
        }
        for grant in &self.bootstrap.grants {
            if grant.principal.trim().is_empty() || grant.securable_id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "bootstrap grant {} on {} has an empty principal or securable id",
                    grant.privilege, grant.securable_type
                )));
            }
            if !is_valid_privilege_for_kind(grant.securable_type, grant.privilege) {
                return Err(ConfigError::Invalid(format!(
                    "bootstrap grant {} is not valid on a {}",
                    grant.privilege, grant.securable_type
                )));
            }
        }
        for edge in &self.bootstrap.memberships {
            if edge.member.trim().is_empty() || edge.group.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "bootstrap membership has an empty member or group".to_string(),
                ));
            }
            if edge.member == edge.group {
                return Err(ConfigError::Invalid(format!(
                    "group {} cannot be a member of itself",
                    edge.group
                )));
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Env {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
