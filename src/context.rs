// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Context
//!
//! Every component receives an explicit [`Context`] instead of reaching for
//! process globals: the working directory that holds the provisioning
//! document and resource cache, the tunable [`Settings`], and the tenant
//! [`Credentials`] when the remote provider is involved.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::SubnetRange;
use crate::errors::{ProvisionError, ProvisionResult};

/// Environment variables carrying tenant credentials
pub const CREDENTIAL_VARS: [&str; 6] = [
    "OS_USERNAME",
    "OS_PASSWORD",
    "OS_AUTH_URL",
    "OS_TENANT_NAME",
    "OS_TENANT_ID",
    "OS_REGION_NAME",
];

/// Tunable settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Owner prefix for deterministic network resource names
    pub username: String,

    /// Root of the host inventory tree
    pub inventory_root: PathBuf,

    pub site: String,

    pub environment: String,

    /// Substring identifying the external network
    pub floating_network_pattern: String,

    pub primary_cidr: SubnetRange,

    pub mgmt_cidr: SubnetRange,

    /// Pause between subnet creation and router attachment, in seconds
    pub propagation_delay_secs: u64,

    pub default_flavor: String,

    pub default_image: String,

    /// File name of the provisioning document inside the working directory
    pub document_name: String,

    /// File name of the append-only resource id cache
    pub cache_name: String,

    /// Shell provisioner script referenced from local VM blocks
    pub provision_script: String,

    /// Guest path the working directory is synced to
    pub synced_folder: String,

    pub vagrant_bin: String,

    pub openstack_bin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: "cim".to_string(),
            inventory_root: PathBuf::from("inventory"),
            site: "default".to_string(),
            environment: "dev".to_string(),
            floating_network_pattern: "public-floating".to_string(),
            primary_cidr: SubnetRange::from_network(Ipv4Addr::new(10, 0, 20, 0), 24),
            mgmt_cidr: SubnetRange::from_network(Ipv4Addr::new(10, 0, 30, 0), 24),
            propagation_delay_secs: 2,
            default_flavor: "m1.medium".to_string(),
            default_image: "CentOS-7-x86_64".to_string(),
            document_name: "Vagrantfile".to_string(),
            cache_name: ".infra-resources".to_string(),
            provision_script: "scripts/provision.sh".to_string(),
            synced_folder: "/srv/provisioning".to_string(),
            vagrant_bin: "vagrant".to_string(),
            openstack_bin: "openstack".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `INFRA_*` environment variables over the defaults
    pub fn from_env() -> ProvisionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> ProvisionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(username) = lookup("INFRA_USERNAME").or_else(|| lookup("OS_USERNAME")) {
            settings.username = username;
        }
        if let Some(root) = lookup("INFRA_INVENTORY") {
            settings.inventory_root = PathBuf::from(root);
        }
        if let Some(site) = lookup("INFRA_SITE") {
            settings.site = site;
        }
        if let Some(environment) = lookup("INFRA_ENVIRONMENT") {
            settings.environment = environment;
        }
        if let Some(pattern) = lookup("INFRA_FLOATING_NETWORK") {
            settings.floating_network_pattern = pattern;
        }
        if let Some(cidr) = lookup("INFRA_PRIMARY_CIDR") {
            settings.primary_cidr = parse_cidr("INFRA_PRIMARY_CIDR", &cidr)?;
        }
        if let Some(cidr) = lookup("INFRA_MGMT_CIDR") {
            settings.mgmt_cidr = parse_cidr("INFRA_MGMT_CIDR", &cidr)?;
        }
        if let Some(delay) = lookup("INFRA_PROPAGATION_DELAY") {
            settings.propagation_delay_secs = delay.parse().map_err(|_| {
                ProvisionError::Configuration(format!(
                    "INFRA_PROPAGATION_DELAY must be whole seconds, got {}",
                    delay
                ))
            })?;
        }
        if let Some(flavor) = lookup("INFRA_DEFAULT_FLAVOR") {
            settings.default_flavor = flavor;
        }
        if let Some(image) = lookup("INFRA_DEFAULT_IMAGE") {
            settings.default_image = image;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> ProvisionResult<()> {
        if self.username.trim().is_empty() {
            return Err(ProvisionError::Configuration(
                "username for resource naming is empty".to_string(),
            ));
        }
        if self.primary_cidr == self.mgmt_cidr {
            return Err(ProvisionError::Configuration(format!(
                "primary and mgmt networks share CIDR {}",
                self.primary_cidr
            )));
        }
        Ok(())
    }

    pub fn propagation_delay(&self) -> Duration {
        Duration::from_secs(self.propagation_delay_secs)
    }

    /// Directory holding one YAML file per host
    pub fn hosts_dir(&self) -> PathBuf {
        self.inventory_root
            .join(&self.site)
            .join(&self.environment)
            .join("hosts.d")
    }
}

fn parse_cidr(var: &str, value: &str) -> ProvisionResult<SubnetRange> {
    SubnetRange::new(value).map_err(|e| ProvisionError::Configuration(format!("{}: {}", var, e)))
}

/// Tenant credentials for the remote provider
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub auth_url: String,
    pub tenant_name: String,
    pub tenant_id: String,
    pub region: String,
}

impl Credentials {
    /// Read all `OS_*` variables; every one of them is required
    pub fn from_env() -> ProvisionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ProvisionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing: Vec<&str> = CREDENTIAL_VARS
            .iter()
            .copied()
            .filter(|var| lookup(var).map_or(true, |v| v.is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(ProvisionError::Configuration(format!(
                "missing credentials: {}",
                missing.join(", ")
            )));
        }

        let get = |key: &str| lookup(key).unwrap_or_default();
        Ok(Self {
            username: get("OS_USERNAME"),
            password: get("OS_PASSWORD"),
            auth_url: get("OS_AUTH_URL"),
            tenant_name: get("OS_TENANT_NAME"),
            tenant_id: get("OS_TENANT_ID"),
            region: get("OS_REGION_NAME"),
        })
    }

    /// `(variable, value)` pairs for child process environments
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        [
            ("OS_USERNAME", &self.username),
            ("OS_PASSWORD", &self.password),
            ("OS_AUTH_URL", &self.auth_url),
            ("OS_TENANT_NAME", &self.tenant_name),
            ("OS_TENANT_ID", &self.tenant_id),
            ("OS_REGION_NAME", &self.region),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("tenant_name", &self.tenant_name)
            .field("tenant_id", &self.tenant_id)
            .field("region", &self.region)
            .finish()
    }
}

/// Per-invocation context passed to every component
#[derive(Debug, Clone)]
pub struct Context {
    pub workdir: PathBuf,
    pub settings: Settings,
    pub credentials: Option<Credentials>,
}

impl Context {
    pub fn new(workdir: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            workdir: workdir.into(),
            settings,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn document_path(&self) -> PathBuf {
        self.workdir.join(&self.settings.document_name)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.workdir.join(&self.settings.cache_name)
    }

    /// Credentials, or a configuration error when the remote path needs them
    pub fn credentials(&self) -> ProvisionResult<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            ProvisionError::Configuration(format!(
                "remote provider requires {}",
                CREDENTIAL_VARS.join(", ")
            ))
        })
    }

    /// Credential env pairs, empty when none are loaded
    pub fn credential_env(&self) -> Vec<(String, String)> {
        self.credentials
            .as_ref()
            .map(Credentials::env_pairs)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.hosts_dir(),
            PathBuf::from("inventory/default/dev/hosts.d")
        );
    }

    #[test]
    fn test_settings_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("OS_USERNAME", "alice"),
            ("INFRA_SITE", "lab"),
            ("INFRA_PRIMARY_CIDR", "10.9.0.0/24"),
            ("INFRA_PROPAGATION_DELAY", "0"),
        ]))
        .unwrap();
        assert_eq!(settings.username, "alice");
        assert_eq!(settings.site, "lab");
        assert_eq!(settings.primary_cidr.to_string(), "10.9.0.0/24");
        assert_eq!(settings.propagation_delay(), Duration::ZERO);
    }

    #[test]
    fn test_settings_reject_shared_cidr() {
        let result = Settings::from_lookup(lookup(&[
            ("INFRA_PRIMARY_CIDR", "10.0.30.0/24"),
        ]));
        assert!(matches!(result, Err(ProvisionError::Configuration(_))));
    }

    #[test]
    fn test_settings_reject_bad_delay() {
        let result = Settings::from_lookup(lookup(&[("INFRA_PROPAGATION_DELAY", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_require_every_variable() {
        let err = Credentials::from_lookup(lookup(&[
            ("OS_USERNAME", "alice"),
            ("OS_PASSWORD", "secret"),
        ]))
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("OS_AUTH_URL"));
        assert!(message.contains("OS_REGION_NAME"));
        assert!(!message.contains("OS_PASSWORD"));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let pairs: Vec<(&str, &str)> = CREDENTIAL_VARS.iter().map(|v| (*v, "value")).collect();
        let creds = Credentials::from_lookup(lookup(&pairs)).unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("<redacted>"));
        assert_eq!(creds.env_pairs().len(), 6);
    }

    #[test]
    fn test_context_paths() {
        let ctx = Context::new("/work", Settings::default());
        assert_eq!(ctx.document_path(), PathBuf::from("/work/Vagrantfile"));
        assert_eq!(ctx.cache_path(), PathBuf::from("/work/.infra-resources"));
        assert!(ctx.credentials().is_err());
        assert!(ctx.credential_env().is_empty());
    }
}
