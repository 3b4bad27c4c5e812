// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host Catalog
//!
//! Source of [`HostDescriptor`] records. The YAML catalog reads one file per
//! host from `<inventory>/<site>/<environment>/hosts.d/<hostname>.yaml`:
//!
//! ```yaml
//! role: infra
//! domain: example.com
//! ip: 10.0.20.11
//! mac: "52:54:00:1a:2b:3c"
//! memory: 2048
//! box: centos/7
//! deploy_args:
//!   image: CentOS-7-x86_64
//!   flavor: m1.medium
//! groups: [infra]
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::debug;

use crate::domain::{DeployArgs, HostDescriptor, Hostname, MacAddress};
use crate::errors::{ProvisionError, ProvisionResult};

/// Lookup of static host descriptions
#[async_trait]
pub trait HostCatalog: Send + Sync {
    /// Descriptor for `hostname`
    ///
    /// # Errors
    /// `HostNotFound` when no record exists, `Catalog` when it cannot be read.
    async fn get(&self, hostname: &Hostname) -> ProvisionResult<HostDescriptor>;
}

/// On-disk record; the hostname comes from the file name
#[derive(Debug, Deserialize)]
struct HostRecord {
    role: String,
    domain: String,
    ip: IpAddr,
    mac: MacAddress,
    memory: u32,
    #[serde(rename = "box", default)]
    box_name: Option<String>,
    #[serde(default)]
    deploy_args: DeployArgs,
    groups: Vec<String>,
    #[serde(default)]
    profile: Option<String>,
    #[serde(default)]
    security_groups: Vec<String>,
}

impl HostRecord {
    fn into_descriptor(self, hostname: Hostname) -> ProvisionResult<HostDescriptor> {
        let has_image = self.deploy_args.image.is_some() || self.deploy_args.flavor.is_some();
        if self.box_name.is_none() && !has_image {
            return Err(ProvisionError::Catalog {
                hostname: hostname.to_string(),
                reason: "record needs `box` or `deploy_args`".to_string(),
            });
        }

        Ok(HostDescriptor {
            hostname,
            role: self.role,
            domain: self.domain,
            ip: self.ip,
            mac: self.mac,
            memory: self.memory,
            box_name: self.box_name,
            deploy_args: self.deploy_args,
            groups: self.groups,
            profile: self.profile,
            security_groups: self.security_groups,
        })
    }
}

/// Catalog backed by a `hosts.d` directory of YAML files
#[derive(Debug, Clone)]
pub struct YamlHostCatalog {
    hosts_dir: PathBuf,
}

impl YamlHostCatalog {
    pub fn new(hosts_dir: impl Into<PathBuf>) -> Self {
        Self {
            hosts_dir: hosts_dir.into(),
        }
    }

    pub fn record_path(&self, hostname: &Hostname) -> PathBuf {
        self.hosts_dir.join(format!("{}.yaml", hostname))
    }
}

#[async_trait]
impl HostCatalog for YamlHostCatalog {
    async fn get(&self, hostname: &Hostname) -> ProvisionResult<HostDescriptor> {
        let path = self.record_path(hostname);
        let catalog_error = |reason: String| ProvisionError::Catalog {
            hostname: hostname.to_string(),
            reason,
        };

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProvisionError::HostNotFound(hostname.to_string()));
            }
            Err(e) => return Err(catalog_error(format!("{}: {}", path.display(), e))),
        };

        let record: HostRecord = serde_yaml::from_str(&text)
            .map_err(|e| catalog_error(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded host record {}", path.display());
        record.into_descriptor(hostname.clone())
    }
}

/// Catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryHostCatalog {
    hosts: HashMap<Hostname, HostDescriptor>,
}

impl InMemoryHostCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, descriptor: HostDescriptor) -> Self {
        self.hosts.insert(descriptor.hostname.clone(), descriptor);
        self
    }
}

#[async_trait]
impl HostCatalog for InMemoryHostCatalog {
    async fn get(&self, hostname: &Hostname) -> ProvisionResult<HostDescriptor> {
        self.hosts
            .get(hostname)
            .cloned()
            .ok_or_else(|| ProvisionError::HostNotFound(hostname.to_string()))
    }
}
