// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed VM block records
//!
//! A [`VmBlock`] is built from a [`HostDescriptor`] plus [`ProviderInfo`],
//! validated, and only then handed to the renderer. Nothing here produces
//! document text.

use std::net::IpAddr;

use crate::context::Settings;
use crate::domain::{HostDescriptor, Hostname, Location, MacAddress, SubnetRange};
use crate::errors::{ProvisionError, ProvisionResult};
use crate::network::NetworkTopology;

/// Provider the block is written for
#[derive(Debug, Clone, Copy)]
pub enum ProviderInfo<'a> {
    Local,
    /// Remote blocks reference the bootstrapped tenant network
    Remote(&'a NetworkTopology),
}

impl ProviderInfo<'_> {
    pub fn location(&self) -> Location {
        match self {
            ProviderInfo::Local => Location::Local,
            ProviderInfo::Remote(_) => Location::Remote,
        }
    }
}

/// Values a block falls back to when the host record leaves them out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDefaults {
    pub flavor: String,
    pub image: String,
    pub provision_script: String,
    pub synced_folder: String,
}

impl BlockDefaults {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            flavor: settings.default_flavor.clone(),
            image: settings.default_image.clone(),
            provision_script: settings.provision_script.clone(),
            synced_folder: settings.synced_folder.clone(),
        }
    }
}

/// Shell provisioner invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioner {
    pub script: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBlock {
    pub box_name: String,
    pub ip: IpAddr,
    pub mac: MacAddress,
    pub memory: u32,
    /// `(host path, guest path)`
    pub synced_folder: (String, String),
}

/// Network attachment on a remote VM; the mgmt network carries no address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRef {
    pub name: String,
    pub address: Option<IpAddr>,
    pub cidr: SubnetRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBlock {
    pub flavor: String,
    pub image: String,
    pub floating_ip_pool: String,
    pub networks: Vec<NetworkRef>,
    pub security_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockBody {
    Local(LocalBlock),
    Remote(RemoteBlock),
}

/// One `config.vm.define` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmBlock {
    pub hostname: Hostname,
    pub fqdn: String,
    pub provisioner: Provisioner,
    pub body: BlockBody,
}

impl VmBlock {
    /// Assemble the block for `descriptor`; the result is not yet validated
    pub fn build(
        descriptor: &HostDescriptor,
        provider: ProviderInfo<'_>,
        defaults: &BlockDefaults,
    ) -> Self {
        let body = match provider {
            ProviderInfo::Local => BlockBody::Local(LocalBlock {
                box_name: descriptor.box_name.clone().unwrap_or_default(),
                ip: descriptor.ip,
                mac: descriptor.mac,
                memory: descriptor.memory,
                synced_folder: (".".to_string(), defaults.synced_folder.clone()),
            }),
            ProviderInfo::Remote(topology) => {
                let deploy = &descriptor.deploy_args;
                let mut security_groups: Vec<String> = Vec::new();
                for group in topology
                    .security_group_names()
                    .into_iter()
                    .chain(descriptor.security_groups.iter().map(String::as_str))
                {
                    if !security_groups.iter().any(|g| g == group) {
                        security_groups.push(group.to_string());
                    }
                }

                BlockBody::Remote(RemoteBlock {
                    flavor: deploy.flavor.clone().unwrap_or_else(|| defaults.flavor.clone()),
                    image: deploy.image.clone().unwrap_or_else(|| defaults.image.clone()),
                    floating_ip_pool: topology.floating_network_name().to_string(),
                    networks: vec![
                        NetworkRef {
                            name: topology.mgmt.network.name.clone(),
                            address: None,
                            cidr: topology.mgmt.cidr,
                        },
                        NetworkRef {
                            name: topology.primary.network.name.clone(),
                            address: Some(descriptor.ip),
                            cidr: topology.primary.cidr,
                        },
                    ],
                    security_groups,
                })
            }
        };

        Self {
            hostname: descriptor.hostname.clone(),
            fqdn: descriptor.fqdn(),
            provisioner: Provisioner {
                script: defaults.provision_script.clone(),
                args: vec![descriptor.role.clone(), descriptor.profile_or_role().to_string()],
            },
            body,
        }
    }

    pub fn location(&self) -> Location {
        match self.body {
            BlockBody::Local(_) => Location::Local,
            BlockBody::Remote(_) => Location::Remote,
        }
    }

    /// Reject blocks the provider would refuse or the renderer cannot quote
    pub fn validate(&self) -> ProvisionResult<()> {
        let invalid = |reason: String| ProvisionError::InvalidBlock {
            hostname: self.hostname.to_string(),
            reason,
        };

        check_literal("hostname", &self.fqdn).map_err(invalid)?;
        check_literal("provision script", &self.provisioner.script).map_err(invalid)?;
        for arg in &self.provisioner.args {
            check_literal("provision argument", arg).map_err(invalid)?;
        }

        match &self.body {
            BlockBody::Local(local) => {
                check_literal("box", &local.box_name).map_err(invalid)?;
                check_literal("synced folder", &local.synced_folder.1).map_err(invalid)?;
                if local.memory == 0 {
                    return Err(invalid("memory must be greater than zero".to_string()));
                }
            }
            BlockBody::Remote(remote) => {
                check_literal("flavor", &remote.flavor).map_err(invalid)?;
                check_literal("image", &remote.image).map_err(invalid)?;
                check_literal("floating ip pool", &remote.floating_ip_pool).map_err(invalid)?;
                if remote.security_groups.is_empty() {
                    return Err(invalid("no security groups".to_string()));
                }
                for group in &remote.security_groups {
                    check_literal("security group", group).map_err(invalid)?;
                }
                if remote.networks.iter().all(|n| n.address.is_none()) {
                    return Err(invalid("no network carries the host address".to_string()));
                }
                for network in &remote.networks {
                    check_literal("network", &network.name).map_err(invalid)?;
                    if let Some(address) = network.address {
                        if !network.cidr.contains(address) {
                            return Err(invalid(format!(
                                "address {} is outside {} ({})",
                                address, network.name, network.cidr
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Values end up inside double-quoted literals
fn check_literal(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is empty", field));
    }
    if value.contains(['"', '\\', '\n', '\r']) || value.contains("#{") {
        return Err(format!("{} {:?} contains characters that cannot be quoted", field, value));
    }
    Ok(())
}
