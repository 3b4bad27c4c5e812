// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host Descriptor
//!
//! Static, externally sourced description of a node. The core only reads it.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::{Hostname, MacAddress};

/// Remote deployment hints from the host record (`deploy_args:` block)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
}

/// Everything the provisioner knows about one node before it exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    /// Machine name; also the identity used by the engine
    pub hostname: Hostname,

    /// Functional role, e.g. `infra`
    pub role: String,

    /// DNS domain appended to the hostname inside the guest
    pub domain: String,

    /// Address on the primary network
    pub ip: IpAddr,

    pub mac: MacAddress,

    /// Guest memory in MiB
    pub memory: u32,

    /// Local box reference
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub box_name: Option<String>,

    #[serde(default)]
    pub deploy_args: DeployArgs,

    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Extra security groups on top of the tenant default
    #[serde(default)]
    pub security_groups: Vec<String>,
}

impl HostDescriptor {
    pub fn fqdn(&self) -> String {
        self.hostname.fqdn(&self.domain)
    }

    /// Profile name, falling back to the role when none is set
    pub fn profile_or_role(&self) -> &str {
        self.profile.as_deref().unwrap_or(&self.role)
    }
}
