// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud network API seam
//!
//! Typed find/create operations the bootstrapper needs from the tenant.
//! Implementations report failures as `Bootstrap` errors naming the step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::naming::ResourceKind;
use crate::context::Context;
use crate::domain::SubnetRange;
use crate::errors::ProvisionResult;

/// A tenant resource as the cloud reports it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CloudResource {
    #[serde(alias = "ID")]
    pub id: String,

    #[serde(alias = "Name")]
    pub name: String,
}

impl CloudResource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for CloudResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Icmp,
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Icmp => f.write_str("icmp"),
            Protocol::Tcp => f.write_str("tcp"),
        }
    }
}

/// Ingress rule on a security group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngressRule {
    pub protocol: Protocol,
    /// Inclusive port range; `None` means any
    pub ports: Option<(u16, u16)>,
}

/// Rules added to a freshly created security group
pub const DEFAULT_INGRESS_RULES: [IngressRule; 2] = [
    IngressRule {
        protocol: Protocol::Icmp,
        ports: None,
    },
    IngressRule {
        protocol: Protocol::Tcp,
        ports: Some((1, 65535)),
    },
];

/// Network operations against a cloud tenant
#[async_trait]
pub trait NetworkApi: Send + Sync {
    /// All tenant resources of `kind` visible to the caller
    async fn list(
        &self,
        ctx: &Context,
        kind: ResourceKind,
    ) -> ProvisionResult<Vec<CloudResource>>;

    async fn create_security_group(
        &self,
        ctx: &Context,
        name: &str,
    ) -> ProvisionResult<CloudResource>;

    async fn add_ingress_rule(
        &self,
        ctx: &Context,
        group: &CloudResource,
        rule: &IngressRule,
    ) -> ProvisionResult<()>;

    /// Create a router whose external gateway is `gateway`
    async fn create_router(
        &self,
        ctx: &Context,
        name: &str,
        gateway: &CloudResource,
    ) -> ProvisionResult<CloudResource>;

    async fn create_network(&self, ctx: &Context, name: &str) -> ProvisionResult<CloudResource>;

    async fn create_subnet(
        &self,
        ctx: &Context,
        name: &str,
        network: &CloudResource,
        cidr: SubnetRange,
    ) -> ProvisionResult<CloudResource>;

    /// Ids of the subnets that already have a port on `router`
    async fn router_subnet_ids(
        &self,
        ctx: &Context,
        router: &CloudResource,
    ) -> ProvisionResult<Vec<String>>;

    async fn add_router_interface(
        &self,
        ctx: &Context,
        router: &CloudResource,
        subnet: &CloudResource,
    ) -> ProvisionResult<()>;
}
