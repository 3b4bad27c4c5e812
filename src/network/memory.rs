// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory [`NetworkApi`]
//!
//! Keeps tenant state in a map and counts every create call, so tests can
//! assert idempotence ("at most one create per resource") directly.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::api::{CloudResource, IngressRule, NetworkApi};
use super::naming::ResourceKind;
use crate::context::Context;
use crate::domain::SubnetRange;
use crate::errors::{ProvisionError, ProvisionResult};

/// Create operations tracked by [`InMemoryNetworkApi::creates`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateOp {
    SecurityGroup,
    IngressRule,
    Router,
    Network,
    Subnet,
    RouterInterface,
}

#[derive(Debug, Default)]
struct Tenant {
    resources: HashMap<ResourceKind, Vec<CloudResource>>,
    rules: Vec<(String, IngressRule)>,
    gateways: HashMap<String, String>,
    subnet_ranges: HashMap<String, (String, SubnetRange)>,
    router_ports: Vec<(String, String)>,
    creates: HashMap<CreateOp, usize>,
    failing: Option<CreateOp>,
    next_id: usize,
}

impl Tenant {
    fn insert(&mut self, kind: ResourceKind, name: &str) -> CloudResource {
        self.next_id += 1;
        let resource = CloudResource::new(format!("{}-{}", kind.suffix(), self.next_id), name);
        self.resources.entry(kind).or_default().push(resource.clone());
        resource
    }

    fn record(&mut self, op: CreateOp, step: &str) -> ProvisionResult<()> {
        if self.failing == Some(op) {
            return Err(ProvisionError::bootstrap(step, "quota exceeded"));
        }
        *self.creates.entry(op).or_default() += 1;
        Ok(())
    }
}

/// Tenant simulated in memory
#[derive(Debug, Default)]
pub struct InMemoryNetworkApi {
    tenant: Mutex<Tenant>,
}

impl InMemoryNetworkApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tenant<T>(&self, f: impl FnOnce(&mut Tenant) -> T) -> ProvisionResult<T> {
        let mut tenant = self
            .tenant
            .lock()
            .map_err(|_| ProvisionError::bootstrap("tenant", "state lock poisoned"))?;
        Ok(f(&mut tenant))
    }

    /// Pre-existing resource of `kind`
    pub fn with_resource(self, kind: ResourceKind, name: &str) -> Self {
        let _ = self.with_tenant(|t| t.insert(kind, name));
        self
    }

    /// Pre-existing external network
    pub fn with_external_network(self, name: &str) -> Self {
        self.with_resource(ResourceKind::FloatingNetwork, name)
    }

    /// Make every call of `op` fail
    pub fn failing(self, op: CreateOp) -> Self {
        let _ = self.with_tenant(|t| t.failing = Some(op));
        self
    }

    /// Number of successful `op` calls so far
    pub fn creates(&self, op: CreateOp) -> usize {
        self.with_tenant(|t| t.creates.get(&op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_creates(&self) -> usize {
        self.with_tenant(|t| t.creates.values().sum()).unwrap_or(0)
    }

    /// Rules present on the group with `group_id`
    pub fn rules_for(&self, group_id: &str) -> Vec<IngressRule> {
        self.with_tenant(|t| {
            t.rules
                .iter()
                .filter(|(id, _)| id == group_id)
                .map(|(_, rule)| *rule)
                .collect()
        })
        .unwrap_or_default()
    }

    /// External gateway network id of `router_id`
    pub fn gateway_of(&self, router_id: &str) -> Option<String> {
        self.with_tenant(|t| t.gateways.get(router_id).cloned())
            .ok()
            .flatten()
    }

    /// CIDR a subnet was created with
    pub fn subnet_range(&self, subnet_id: &str) -> Option<SubnetRange> {
        self.with_tenant(|t| t.subnet_ranges.get(subnet_id).map(|(_, cidr)| *cidr))
            .ok()
            .flatten()
    }
}

#[async_trait]
impl NetworkApi for InMemoryNetworkApi {
    async fn list(
        &self,
        _ctx: &Context,
        kind: ResourceKind,
    ) -> ProvisionResult<Vec<CloudResource>> {
        self.with_tenant(|t| t.resources.get(&kind).cloned().unwrap_or_default())
    }

    async fn create_security_group(
        &self,
        _ctx: &Context,
        name: &str,
    ) -> ProvisionResult<CloudResource> {
        self.with_tenant(|t| {
            t.record(CreateOp::SecurityGroup, "create security group")?;
            Ok(t.insert(ResourceKind::SecurityGroup, name))
        })?
    }

    async fn add_ingress_rule(
        &self,
        _ctx: &Context,
        group: &CloudResource,
        rule: &IngressRule,
    ) -> ProvisionResult<()> {
        self.with_tenant(|t| {
            t.record(CreateOp::IngressRule, "create security group rule")?;
            t.rules.push((group.id.clone(), *rule));
            Ok(())
        })?
    }

    async fn create_router(
        &self,
        _ctx: &Context,
        name: &str,
        gateway: &CloudResource,
    ) -> ProvisionResult<CloudResource> {
        self.with_tenant(|t| {
            t.record(CreateOp::Router, "create router")?;
            let router = t.insert(ResourceKind::Router, name);
            t.gateways.insert(router.id.clone(), gateway.id.clone());
            Ok(router)
        })?
    }

    async fn create_network(&self, _ctx: &Context, name: &str) -> ProvisionResult<CloudResource> {
        self.with_tenant(|t| {
            t.record(CreateOp::Network, "create network")?;
            Ok(t.insert(ResourceKind::Network, name))
        })?
    }

    async fn create_subnet(
        &self,
        _ctx: &Context,
        name: &str,
        network: &CloudResource,
        cidr: SubnetRange,
    ) -> ProvisionResult<CloudResource> {
        self.with_tenant(|t| {
            t.record(CreateOp::Subnet, "create subnet")?;
            let subnet = t.insert(ResourceKind::Subnet, name);
            t.subnet_ranges
                .insert(subnet.id.clone(), (network.id.clone(), cidr));
            Ok(subnet)
        })?
    }

    async fn router_subnet_ids(
        &self,
        _ctx: &Context,
        router: &CloudResource,
    ) -> ProvisionResult<Vec<String>> {
        self.with_tenant(|t| {
            t.router_ports
                .iter()
                .filter(|(router_id, _)| *router_id == router.id)
                .map(|(_, subnet_id)| subnet_id.clone())
                .collect()
        })
    }

    async fn add_router_interface(
        &self,
        _ctx: &Context,
        router: &CloudResource,
        subnet: &CloudResource,
    ) -> ProvisionResult<()> {
        self.with_tenant(|t| {
            t.record(CreateOp::RouterInterface, "add router interface")?;
            t.router_ports.push((router.id.clone(), subnet.id.clone()));
            Ok(())
        })?
    }
}
