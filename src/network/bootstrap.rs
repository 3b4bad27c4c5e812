// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Bootstrapper
//!
//! Brings the tenant network a remote VM needs into existence, in order:
//!
//! 1. security group (plus default ingress rules when newly created)
//! 2. floating network (found only)
//! 3. router with the floating network as gateway
//! 4. primary network, subnet and router interface
//! 5. mgmt network, subnet and router interface
//!
//! Every step finds its resource by deterministic name before creating it,
//! so a second run against an unchanged tenant creates nothing. The first
//! failing step aborts the run; resources created by earlier steps stay.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::api::{CloudResource, NetworkApi, DEFAULT_INGRESS_RULES};
use super::cache::ResourceCache;
use super::naming::{Purpose, ResourceKind, ResourceName};
use crate::context::Context;
use crate::domain::SubnetRange;
use crate::errors::{ProvisionError, ProvisionResult};

/// A network, its subnet and the CIDR it was bootstrapped with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetAttachment {
    pub purpose: Purpose,
    pub network: CloudResource,
    pub subnet: CloudResource,
    pub cidr: SubnetRange,
}

/// Tenant resources a remote VM block refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkTopology {
    pub floating_network: CloudResource,
    pub security_group: CloudResource,
    pub router: CloudResource,
    pub primary: SubnetAttachment,
    pub mgmt: SubnetAttachment,
}

impl NetworkTopology {
    /// Pool floating IPs are allocated from
    pub fn floating_network_name(&self) -> &str {
        &self.floating_network.name
    }

    /// Networks in the order a VM attaches to them
    pub fn networks(&self) -> [&SubnetAttachment; 2] {
        [&self.mgmt, &self.primary]
    }

    pub fn network_names(&self) -> Vec<&str> {
        self.networks()
            .iter()
            .map(|attachment| attachment.network.name.as_str())
            .collect()
    }

    pub fn security_group_names(&self) -> Vec<&str> {
        vec![self.security_group.name.as_str()]
    }
}

/// Idempotent find-or-create over a [`NetworkApi`]
pub struct NetworkBootstrapper {
    api: Arc<dyn NetworkApi>,
}

impl NetworkBootstrapper {
    pub fn new(api: Arc<dyn NetworkApi>) -> Self {
        Self { api }
    }

    /// Ensure the full topology exists for `ctx.settings.username`
    ///
    /// # Errors
    /// `Bootstrap` naming the first step that could not find or create its
    /// resource.
    pub async fn ensure_network(&self, ctx: &Context) -> ProvisionResult<NetworkTopology> {
        let mut cache = ResourceCache::load(ctx.cache_path()).await;
        let username = ctx.settings.username.as_str();
        info!("Ensuring network topology for {}", username);

        let security_group = self.ensure_security_group(ctx, &mut cache, username).await?;
        let floating_network = self.find_floating_network(ctx).await?;
        let router = self
            .ensure_router(ctx, &mut cache, username, &floating_network)
            .await?;

        let primary = self
            .ensure_attachment(ctx, &mut cache, &router, username, Purpose::Primary)
            .await?;
        let mgmt = self
            .ensure_attachment(ctx, &mut cache, &router, username, Purpose::Mgmt)
            .await?;

        info!(
            "Network topology ready: router {}, networks {} and {}",
            router.name, primary.network.name, mgmt.network.name
        );
        Ok(NetworkTopology {
            floating_network,
            security_group,
            router,
            primary,
            mgmt,
        })
    }

    async fn find(
        &self,
        ctx: &Context,
        cache: &mut ResourceCache,
        name: &ResourceName,
    ) -> ProvisionResult<Option<CloudResource>> {
        let listed = self.api.list(ctx, name.kind()).await?;

        // a cached id only counts while the tenant still has it
        if let Some(cached) = cache.lookup(name) {
            if listed.iter().any(|resource| resource.id == cached.id) {
                debug!("Using cached {} {}", name.kind(), cached);
                return Ok(Some(cached.clone()));
            }
            warn!("Cached {} {} no longer exists in the tenant", name.kind(), cached);
        }

        let found = listed
            .into_iter()
            .find(|resource| name.matches(&resource.name));
        if let Some(resource) = &found {
            debug!("Found existing {} {}", name.kind(), resource);
            cache.record(name.kind(), resource).await;
        }
        Ok(found)
    }

    async fn ensure_security_group(
        &self,
        ctx: &Context,
        cache: &mut ResourceCache,
        username: &str,
    ) -> ProvisionResult<CloudResource> {
        let name = ResourceName::new(username, Purpose::Primary, ResourceKind::SecurityGroup);
        if let Some(group) = self.find(ctx, cache, &name).await? {
            return Ok(group);
        }

        let group = self.api.create_security_group(ctx, &name.render()).await?;
        for rule in &DEFAULT_INGRESS_RULES {
            self.api.add_ingress_rule(ctx, &group, rule).await?;
        }
        cache.record(ResourceKind::SecurityGroup, &group).await;
        info!("Created security group {}", group);
        Ok(group)
    }

    async fn find_floating_network(&self, ctx: &Context) -> ProvisionResult<CloudResource> {
        let pattern = ctx.settings.floating_network_pattern.as_str();
        self.api
            .list(ctx, ResourceKind::FloatingNetwork)
            .await?
            .into_iter()
            .find(|network| network.name.contains(pattern))
            .ok_or_else(|| {
                ProvisionError::bootstrap(
                    "find floating network",
                    format!("no external network name contains {:?}", pattern),
                )
            })
    }

    async fn ensure_router(
        &self,
        ctx: &Context,
        cache: &mut ResourceCache,
        username: &str,
        gateway: &CloudResource,
    ) -> ProvisionResult<CloudResource> {
        let name = ResourceName::new(username, Purpose::Primary, ResourceKind::Router);
        if let Some(router) = self.find(ctx, cache, &name).await? {
            return Ok(router);
        }

        let router = self.api.create_router(ctx, &name.render(), gateway).await?;
        cache.record(ResourceKind::Router, &router).await;
        info!("Created router {} with gateway {}", router, gateway.name);
        Ok(router)
    }

    async fn ensure_attachment(
        &self,
        ctx: &Context,
        cache: &mut ResourceCache,
        router: &CloudResource,
        username: &str,
        purpose: Purpose,
    ) -> ProvisionResult<SubnetAttachment> {
        let cidr = match purpose {
            Purpose::Primary => ctx.settings.primary_cidr,
            Purpose::Mgmt => ctx.settings.mgmt_cidr,
        };

        let network_name = ResourceName::new(username, purpose, ResourceKind::Network);
        let network = match self.find(ctx, cache, &network_name).await? {
            Some(network) => network,
            None => {
                let network = self.api.create_network(ctx, &network_name.render()).await?;
                cache.record(ResourceKind::Network, &network).await;
                info!("Created network {}", network);
                network
            }
        };

        let subnet_name = ResourceName::new(username, purpose, ResourceKind::Subnet);
        let (subnet, created) = match self.find(ctx, cache, &subnet_name).await? {
            Some(subnet) => (subnet, false),
            None => {
                let subnet = self
                    .api
                    .create_subnet(ctx, &subnet_name.render(), &network, cidr)
                    .await?;
                cache.record(ResourceKind::Subnet, &subnet).await;
                info!("Created subnet {} ({})", subnet, cidr);
                (subnet, true)
            }
        };

        if self.router_owns(ctx, router, &subnet_name).await? {
            debug!("Router {} already has an interface on {}", router.name, subnet.name);
        } else {
            if created {
                // the backend needs a moment before a new subnet can be attached
                tokio::time::sleep(ctx.settings.propagation_delay()).await;
            }
            self.api.add_router_interface(ctx, router, &subnet).await?;
            info!("Attached {} to router {}", subnet.name, router.name);
        }

        Ok(SubnetAttachment {
            purpose,
            network,
            subnet,
            cidr,
        })
    }

    /// Whether any port on `router` sits on a subnet named `subnet_name`
    async fn router_owns(
        &self,
        ctx: &Context,
        router: &CloudResource,
        subnet_name: &ResourceName,
    ) -> ProvisionResult<bool> {
        let attached = self.api.router_subnet_ids(ctx, router).await?;
        if attached.is_empty() {
            return Ok(false);
        }
        let subnets = self.api.list(ctx, ResourceKind::Subnet).await?;
        Ok(subnets
            .iter()
            .filter(|subnet| attached.contains(&subnet.id))
            .any(|subnet| subnet_name.matches(&subnet.name)))
    }
}
