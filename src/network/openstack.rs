// Copyright (c) 2025 - Cowboy AI, Inc.
//! OpenStack CLI backend for [`NetworkApi`]
//!
//! Shells out to the `openstack` client with `-f json` and parses its output.
//! Authentication is entirely the client's business; we only export the
//! `OS_*` variables from the [`Context`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::api::{CloudResource, IngressRule, NetworkApi};
use super::naming::ResourceKind;
use crate::context::Context;
use crate::domain::SubnetRange;
use crate::errors::{ProvisionError, ProvisionResult};
use crate::provider::runner::{CommandRunner, CommandSpec};

/// `openstack` CLI driven through a [`CommandRunner`]
pub struct OpenStackCli {
    runner: Arc<dyn CommandRunner>,
}

impl OpenStackCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn command<I, S>(&self, ctx: &Context, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(&ctx.settings.openstack_bin)
            .args(args)
            .current_dir(ctx.workdir())
            .envs(ctx.credential_env())
    }

    async fn run(&self, step: &str, spec: CommandSpec) -> ProvisionResult<String> {
        debug!("openstack step {}: {}", step, spec);
        self.runner
            .run(&spec)
            .await
            .map_err(|e| ProvisionError::bootstrap(step, e))
    }

    async fn run_json<T: DeserializeOwned>(
        &self,
        step: &str,
        spec: CommandSpec,
    ) -> ProvisionResult<T> {
        let output = self.run(step, spec).await?;
        serde_json::from_str(&output).map_err(|e| {
            ProvisionError::bootstrap(step, format!("unexpected openstack output: {}", e))
        })
    }
}

/// Subnet ids out of a `port list` row's fixed-IP column
///
/// Newer clients emit a list of objects, older ones a formatted string such
/// as `ip_address='10.0.20.1', subnet_id='abc'`.
pub fn fixed_ip_subnet_ids(fixed_ips: &Value) -> Vec<String> {
    match fixed_ips {
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| entry.get("subnet_id").and_then(Value::as_str))
            .map(String::from)
            .collect(),
        Value::String(text) => text
            .split("subnet_id='")
            .skip(1)
            .filter_map(|rest| rest.split('\'').next())
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl NetworkApi for OpenStackCli {
    async fn list(&self, ctx: &Context, kind: ResourceKind) -> ProvisionResult<Vec<CloudResource>> {
        let args: &[&str] = match kind {
            ResourceKind::SecurityGroup => &["security", "group", "list"],
            ResourceKind::Router => &["router", "list"],
            ResourceKind::Network => &["network", "list"],
            ResourceKind::Subnet => &["subnet", "list"],
            ResourceKind::FloatingNetwork => &["network", "list", "--external"],
        };
        let spec = self
            .command(ctx, args.iter().copied())
            .args(["-f", "json"]);
        self.run_json(&format!("list {}", kind), spec).await
    }

    async fn create_security_group(
        &self,
        ctx: &Context,
        name: &str,
    ) -> ProvisionResult<CloudResource> {
        info!("Creating security group {}", name);
        let spec = self.command(ctx, ["security", "group", "create", name, "-f", "json"]);
        self.run_json("create security group", spec).await
    }

    async fn add_ingress_rule(
        &self,
        ctx: &Context,
        group: &CloudResource,
        rule: &IngressRule,
    ) -> ProvisionResult<()> {
        let mut spec = self.command(
            ctx,
            ["security", "group", "rule", "create", "--ingress", "--protocol"],
        );
        spec = spec.arg(rule.protocol.to_string());
        if let Some((from, to)) = rule.ports {
            spec = spec.args(["--dst-port".to_string(), format!("{}:{}", from, to)]);
        }
        spec = spec.arg(&group.id);
        self.run("create security group rule", spec).await.map(|_| ())
    }

    async fn create_router(
        &self,
        ctx: &Context,
        name: &str,
        gateway: &CloudResource,
    ) -> ProvisionResult<CloudResource> {
        info!("Creating router {} via {}", name, gateway.name);
        let spec = self.command(ctx, ["router", "create", name, "-f", "json"]);
        let router: CloudResource = self.run_json("create router", spec).await?;

        let spec = self.command(
            ctx,
            ["router", "set", "--external-gateway", gateway.id.as_str(), router.id.as_str()],
        );
        self.run("set router gateway", spec).await?;
        Ok(router)
    }

    async fn create_network(&self, ctx: &Context, name: &str) -> ProvisionResult<CloudResource> {
        info!("Creating network {}", name);
        let spec = self.command(ctx, ["network", "create", name, "-f", "json"]);
        self.run_json("create network", spec).await
    }

    async fn create_subnet(
        &self,
        ctx: &Context,
        name: &str,
        network: &CloudResource,
        cidr: SubnetRange,
    ) -> ProvisionResult<CloudResource> {
        info!("Creating subnet {} ({}) on {}", name, cidr, network.name);
        let spec = self
            .command(ctx, ["subnet", "create", name, "--network", network.id.as_str()])
            .args(["--subnet-range".to_string(), cidr.to_string()])
            .args(["-f", "json"]);
        self.run_json("create subnet", spec).await
    }

    async fn router_subnet_ids(
        &self,
        ctx: &Context,
        router: &CloudResource,
    ) -> ProvisionResult<Vec<String>> {
        let spec = self.command(
            ctx,
            ["port", "list", "--router", router.id.as_str(), "-f", "json"],
        );
        let ports: Vec<Value> = self.run_json("list router ports", spec).await?;
        Ok(ports
            .iter()
            .filter_map(|port| port.get("Fixed IP Addresses"))
            .flat_map(fixed_ip_subnet_ids)
            .collect())
    }

    async fn add_router_interface(
        &self,
        ctx: &Context,
        router: &CloudResource,
        subnet: &CloudResource,
    ) -> ProvisionResult<()> {
        info!("Attaching subnet {} to router {}", subnet.name, router.name);
        let spec = self.command(
            ctx,
            ["router", "add", "subnet", router.id.as_str(), subnet.id.as_str()],
        );
        self.run("add router interface", spec).await.map(|_| ())
    }
}
