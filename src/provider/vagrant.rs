// Copyright (c) 2025 - Cowboy AI, Inc.
//! Vagrant-driven providers
//!
//! Both backends are driven through the same `vagrant` binary against the
//! same Vagrantfile. They differ in the `--provider` flag and in whether the
//! tenant credentials are exported to the child process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::runner::{CommandRunner, CommandSpec};
use super::VmProvider;
use crate::context::Context;
use crate::domain::{Hostname, Location};
use crate::errors::{ProvisionError, ProvisionResult};

/// Raw status Vagrant reports for a machine it has no record of
pub const NOT_CREATED: &str = "not_created";

/// Parse `vagrant status --machine-readable` into `machine -> state`
///
/// Lines look like `1700000000,infra-001,state,running`; everything that is
/// not a `state` record is ignored.
pub fn parse_machine_states(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.trim().splitn(4, ',').collect();
            match fields.as_slice() {
                [_, target, "state", state] if !target.is_empty() => {
                    Some((target.to_string(), state.trim().to_string()))
                }
                _ => None,
            }
        })
        .collect()
}

/// Shared command plumbing for both Vagrant providers
struct VagrantCli {
    runner: Arc<dyn CommandRunner>,
}

impl VagrantCli {
    fn command(&self, ctx: &Context, with_credentials: bool) -> CommandSpec {
        let spec = CommandSpec::new(&ctx.settings.vagrant_bin).current_dir(ctx.workdir());
        if with_credentials {
            spec.envs(ctx.credential_env())
        } else {
            spec
        }
    }

    async fn status(
        &self,
        ctx: &Context,
        name: &Hostname,
        with_credentials: bool,
    ) -> ProvisionResult<String> {
        // Vagrant refuses to run without a Vagrantfile; nothing can exist yet.
        if !ctx.document_path().exists() {
            debug!("No provisioning document yet, {} is not created", name);
            return Ok(NOT_CREATED.to_string());
        }

        let spec = self
            .command(ctx, with_credentials)
            .args(["status", "--machine-readable"]);
        let output = self
            .runner
            .run(&spec)
            .await
            .map_err(|e| ProvisionError::Probe {
                identity: name.to_string(),
                reason: e.to_string(),
            })?;

        let states = parse_machine_states(&output);
        Ok(states
            .get(name.as_str())
            .cloned()
            .unwrap_or_else(|| NOT_CREATED.to_string()))
    }

    async fn reload(
        &self,
        ctx: &Context,
        name: &Hostname,
        with_credentials: bool,
    ) -> ProvisionResult<()> {
        let spec = self
            .command(ctx, with_credentials)
            .args(["provision", name.as_str()]);
        info!("Re-applying provisioning on {}", name);
        self.runner
            .run(&spec)
            .await
            .map(|_| ())
            .map_err(|e| ProvisionError::ReloadFailed {
                identity: name.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Local hypervisor provider (`vagrant up <name>`)
pub struct LocalProvider {
    cli: VagrantCli,
}

impl LocalProvider {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            cli: VagrantCli { runner },
        }
    }
}

#[async_trait]
impl VmProvider for LocalProvider {
    fn location(&self) -> Location {
        Location::Local
    }

    async fn status(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<String> {
        self.cli.status(ctx, name, false).await
    }

    async fn boot(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<()> {
        let spec = self.cli.command(ctx, false).args(["up", name.as_str()]);
        info!("Booting {} on the local hypervisor", name);
        self.cli
            .runner
            .run(&spec)
            .await
            .map(|_| ())
            .map_err(|e| ProvisionError::BootFailed {
                identity: name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn reload(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<()> {
        self.cli.reload(ctx, name, false).await
    }
}

/// OpenStack tenant provider (`vagrant up <name> --provider=openstack`)
pub struct RemoteProvider {
    cli: VagrantCli,
}

impl RemoteProvider {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            cli: VagrantCli { runner },
        }
    }
}

#[async_trait]
impl VmProvider for RemoteProvider {
    fn location(&self) -> Location {
        Location::Remote
    }

    async fn status(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<String> {
        self.cli.status(ctx, name, true).await
    }

    async fn boot(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<()> {
        ctx.credentials()?;
        let spec = self
            .cli
            .command(ctx, true)
            .args(["up", name.as_str(), "--provider=openstack"]);
        info!("Booting {} in the remote tenant", name);
        self.cli
            .runner
            .run(&spec)
            .await
            .map(|_| ())
            .map_err(|e| ProvisionError::BootFailed {
                identity: name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn reload(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<()> {
        self.cli.reload(ctx, name, true).await
    }
}
