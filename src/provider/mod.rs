// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provider Adapter
//!
//! The two backends share one capability interface, [`VmProvider`], and are
//! represented by the tagged [`Provider`] variant. The variant is chosen once,
//! from the desired [`Location`], at the adapter boundary; nothing past this
//! point compares provider names.
//!
//! ```text
//! Location::Local  → Provider::Local(LocalProvider)   → vagrant up <name>
//! Location::Remote → Provider::Remote(RemoteProvider) → vagrant up <name> --provider=openstack
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::context::Context;
use crate::domain::{Hostname, Location};
use crate::errors::ProvisionResult;

pub mod runner;
pub mod vagrant;

pub use runner::{CommandError, CommandRunner, CommandSpec, ProcessRunner, ScriptedRunner};
pub use vagrant::{LocalProvider, RemoteProvider};

/// Capabilities every provider backend offers
#[async_trait]
pub trait VmProvider: Send + Sync {
    /// Where VMs booted by this provider live
    fn location(&self) -> Location;

    /// Raw provider status string for `name`
    async fn status(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<String>;

    /// Boot `name`; failures surface as `BootFailed`
    async fn boot(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<()>;

    /// Re-apply provisioning to a running `name`
    async fn reload(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<()>;
}

/// Provider backend selected for one reconciliation
pub enum Provider {
    Local(LocalProvider),
    Remote(RemoteProvider),
}

impl Provider {
    /// Select the backend for `location`
    pub fn for_location(location: Location, runner: Arc<dyn CommandRunner>) -> Self {
        match location {
            Location::Local => Provider::Local(LocalProvider::new(runner)),
            Location::Remote => Provider::Remote(RemoteProvider::new(runner)),
        }
    }

    fn inner(&self) -> &dyn VmProvider {
        match self {
            Provider::Local(local) => local,
            Provider::Remote(remote) => remote,
        }
    }
}

#[async_trait]
impl VmProvider for Provider {
    fn location(&self) -> Location {
        self.inner().location()
    }

    async fn status(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<String> {
        self.inner().status(ctx, name).await
    }

    async fn boot(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<()> {
        self.inner().boot(ctx, name).await
    }

    async fn reload(&self, ctx: &Context, name: &Hostname) -> ProvisionResult<()> {
        self.inner().reload(ctx, name).await
    }
}
