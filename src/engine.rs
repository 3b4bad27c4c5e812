// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reconciliation Engine
//!
//! Runs `infra_ensure_up`: probe, let the [`Reconciliation`] machine decide,
//! execute the decision. Every call is awaited before the next one starts and
//! the first error ends the run; nothing is retried.
//!
//! ```text
//! probe(primary) ──► Reload | Boot | Bootstrap | Fail
//!        │
//!        └─ wrong location ──► probe(alternate) ──► Reload | Boot | Bootstrap | Fail
//! ```

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::catalog::HostCatalog;
use crate::context::Context;
use crate::document::{ConfigEmitter, ProviderInfo};
use crate::domain::{Hostname, IdentityChain, Location};
use crate::errors::{ProvisionError, ProvisionResult};
use crate::network::{NetworkApi, NetworkBootstrapper};
use crate::probe::probe;
use crate::provider::{CommandRunner, Provider, VmProvider};
use crate::state_machine::reconcile::{Action, Reconciliation};
use crate::state_machine::StateMachineWithHistory;

/// Final result of one `infra_ensure_up` run
#[derive(Debug)]
pub enum Outcome {
    /// `identity` is now up at the desired location
    Success { identity: Hostname, action: Action },
    /// The run stopped at `identity` with `error`
    Failure {
        identity: Hostname,
        error: ProvisionError,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Identity the run ended on
    pub fn identity(&self) -> &Hostname {
        match self {
            Outcome::Success { identity, .. } | Outcome::Failure { identity, .. } => identity,
        }
    }

    /// Process exit code for the entry contract: 0 success, 1 failure
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Identity on success, error message on failure
    pub fn message(&self) -> String {
        match self {
            Outcome::Success { identity, .. } => identity.to_string(),
            Outcome::Failure { error, .. } => error.to_string(),
        }
    }
}

/// Drives probe, network bootstrap, document emission and boot
pub struct ReconciliationEngine {
    ctx: Context,
    runner: Arc<dyn CommandRunner>,
    catalog: Arc<dyn HostCatalog>,
    network: Arc<dyn NetworkApi>,
    emitter: ConfigEmitter,
}

impl ReconciliationEngine {
    pub fn new(
        ctx: Context,
        runner: Arc<dyn CommandRunner>,
        catalog: Arc<dyn HostCatalog>,
        network: Arc<dyn NetworkApi>,
    ) -> Self {
        let emitter = ConfigEmitter::from_settings(&ctx.settings);
        Self {
            ctx,
            runner,
            catalog,
            network,
            emitter,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Make one member of `chain` run at `desired`
    ///
    /// Never returns an error: every failure is folded into
    /// [`Outcome::Failure`] naming the identity it happened on.
    pub async fn infra_ensure_up(&self, desired: Location, chain: &IdentityChain) -> Outcome {
        info!("Ensuring {} is up at the {} location", chain, desired);
        let provider = Provider::for_location(desired, self.runner.clone());
        let mut machine = StateMachineWithHistory::new(Reconciliation::start(desired));
        let mut identity = chain.primary();

        let outcome = loop {
            let observed = match probe(&provider, &self.ctx, identity).await {
                Ok(state) => state,
                Err(error) => break failure(identity, error),
            };
            info!("{} is {}", identity, observed);

            let action = match machine.step(observed) {
                Ok(action) => action,
                Err(e) => break failure(identity, e.into()),
            };

            let result = match action {
                Action::Probe(slot) => {
                    info!(
                        "{} already exists at the {} location, trying {}",
                        identity,
                        desired.other(),
                        chain.get(slot)
                    );
                    identity = chain.get(slot);
                    continue;
                }
                Action::Reload(_) => provider.reload(&self.ctx, identity).await,
                Action::Boot(_) => provider.boot(&self.ctx, identity).await,
                Action::Bootstrap(_) => self.bootstrap(&provider, identity).await,
                Action::Fail(_, refusal) => Err(ProvisionError::NoUsableIdentity {
                    chain: chain.to_string(),
                    reason: refusal.to_string(),
                }),
            };

            break match result {
                Ok(()) => Outcome::Success {
                    identity: identity.clone(),
                    action,
                },
                Err(error) => failure(identity, error),
            };
        };

        for step in machine.history() {
            debug!("{} on {} -> {:?}", step.from.phase(), step.input, step.output);
        }
        match &outcome {
            Outcome::Success { identity, action } => info!("{} is up ({:?})", identity, action),
            Outcome::Failure { identity, error } => error!("Giving up on {}: {}", identity, error),
        }
        outcome
    }

    /// Create `identity` from scratch at the provider's location
    ///
    /// Everything that can be checked locally is checked before the tenant
    /// is touched: credentials, the host record, an existing block and the
    /// remote address.
    async fn bootstrap(&self, provider: &Provider, identity: &Hostname) -> ProvisionResult<()> {
        let location = provider.location();
        if location == Location::Remote {
            self.ctx.credentials()?;
        }

        let descriptor = self.catalog.get(identity).await?;
        let path = self.ctx.document_path();
        let existing = self.emitter.defined_block(&path, identity).await?;
        if let Some(block) = &existing {
            if block.location() != location {
                warn!(
                    "{} is defined for the {} location in {}, not {}",
                    identity,
                    block.location(),
                    path.display(),
                    location
                );
                return Err(ProvisionError::DuplicateBlock(identity.to_string()));
            }
        }

        let topology = match location {
            Location::Remote => {
                let primary_cidr = self.ctx.settings.primary_cidr;
                if existing.is_none() && !primary_cidr.contains(descriptor.ip) {
                    return Err(ProvisionError::InvalidBlock {
                        hostname: identity.to_string(),
                        reason: format!(
                            "address {} is outside the primary network ({})",
                            descriptor.ip, primary_cidr
                        ),
                    });
                }
                Some(
                    NetworkBootstrapper::new(self.network.clone())
                        .ensure_network(&self.ctx)
                        .await?,
                )
            }
            Location::Local => None,
        };

        self.emitter.init_document(&path, false).await?;
        if existing.is_some() {
            info!("{} is already defined in {}, reusing its block", identity, path.display());
        } else {
            let provider_info = match &topology {
                Some(topology) => ProviderInfo::Remote(topology),
                None => ProviderInfo::Local,
            };
            self.emitter
                .append_vm_block(&path, &descriptor, provider_info)
                .await?;
        }

        provider.boot(&self.ctx, identity).await
    }
}

fn failure(identity: &Hostname, error: ProvisionError) -> Outcome {
    Outcome::Failure {
        identity: identity.clone(),
        error,
    }
}
