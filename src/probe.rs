// Copyright (c) 2025 - Cowboy AI, Inc.
//! State Probe
//!
//! Asks a provider for a node's raw status and normalizes it to canonical
//! [`VmState`]. Probing has no side effects beyond the status query itself.

use tracing::debug;

use crate::context::Context;
use crate::domain::{Hostname, VmState};
use crate::errors::{ProvisionError, ProvisionResult};
use crate::provider::VmProvider;

/// Probe `identity` through `provider`
///
/// # Errors
/// - `Probe` when the status query fails
/// - `Probe` when the provider reports a status with no canonical mapping
pub async fn probe(
    provider: &dyn VmProvider,
    ctx: &Context,
    identity: &Hostname,
) -> ProvisionResult<VmState> {
    let raw = provider.status(ctx, identity).await.map_err(|e| match e {
        ProvisionError::Probe { .. } => e,
        other => ProvisionError::Probe {
            identity: identity.to_string(),
            reason: other.to_string(),
        },
    })?;

    let state = VmState::classify(&raw);
    debug!("{} reports {:?} -> {}", identity, raw.trim(), state);

    if state.is_unknown() {
        return Err(ProvisionError::Probe {
            identity: identity.to_string(),
            reason: format!("unrecognized provider status {:?}", raw.trim()),
        });
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Settings;
    use crate::domain::{Location, PowerState};
    use crate::provider::{Provider, ScriptedRunner};
    use std::sync::Arc;
    use test_case::test_case;

    async fn probe_raw(raw: &str) -> ProvisionResult<VmState> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Vagrantfile"), "").unwrap();
        let output = format!("1700000000,infra-001,state,{}\n", raw);
        let runner = Arc::new(ScriptedRunner::new().respond("vagrant status", &output));
        let provider = Provider::for_location(Location::Local, runner);
        let ctx = Context::new(dir.path(), Settings::default());
        probe(&provider, &ctx, &Hostname::new("infra-001").unwrap()).await
    }

    #[test_case("running", PowerState::Running, Some(Location::Local); "running")]
    #[test_case("poweroff", PowerState::PoweredOff, Some(Location::Local); "poweroff")]
    #[test_case("active", PowerState::Running, Some(Location::Remote); "active")]
    #[test_case("shutoff", PowerState::PoweredOff, Some(Location::Remote); "shutoff")]
    #[test_case("saved", PowerState::PoweredOff, Some(Location::Remote); "saved")]
    #[test_case("not_created", PowerState::NotCreated, None; "not created")]
    #[tokio::test]
    async fn test_known_statuses(raw: &str, power: PowerState, location: Option<Location>) {
        let state = probe_raw(raw).await.unwrap();
        assert_eq!(state, VmState { power, location });
    }

    #[tokio::test]
    async fn test_unmapped_status_is_an_error() {
        let err = probe_raw("aborted").await.unwrap_err();
        match err {
            ProvisionError::Probe { identity, reason } => {
                assert_eq!(identity, "infra-001");
                assert!(reason.contains("aborted"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_command_failure_is_an_error_value() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Vagrantfile"), "").unwrap();
        let runner = Arc::new(ScriptedRunner::new().fail("vagrant status", "boom"));
        let provider = Provider::for_location(Location::Local, runner);
        let ctx = Context::new(dir.path(), Settings::default());

        let result = probe(&provider, &ctx, &Hostname::new("infra-001").unwrap()).await;
        assert!(matches!(result, Err(ProvisionError::Probe { .. })));
    }
}
