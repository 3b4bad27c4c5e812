// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure reconciliation for singleton nodes
//!
//! Keeps a fail-over pair of node identities (e.g. `infra-001`/`infra-002`)
//! running at a desired location, either on the local hypervisor or in a
//! remote OpenStack tenant, with a Vagrantfile as the shared desired-state
//! document.
//!
//! - [`probe`] - raw provider status to canonical [`domain::VmState`]
//! - [`network`] - idempotent tenant network bootstrap
//! - [`document`] - typed VM blocks appended to the Vagrantfile
//! - [`provider`] - local/remote backends behind one capability trait
//! - [`engine`] - the `infra_ensure_up` run

pub mod catalog;
pub mod context;
pub mod document;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod network;
pub mod probe;
pub mod provider;
pub mod state_machine;

pub use catalog::{HostCatalog, InMemoryHostCatalog, YamlHostCatalog};
pub use context::{Context, Credentials, Settings};
pub use engine::{Outcome, ReconciliationEngine};
pub use errors::{ProvisionError, ProvisionResult};
