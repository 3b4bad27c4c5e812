// Copyright (c) 2025 - Cowboy AI, Inc.
//! Remote tenant networking
//!
//! - [`naming`]: deterministic resource names and exact-parts matching
//! - [`api`]: the [`NetworkApi`] seam over the cloud tenant
//! - [`openstack`]: `openstack` CLI backend
//! - [`memory`]: in-memory backend for tests and dry runs
//! - [`cache`]: append-only resource id cache
//! - [`bootstrap`]: the ordered find-or-create run producing a [`NetworkTopology`]

pub mod api;
pub mod bootstrap;
pub mod cache;
pub mod memory;
pub mod naming;
pub mod openstack;

pub use api::{CloudResource, IngressRule, NetworkApi, Protocol, DEFAULT_INGRESS_RULES};
pub use bootstrap::{NetworkBootstrapper, NetworkTopology, SubnetAttachment};
pub use cache::ResourceCache;
pub use memory::{CreateOp, InMemoryNetworkApi};
pub use naming::{Purpose, ResourceKind, ResourceName};
pub use openstack::OpenStackCli;
