// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Domain Models
//!
//! Value objects the reconciliation engine works with. All of them validate
//! on construction, so holding one means holding a valid value.
//!
//! - [`Hostname`] - machine name (single RFC 1123 label)
//! - [`MacAddress`] / [`SubnetRange`] - network value objects
//! - [`HostDescriptor`] - static node description from the host catalog
//! - [`VmState`] - canonical `(PowerState, Location)` probe result
//! - [`IdentityChain`] - primary/alternate fail-over pair

pub mod host;
pub mod hostname;
pub mod identity;
pub mod network;
pub mod state;

pub use host::{DeployArgs, HostDescriptor};
pub use hostname::{Hostname, HostnameError};
pub use identity::{IdentityChain, Slot};
pub use network::{MacAddress, NetworkError, SubnetRange};
pub use state::{Location, PowerState, VmState};
