// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deterministic resource naming
//!
//! Tenant resources are named `<user>[-mgmt]-<kind>`, e.g. `alice-router` or
//! `alice-mgmt-subnet`. The name is the idempotency key: a later run finds
//! the resource by name instead of creating a second one.
//!
//! Matching compares the full sequence of name parts (split on `-` or `_`,
//! case-insensitive). `alice-mgmt-subnet` therefore never satisfies a lookup
//! for `alice-subnet`, and the reverse holds too.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of tenant resource the bootstrapper manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    SecurityGroup,
    Router,
    Network,
    Subnet,
    /// Provider-owned external network; found, never created
    FloatingNetwork,
}

impl ResourceKind {
    /// Trailing name part for resources of this kind
    pub fn suffix(&self) -> &'static str {
        match self {
            ResourceKind::SecurityGroup => "secgroup",
            ResourceKind::Router => "router",
            ResourceKind::Network => "network",
            ResourceKind::Subnet => "subnet",
            ResourceKind::FloatingNetwork => "floating",
        }
    }

    /// Stable label used in the resource cache
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::SecurityGroup => "security_group",
            ResourceKind::Router => "router",
            ResourceKind::Network => "network",
            ResourceKind::Subnet => "subnet",
            ResourceKind::FloatingNetwork => "floating_network",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "security_group" => Some(ResourceKind::SecurityGroup),
            "router" => Some(ResourceKind::Router),
            "network" => Some(ResourceKind::Network),
            "subnet" => Some(ResourceKind::Subnet),
            "floating_network" => Some(ResourceKind::FloatingNetwork),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().replace('_', " "))
    }
}

/// What a network is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    /// Carries the host's own address
    Primary,
    /// Management plane
    Mgmt,
}

impl Purpose {
    fn part(&self) -> Option<&'static str> {
        match self {
            Purpose::Primary => None,
            Purpose::Mgmt => Some("mgmt"),
        }
    }
}

/// Split a resource name into its comparable parts
pub fn name_parts(name: &str) -> Vec<String> {
    name.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Deterministic name derived from `(username, purpose, kind)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName {
    username: String,
    purpose: Purpose,
    kind: ResourceKind,
}

impl ResourceName {
    pub fn new(username: impl Into<String>, purpose: Purpose, kind: ResourceKind) -> Self {
        Self {
            username: username.into(),
            purpose,
            kind,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    /// Expected name parts, in order
    pub fn parts(&self) -> Vec<String> {
        let mut parts = name_parts(&self.username);
        parts.extend(self.purpose.part().map(String::from));
        parts.push(self.kind.suffix().to_string());
        parts
    }

    /// Name to create the resource under
    pub fn render(&self) -> String {
        self.parts().join("-")
    }

    /// Whether an existing resource called `candidate` is this resource
    pub fn matches(&self, candidate: &str) -> bool {
        name_parts(candidate) == self.parts()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
