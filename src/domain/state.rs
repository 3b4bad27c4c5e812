// Copyright (c) 2025 - Cowboy AI, Inc.
//! Canonical VM State
//!
//! Providers report status in their own vocabulary. Vagrant's VirtualBox
//! driver says `running`/`poweroff`; the OpenStack provider says
//! `active`/`shutoff`. Everything downstream works on [`VmState`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a VM lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// Local hypervisor
    Local,
    /// Remote cloud tenant
    Remote,
}

impl Location {
    /// The location that is not `self`
    pub fn other(&self) -> Location {
        match self {
            Location::Local => Location::Remote,
            Location::Remote => Location::Local,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local => f.write_str("local"),
            Location::Remote => f.write_str("remote"),
        }
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Location::Local),
            "remote" => Ok(Location::Remote),
            other => Err(format!("unknown location: {}", other)),
        }
    }
}

/// Power state of a VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    Running,
    PoweredOff,
    NotCreated,
    Unknown,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerState::Running => "running",
            PowerState::PoweredOff => "powered off",
            PowerState::NotCreated => "not created",
            PowerState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Canonical `(PowerState, Location)` pair produced by a probe
///
/// `location` is `None` only for [`PowerState::NotCreated`]: a VM that does
/// not exist is in neither place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VmState {
    pub power: PowerState,
    pub location: Option<Location>,
}

impl VmState {
    pub const NOT_CREATED: VmState = VmState {
        power: PowerState::NotCreated,
        location: None,
    };

    pub const UNKNOWN: VmState = VmState {
        power: PowerState::Unknown,
        location: Some(Location::Local),
    };

    pub fn new(power: PowerState, location: Location) -> Self {
        Self {
            power,
            location: Some(location),
        }
    }

    /// Map a raw provider status string to canonical state
    ///
    /// Total: anything unrecognized maps to [`VmState::UNKNOWN`].
    pub fn classify(raw: &str) -> Self {
        match raw.trim() {
            "running" => VmState::new(PowerState::Running, Location::Local),
            "poweroff" => VmState::new(PowerState::PoweredOff, Location::Local),
            "active" => VmState::new(PowerState::Running, Location::Remote),
            "shutoff" | "saved" => VmState::new(PowerState::PoweredOff, Location::Remote),
            "not_created" => VmState::NOT_CREATED,
            _ => VmState::UNKNOWN,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.power == PowerState::Unknown
    }

    /// True when the VM exists at `location`
    pub fn is_at(&self, location: Location) -> bool {
        self.location == Some(location) && self.power != PowerState::NotCreated
    }
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{} ({})", self.power, location),
            None => write!(f, "{}", self.power),
        }
    }
}
