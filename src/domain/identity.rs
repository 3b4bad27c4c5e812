// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity chain for singleton roles

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Hostname, HostnameError};

/// Position within an [`IdentityChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Primary,
    Alternate,
}

/// Ordered fail-over pair for a singleton role, e.g. `infra-001`/`infra-002`
///
/// # Invariants
/// - Both members are valid hostnames
/// - The members differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityChain {
    primary: Hostname,
    alternate: Hostname,
}

impl IdentityChain {
    pub fn new(primary: Hostname, alternate: Hostname) -> Result<Self, HostnameError> {
        if primary == alternate {
            return Err(HostnameError::InvalidLabelFormat(format!(
                "{} cannot be its own alternate",
                primary
            )));
        }
        Ok(Self { primary, alternate })
    }

    /// Build a chain from two raw names
    pub fn parse(primary: &str, alternate: &str) -> Result<Self, HostnameError> {
        Self::new(Hostname::new(primary)?, Hostname::new(alternate)?)
    }

    pub fn primary(&self) -> &Hostname {
        &self.primary
    }

    pub fn alternate(&self) -> &Hostname {
        &self.alternate
    }

    pub fn get(&self, slot: Slot) -> &Hostname {
        match slot {
            Slot::Primary => &self.primary,
            Slot::Alternate => &self.alternate,
        }
    }
}

impl fmt::Display for IdentityChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.primary, self.alternate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_slots() {
        let chain = IdentityChain::parse("infra-001", "infra-002").unwrap();
        assert_eq!(chain.get(Slot::Primary).as_str(), "infra-001");
        assert_eq!(chain.get(Slot::Alternate).as_str(), "infra-002");
        assert_eq!(chain.to_string(), "infra-001 -> infra-002");
    }

    #[test]
    fn test_chain_rejects_self_alternate() {
        assert!(IdentityChain::parse("infra-001", "INFRA-001").is_err());
    }
}
