// Copyright (c) 2025 - Cowboy AI, Inc.
//! Hostname Value Object
//!
//! Node identities double as Vagrant machine names and as the first label of
//! the guest FQDN, so they must be valid RFC 1123 labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Hostname validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostnameError {
    #[error("Hostname is empty")]
    Empty,

    #[error("Hostname label exceeds 63 characters: {0}")]
    LabelTooLong(String),

    #[error("Invalid character {1:?} in hostname {0}")]
    InvalidCharacter(String, char),

    #[error("Hostname cannot start or end with hyphen: {0}")]
    InvalidLabelFormat(String),

    #[error("Hostname cannot be all numeric: {0}")]
    NumericLabel(String),
}

/// Short (single label) machine name, e.g. `infra-001`
///
/// # Invariants
/// - Non-empty, at most 63 characters
/// - ASCII alphanumerics and hyphens only
/// - No leading or trailing hyphen
/// - Not purely numeric
///
/// # Examples
///
/// ```rust
/// use cim_provisioner::domain::Hostname;
///
/// let host = Hostname::new("infra-001").unwrap();
/// assert_eq!(host.fqdn("example.com"), "infra-001.example.com");
/// assert!(Hostname::new("-bad").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hostname(String);

impl Hostname {
    /// Maximum length for a single label (RFC 1123)
    pub const MAX_LABEL_LENGTH: usize = 63;

    /// Create a validated hostname, folded to lower case
    pub fn new(name: impl Into<String>) -> Result<Self, HostnameError> {
        let name = name.into().to_ascii_lowercase();

        if name.is_empty() {
            return Err(HostnameError::Empty);
        }
        if name.len() > Self::MAX_LABEL_LENGTH {
            return Err(HostnameError::LabelTooLong(name));
        }
        if let Some(ch) = name.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
            return Err(HostnameError::InvalidCharacter(name, ch));
        }
        if name.starts_with('-') || name.ends_with('-') {
            return Err(HostnameError::InvalidLabelFormat(name));
        }
        if name.chars().all(|c| c.is_ascii_digit()) {
            return Err(HostnameError::NumericLabel(name));
        }

        Ok(Self(name))
    }

    /// Get the hostname as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully qualified name under `domain`; an empty domain yields the bare name
    pub fn fqdn(&self, domain: &str) -> String {
        let domain = domain.trim_matches('.');
        if domain.is_empty() {
            self.0.clone()
        } else {
            format!("{}.{}", self.0, domain)
        }
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Hostname {
    type Error = HostnameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Hostname {
    type Error = HostnameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Hostname> for String {
    fn from(value: Hostname) -> Self {
        value.0
    }
}
