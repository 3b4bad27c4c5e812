// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Invalid MAC address format: {0}")]
    InvalidMacAddress(String),
}

/// MAC Address value object
///
/// Accepts `00:11:22:33:44:55`, `00-11-22-33-44-55` and `001122334455`.
/// Displays in the canonical colon form; [`MacAddress::compact`] gives the
/// bare upper-case form VirtualBox expects in a Vagrantfile.
///
/// # Examples
///
/// ```rust
/// use cim_provisioner::domain::MacAddress;
///
/// let mac = MacAddress::new("52:54:00:1a:2b:3c").unwrap();
/// assert_eq!(mac.compact(), "5254001A2B3C");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Parse a MAC address
    ///
    /// # Invariants
    /// - Exactly 12 hex digits once separators are removed
    pub fn new(mac: impl AsRef<str>) -> Result<Self, NetworkError> {
        let mac = mac.as_ref();
        let digits = mac.replace([':', '-'], "");

        if digits.len() != 12 || !digits.is_ascii() {
            return Err(NetworkError::InvalidMacAddress(mac.to_string()));
        }

        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            *octet = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
                .map_err(|_| NetworkError::InvalidMacAddress(mac.to_string()))?;
        }

        Ok(Self(octets))
    }

    /// Get the octets
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Upper-case hex without separators
    pub fn compact(&self) -> String {
        self.0.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|b| format!("{:02x}", b)).collect();
        f.write_str(&parts.join(":"))
    }
}

impl FromStr for MacAddress {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MacAddress> for String {
    fn from(value: MacAddress) -> Self {
        value.to_string()
    }
}

/// IPv4 subnet range in CIDR notation, e.g. `10.0.20.0/24`
///
/// Host bits are masked off so the stored value is always the network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubnetRange {
    network: Ipv4Addr,
    prefix_length: u8,
}

impl SubnetRange {
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();
        let (addr, prefix) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let addr =
            Ipv4Addr::from_str(addr).map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;
        let prefix_length = prefix
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;
        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        let network = Ipv4Addr::from(u32::from(addr) & Self::mask(prefix_length));
        Ok(Self {
            network,
            prefix_length,
        })
    }

    /// Build from an already masked network address
    pub(crate) const fn from_network(network: Ipv4Addr, prefix_length: u8) -> Self {
        Self {
            network,
            prefix_length,
        }
    }

    fn mask(prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_length))
        }
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Whether `ip` falls inside this range (IPv6 never does)
    pub fn contains(&self, ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => {
                u32::from(v4) & Self::mask(self.prefix_length) == u32::from(self.network)
            }
            IpAddr::V6(_) => false,
        }
    }
}

impl fmt::Display for SubnetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_length)
    }
}

impl FromStr for SubnetRange {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SubnetRange {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubnetRange> for String {
    fn from(value: SubnetRange) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_address_formats() {
        let colon = MacAddress::new("52:54:00:1a:2b:3c").unwrap();
        let dash = MacAddress::new("52-54-00-1A-2B-3C").unwrap();
        let bare = MacAddress::new("5254001a2b3c").unwrap();
        assert_eq!(colon, dash);
        assert_eq!(colon, bare);
        assert_eq!(colon.to_string(), "52:54:00:1a:2b:3c");
        assert_eq!(colon.compact(), "5254001A2B3C");
    }

    #[test]
    fn test_invalid_mac_addresses() {
        assert!(MacAddress::new("52:54:00:1a:2b").is_err());
        assert!(MacAddress::new("52:54:00:1a:2b:zz").is_err());
        assert!(MacAddress::new("").is_err());
        assert!(MacAddress::new("ééééééé").is_err());
    }

    #[test]
    fn test_subnet_range_masks_host_bits() {
        let range = SubnetRange::new("10.0.20.17/24").unwrap();
        assert_eq!(range.to_string(), "10.0.20.0/24");
        assert_eq!(range.prefix_length(), 24);
    }

    #[test]
    fn test_subnet_range_contains() {
        let range = SubnetRange::new("10.0.20.0/24").unwrap();
        assert!(range.contains("10.0.20.11".parse().unwrap()));
        assert!(!range.contains("10.0.21.11".parse().unwrap()));
        assert!(!range.contains("::1".parse().unwrap()));
    }

    #[test]
    fn test_invalid_subnet_ranges() {
        assert!(SubnetRange::new("10.0.20.0").is_err());
        assert_eq!(
            SubnetRange::new("10.0.20.0/33"),
            Err(NetworkError::InvalidPrefixLength(33))
        );
        assert!(SubnetRange::new("fd00::/64").is_err());
    }
}
