// crates/topology-core/src/interfaces/mod.rs
// ============================================================================
// Module: Topology Interfaces
// Description: Seams the engine consumes from its environment.
// Purpose: Keep host-syntax rules pluggable without touching the engine.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The engine never decides on its own what a server address looks like. It
//! asks a [`HostSyntax`] implementation supplied by the embedding layer.
//! [`StandardHostSyntax`] covers IPv4, IPv6 and RFC 1123 host names.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::Ipv4Addr;
use std::net::Ipv6Addr;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum total length of a host name.
const MAX_HOSTNAME_LENGTH: usize = 253;
/// Maximum length of a single host name label.
const MAX_LABEL_LENGTH: usize = 63;

// ============================================================================
// SECTION: Host Syntax
// ============================================================================

/// Host-syntax predicate used to accept or reject address entries.
pub trait HostSyntax {
    /// Returns true when `candidate` is a complete, well-formed host.
    ///
    /// Partial input typed mid-entry (for example `10.0.0`) must return false.
    fn is_host(&self, candidate: &str) -> bool;
}

impl<T: HostSyntax + ?Sized> HostSyntax for &T {
    fn is_host(&self, candidate: &str) -> bool {
        (**self).is_host(candidate)
    }
}

/// Default host-syntax rules: IPv4, IPv6, or an RFC 1123 host name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardHostSyntax;

impl HostSyntax for StandardHostSyntax {
    fn is_host(&self, candidate: &str) -> bool {
        if candidate.is_empty() || candidate.trim() != candidate {
            return false;
        }
        if candidate.contains(':') {
            return candidate.parse::<Ipv6Addr>().is_ok();
        }
        if candidate.parse::<Ipv4Addr>().is_ok() {
            return true;
        }
        is_hostname(candidate)
    }
}

/// Returns true when the value is an RFC 1123 host name.
///
/// A name whose last label is numeric must be a full IPv4 address instead, so
/// fragments like `10.0.0` are rejected.
fn is_hostname(value: &str) -> bool {
    if value.len() > MAX_HOSTNAME_LENGTH {
        return false;
    }
    let labels: Vec<&str> = value.split('.').collect();
    if labels.last().is_some_and(|label| label.chars().all(|ch| ch.is_ascii_digit())) {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LENGTH
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
