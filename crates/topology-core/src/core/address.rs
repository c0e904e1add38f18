// crates/topology-core/src/core/address.rs
// ============================================================================
// Module: Address Sets
// Description: Normalized, order-preserving sets of server addresses.
// Purpose: Trim, deduplicate and syntax-check raw address input for a zone.
// Dependencies: serde, thiserror, crate::interfaces
// ============================================================================

//! ## Overview
//! Addresses are compared case-sensitively after trimming. An [`AddressSet`]
//! keeps insertion order (the first address drives leader defaults) and never
//! holds two equal entries. Raw UI input goes through [`AddressInput`], which
//! keeps invalid fragments and collapsed duplicates aside so they can be
//! annotated instead of thrown.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::interfaces::HostSyntax;

// ============================================================================
// SECTION: Address
// ============================================================================

/// A single trimmed server address (IPv4, IPv6 or host name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Trims the raw value and checks it against the host syntax.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidAddress`] when the trimmed value is not
    /// a complete host.
    pub fn parse(raw: &str, syntax: &impl HostSyntax) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        if syntax.is_host(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(AddressError::InvalidAddress(trimmed.to_string()))
        }
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Address normalization errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Entry does not match the host-syntax predicate.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

// ============================================================================
// SECTION: Address Set
// ============================================================================

/// Ordered collection of unique addresses scoped to one zone.
///
/// # Invariants
/// - No two entries are equal.
/// - Entries keep the order in which they were first submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressSet {
    /// Unique entries in insertion order.
    entries: Vec<Address>,
}

impl AddressSet {
    /// Builds an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Strictly normalizes a raw sequence: trims, drops empties, deduplicates.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidAddress`] for the first entry that does
    /// not match the host syntax.
    pub fn normalize<S: AsRef<str>>(
        raw: &[S],
        syntax: &impl HostSyntax,
    ) -> Result<Self, AddressError> {
        let mut set = Self::new();
        for entry in raw {
            let trimmed = entry.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            let address = Address::parse(trimmed, syntax)?;
            set.insert(address);
        }
        Ok(set)
    }

    /// Appends an address unless already present. Returns true when inserted.
    pub fn insert(&mut self, address: Address) -> bool {
        if self.contains(&address) {
            return false;
        }
        self.entries.push(address);
        true
    }

    /// Returns true when the set contains `address`.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.entries.contains(address)
    }

    /// Returns true when the set contains the trimmed string value.
    #[must_use]
    pub fn contains_str(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.entries.iter().any(|entry| entry.as_str() == trimmed)
    }

    /// Returns the addresses shared with `other`, in this set's order.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> Vec<Address> {
        self.entries.iter().filter(|entry| other.contains(entry)).cloned().collect()
    }

    /// Returns the entries of this set missing from `other`, in order.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Vec<Address> {
        self.entries.iter().filter(|entry| !other.contains(entry)).cloned().collect()
    }

    /// Returns the first address by insertion order.
    #[must_use]
    pub fn first(&self) -> Option<&Address> {
        self.entries.first()
    }

    /// Returns an iterator over the addresses in order.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.entries.iter()
    }

    /// Returns the number of addresses.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the addresses as plain strings.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.as_str().to_string()).collect()
    }
}

impl<'a> IntoIterator for &'a AddressSet {
    type Item = &'a Address;
    type IntoIter = std::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// SECTION: Lenient Input
// ============================================================================

/// Outcome of lenient normalization of raw address input.
///
/// Unlike [`AddressSet::normalize`], invalid fragments do not abort the
/// normalization; they are kept for annotation so the table stays renderable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressInput {
    /// Valid, unique addresses in submission order.
    pub set: AddressSet,
    /// Trimmed entries that failed the host syntax, in submission order.
    pub invalid: Vec<String>,
    /// Addresses that appeared more than once in the raw input.
    pub collapsed: Vec<Address>,
}

impl AddressInput {
    /// Normalizes raw entries, keeping invalid fragments and duplicates aside.
    #[must_use]
    pub fn from_raw<S: AsRef<str>>(raw: &[S], syntax: &impl HostSyntax) -> Self {
        let mut input = Self::default();
        let mut seen_invalid: BTreeSet<String> = BTreeSet::new();
        for entry in raw {
            let trimmed = entry.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            match Address::parse(trimmed, syntax) {
                Ok(address) => {
                    if !input.set.insert(address.clone()) && !input.collapsed.contains(&address) {
                        input.collapsed.push(address);
                    }
                }
                Err(AddressError::InvalidAddress(fragment)) => {
                    if seen_invalid.insert(fragment.clone()) {
                        input.invalid.push(fragment);
                    }
                }
            }
        }
        input
    }

    /// Returns true when normalization collapsed duplicate entries.
    #[must_use]
    pub const fn has_internal_duplicates(&self) -> bool {
        !self.collapsed.is_empty()
    }

    /// Returns true when any entry failed the host syntax.
    #[must_use]
    pub const fn has_invalid(&self) -> bool {
        !self.invalid.is_empty()
    }
}

/// Splits a free-text address blob on commas, semicolons and whitespace.
#[must_use]
pub fn split_address_text(text: &str) -> Vec<String> {
    text.split(|ch: char| ch == ',' || ch == ';' || ch.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
