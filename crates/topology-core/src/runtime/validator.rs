// crates/topology-core/src/runtime/validator.rs
// ============================================================================
// Module: Cross-Row Validator
// Description: Field and table-wide validation of the topology table.
// Purpose: Recompute every annotation whose validity depends on an edit.
// Dependencies: url, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Duplicate addresses, duplicate names and duplicate access URLs are
//! table-wide invariants, so a single-row edit can invalidate or revalidate
//! other rows. [`CrossRowValidator::revalidate`] keeps the row-local errors of
//! untouched rows, recomputes the edited row, and rebuilds every table-wide
//! error from scratch. Duplicate errors are attributed to the other zone
//! involved, which makes clearing symmetric: an error caused by a third zone
//! survives because it is recomputed, not patched.
//!
//! Syntax errors take precedence: a field carrying a syntax error shows no
//! invariant errors. Invalid fragments never enter an [`AddressSet`], so they
//! never raise duplicate errors.
//!
//! [`AddressSet`]: crate::core::AddressSet

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use url::Url;

use crate::core::AddressHistory;
use crate::core::AddressInput;
use crate::core::DeploymentMode;
use crate::core::DuplicateScope;
use crate::core::ErrorAnnotations;
use crate::core::ErrorCategory;
use crate::core::FieldError;
use crate::core::LeaderMode;
use crate::core::TopologyTable;
use crate::core::Zone;
use crate::core::ZoneField;
use crate::core::ZoneId;
use crate::interfaces::HostSyntax;

// ============================================================================
// SECTION: Access URLs
// ============================================================================

/// Parsed `scheme://host:port` access URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUrl {
    /// URL scheme (`http` or `https`).
    pub scheme: String,
    /// Host exactly as typed (brackets stripped for IPv6).
    pub host: String,
    /// Explicit port.
    pub port: u16,
}

impl AccessUrl {
    /// Parses an access URL.
    ///
    /// The host is taken verbatim from the input so it compares
    /// case-sensitively with zone addresses.
    ///
    /// # Errors
    ///
    /// Returns a short reason when the value is not `scheme://host:port`.
    pub fn parse(value: &str) -> Result<Self, String> {
        let trimmed = value.trim();
        let parsed = Url::parse(trimmed).map_err(|err| err.to_string())?;
        let scheme = parsed.scheme().to_string();
        if scheme != "http" && scheme != "https" {
            return Err("scheme must be http or https".to_string());
        }
        if parsed.query().is_some() || parsed.fragment().is_some() || parsed.path() != "/" {
            return Err("must not carry a path, query or fragment".to_string());
        }
        let authority = trimmed
            .split_once("://")
            .map(|(_, rest)| rest.trim_end_matches('/'))
            .ok_or_else(|| "missing scheme separator".to_string())?;
        let (host, port_text) = if let Some(rest) = authority.strip_prefix('[') {
            let (host, tail) =
                rest.split_once(']').ok_or_else(|| "unterminated IPv6 host".to_string())?;
            (host, tail.strip_prefix(':'))
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };
        let port = port_text
            .filter(|text| !text.is_empty())
            .ok_or_else(|| "port is required".to_string())?
            .parse::<u16>()
            .map_err(|_| "port must be a number between 0 and 65535".to_string())?;
        if host.is_empty() || host.contains('@') {
            return Err("host is required".to_string());
        }
        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
        })
    }

    /// Formats an access URL, bracketing IPv6 hosts.
    #[must_use]
    pub fn format(scheme: &str, host: &str, port: u16) -> String {
        if host.contains(':') {
            format!("{scheme}://[{host}]:{port}")
        } else {
            format!("{scheme}://{host}:{port}")
        }
    }
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Validator bound to one deployment mode and host syntax.
pub struct CrossRowValidator<'a, H> {
    /// Mode whose rules apply.
    mode: &'a DeploymentMode,
    /// Host-syntax predicate.
    syntax: &'a H,
}

impl<'a, H: HostSyntax> CrossRowValidator<'a, H> {
    /// Creates a validator.
    #[must_use]
    pub const fn new(mode: &'a DeploymentMode, syntax: &'a H) -> Self {
        Self {
            mode,
            syntax,
        }
    }

    /// Validates the whole table from scratch.
    ///
    /// With `strict` set, required-field checks also apply to pristine rows
    /// (used at submission time).
    #[must_use]
    pub fn validate_table(
        &self,
        table: &TopologyTable,
        history: &AddressHistory,
        strict: bool,
    ) -> ErrorAnnotations {
        let mut annotations = ErrorAnnotations::new();
        for zone in table.zones() {
            self.push_zone_errors(&mut annotations, zone, strict);
        }
        self.push_table_errors(&mut annotations, table, history);
        apply_precedence(&mut annotations);
        annotations
    }

    /// Revalidates after `edited` changed.
    ///
    /// Row-local errors of other rows are carried over from `previous`; the
    /// edited row and every table-wide error are recomputed.
    #[must_use]
    pub fn revalidate(
        &self,
        table: &TopologyTable,
        edited: ZoneId,
        previous: &ErrorAnnotations,
        history: &AddressHistory,
    ) -> ErrorAnnotations {
        let live: BTreeSet<ZoneId> = table.zones().iter().map(|zone| zone.id).collect();
        let mut annotations = previous.clone();
        annotations.retain(|zone, _, error| {
            zone != edited
                && live.contains(&zone)
                && error.other_zone().is_none()
                && error.category() != ErrorCategory::External
        });
        if let Some(zone) = table.get(edited) {
            self.push_zone_errors(&mut annotations, zone, false);
        }
        self.push_table_errors(&mut annotations, table, history);
        apply_precedence(&mut annotations);
        annotations
    }

    /// Row-local errors: name grammar, address syntax, internal duplicates,
    /// leader consistency and required fields.
    #[must_use]
    pub fn zone_errors(&self, zone: &Zone, strict: bool) -> Vec<(ZoneField, FieldError)> {
        let mut errors = Vec::new();
        let required = strict || !zone.is_pristine();

        if let Err(reason) = self.mode.name_grammar.check(&zone.name) {
            errors.push((
                ZoneField::Name,
                FieldError::InvalidName {
                    reason: reason.to_string(),
                },
            ));
        }

        let input = AddressInput::from_raw(&zone.raw_addresses, self.syntax);
        for entry in input.invalid {
            errors.push((
                ZoneField::Addresses,
                FieldError::InvalidAddress {
                    entry,
                },
            ));
        }
        for address in input.collapsed {
            errors.push((
                ZoneField::Addresses,
                FieldError::DuplicateWithinZone {
                    address,
                },
            ));
        }
        if required && zone.raw_addresses.is_empty() {
            errors.push((ZoneField::Addresses, FieldError::AddressesRequired));
        }

        match (&self.mode.leader, zone.leader.as_deref()) {
            (LeaderMode::Disabled, _) => {}
            (_, None) => {
                if required && self.mode.leader_required {
                    errors.push((ZoneField::Leader, FieldError::LeaderRequired));
                }
            }
            (LeaderMode::Address, Some(leader)) => {
                if !zone.addresses.contains_str(leader) {
                    errors.push((
                        ZoneField::Leader,
                        FieldError::LeaderNotInZone {
                            leader: leader.to_string(),
                        },
                    ));
                }
            }
            (
                LeaderMode::AccessUrl {
                    ..
                },
                Some(leader),
            ) => match AccessUrl::parse(leader) {
                Ok(url) => {
                    if !zone.addresses.contains_str(&url.host) {
                        errors.push((
                            ZoneField::Leader,
                            FieldError::LeaderNotInZone {
                                leader: leader.to_string(),
                            },
                        ));
                    }
                }
                Err(reason) => errors.push((
                    ZoneField::Leader,
                    FieldError::InvalidAccessUrl {
                        value: leader.to_string(),
                        reason,
                    },
                )),
            },
        }
        errors
    }

    /// Pushes the row-local errors of one zone.
    fn push_zone_errors(&self, annotations: &mut ErrorAnnotations, zone: &Zone, strict: bool) {
        for (field, error) in self.zone_errors(zone, strict) {
            annotations.push(zone.id, field, error);
        }
    }

    /// Pushes every table-wide error: addresses, names and access URLs.
    fn push_table_errors(
        &self,
        annotations: &mut ErrorAnnotations,
        table: &TopologyTable,
        history: &AddressHistory,
    ) {
        let zones = table.zones();
        for zone in zones {
            for other in zones.iter().filter(|other| other.id != zone.id) {
                for address in zone.addresses.intersects(&other.addresses) {
                    annotations.push(
                        zone.id,
                        ZoneField::Addresses,
                        FieldError::DuplicateAcrossZones {
                            address,
                            zone: other.id,
                        },
                    );
                }
                let name = zone.name.trim();
                if !name.is_empty() && name == other.name.trim() {
                    annotations.push(
                        zone.id,
                        ZoneField::Name,
                        FieldError::DuplicateName {
                            name: name.to_string(),
                            zone: other.id,
                        },
                    );
                }
                if matches!(self.mode.leader, LeaderMode::AccessUrl { .. })
                    && let (Some(mine), Some(theirs)) = (&zone.leader, &other.leader)
                    && mine.trim() == theirs.trim()
                {
                    annotations.push(
                        zone.id,
                        ZoneField::Leader,
                        FieldError::DuplicateAccessUrl {
                            url: mine.trim().to_string(),
                            zone: other.id,
                        },
                    );
                }
            }
            if self.mode.duplicate_scope == DuplicateScope::Session {
                for address in &zone.addresses {
                    let Some(holder) = history.released_by_other(address, zone.id) else {
                        continue;
                    };
                    let still_held =
                        table.get(holder).is_some_and(|other| other.addresses.contains(address));
                    if table.get(holder).is_some() && !still_held {
                        annotations.push(
                            zone.id,
                            ZoneField::Addresses,
                            FieldError::AddressHeldEarlier {
                                address: address.clone(),
                                zone: holder,
                            },
                        );
                    }
                }
            }
        }
    }
}

/// Drops invariant errors from fields that also carry a syntax error.
fn apply_precedence(annotations: &mut ErrorAnnotations) {
    let syntax_keys: BTreeSet<(ZoneId, ZoneField)> = annotations
        .iter()
        .filter(|(_, _, errors)| {
            errors.iter().any(|error| error.category() == ErrorCategory::Syntax)
        })
        .map(|(zone, field, _)| (zone, field))
        .collect();
    if syntax_keys.is_empty() {
        return;
    }
    annotations.retain(|zone, field, error| {
        !syntax_keys.contains(&(zone, field)) || error.category() != ErrorCategory::Invariant
    });
}
