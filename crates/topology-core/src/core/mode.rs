// crates/topology-core/src/core/mode.rs
// ============================================================================
// Module: Deployment Modes
// Description: Per-wizard-variant parameters for the single topology engine.
// Purpose: Replace duplicated per-wizard engines with one parameterized model.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`DeploymentMode`] captures the small set of knobs that differ between
//! wizard variants: row-count bounds, default naming, name grammar, leader
//! shape and the scope of cross-zone duplicate detection. Presets cover the
//! cluster, OMS and single-node wizards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum zone name length.
pub const MIN_ZONE_NAME_LENGTH: usize = 2;
/// Maximum zone name length.
pub const MAX_ZONE_NAME_LENGTH: usize = 32;
/// Default scheme for synthesized access URLs.
pub const DEFAULT_ACCESS_SCHEME: &str = "http";
/// Default port for synthesized access URLs.
pub const DEFAULT_ACCESS_PORT: u16 = 8080;

// ============================================================================
// SECTION: Mode Knobs
// ============================================================================

/// Default naming scheme for rows created by "add zone".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneNaming {
    /// `zone{N}`.
    Zone,
    /// `default-{N}`.
    Default,
}

impl ZoneNaming {
    /// Returns the literal prefix preceding the numeric suffix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Zone => "zone",
            Self::Default => "default-",
        }
    }

    /// Formats the default name for suffix `n`.
    #[must_use]
    pub fn format(self, n: u64) -> String {
        format!("{}{n}", self.prefix())
    }

    /// Extracts the numeric suffix when `name` follows this scheme.
    #[must_use]
    pub fn suffix_of(self, name: &str) -> Option<u64> {
        let digits = name.strip_prefix(self.prefix())?;
        if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// Zone name grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameGrammar {
    /// Whether `-` is accepted inside the name body.
    pub allow_hyphen: bool,
}

impl NameGrammar {
    /// Checks a name, returning a short reason on failure.
    ///
    /// # Errors
    ///
    /// Returns the violated rule as a static label.
    pub fn check(self, name: &str) -> Result<(), &'static str> {
        let length = name.chars().count();
        if !(MIN_ZONE_NAME_LENGTH ..= MAX_ZONE_NAME_LENGTH).contains(&length) {
            return Err("length must be between 2 and 32");
        }
        let mut chars = name.chars();
        if !chars.next().is_some_and(|ch| ch.is_ascii_alphabetic()) {
            return Err("must start with a letter");
        }
        if !name.chars().last().is_some_and(|ch| ch.is_ascii_alphanumeric()) {
            return Err("must end with a letter or digit");
        }
        let body_ok = name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || (self.allow_hyphen && ch == '-'));
        if !body_ok {
            return Err(if self.allow_hyphen {
                "may only contain letters, digits, '_' and '-'"
            } else {
                "may only contain letters, digits and '_'"
            });
        }
        Ok(())
    }
}

/// Shape of the per-zone leader field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeaderMode {
    /// The mode has no leader field.
    Disabled,
    /// Leader is one of the zone's addresses (rootservice).
    Address,
    /// Leader is `scheme://host:port` with host in the zone (`cm_url`).
    AccessUrl {
        /// Scheme used when the synchronizer synthesizes a URL.
        scheme: String,
        /// Port used when the synchronizer synthesizes a URL.
        port: u16,
    },
}

impl LeaderMode {
    /// Returns true when the mode carries a leader field.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Which addresses participate in cross-zone duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateScope {
    /// Only addresses currently present in the table.
    Table,
    /// Current addresses plus addresses removed from other zones by row edits
    /// earlier in this session.
    Session,
}

// ============================================================================
// SECTION: Deployment Mode
// ============================================================================

/// Parameters of one wizard variant.
///
/// # Invariants
/// - `min_zones >= 1`.
/// - `max_zones`, when set, is at least `min_zones`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentMode {
    /// Minimum number of zones that must remain after a deletion.
    pub min_zones: usize,
    /// Maximum number of zones (`Some(1)` = single-zone mode).
    pub max_zones: Option<usize>,
    /// Default naming scheme for new rows.
    pub naming: ZoneNaming,
    /// Zone name grammar.
    pub name_grammar: NameGrammar,
    /// Leader field shape.
    pub leader: LeaderMode,
    /// Whether an empty leader is an error once the zone has addresses.
    pub leader_required: bool,
    /// Cross-zone duplicate detection scope.
    pub duplicate_scope: DuplicateScope,
}

impl DeploymentMode {
    /// Cluster wizard: `zone{N}` rows with a rootservice leader.
    #[must_use]
    pub const fn cluster() -> Self {
        Self {
            min_zones: 1,
            max_zones: None,
            naming: ZoneNaming::Zone,
            name_grammar: NameGrammar {
                allow_hyphen: false,
            },
            leader: LeaderMode::Address,
            leader_required: true,
            duplicate_scope: DuplicateScope::Table,
        }
    }

    /// OMS wizard: `default-{N}` regions with a `cm_url` access URL.
    #[must_use]
    pub fn oms() -> Self {
        Self {
            min_zones: 1,
            max_zones: None,
            naming: ZoneNaming::Default,
            name_grammar: NameGrammar {
                allow_hyphen: true,
            },
            leader: LeaderMode::AccessUrl {
                scheme: DEFAULT_ACCESS_SCHEME.to_string(),
                port: DEFAULT_ACCESS_PORT,
            },
            leader_required: true,
            duplicate_scope: DuplicateScope::Session,
        }
    }

    /// Single-node wizard: exactly one zone.
    #[must_use]
    pub const fn single_node() -> Self {
        Self {
            min_zones: 1,
            max_zones: Some(1),
            naming: ZoneNaming::Zone,
            name_grammar: NameGrammar {
                allow_hyphen: false,
            },
            leader: LeaderMode::Address,
            leader_required: true,
            duplicate_scope: DuplicateScope::Table,
        }
    }

    /// Returns true when the default flag is enforced (multi-zone modes).
    #[must_use]
    pub fn enforces_default(&self) -> bool {
        self.max_zones != Some(1)
    }

    /// Returns the effective minimum row count (never below one).
    #[must_use]
    pub fn effective_min_zones(&self) -> usize {
        self.min_zones.max(1)
    }
}

impl Default for DeploymentMode {
    fn default() -> Self {
        Self::cluster()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
