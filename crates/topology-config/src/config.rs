// crates/topology-config/src/config.rs
// ============================================================================
// Module: Topology Wizard Configuration
// Description: Configuration loading and validation for the topology wizard.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: topology-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The `[mode]` section picks a deployment preset and optionally overrides
//! its knobs; `[[components]]` declares the dependency graph (the standard
//! graph applies when none is declared); `[[component_servers]]` gives
//! components a server list; `[audit]` selects where wizard actions are
//! recorded. Missing or invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use topology_core::ComponentGraph;
use topology_core::ComponentId;
use topology_core::DEFAULT_ACCESS_PORT;
use topology_core::DEFAULT_ACCESS_SCHEME;
use topology_core::DeploymentMode;
use topology_core::DuplicateScope;
use topology_core::FileAuditSink;
use topology_core::LeaderMode;
use topology_core::NameGrammar;
use topology_core::NoopAuditSink;
use topology_core::ServerCardinality;
use topology_core::StandardHostSyntax;
use topology_core::StderrAuditSink;
use topology_core::TopologyEngine;
use topology_core::WizardAuditSink;
use topology_core::WizardSession;
use topology_core::ZoneNaming;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "topology-wizard.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "TOPOLOGY_WIZARD_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of declared components.
pub(crate) const MAX_COMPONENTS: usize = 64;
/// Maximum length of a component identifier.
pub(crate) const MAX_COMPONENT_ID_LENGTH: usize = 64;
/// Upper bound accepted for `mode.max_zones`.
pub(crate) const MAX_ZONES_LIMIT: usize = 256;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration for the topology wizard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WizardConfig {
    /// Components selected when a session starts.
    #[serde(default)]
    pub default_selection: Vec<ComponentId>,
    /// Deployment mode preset and overrides.
    #[serde(default)]
    pub mode: ModeConfig,
    /// Component dependency declarations; empty means the standard graph.
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
    /// Components that carry a server list.
    #[serde(default)]
    pub component_servers: Vec<ComponentServersConfig>,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl WizardConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration like [`WizardConfig::load`], falling back to the
    /// defaults when no path is given, the environment override is unset and
    /// the default file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicit or present file fails to load.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if path.is_none()
            && env::var_os(CONFIG_ENV_VAR).is_none()
            && !Path::new(DEFAULT_CONFIG_NAME).exists()
        {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mode.validate()?;
        let graph = self.component_graph()?;
        for id in &self.default_selection {
            if !graph.contains(id) {
                return Err(ConfigError::Invalid(format!(
                    "default_selection references unknown component {id}"
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for servers in &self.component_servers {
            if !graph.contains(&servers.component) {
                return Err(ConfigError::Invalid(format!(
                    "component_servers references unknown component {}",
                    servers.component
                )));
            }
            if !seen.insert(&servers.component) {
                return Err(ConfigError::Invalid(format!(
                    "component_servers declares {} more than once",
                    servers.component
                )));
            }
        }
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the deployment mode after applying overrides to the preset.
    #[must_use]
    pub fn deployment_mode(&self) -> DeploymentMode {
        self.mode.deployment_mode()
    }

    /// Builds the component graph.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when declarations are malformed.
    pub fn component_graph(&self) -> Result<ComponentGraph, ConfigError> {
        if self.components.is_empty() {
            return Ok(ComponentGraph::standard());
        }
        if self.components.len() > MAX_COMPONENTS {
            return Err(ConfigError::Invalid(format!(
                "components exceeds max of {MAX_COMPONENTS}"
            )));
        }
        for component in &self.components {
            validate_component_id("components.id", &component.id)?;
            for dependency in &component.implies {
                validate_component_id("components.implies", dependency)?;
            }
        }
        let declarations = self
            .components
            .iter()
            .map(|component| (component.id.clone(), component.implies.iter().cloned()));
        ComponentGraph::new(declarations).map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Builds an engine for the configured deployment mode.
    #[must_use]
    pub fn engine(&self) -> TopologyEngine {
        TopologyEngine::new(self.deployment_mode(), StandardHostSyntax)
    }

    /// Builds a fresh wizard session with server lists, default selection and
    /// audit sink applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the graph, sink or selection is invalid.
    pub fn build_session(&self) -> Result<WizardSession, ConfigError> {
        let graph = self.component_graph()?;
        let sink = self.audit.build_sink()?;
        let mut session = WizardSession::new(self.engine(), graph).with_audit(sink);
        for servers in &self.component_servers {
            session = session
                .with_server_list(servers.component.clone(), servers.cardinality)
                .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }
        session
            .with_selection(&self.default_selection)
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

// ============================================================================
// SECTION: Mode Config
// ============================================================================

/// Deployment mode presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModePreset {
    /// `zone{N}` rows with an address leader.
    #[default]
    Cluster,
    /// `default-{N}` regions with an access-URL leader.
    Oms,
    /// Exactly one zone.
    SingleNode,
}

impl ModePreset {
    /// Returns the preset deployment mode.
    #[must_use]
    pub fn mode(self) -> DeploymentMode {
        match self {
            Self::Cluster => DeploymentMode::cluster(),
            Self::Oms => DeploymentMode::oms(),
            Self::SingleNode => DeploymentMode::single_node(),
        }
    }
}

/// Leader field kinds selectable in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderKind {
    /// No leader field.
    Disabled,
    /// Leader is one of the zone's addresses.
    Address,
    /// Leader is `scheme://host:port`.
    AccessUrl,
}

/// `[mode]` section: a preset plus optional overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModeConfig {
    /// Base preset.
    #[serde(default)]
    pub preset: ModePreset,
    /// Override for the minimum row count.
    #[serde(default)]
    pub min_zones: Option<usize>,
    /// Override for the maximum row count.
    #[serde(default)]
    pub max_zones: Option<usize>,
    /// Override for the default naming scheme.
    #[serde(default)]
    pub naming: Option<ZoneNaming>,
    /// Override for hyphens in zone names.
    #[serde(default)]
    pub allow_hyphen: Option<bool>,
    /// Override for the leader kind.
    #[serde(default)]
    pub leader: Option<LeaderKind>,
    /// Scheme used for synthesized access URLs.
    #[serde(default)]
    pub access_scheme: Option<String>,
    /// Port used for synthesized access URLs.
    #[serde(default)]
    pub access_port: Option<u16>,
    /// Override for whether an empty leader is an error.
    #[serde(default)]
    pub leader_required: Option<bool>,
    /// Override for the duplicate detection scope.
    #[serde(default)]
    pub duplicate_scope: Option<DuplicateScope>,
}

impl ModeConfig {
    /// Applies the overrides to the preset.
    #[must_use]
    pub fn deployment_mode(&self) -> DeploymentMode {
        let mut mode = self.preset.mode();
        if let Some(min_zones) = self.min_zones {
            mode.min_zones = min_zones;
        }
        if self.max_zones.is_some() {
            mode.max_zones = self.max_zones;
        }
        if let Some(naming) = self.naming {
            mode.naming = naming;
        }
        if let Some(allow_hyphen) = self.allow_hyphen {
            mode.name_grammar = NameGrammar {
                allow_hyphen,
            };
        }
        let (preset_scheme, preset_port) = match &mode.leader {
            LeaderMode::AccessUrl {
                scheme,
                port,
            } => (scheme.clone(), *port),
            LeaderMode::Disabled | LeaderMode::Address => {
                (DEFAULT_ACCESS_SCHEME.to_string(), DEFAULT_ACCESS_PORT)
            }
        };
        let kind = self.leader.unwrap_or(match mode.leader {
            LeaderMode::Disabled => LeaderKind::Disabled,
            LeaderMode::Address => LeaderKind::Address,
            LeaderMode::AccessUrl {
                ..
            } => LeaderKind::AccessUrl,
        });
        mode.leader = match kind {
            LeaderKind::Disabled => LeaderMode::Disabled,
            LeaderKind::Address => LeaderMode::Address,
            LeaderKind::AccessUrl => LeaderMode::AccessUrl {
                scheme: self.access_scheme.clone().unwrap_or(preset_scheme),
                port: self.access_port.unwrap_or(preset_port),
            },
        };
        if let Some(leader_required) = self.leader_required {
            mode.leader_required = leader_required;
        }
        if let Some(scope) = self.duplicate_scope {
            mode.duplicate_scope = scope;
        }
        mode
    }

    /// Validates the effective mode.
    fn validate(&self) -> Result<(), ConfigError> {
        let mode = self.deployment_mode();
        if mode.min_zones == 0 {
            return Err(ConfigError::Invalid("mode.min_zones must be at least 1".to_string()));
        }
        if mode.min_zones > MAX_ZONES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "mode.min_zones exceeds max of {MAX_ZONES_LIMIT}"
            )));
        }
        if let Some(max_zones) = mode.max_zones {
            if max_zones < mode.min_zones {
                return Err(ConfigError::Invalid(
                    "mode.max_zones must be at least mode.min_zones".to_string(),
                ));
            }
            if max_zones > MAX_ZONES_LIMIT {
                return Err(ConfigError::Invalid(format!(
                    "mode.max_zones exceeds max of {MAX_ZONES_LIMIT}"
                )));
            }
        }
        if mode.naming == ZoneNaming::Default && !mode.name_grammar.allow_hyphen {
            return Err(ConfigError::Invalid(
                "mode.naming = \"default\" requires mode.allow_hyphen".to_string(),
            ));
        }
        match &mode.leader {
            LeaderMode::AccessUrl {
                scheme,
                port,
            } => {
                if scheme != "http" && scheme != "https" {
                    return Err(ConfigError::Invalid(
                        "mode.access_scheme must be http or https".to_string(),
                    ));
                }
                if *port == 0 {
                    return Err(ConfigError::Invalid(
                        "mode.access_port must be non-zero".to_string(),
                    ));
                }
            }
            LeaderMode::Disabled | LeaderMode::Address => {
                if self.access_scheme.is_some() || self.access_port.is_some() {
                    return Err(ConfigError::Invalid(
                        "mode.access_scheme and mode.access_port require an access_url leader"
                            .to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Component Config
// ============================================================================

/// One `[[components]]` declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentConfig {
    /// Component identifier.
    pub id: ComponentId,
    /// Direct dependencies.
    #[serde(default)]
    pub implies: Vec<ComponentId>,
}

/// One `[[component_servers]]` declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentServersConfig {
    /// Component that carries the list.
    pub component: ComponentId,
    /// Whether one or many servers may be chosen.
    #[serde(default)]
    pub cardinality: ServerCardinality,
}

// ============================================================================
// SECTION: Audit Config
// ============================================================================

/// Audit sink kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard audit events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// Append-only JSON lines file.
    File,
}

/// `[audit]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (AuditSinkKind::None | AuditSinkKind::Stderr, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only valid with the file sink".to_string(),
            )),
            (AuditSinkKind::None | AuditSinkKind::Stderr, None) => Ok(()),
        }
    }

    /// Opens the configured sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file sink cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn WizardAuditSink>, ConfigError> {
        match self.sink {
            AuditSinkKind::None => Ok(Arc::new(NoopAuditSink)),
            AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
            AuditSinkKind::File => {
                let Some(path) = &self.path else {
                    return Err(ConfigError::Invalid(
                        "audit.path is required for the file sink".to_string(),
                    ));
                };
                let sink = FileAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a component identifier's shape.
fn validate_component_id(field: &str, id: &ComponentId) -> Result<(), ConfigError> {
    let value = id.as_str();
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_COMPONENT_ID_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds max length of {MAX_COMPONENT_ID_LENGTH}"
        )));
    }
    if !value.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_') {
        return Err(ConfigError::Invalid(format!(
            "{field} may only contain letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
