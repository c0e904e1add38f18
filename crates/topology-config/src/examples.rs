// crates/topology-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `topology-wizard.toml`. The output is deterministic and
//! is checked against the validator in tests.

/// Returns a canonical example `topology-wizard.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"default_selection = ["proxy"]

[mode]
preset = "oms"
# min_zones = 1
# max_zones = 8
# leader = "access_url"
access_scheme = "https"
access_port = 8443
duplicate_scope = "session"

[[components]]
id = "proxy"

[[components]]
id = "agent"

[[components]]
id = "config-server"

[[components]]
id = "collector"

[[components]]
id = "time-series-db"

[[components]]
id = "dashboard"
implies = ["collector", "time-series-db"]

[[components]]
id = "alerting"
implies = ["collector", "time-series-db"]

[[component_servers]]
component = "proxy"
cardinality = "multiple"

[[component_servers]]
component = "config-server"
cardinality = "single"

[audit]
sink = "stderr"
# sink = "file"
# path = "topology-wizard-audit.jsonl"
"#,
    )
}
