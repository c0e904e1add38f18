// crates/topology-cli/src/main.rs
// ============================================================================
// Module: Topology Wizard CLI Entry Point
// Description: Command dispatcher for offline topology and config workflows.
// Purpose: Check saved topologies, replay event streams and resolve selections.
// Dependencies: clap, topology-config, topology-core, serde, serde_jcs, thiserror.
// ============================================================================

//! ## Overview
//! The `topology-wizard` CLI runs the topology engine without a browser:
//! it validates configuration, checks saved deployment payloads, normalizes
//! them to canonical JSON, replays recorded wizard event streams and resolves
//! component selections against the configured dependency graph. Input files
//! are untrusted and read with hard size limits.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use topology_config::WizardConfig;
use topology_config::config_toml_example;
use topology_core::ComponentGraph;
use topology_core::ComponentId;
use topology_core::ComponentSelection;
use topology_core::DeploymentPayload;
use topology_core::ErrorAnnotations;
use topology_core::EventOutcome;
use topology_core::FieldError;
use topology_core::SessionSnapshot;
use topology_core::SubmitError;
use topology_core::WizardEvent;
use topology_core::WizardSession;
use topology_core::runtime::resolver::select_all;
use topology_core::runtime::resolver::toggle;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a saved deployment payload.
const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;
/// Maximum size of a recorded event stream.
const MAX_EVENTS_BYTES: usize = 4 * 1024 * 1024;
/// Maximum size of any JSON document written to stdout.
const MAX_OUTPUT_BYTES: usize = 8 * 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "topology-wizard", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Saved topology utilities.
    Topology {
        /// Selected topology subcommand.
        #[command(subcommand)]
        command: TopologyCommand,
    },
    /// Wizard session utilities.
    Session {
        /// Selected session subcommand.
        #[command(subcommand)]
        command: SessionCommand,
    },
    /// Component selection utilities.
    Components {
        /// Selected components subcommand.
        #[command(subcommand)]
        command: ComponentsCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a topology wizard configuration file.
    Validate(ConfigArgs),
    /// Print the canonical example configuration.
    Example,
}

/// Topology subcommands.
#[derive(Subcommand, Debug)]
enum TopologyCommand {
    /// Validate a saved payload and print its annotations.
    Check(TopologyInputCommand),
    /// Print the normalized payload as canonical JSON.
    Payload(TopologyInputCommand),
}

/// Session subcommands.
#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Apply a recorded event stream and print the final snapshot.
    Replay(SessionReplayCommand),
}

/// Components subcommands.
#[derive(Subcommand, Debug)]
enum ComponentsCommand {
    /// Resolve a selection through the dependency graph.
    Resolve(ComponentsResolveCommand),
}

/// Shared configuration path argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Config file path (defaults to `TOPOLOGY_WIZARD_CONFIG` or
    /// `topology-wizard.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for commands that read a saved payload.
#[derive(Args, Debug)]
struct TopologyInputCommand {
    /// Saved deployment payload (JSON).
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Configuration arguments.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Arguments for `session replay`.
#[derive(Args, Debug)]
struct SessionReplayCommand {
    /// Recorded events (JSON array).
    #[arg(long, value_name = "PATH")]
    events: PathBuf,
    /// Saved deployment payload to load before replaying.
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
    /// Configuration arguments.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Arguments for `components resolve`.
#[derive(Args, Debug)]
struct ComponentsResolveCommand {
    /// Components to select, in order.
    #[arg(long = "select", value_name = "ID")]
    select: Vec<String>,
    /// Components to deselect after selecting.
    #[arg(long = "deselect", value_name = "ID")]
    deselect: Vec<String>,
    /// Configuration arguments.
    #[command(flatten)]
    config: ConfigArgs,
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Output of `topology check`.
#[derive(Debug, Serialize)]
struct CheckReport {
    /// True when the payload could be submitted.
    valid: bool,
    /// Field errors after strict validation.
    error_count: usize,
    /// Per-zone annotations.
    annotations: ErrorAnnotations,
    /// Deployment name errors.
    deployment_errors: Vec<FieldError>,
    /// Selected components with an empty server list.
    components_without_servers: Vec<ComponentId>,
}

/// One applied event in `session replay`.
#[derive(Debug, Serialize)]
struct ReplayStep {
    /// Position in the event stream.
    index: usize,
    /// Outcome when the event was accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<EventOutcome>,
    /// Rejection or refusal message.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Output of `session replay`.
#[derive(Debug, Serialize)]
struct ReplayReport {
    /// Per-event results.
    steps: Vec<ReplayStep>,
    /// Session state after the last event.
    snapshot: SessionSnapshot,
}

/// Output of `components resolve`.
#[derive(Debug, Serialize)]
struct ResolveReport {
    /// Final selection, closed under the graph.
    selection: ComponentSelection,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Config {
            command,
        } => command_config(&command),
        Commands::Topology {
            command,
        } => command_topology(&command),
        Commands::Session {
            command,
        } => match command {
            SessionCommand::Replay(command) => command_session_replay(&command),
        },
        Commands::Components {
            command,
        } => match command {
            ComponentsCommand::Resolve(command) => command_components_resolve(&command),
        },
    }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => {
            WizardConfig::load(args.config.as_deref())
                .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
            write_stdout_line("config ok")
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Example => {
            let example = config_toml_example();
            write_stdout_bytes(example.as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads configuration, falling back to defaults when no file is present.
fn load_config(args: &ConfigArgs) -> CliResult<WizardConfig> {
    WizardConfig::load_or_default(args.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Builds a session from configuration.
fn build_session(config: &WizardConfig) -> CliResult<WizardSession> {
    config
        .build_session()
        .map_err(|err| CliError::new(format!("failed to start session: {err}")))
}

// ============================================================================
// SECTION: Topology Commands
// ============================================================================

/// Dispatches topology subcommands.
fn command_topology(command: &TopologyCommand) -> CliResult<ExitCode> {
    match command {
        TopologyCommand::Check(command) => {
            let mut session = loaded_session(command)?;
            let report = check_report(&mut session);
            write_canonical_json(&report)?;
            Ok(if report.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        TopologyCommand::Payload(command) => {
            let mut session = loaded_session(command)?;
            let payload = session
                .submit()
                .map_err(|err| CliError::new(format!("payload refused: {err}")))?;
            write_canonical_json(&payload)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Builds a session and loads the saved payload into it.
fn loaded_session(command: &TopologyInputCommand) -> CliResult<WizardSession> {
    let config = load_config(&command.config)?;
    let payload: DeploymentPayload = read_json(&command.input, "payload", MAX_PAYLOAD_BYTES)?;
    let mut session = build_session(&config)?;
    session
        .load(&payload)
        .map_err(|err| CliError::new(format!("failed to load payload: {err}")))?;
    Ok(session)
}

/// Runs strict validation and summarizes the result.
fn check_report(session: &mut WizardSession) -> CheckReport {
    let (valid, error_count, components_without_servers) = match session.submit() {
        Ok(_) => (true, 0, Vec::new()),
        Err(SubmitError::Blocked {
            error_count,
            components_without_servers,
        }) => (false, error_count, components_without_servers),
    };
    CheckReport {
        valid,
        error_count,
        annotations: session.annotations(),
        deployment_errors: session.deployment_errors(),
        components_without_servers,
    }
}

// ============================================================================
// SECTION: Session Commands
// ============================================================================

/// Executes `session replay`.
fn command_session_replay(command: &SessionReplayCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let mut session = build_session(&config)?;
    if let Some(input) = &command.input {
        let payload: DeploymentPayload = read_json(input, "payload", MAX_PAYLOAD_BYTES)?;
        session
            .load(&payload)
            .map_err(|err| CliError::new(format!("failed to load payload: {err}")))?;
    }
    let events: Vec<WizardEvent> = read_json(&command.events, "events", MAX_EVENTS_BYTES)?;
    let report = replay(&mut session, events);
    write_canonical_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Applies every event in order; rejected events are reported and skipped.
fn replay(session: &mut WizardSession, events: Vec<WizardEvent>) -> ReplayReport {
    let steps = events
        .into_iter()
        .enumerate()
        .map(|(index, event)| match session.handle(event) {
            Ok(outcome) => ReplayStep {
                index,
                outcome: Some(outcome),
                error: None,
            },
            Err(err) => ReplayStep {
                index,
                outcome: None,
                error: Some(err.to_string()),
            },
        })
        .collect();
    ReplayReport {
        steps,
        snapshot: session.snapshot(),
    }
}

// ============================================================================
// SECTION: Component Commands
// ============================================================================

/// Executes `components resolve`.
fn command_components_resolve(command: &ComponentsResolveCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let graph = config
        .component_graph()
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let selection = resolve_selection(&graph, &command.select, &command.deselect)?;
    write_canonical_json(&ResolveReport {
        selection,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Selects then deselects components, cascading through `graph`.
fn resolve_selection(
    graph: &ComponentGraph,
    select: &[String],
    deselect: &[String],
) -> CliResult<ComponentSelection> {
    let select: Vec<ComponentId> = select.iter().map(ComponentId::new).collect();
    let mut selection =
        select_all(graph, &select).map_err(|err| CliError::new(err.to_string()))?;
    for id in deselect {
        selection = toggle(graph, &selection, &ComponentId::new(id), false)
            .map_err(|err| CliError::new(err.to_string()))?;
    }
    Ok(selection)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads and parses a bounded JSON input file.
fn read_json<T: DeserializeOwned>(path: &Path, kind: &str, max_bytes: usize) -> CliResult<T> {
    let bytes = read_bytes_with_limit(path, max_bytes).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {kind} {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{kind} {} exceeds size limit ({size} > {limit} bytes)",
            path.display()
        )),
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("invalid {kind} {}: {err}", path.display())))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Serializes `value` as canonical JSON, enforcing the output size limit.
fn canonical_json_bytes<T: Serialize>(value: &T) -> CliResult<Vec<u8>> {
    let bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    if bytes.len() > MAX_OUTPUT_BYTES {
        return Err(CliError::new(format!(
            "output exceeds size limit ({} > {MAX_OUTPUT_BYTES} bytes)",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Writes canonical JSON to stdout with a trailing newline.
fn write_canonical_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = canonical_json_bytes(value)?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
