// crates/aksjeradar-cli/src/main.rs
// ============================================================================
// Module: Aksjeradar CLI Entry Point
// Description: Command dispatcher for the Aksjeradar access gate.
// Purpose: Serve the gated app, evaluate single decisions, validate config.
// Dependencies: clap, aksjeradar-core, aksjeradar-config, aksjeradar-web, tokio
// ============================================================================

//! ## Overview
//! The Aksjeradar CLI runs the gated HTTP server, evaluates one gate decision
//! offline for a described principal, and validates configuration files.
//! Output goes through explicit stdout/stderr writers; failures exit non-zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use aksjeradar_config::AksjeradarConfig;
use aksjeradar_config::resolve_path;
use aksjeradar_core::Decision;
use aksjeradar_core::DecisionBasis;
use aksjeradar_core::ExemptionPolicy;
use aksjeradar_core::PremiumCheckError;
use aksjeradar_core::Principal;
use aksjeradar_core::assess;
use aksjeradar_web::WebServer;
use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "aksjeradar", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gated HTTP server.
    Serve(ServeCommand),
    /// Evaluate a single access decision.
    Check(CheckCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to aksjeradar.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Configuration for the `check` command.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Route descriptor (endpoint name or `static`).
    #[arg(long, value_name = "ROUTE")]
    route: String,
    /// Request path.
    #[arg(long, value_name = "PATH")]
    path: String,
    /// Account email of the principal.
    #[arg(long, value_name = "EMAIL")]
    email: Option<String>,
    /// Treat the principal as authenticated.
    #[arg(long, action = ArgAction::SetTrue)]
    authenticated: bool,
    /// Outcome of the premium check.
    #[arg(long, value_enum, default_value_t = PremiumArg::False)]
    premium: PremiumArg,
    /// Treat the caller as expecting JSON.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
    /// Config file supplying the exemption policy (defaults apply when omitted).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Simulated premium check outcome.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum PremiumArg {
    /// Premium access granted.
    True,
    /// Premium access not granted.
    False,
    /// Premium lookup fails.
    Error,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate(ConfigValidateCommand),
}

/// Configuration for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to aksjeradar.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
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
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Check(command) => command_check(&command),
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config_path = resolve_path(command.config.as_deref())
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))?;
    let config = AksjeradarConfig::load(Some(&config_path))
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))?;
    let bind = config.server.bind.clone();

    let server =
        tokio::task::spawn_blocking(move || WebServer::from_config(config, Some(config_path)))
            .await
            .map_err(|err| CliError::new(format!("Server init failed: init join failed: {err}")))?
            .map_err(|err| CliError::new(format!("Server init failed: {err}")))?;
    write_stderr_line(&format!("aksjeradar: serving on {bind}"))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("Server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Check Command
// ============================================================================

/// Principal described entirely by command-line flags.
struct FlagPrincipal {
    /// Whether the principal is authenticated.
    authenticated: bool,
    /// Account email.
    email: Option<String>,
    /// Premium check outcome.
    premium: PremiumArg,
}

impl Principal for FlagPrincipal {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn has_premium_access(&self) -> Result<bool, PremiumCheckError> {
        match self.premium {
            PremiumArg::True => Ok(true),
            PremiumArg::False => Ok(false),
            PremiumArg::Error => {
                Err(PremiumCheckError::Unavailable("premium lookup failed".to_string()))
            }
        }
    }
}

/// JSON report for a single decision.
#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    /// Route descriptor evaluated.
    route: &'a str,
    /// Request path evaluated.
    path: &'a str,
    /// Decision label.
    decision: &'static str,
    /// Denial reason for JSON denials.
    reason: Option<&'static str>,
    /// Rule that produced the decision.
    basis: DecisionBasis,
    /// Recovered failure text for fail-open decisions.
    error: Option<String>,
}

/// Executes the `check` command.
fn command_check(command: &CheckCommand) -> CliResult<ExitCode> {
    let policy = match &command.config {
        Some(path) => AksjeradarConfig::load(Some(path))
            .map_err(|err| CliError::new(format!("Failed to load config: {err}")))?
            .exemption_policy(),
        None => ExemptionPolicy::default(),
    };
    let principal = FlagPrincipal {
        authenticated: command.authenticated,
        email: command.email.clone(),
        premium: command.premium,
    };
    let assessment = assess(&policy, &principal, &command.route, &command.path, command.json);
    let reason = match assessment.decision {
        Decision::DenyJson(reason) => Some(reason.as_str()),
        _ => None,
    };
    let report = CheckReport {
        route: &command.route,
        path: &command.path,
        decision: assessment.decision.as_str(),
        reason,
        basis: assessment.basis,
        error: assessment.failure.map(|failure| failure.to_string()),
    };
    let payload = serde_json::to_string(&report)
        .map_err(|err| CliError::new(format!("Failed to render report: {err}")))?;
    write_stdout_line(&payload).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = AksjeradarConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))?;
    let summary = format!(
        "Config valid: {} exempt email(s), {} open prefix(es), {} session fixture(s)",
        config.exemption_policy().exempt_email_count(),
        config.access.open_path_prefixes.len(),
        config.sessions.len()
    );
    write_stdout_line(&summary).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("Failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
