// toolgate-cli/src/main.rs
// ============================================================================
// Module: Toolgate CLI Entry Point
// Description: Command dispatcher for serving and config validation.
// Purpose: Wire the registry, load configuration, and run the server.
// Dependencies: clap, toolgate-backends, toolgate-config, toolgate-mcp, tokio
// ============================================================================

//! ## Overview
//! `toolgate serve` loads the configuration document, initializes every
//! source, and serves the catalog over HTTP or stdio. `toolgate config
//! validate` runs the same load path and reports the result without
//! binding a transport. The kind registry is built here, explicitly, so
//! startup ordering is visible and nothing registers behind main's back.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use toolgate_backends::register_builtins;
use toolgate_config::load_file;
use toolgate_core::Registry;
use toolgate_mcp::McpServer;
use toolgate_mcp::ServerOptions;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the log filter.
const LOG_ENV_VAR: &str = "TOOLGATE_LOG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "toolgate", version, about = "Tool-invocation gateway for model-driven clients")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway server.
    Serve(ServeCommand),
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
    /// Path to the tools configuration document.
    #[arg(long, value_name = "PATH", default_value = "tools.yaml")]
    config: PathBuf,
    /// Bind address for the HTTP transport.
    #[arg(long, default_value = "127.0.0.1")]
    address: String,
    /// Bind port for the HTTP transport.
    #[arg(long, default_value_t = 5000)]
    port: u16,
    /// Serve newline-delimited JSON-RPC on stdin/stdout instead of HTTP.
    #[arg(long)]
    stdio: bool,
    /// Log filter, e.g. `info` or `toolgate=debug`.
    #[arg(long, value_name = "FILTER", default_value = "info")]
    log_level: String,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a tools configuration document.
    Validate(ConfigValidateCommand),
}

/// Configuration for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Path to the tools configuration document.
    #[arg(long, value_name = "PATH", default_value = "tools.yaml")]
    config: PathBuf,
    /// Log filter, e.g. `info` or `toolgate=debug`.
    #[arg(long, value_name = "FILTER", default_value = "warn")]
    log_level: String,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => run_serve(command),
        Commands::Config {
            command: ConfigCommand::Validate(command),
        } => run_config_validate(command),
    }
}

/// Installs the tracing subscriber for stderr logging.
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Builds the registry with every built-in kind installed.
fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    register_builtins(&mut registry);
    registry
}

fn run_serve(command: ServeCommand) -> ExitCode {
    init_logging(&command.log_level);
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "unable to start the async runtime");
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(async {
        let registry = builtin_registry();
        let gateway = match load_file(&command.config, &registry).await {
            Ok(gateway) => gateway,
            Err(err) => {
                error!(config = %command.config.display(), error = %err, "configuration failed");
                return ExitCode::FAILURE;
            }
        };
        let options = ServerOptions {
            address: command.address.clone(),
            port: command.port,
            ..ServerOptions::default()
        };
        let server = McpServer::new(gateway, options);
        let served =
            if command.stdio { server.serve_stdio().await } else { server.serve().await };
        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!(error = %err, "server failed");
                ExitCode::FAILURE
            }
        }
    })
}

fn run_config_validate(command: ConfigValidateCommand) -> ExitCode {
    init_logging(&command.log_level);
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "unable to start the async runtime");
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(async {
        let registry = builtin_registry();
        match load_file(&command.config, &registry).await {
            Ok(gateway) => {
                println!(
                    "{}: OK ({} sources, {} tools, {} toolsets)",
                    command.config.display(),
                    gateway.sources.len(),
                    gateway.tools.len(),
                    gateway.toolsets.len(),
                );
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("{}: {err}", command.config.display());
                ExitCode::FAILURE
            }
        }
    })
}
