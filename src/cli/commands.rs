//! CLI command implementations

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::http_server::{schema_gate, GatewayConfig, GatewayServer};
use crate::observability::{Logger, Severity};
use crate::schema::{profile_schema, SchemaLoader};
use crate::store::{DocumentStore, ReadPolicy};

use super::args::{Command, StoreArgs};
use super::errors::{CliError, CliResult};
use super::io::{write_json_line, write_stdout_line};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { store, www, listen } => serve(&store, www, listen.as_deref()),
        Command::Verify { store } => verify(&store),
        Command::CheckSchema { schema } => check_schema(&schema),
        Command::PrintSchema { out } => print_schema(out.as_deref()),
    }
}

/// Builds the effective configuration: file (or defaults), then flags.
pub fn load_config(args: &StoreArgs) -> CliResult<GatewayConfig> {
    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(dir) = &args.dir {
        config.profile_dir = dir.clone();
    }
    if let Some(schema) = &args.schema {
        config.schema_path = Some(schema.clone());
    }
    Ok(config)
}

/// Serve until the flash marker drains the gateway.
///
/// Returns once the drain has completed or timed out; either way the
/// process exits successfully.
pub fn serve(args: &StoreArgs, www: Option<PathBuf>, listen: Option<&str>) -> CliResult<()> {
    let mut config = load_config(args)?;
    if let Some(www) = www {
        config.www_dir = www;
    }
    if let Some(listen) = listen {
        config.set_listen(listen)?;
    }
    Logger::set_min_severity(config.log_level);

    let server = GatewayServer::open(config)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    let outcome = rt.block_on(server.run())?;

    // Requests abandoned by a timed-out drain must not hold the process.
    rt.shutdown_background();

    Logger::info("GATEWAY_STOPPED", &[("drain", outcome.as_str())]);
    Ok(())
}

/// Totals reported at the end of `verify`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerifySummary {
    pub checked: usize,
    pub failed: usize,
}

#[derive(Serialize)]
struct VerifyReport<'a> {
    name: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Re-reads every profile with full integrity and schema checks.
pub fn verify(args: &StoreArgs) -> CliResult<()> {
    let config = load_config(args)?;
    // stdout carries the report; keep routine log lines off it.
    Logger::set_min_severity(config.log_level.max(Severity::Error));

    let gate = schema_gate(&config)?;
    let store = DocumentStore::open(&config.profile_dir, gate, ReadPolicy::Revalidate)?;

    let stdout = io::stdout();
    let summary = verify_store(&store, &mut stdout.lock())?;
    if summary.failed > 0 {
        return Err(CliError::verify_failed(summary.failed, summary.checked));
    }
    Ok(())
}

/// Writes one JSON line per stored profile, then a summary line.
pub fn verify_store<W: Write>(store: &DocumentStore, out: &mut W) -> CliResult<VerifySummary> {
    let mut summary = VerifySummary {
        checked: 0,
        failed: 0,
    };

    for name in store.list()? {
        let name = name?;
        summary.checked += 1;

        let report = match store.read_with(name.as_str(), ReadPolicy::Revalidate) {
            Ok(document) => VerifyReport {
                name: name.as_str(),
                status: "ok",
                bytes: Some(document.payload.len()),
                error: None,
            },
            Err(e) => {
                summary.failed += 1;
                VerifyReport {
                    name: name.as_str(),
                    status: "error",
                    bytes: None,
                    error: Some(e.to_string()),
                }
            }
        };
        write_json_line(out, &report)?;
    }

    write_json_line(out, &summary)?;
    Ok(summary)
}

/// Loads a schema file and reports its shape.
pub fn check_schema(path: &Path) -> CliResult<()> {
    let schema = SchemaLoader::load_file(path)?;
    write_stdout_line(&serde_json::json!({
        "status": "ok",
        "schema": schema.label(),
        "fields": schema.fields.len(),
        "rules": schema.rules.len(),
    }))
}

/// Emits the built-in profile schema, e.g. as a starting point for a
/// custom schema file.
pub fn print_schema(out: Option<&Path>) -> CliResult<()> {
    let schema = profile_schema();
    match out {
        Some(path) => Ok(SchemaLoader::save_file(&schema, path)?),
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, &schema)?;
            writeln!(lock)?;
            Ok(())
        }
    }
}
