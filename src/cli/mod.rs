//! CLI module for profile-gateway
//!
//! Provides command-line interface for:
//! - serve: run the HTTP gateway until drained
//! - verify: re-check every stored profile
//! - check-schema: validate a schema file
//! - print-schema: emit the built-in profile schema

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, StoreArgs};
pub use commands::{
    check_schema, load_config, print_schema, run, run_command, serve, verify, verify_store,
    VerifySummary,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json_line, write_stdout_line};
