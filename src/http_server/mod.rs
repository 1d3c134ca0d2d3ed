//! # Profile Gateway HTTP Server
//!
//! Thin HTTP surface over the document store. One route per operation; all
//! store work runs on the blocking pool.
//!
//! # Endpoints
//!
//! - `/filelist` - list profiles, request a list refresh
//! - `/files` - read, write, delete one profile
//! - everything else - static UI assets from the www directory

pub mod config;
pub mod errors;
pub mod routes;
pub mod server;

pub use config::{ConfigError, GatewayConfig};
pub use errors::{GatewayError, GatewayResult};
pub use routes::{gateway_routes, GatewayState};
pub use server::{schema_gate, GatewayServer, StartupError};
