//! profile-gateway - local HTTP gateway for device profiles
//!
//! Stores small structured profile documents in a flat directory, each
//! prefixed with a checksum and validated against a declared schema on the
//! way in and (by default) on the way out. An external process stops the
//! gateway by creating a marker file, after which in-flight requests get a
//! bounded time to finish.

pub mod cli;
pub mod http_server;
pub mod lifecycle;
pub mod naming;
pub mod observability;
pub mod schema;
pub mod storage;
pub mod store;
