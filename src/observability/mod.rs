//! Observability for the gateway
//!
//! Structured JSON logging only. Logging is passive: it never alters the
//! outcome of a request or a lifecycle transition.
//!
//! ```ignore
//! use profile_gateway::observability::Logger;
//!
//! Logger::info("PROFILE_WRITTEN", &[("name", "profile1.a7p")]);
//! ```

mod logger;

pub use logger::{Logger, Severity};
