//! Gateway lifecycle
//!
//! ```text
//! Running --(flash marker seen)--> Draining --(server done | timeout)--> Stopped
//! ```
//!
//! The state lives in one `watch` channel. The controller polls for the
//! marker; [`serve_with_drain`] stops accepting connections once the state
//! leaves `Running` and bounds how long in-flight requests may take.

mod controller;
mod state;

pub use controller::{serve_with_drain, DrainOutcome, LifecycleController};
pub use state::{Lifecycle, LifecycleState};
