//! Shared plumbing for the torquesrv workspace
//!
//! Provides the pieces every service binary needs but that carry no
//! ingestion logic:
//! - process log sink (console + append-only file)
//! - graceful shutdown signal handling

pub mod logging;
pub mod shutdown;

pub use logging::{init_logging, LogConfig, ACCESS_TARGET};
pub use shutdown::{shutdown_signal, wait_for_shutdown, ShutdownSignal};
