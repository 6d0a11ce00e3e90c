//! Logging setup.
//!
//! Library code only emits `tracing` events; binaries and tests choose
//! the subscriber.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber.
///
/// Level filter comes from `RUST_LOG` (default `info`), e.g.
/// `RUST_LOG=u_timetable=debug`.
///
/// # Panics
/// If a global subscriber is already installed.
///
/// ```no_run
/// u_timetable::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Installs a debug-level subscriber that writes through the test
/// harness. Safe to call from every test.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
