//! Tracing setup for test binaries.
//!
//! The library only emits `tracing` events. Test suites call
//! [`init_test_tracing`] to see them, filtered by `RUST_LOG`
//! (for example `RUST_LOG=pagekit=debug`).

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "pagekit=info";

/// Install a test-friendly fmt subscriber.
///
/// Safe to call from every test: only the first call installs a subscriber,
/// later calls return `false`.
pub fn init_test_tracing() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(false)
        .try_init()
        .is_ok()
}
