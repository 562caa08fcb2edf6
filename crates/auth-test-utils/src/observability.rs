//! Tracing setup for test binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_TEST_LOG_FILTER: &str = "auth_test_utils=debug,common=debug,tower_http=debug";

/// Install a global subscriber that writes through the test harness.
///
/// Safe to call from every test: only the first call installs a subscriber,
/// later calls are no-ops.
pub fn init_test_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_TEST_LOG_FILTER.into());

    // Err means another test already installed a subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
