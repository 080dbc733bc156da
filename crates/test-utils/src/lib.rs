//! Shared helpers for engine-supervisor tests: builders, a recording stdin
//! and `sh` stub engines.

pub mod builders;
pub mod recording_sink;
pub mod stub;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

/// Upper bound for a whole supervised run in tests. Generous enough for the
/// stream-drain timer plus the slowest grace period used by the suite.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

static INIT: Once = Once::new();

/// Install a test subscriber once per test binary.
///
/// Output goes through the test writer, so echoed engine lines only show up
/// for failing tests. `RUST_LOG=debug` turns on coordinator transitions.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // Another harness may already have installed one.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, panicking if it outlives [`TEST_TIMEOUT`]. A hung engine or a
/// coordinator that never stops must fail the test, not the CI job.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("supervised run did not finish within {TEST_TIMEOUT:?}"),
    }
}
