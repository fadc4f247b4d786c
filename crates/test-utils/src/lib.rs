pub mod builders;
pub mod recording_invoker;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Route muddle's `tracing` output into the test harness.
///
/// Scheduler and tag store events (`label = ...` fields) are captured per
/// test and only shown when a test fails, or with `-- --nocapture`. The
/// filter comes from `RUST_LOG`, e.g. `RUST_LOG=muddle::dag=debug`, and
/// defaults to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Parse a label, panicking on bad input. Tests only.
pub fn label(text: &str) -> muddle::label::Label {
    muddle::label::Label::parse(text)
        .unwrap_or_else(|e| panic!("bad test label '{text}': {e}"))
}

/// Fail a test whose build hangs, e.g. on a child process that never exits.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("build did not finish within 5 seconds")
}
