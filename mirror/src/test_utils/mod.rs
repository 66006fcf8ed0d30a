//! Test utilities: call-counting stub clients and tracing setup.

mod clients;

pub use clients::{StubBucket, StubDestination, StubSource, StubStaging, TableState};

/// Initializes tracing for tests, honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs the
/// subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
