pub mod db;
pub mod factory;
pub mod test_runner;

use tracing_subscriber::EnvFilter;

/// Routes relayer logs to the test output, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
