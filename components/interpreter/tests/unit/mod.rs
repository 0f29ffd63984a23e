//! Unit tests for interpreter components

#[path = "../common/asm.rs"]
mod asm;

mod test_operators;

/// Route interpreter logs to the test harness when RUST_LOG is set.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
