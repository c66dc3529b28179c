//! Common test utilities.
//!
//! Call [`init_tracing`] at the top of a test to get `tracing` output when
//! the crate is built with the `tracing` feature:
//!
//! ```bash
//! RUST_LOG=snzi=trace cargo test --features tracing -- --nocapture
//! ```

#![allow(dead_code)]

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a subscriber reading the filter from `RUST_LOG`. Idempotent.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
