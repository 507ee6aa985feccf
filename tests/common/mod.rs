//! Integration test common infrastructure.
//!
//! Provides a recording platform stub, command/module fixtures, and event
//! constructors for driving the dispatch pipeline end to end.

pub mod catalog;
pub mod platform;

#[allow(unused_imports)]
pub use catalog::*;
#[allow(unused_imports)]
pub use platform::RecordingPlatform;

use commandeer::FrameworkConfig;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Framework config with the dispatcher switched on. Also installs a test
/// subscriber so `RUST_LOG` works under `cargo test`.
#[allow(dead_code)]
pub fn live_config() -> FrameworkConfig {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
    let mut config = FrameworkConfig::default();
    config.dispatcher.enabled = true;
    config
}
