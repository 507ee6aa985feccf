//! Telemetry utilities for invocation timing and dispatch correlation.

use std::time::Instant;
use tracing::debug;

/// Guard for timing command execution.
///
/// Logs command latency when dropped, whether the pipeline finished or bailed
/// at a gate.
pub struct DispatchTimer {
    command: String,
    start: Instant,
}

impl DispatchTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for DispatchTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        debug!(command = %self.command, elapsed_ms, "invocation finished");
    }
}

/// Standardized span constructors for dispatch observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for one command invocation.
    pub fn invocation(command: &str, actor: &str, community: Option<&str>) -> Span {
        if let Some(community) = community {
            info_span!("invocation", command = %command, actor = %actor, community = %community)
        } else {
            info_span!("invocation", command = %command, actor = %actor)
        }
    }

    /// Create a span for a module lifecycle operation.
    pub fn lifecycle(operation: &'static str, module: &str) -> Span {
        info_span!("lifecycle", operation = %operation, module = %module)
    }
}
