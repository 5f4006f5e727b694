//! Latency instrumentation and the health-check payload.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Operations slower than this are logged at WARN. Geocode searches against
/// the public endpoint routinely take a few hundred milliseconds; anything
/// past a second means the upstream or the database is struggling.
const SLOW_OP_THRESHOLD: Duration = Duration::from_secs(1);

/// Wall-clock timer for one named operation (a geocode search, a registry
/// write). Emits a structured event when finished.
pub struct LatencyTracker {
    operation: String,
    start: Instant,
}

impl LatencyTracker {
    /// Examples:
    ///   let tracker = LatencyTracker::start("registry.create_shop");
    pub fn start(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Emit the timing event and consume the tracker.
    pub fn finish(self) {
        let elapsed = self.start.elapsed();
        if elapsed > SLOW_OP_THRESHOLD {
            warn!(
                operation = %self.operation,
                elapsed_ms = elapsed.as_millis() as u64,
                "slow operation"
            );
        } else {
            debug!(
                operation = %self.operation,
                elapsed_ms = elapsed.as_millis() as u64,
                "operation complete"
            );
        }
    }
}

/// Payload of `GET /api/v1/health`. `db_ok` reflects a live `SELECT 1`
/// against the registry database; a failing probe degrades the status
/// instead of failing the endpoint.
#[derive(Debug, serde::Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub db_ok: bool,
}

impl HealthStatus {
    pub fn ok(uptime_secs: u64, db_ok: bool) -> Self {
        Self {
            status: if db_ok { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs,
            db_ok,
        }
    }
}
