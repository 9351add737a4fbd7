//! Application state for the web server.

use std::sync::Arc;
use std::time::Instant;

use strata::Engine;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The profiling engine, shared across requests.
    pub engine: Arc<Engine>,
    /// Server start time, for uptime reporting.
    pub started: Instant,
    /// "development" or "production".
    pub environment: String,
}

impl AppState {
    /// Create new application state.
    pub fn new(engine: Engine, environment: String) -> Self {
        Self {
            engine: Arc::new(engine),
            started: Instant::now(),
            environment,
        }
    }
}

/// Generate a request identifier.
pub fn request_id() -> String {
    format!("{:016x}", fastrand::u64(..))
}
