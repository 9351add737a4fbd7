//! Request handlers.

pub mod compare;
pub mod health;
pub mod profile;

use std::time::Duration;

/// Client-facing deadline for one profiling or comparison request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
