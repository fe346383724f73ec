//! # Configuration
//!
//! Runtime settings for the runner and the HTTP server.
//!
//! Values come from CLI flags, each with an `ERBENCH_*` environment fallback
//! (see [`crate::cli`]); the defaults live here.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

/// Default number of models clustered/evaluated at the same time.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default comparison requests accepted per minute.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 30;

/// Default timeout for one request to an external clustering service.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(600);

/// Settings for one comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Upper bound on models in flight at once (at least 1).
    pub max_concurrency: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl RunnerConfig {
    #[must_use]
    pub fn with_concurrency(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }
}

/// Settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Bearer token required on `/api/*` when set.
    pub api_key: Option<String>,
    /// Comparison requests per minute; `None` disables limiting.
    pub rate_limit_per_minute: Option<NonZeroU32>,
    pub runner: RunnerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            api_key: None,
            rate_limit_per_minute: NonZeroU32::new(DEFAULT_RATE_LIMIT_PER_MINUTE),
            runner: RunnerConfig::default(),
        }
    }
}
