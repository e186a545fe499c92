//! Configuration for agentrelay.
//!
//! Provides the [`RouterConfig`] struct that bounds a collaboration run and sizes the
//! blocking worker pool. Users construct this in code; it also derives `Deserialize` so it
//! can be read from a JSON document when an application prefers that.
//!
//! # Example
//!
//! ```rust
//! use agentrelay::RouterConfig;
//!
//! // Use the defaults (5 collaboration iterations, 4 blocking workers)
//! let config = RouterConfig::default();
//! assert_eq!(config.max_iterations, 5);
//!
//! // Or tighten the loop
//! let config = RouterConfig {
//!     max_iterations: 2,
//!     ..RouterConfig::default()
//! };
//! ```

use serde::Deserialize;

/// Collaboration rounds allowed before a run ends with `MaxIterationsReached`.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Concurrent jobs allowed on the blocking [`WorkerPool`](crate::worker_pool::WorkerPool).
pub const DEFAULT_MAX_BLOCKING_WORKERS: usize = 4;

/// Settings shared by every orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Upper bound on collaboration iterations. Values below 1 are treated as 1.
    pub max_iterations: usize,
    /// Size of the blocking worker pool used by synchronous collaborators.
    pub max_blocking_workers: usize,
}

impl RouterConfig {
    /// Parse a config from JSON, filling missing fields with defaults.
    ///
    /// ```rust
    /// use agentrelay::RouterConfig;
    ///
    /// let config = RouterConfig::from_json(r#"{ "max_iterations": 3 }"#).unwrap();
    /// assert_eq!(config.max_iterations, 3);
    /// assert_eq!(config.max_blocking_workers, 4);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The iteration cap actually enforced (never zero).
    pub fn effective_max_iterations(&self) -> usize {
        self.max_iterations.max(1)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_blocking_workers: DEFAULT_MAX_BLOCKING_WORKERS,
        }
    }
}
