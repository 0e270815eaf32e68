//! # Coordinator Configuration
//!
//! Channel sizing and collaborator timeouts for the coordinator.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coordinator tuning.
///
/// Controls how many events each input stream may buffer before submitters
/// wait, and how long the dispatcher waits on a collaborator before giving up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Buffered queue batches before `submit_queue_batch` waits.
    ///
    /// Default: 32.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Buffered transport commands before `submit_transport_command` waits.
    ///
    /// Default: 64.
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,

    /// Buffered focus notifications.
    ///
    /// Default: 64.
    #[serde(default = "default_focus_capacity")]
    pub focus_capacity: usize,

    /// Buffered output events (track finished).
    ///
    /// Default: 64.
    #[serde(default = "default_output_event_capacity")]
    pub output_event_capacity: usize,

    /// Maximum time to wait for a locator. A timeout is reported as a
    /// transport failure and the track is skipped.
    ///
    /// Default: 15 seconds.
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout: Duration,

    /// Maximum time to wait for the focus arbiter. A timeout counts as a
    /// denial.
    ///
    /// Default: 5 seconds.
    #[serde(default = "default_focus_timeout")]
    pub focus_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            command_capacity: default_command_capacity(),
            focus_capacity: default_focus_capacity(),
            output_event_capacity: default_output_event_capacity(),
            resolve_timeout: default_resolve_timeout(),
            focus_timeout: default_focus_timeout(),
        }
    }
}

impl CoordinatorConfig {
    /// Create a configuration that gives up on slow collaborators quickly.
    ///
    /// - Short resolution timeout (3s)
    /// - Short focus timeout (1s)
    /// - Smaller buffers
    pub fn low_latency() -> Self {
        Self {
            queue_capacity: 8,
            command_capacity: 16,
            resolve_timeout: Duration::from_secs(3),
            focus_timeout: Duration::from_secs(1),
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        let capacities = [
            ("queue_capacity", self.queue_capacity),
            ("command_capacity", self.command_capacity),
            ("focus_capacity", self.focus_capacity),
            ("output_event_capacity", self.output_event_capacity),
        ];
        for (name, value) in capacities {
            if value == 0 {
                return Err(format!("{} must be > 0", name));
            }
        }

        if self.resolve_timeout.is_zero() {
            return Err("resolve_timeout must be > 0".to_string());
        }

        if self.focus_timeout.is_zero() {
            return Err("focus_timeout must be > 0".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_queue_capacity() -> usize {
    32
}

fn default_command_capacity() -> usize {
    64
}

fn default_focus_capacity() -> usize {
    64
}

fn default_output_event_capacity() -> usize {
    64
}

fn default_resolve_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_focus_timeout() -> Duration {
    Duration::from_secs(5)
}
