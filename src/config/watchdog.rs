use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the watchdog instance that drives the cluster callback
pub const LB_CLUSTER_WATCHDOG_NAME: &str = "_lb_cluster_";
/// Watchdog time slice between RUNNING ticks
pub const DEFAULT_SLICE_MS: u64 = 100;
/// Minimum time between two reconciliation passes, process wide
pub const DEFAULT_DEBOUNCE_SECS: u64 = 5;

/// Watchdog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub name: String,
    pub slice_ms: u64,
    pub debounce_secs: u64,
    /// Run each callback in one execution context only
    pub singleton: bool,
    /// Execution contexts replicating every callback of a non-singleton instance
    pub contexts: Option<usize>,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            name: LB_CLUSTER_WATCHDOG_NAME.to_string(),
            slice_ms: DEFAULT_SLICE_MS,
            debounce_secs: DEFAULT_DEBOUNCE_SECS,
            singleton: true,
            contexts: None,
        }
    }
}

impl WatchdogConfig {
    /// Validate watchdog configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            return Err(anyhow::anyhow!("Watchdog name cannot be empty"));
        }

        if self.slice_ms == 0 {
            return Err(anyhow::anyhow!(
                "Watchdog slice_ms must be greater than 0"
            ));
        }

        if self.debounce_secs == 0 {
            return Err(anyhow::anyhow!(
                "Watchdog debounce_secs must be greater than 0"
            ));
        }

        if self.contexts == Some(0) {
            return Err(anyhow::anyhow!(
                "Watchdog contexts must be greater than 0"
            ));
        }

        Ok(())
    }

    /// Get the slice as Duration
    pub fn get_slice(&self) -> Duration {
        Duration::from_millis(self.slice_ms)
    }

    /// Get the debounce window as Duration
    pub fn get_debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    /// Get the number of execution contexts (default: one per CPU)
    pub fn get_contexts(&self) -> usize {
        self.contexts.unwrap_or_else(super::num_cpus::get)
    }
}
