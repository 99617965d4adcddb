use serde::{Deserialize, Serialize};

use crate::balancer::{HealthCheckMethod, LoadMethod};

/// Default cluster name declared to the balancer
pub const DEFAULT_CLUSTER_NAME: &str = "mycluster";
/// Default worker endpoint
pub const DEFAULT_WORKER_ENDPOINT: &str = "http://localhost:8080";
/// Default session affinity route
pub const DEFAULT_WORKER_ROUTE: &str = "jvmroutetomcat1";
/// Health check interval pushed to the worker. Fixed for now; it is meant to
/// follow the observed status frequency eventually.
pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: u64 = 10_000;

const ENDPOINT_SCHEMES: [&str; 5] = ["http://", "https://", "ajp://", "h2c://", "ws://"];

/// The single cluster managed by the watchdog
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub name: String,
    pub load_method: LoadMethod,
}

/// The single worker declared into the cluster
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub endpoint: String,
    pub route: String,
    pub disabled: bool,
    pub health_check_method: HealthCheckMethod,
    pub health_check_interval_ms: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLUSTER_NAME.to_string(),
            load_method: LoadMethod::default(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WORKER_ENDPOINT.to_string(),
            route: DEFAULT_WORKER_ROUTE.to_string(),
            disabled: false,
            health_check_method: HealthCheckMethod::Cping,
            health_check_interval_ms: DEFAULT_HEALTH_CHECK_INTERVAL_MS,
        }
    }
}

impl ClusterConfig {
    /// Validate cluster configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow::anyhow!("Cluster name cannot be empty"));
        }

        if self.name.contains("://") {
            return Err(anyhow::anyhow!(
                "Cluster name must be a bare name without a scheme: {}",
                self.name
            ));
        }

        Ok(())
    }
}

impl WorkerConfig {
    /// Validate worker configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.endpoint.is_empty() {
            return Err(anyhow::anyhow!("Worker endpoint cannot be empty"));
        }

        if !ENDPOINT_SCHEMES
            .iter()
            .any(|scheme| self.endpoint.starts_with(scheme))
        {
            return Err(anyhow::anyhow!(
                "Worker endpoint must be an http, https, ajp, h2c or ws URL: {}",
                self.endpoint
            ));
        }

        if self.route.chars().any(char::is_whitespace) {
            return Err(anyhow::anyhow!(
                "Worker route cannot contain whitespace: {:?}",
                self.route
            ));
        }

        Ok(())
    }
}
