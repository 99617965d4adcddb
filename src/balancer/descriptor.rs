use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{ClusterConfig, WorkerConfig};
use crate::error::ClusterError;

/// Load distribution method of a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMethod {
    #[default]
    ByRequests,
    ByTraffic,
    ByBusyness,
    Heartbeat,
}

impl LoadMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMethod::ByRequests => "byrequests",
            LoadMethod::ByTraffic => "bytraffic",
            LoadMethod::ByBusyness => "bybusyness",
            LoadMethod::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for LoadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadMethod {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "byrequests" => Ok(LoadMethod::ByRequests),
            "bytraffic" => Ok(LoadMethod::ByTraffic),
            "bybusyness" => Ok(LoadMethod::ByBusyness),
            "heartbeat" => Ok(LoadMethod::Heartbeat),
            other => Err(ClusterError::invalid_params(format!(
                "unknown load method '{}'",
                other
            ))),
        }
    }
}

/// Health check method the balancer applies to a worker.
/// The probe itself is run by the balancer's health check module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthCheckMethod {
    #[default]
    None,
    Tcp,
    Options,
    Head,
    Get,
    /// AJP ping/pong
    Cping,
}

impl HealthCheckMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthCheckMethod::None => "NONE",
            HealthCheckMethod::Tcp => "TCP",
            HealthCheckMethod::Options => "OPTIONS",
            HealthCheckMethod::Head => "HEAD",
            HealthCheckMethod::Get => "GET",
            HealthCheckMethod::Cping => "CPING",
        }
    }
}

impl fmt::Display for HealthCheckMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthCheckMethod {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(HealthCheckMethod::None),
            "TCP" => Ok(HealthCheckMethod::Tcp),
            "OPTIONS" => Ok(HealthCheckMethod::Options),
            "HEAD" => Ok(HealthCheckMethod::Head),
            "GET" => Ok(HealthCheckMethod::Get),
            "CPING" => Ok(HealthCheckMethod::Cping),
            other => Err(ClusterError::invalid_params(format!(
                "unknown health check method '{}'",
                other
            ))),
        }
    }
}

/// The logical cluster declared to the balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDescriptor {
    pub name: String,
    pub load_method: LoadMethod,
}

/// The backend member declared into the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerDescriptor {
    pub cluster_name: String,
    pub endpoint: String,
    pub route: String,
    pub disabled: bool,
    pub health_check_method: HealthCheckMethod,
    pub health_check_interval_ms: u64,
}

impl Default for ClusterDescriptor {
    fn default() -> Self {
        Self::from(&ClusterConfig::default())
    }
}

impl Default for WorkerDescriptor {
    fn default() -> Self {
        Self::new(&ClusterConfig::default(), &WorkerConfig::default())
    }
}

impl From<&ClusterConfig> for ClusterDescriptor {
    fn from(config: &ClusterConfig) -> Self {
        Self {
            name: config.name.clone(),
            load_method: config.load_method,
        }
    }
}

impl WorkerDescriptor {
    pub fn new(cluster: &ClusterConfig, worker: &WorkerConfig) -> Self {
        Self {
            cluster_name: cluster.name.clone(),
            endpoint: worker.endpoint.clone(),
            route: worker.route.clone(),
            disabled: worker.disabled,
            health_check_method: worker.health_check_method,
            health_check_interval_ms: worker.health_check_interval_ms,
        }
    }
}
