use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{HealthCheckMethod, LoadMethod, ParamKey, ReconciliationParams};
use crate::error::{ClusterError, ClusterResult};
use crate::request::SyntheticRequest;

/// Applies declarative parameters to a balancer cluster/worker.
/// Implementations must be idempotent under repeated identical input.
#[async_trait]
pub trait BalancerManager: Send + Sync {
    async fn manage(
        &self,
        request: &mut SyntheticRequest<'_>,
        params: &ReconciliationParams,
    ) -> ClusterResult<()>;
}

/// A worker as seen by the balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancerWorker {
    pub endpoint: String,
    pub route: String,
    pub disabled: bool,
    pub health_check_method: HealthCheckMethod,
    pub health_check_interval_ms: u64,
}

impl BalancerWorker {
    fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            route: String::new(),
            disabled: false,
            health_check_method: HealthCheckMethod::None,
            health_check_interval_ms: 0,
        }
    }
}

/// A cluster as seen by the balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancerCluster {
    pub name: String,
    pub load_method: LoadMethod,
    pub workers: Vec<BalancerWorker>,
}

/// Balancer manager keeping cluster state in process memory
#[derive(Debug, Default)]
pub struct InMemoryBalancerManager {
    clusters: RwLock<BTreeMap<String, BalancerCluster>>,
    applied: AtomicU64,
}

struct WorkerUpdate {
    route: Option<String>,
    disabled: Option<bool>,
    health_check_method: Option<HealthCheckMethod>,
    health_check_interval_ms: Option<u64>,
}

impl WorkerUpdate {
    fn parse(params: &ReconciliationParams) -> ClusterResult<Self> {
        let disabled = params
            .get(ParamKey::DisabledFlag)
            .map(|flag| parse_flag(ParamKey::DisabledFlag, flag))
            .transpose()?;
        let health_check_method = params
            .get(ParamKey::HealthCheckMethod)
            .map(str::parse::<HealthCheckMethod>)
            .transpose()?;
        let health_check_interval_ms = params
            .get(ParamKey::HealthCheckIntervalMillis)
            .map(|v| {
                v.parse::<u64>().map_err(|_| {
                    ClusterError::invalid_params(format!(
                        "{} must be a non-negative integer, got '{}'",
                        ParamKey::HealthCheckIntervalMillis,
                        v
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            route: params.get(ParamKey::Route).map(str::to_string),
            disabled,
            health_check_method,
            health_check_interval_ms,
        })
    }

    fn apply(self, worker: &mut BalancerWorker) {
        if let Some(route) = self.route {
            worker.route = route;
        }
        if let Some(disabled) = self.disabled {
            worker.disabled = disabled;
        }
        if let Some(method) = self.health_check_method {
            worker.health_check_method = method;
        }
        if let Some(interval) = self.health_check_interval_ms {
            worker.health_check_interval_ms = interval;
        }
    }
}

fn parse_flag(key: ParamKey, value: &str) -> ClusterResult<bool> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(ClusterError::invalid_params(format!(
            "{} must be 0 or 1, got '{}'",
            key, other
        ))),
    }
}

impl InMemoryBalancerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clusters, ordered by name
    pub async fn snapshot(&self) -> Vec<BalancerCluster> {
        self.clusters.read().await.values().cloned().collect()
    }

    pub async fn cluster(&self, name: &str) -> Option<BalancerCluster> {
        self.clusters.read().await.get(name).cloned()
    }

    /// Number of declarations applied successfully
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    async fn apply(&self, params: &ReconciliationParams) -> ClusterResult<()> {
        let cluster_name = params
            .get(ParamKey::Cluster)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ClusterError::invalid_params("missing cluster"))?;
        let load_method = params
            .get(ParamKey::LoadMethod)
            .map(str::parse::<LoadMethod>)
            .transpose()?;
        let add_worker = params
            .get(ParamKey::AddWorkerFlag)
            .map(|flag| parse_flag(ParamKey::AddWorkerFlag, flag))
            .transpose()?
            .unwrap_or(false);
        let worker_update = match params.get(ParamKey::Worker) {
            Some(worker) => Some((worker, WorkerUpdate::parse(params)?)),
            None => None,
        };

        let mut clusters = self.clusters.write().await;

        if add_worker {
            let endpoint = params
                .get(ParamKey::NewWorkerUri)
                .filter(|uri| !uri.is_empty())
                .ok_or_else(|| {
                    ClusterError::invalid_params(format!(
                        "{} requires {}",
                        ParamKey::AddWorkerFlag,
                        ParamKey::NewWorkerUri
                    ))
                })?;

            let cluster = clusters
                .entry(cluster_name.to_string())
                .or_insert_with(|| {
                    info!(cluster = cluster_name, "Cluster created");
                    BalancerCluster {
                        name: cluster_name.to_string(),
                        load_method: load_method.unwrap_or_default(),
                        workers: Vec::new(),
                    }
                });

            if !cluster.workers.iter().any(|w| w.endpoint == endpoint) {
                cluster.workers.push(BalancerWorker::new(endpoint));
                info!(cluster = cluster_name, worker = endpoint, "Worker added");
            }
        }

        let cluster = clusters
            .get_mut(cluster_name)
            .ok_or_else(|| ClusterError::cluster_not_found(cluster_name))?;

        if let Some(method) = load_method {
            cluster.load_method = method;
        }

        if let Some((endpoint, update)) = worker_update {
            let worker = cluster
                .workers
                .iter_mut()
                .find(|w| w.endpoint == endpoint)
                .ok_or_else(|| ClusterError::worker_not_found(cluster_name, endpoint))?;
            update.apply(worker);
            debug!(cluster = cluster_name, worker = endpoint, "Worker updated");
        }

        Ok(())
    }
}

#[async_trait]
impl BalancerManager for InMemoryBalancerManager {
    async fn manage(
        &self,
        request: &mut SyntheticRequest<'_>,
        params: &ReconciliationParams,
    ) -> ClusterResult<()> {
        debug!(
            server = %request.server(),
            method = request.method(),
            params = %params,
            "balancer_manage"
        );
        self.apply(params).await?;
        self.applied.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ServerContext;
    use crate::request::{RegionPool, SCOPE_TAG};

    async fn manage(
        manager: &InMemoryBalancerManager,
        params: &ReconciliationParams,
    ) -> ClusterResult<()> {
        let server = ServerContext::new("localhost", 80);
        let pool = RegionPool::new("test");
        let scope = pool.create_scope(SCOPE_TAG);
        let mut request = SyntheticRequest::build(&server, &scope);
        manager.manage(&mut request, params).await
    }

    fn add_worker_params(endpoint: &str) -> ReconciliationParams {
        let mut params = ReconciliationParams::new();
        params
            .set(ParamKey::Cluster, "mycluster")
            .set(ParamKey::LoadMethod, "bytraffic")
            .set(ParamKey::AddWorkerFlag, "1")
            .set(ParamKey::NewWorkerUri, endpoint);
        params
    }

    #[tokio::test]
    async fn test_add_worker_creates_cluster_once() {
        let manager = InMemoryBalancerManager::new();
        let params = add_worker_params("http://localhost:8080");

        manage(&manager, &params).await.unwrap();
        manage(&manager, &params).await.unwrap();

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].load_method, LoadMethod::ByTraffic);
        assert_eq!(snapshot[0].workers.len(), 1);
        assert_eq!(manager.applied(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_worker_fails() {
        let manager = InMemoryBalancerManager::new();
        manage(&manager, &add_worker_params("http://a:8080")).await.unwrap();

        let mut params = ReconciliationParams::new();
        params
            .set(ParamKey::Cluster, "mycluster")
            .set(ParamKey::Worker, "http://b:8080")
            .set(ParamKey::Route, "b");

        let err = manage(&manager, &params).await.unwrap_err();
        assert!(matches!(err, ClusterError::WorkerNotFound { .. }));
        assert_eq!(manager.applied(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_cluster_fails() {
        let manager = InMemoryBalancerManager::new();

        let mut params = ReconciliationParams::new();
        params
            .set(ParamKey::Cluster, "ghost")
            .set(ParamKey::Worker, "http://a:8080");

        let err = manage(&manager, &params).await.unwrap_err();
        assert!(matches!(err, ClusterError::ClusterNotFound { .. }));
    }

    #[tokio::test]
    async fn test_invalid_values_leave_worker_untouched() {
        let manager = InMemoryBalancerManager::new();
        manage(&manager, &add_worker_params("http://a:8080")).await.unwrap();

        let mut params = ReconciliationParams::new();
        params
            .set(ParamKey::Cluster, "mycluster")
            .set(ParamKey::Worker, "http://a:8080")
            .set(ParamKey::Route, "node-a")
            .set(ParamKey::HealthCheckIntervalMillis, "-1");

        let err = manage(&manager, &params).await.unwrap_err();
        assert!(matches!(err, ClusterError::InvalidParams { .. }));

        let cluster = manager.cluster("mycluster").await.unwrap();
        assert_eq!(cluster.workers[0].route, "");
    }

    #[tokio::test]
    async fn test_missing_cluster_key_rejected() {
        let manager = InMemoryBalancerManager::new();
        let err = manage(&manager, &ReconciliationParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::InvalidParams { .. }));
    }
}
