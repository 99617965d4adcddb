//! One reconciliation pass: declare the cluster with its worker, then push the
//! worker's routing and health check settings.

use std::sync::Arc;
use tracing::debug;

use crate::balancer::{
    BalancerManager, ClusterDescriptor, ParamKey, ReconciliationParams, WorkerDescriptor,
};
use crate::error::ClusterResult;
use crate::request::SyntheticRequest;

pub struct ReconciliationAction {
    manager: Arc<dyn BalancerManager>,
    cluster: ClusterDescriptor,
    worker: WorkerDescriptor,
}

impl ReconciliationAction {
    pub fn new(
        manager: Arc<dyn BalancerManager>,
        cluster: ClusterDescriptor,
        worker: WorkerDescriptor,
    ) -> Self {
        Self {
            manager,
            cluster,
            worker,
        }
    }

    pub fn cluster(&self) -> &ClusterDescriptor {
        &self.cluster
    }

    pub fn worker(&self) -> &WorkerDescriptor {
        &self.worker
    }

    /// Declare the cluster and add the worker to it
    pub fn declare_cluster_params(&self) -> ReconciliationParams {
        let mut params = ReconciliationParams::new();
        params
            .set(ParamKey::Cluster, self.cluster.name.as_str())
            .set(ParamKey::LoadMethod, self.cluster.load_method.as_str())
            .set(ParamKey::AddWorkerFlag, "1")
            .set(ParamKey::NewWorkerUri, self.worker.endpoint.as_str());
        params
    }

    /// Configure the existing worker
    pub fn configure_worker_params(&self) -> ReconciliationParams {
        let disabled = if self.worker.disabled { "1" } else { "0" };
        let mut params = ReconciliationParams::new();
        params
            .set(ParamKey::Cluster, self.cluster.name.as_str())
            .set(ParamKey::Worker, self.worker.endpoint.as_str())
            .set(ParamKey::Route, self.worker.route.as_str())
            .set(ParamKey::DisabledFlag, disabled)
            .set(
                ParamKey::HealthCheckMethod,
                self.worker.health_check_method.as_str(),
            )
            .set(
                ParamKey::HealthCheckIntervalMillis,
                self.worker.health_check_interval_ms.to_string(),
            );
        params
    }

    /// Run both declarations in order. The worker declaration is always sent;
    /// its status is the result of the pass.
    pub async fn apply(&self, request: &mut SyntheticRequest<'_>) -> ClusterResult<()> {
        let declare = self.declare_cluster_params();
        if let Err(e) = self.manager.manage(request, &declare).await {
            debug!(
                cluster = %self.cluster.name,
                error = %e,
                "Cluster declaration failed"
            );
        }

        let configure = self.configure_worker_params();
        self.manager.manage(request, &configure).await
    }
}
