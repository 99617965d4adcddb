use async_trait::async_trait;
use lbcluster::balancer::{
    BalancerManager, ClusterDescriptor, HealthCheckMethod, InMemoryBalancerManager, LoadMethod,
    ReconciliationParams, WorkerDescriptor,
};
use lbcluster::config::{ClusterConfig, WorkerConfig};
use lbcluster::host::ServerContext;
use lbcluster::request::{RegionPool, SyntheticRequest, SCOPE_TAG};
use lbcluster::{ClusterError, ClusterResult, ReconciliationAction};
use std::sync::{Arc, Mutex};

/// Test the declarations sent by one reconciliation pass
mod reconciliation_tests {
    use super::*;

    type Pairs = Vec<(&'static str, String)>;

    /// Balancer manager that records every call and can fail chosen calls
    #[derive(Default)]
    struct RecordingManager {
        calls: Mutex<Vec<Pairs>>,
        requests: Mutex<Vec<(String, String, String)>>,
        fail_calls: Vec<usize>,
    }

    impl RecordingManager {
        fn failing(fail_calls: Vec<usize>) -> Self {
            Self {
                fail_calls,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Pairs> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BalancerManager for RecordingManager {
        async fn manage(
            &self,
            request: &mut SyntheticRequest<'_>,
            params: &ReconciliationParams,
        ) -> ClusterResult<()> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(params.to_pairs());
                calls.len() - 1
            };
            self.requests.lock().unwrap().push((
                request.method().to_string(),
                request.uri().to_string(),
                request.server().to_string(),
            ));

            if self.fail_calls.contains(&index) {
                Err(ClusterError::balancer_manager(format!("call {} rejected", index)))
            } else {
                Ok(())
            }
        }
    }

    fn default_action(manager: Arc<dyn BalancerManager>) -> ReconciliationAction {
        ReconciliationAction::new(
            manager,
            ClusterDescriptor::default(),
            WorkerDescriptor::default(),
        )
    }

    async fn run_pass(action: &ReconciliationAction) -> ClusterResult<()> {
        let server = ServerContext::new("localhost", 80);
        let pool = RegionPool::new("test");
        let scope = pool.create_scope(SCOPE_TAG);
        let mut request = SyntheticRequest::build(&server, &scope);
        action.apply(&mut request).await
    }

    fn pairs(items: &[(&'static str, &str)]) -> Pairs {
        items.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    /// Test the exact parameters sent for the default target
    #[tokio::test]
    async fn test_parameter_exactness() {
        let manager = Arc::new(RecordingManager::default());
        let action = default_action(manager.clone());

        run_pass(&action).await.unwrap();

        let calls = manager.calls();
        assert_eq!(calls.len(), 2, "A pass issues exactly two declarations");
        assert_eq!(
            calls[0],
            pairs(&[
                ("cluster", "mycluster"),
                ("loadMethod", "byrequests"),
                ("addWorkerFlag", "1"),
                ("newWorkerURI", "http://localhost:8080"),
            ])
        );
        assert_eq!(
            calls[1],
            pairs(&[
                ("cluster", "mycluster"),
                ("worker", "http://localhost:8080"),
                ("route", "jvmroutetomcat1"),
                ("disabledFlag", "0"),
                ("healthCheckMethod", "CPING"),
                ("healthCheckIntervalMillis", "10000"),
            ])
        );

        let requests = manager.requests.lock().unwrap().clone();
        for (method, uri, server) in requests {
            assert_eq!(method, "PING");
            assert_eq!(uri, "/");
            assert_eq!(server, "localhost:80");
        }
    }

    /// Test that the pass result is the status of the worker declaration
    #[tokio::test]
    async fn test_worker_declaration_failure_is_returned() {
        let manager = Arc::new(RecordingManager::failing(vec![1]));
        let action = default_action(manager.clone());

        let err = run_pass(&action).await.unwrap_err();
        assert!(matches!(err, ClusterError::BalancerManager { .. }));
        assert_eq!(err.to_string(), "Balancer manager error: call 1 rejected");
        assert_eq!(manager.calls().len(), 2);
    }

    /// Test that a failed cluster declaration does not stop the worker declaration
    #[tokio::test]
    async fn test_cluster_declaration_failure_is_not_the_result() {
        let manager = Arc::new(RecordingManager::failing(vec![0]));
        let action = default_action(manager.clone());

        assert!(run_pass(&action).await.is_ok());
        assert_eq!(manager.calls().len(), 2);
    }

    /// Test that repeating a pass leaves the balancer in the same state
    #[tokio::test]
    async fn test_idempotent_against_in_memory_balancer() {
        let balancer = Arc::new(InMemoryBalancerManager::new());
        let action = default_action(balancer.clone());

        run_pass(&action).await.unwrap();
        let once = balancer.snapshot().await;

        run_pass(&action).await.unwrap();
        run_pass(&action).await.unwrap();
        let thrice = balancer.snapshot().await;

        assert_eq!(once, thrice);
        assert_eq!(thrice.len(), 1, "No duplicate clusters");
        let cluster = &thrice[0];
        assert_eq!(cluster.name, "mycluster");
        assert_eq!(cluster.load_method, LoadMethod::ByRequests);
        assert_eq!(cluster.workers.len(), 1, "No duplicate workers");

        let worker = &cluster.workers[0];
        assert_eq!(worker.endpoint, "http://localhost:8080");
        assert_eq!(worker.route, "jvmroutetomcat1");
        assert!(!worker.disabled);
        assert_eq!(worker.health_check_method, HealthCheckMethod::Cping);
        assert_eq!(worker.health_check_interval_ms, 10_000);
        assert_eq!(balancer.applied(), 6);
    }

    /// Test that configured targets flow into the declarations
    #[tokio::test]
    async fn test_configured_target() {
        let cluster = ClusterConfig {
            name: "shop".to_string(),
            load_method: LoadMethod::ByBusyness,
        };
        let worker = WorkerConfig {
            endpoint: "ajp://10.0.0.7:8009".to_string(),
            route: "node7".to_string(),
            disabled: true,
            health_check_method: HealthCheckMethod::Options,
            health_check_interval_ms: 2_000,
        };

        let balancer = Arc::new(InMemoryBalancerManager::new());
        let action = ReconciliationAction::new(
            balancer.clone(),
            ClusterDescriptor::from(&cluster),
            WorkerDescriptor::new(&cluster, &worker),
        );

        run_pass(&action).await.unwrap();

        let shop = balancer.cluster("shop").await.unwrap();
        assert_eq!(shop.load_method, LoadMethod::ByBusyness);
        assert_eq!(shop.workers[0].endpoint, "ajp://10.0.0.7:8009");
        assert_eq!(shop.workers[0].route, "node7");
        assert!(shop.workers[0].disabled);
        assert_eq!(shop.workers[0].health_check_method, HealthCheckMethod::Options);
        assert!(balancer.cluster("mycluster").await.is_none());
    }
}
