use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::{DebounceState, WatchdogCallback, WatchdogState};
use crate::error::ClusterResult;
use crate::host::ServerContext;
use crate::reconcile::ReconciliationAction;
use crate::request::{RegionPool, SyntheticRequest, SCOPE_TAG};

/// Watchdog callback keeping the balancer cluster in line with the declared
/// target. Registered once per server; every registration shares one
/// [`DebounceState`], so replicated callbacks do not multiply the pass rate.
pub struct ClusterWatchdog {
    debounce: Arc<DebounceState>,
    action: Option<ReconciliationAction>,
}

impl ClusterWatchdog {
    /// `action` is `None` when the host has no balancer manager; the callback
    /// then stays inert.
    pub fn new(debounce: Arc<DebounceState>, action: Option<ReconciliationAction>) -> Self {
        Self { debounce, action }
    }

    pub fn is_inert(&self) -> bool {
        self.action.is_none()
    }

    pub fn debounce(&self) -> &Arc<DebounceState> {
        &self.debounce
    }

    pub fn action(&self) -> Option<&ReconciliationAction> {
        self.action.as_ref()
    }

    /// Body of a RUNNING tick
    pub async fn tick(&self, server: &ServerContext, pool: &RegionPool) -> ClusterResult<()> {
        let Some(action) = &self.action else {
            return Ok(());
        };

        if !self.debounce.try_fire(Instant::now()) {
            trace!(server = %server, "Reconciliation skipped, inside debounce window");
            return Ok(());
        }

        // Released on every return path when it goes out of scope
        let scope = pool.create_scope(SCOPE_TAG);
        let mut request = SyntheticRequest::build(server, &scope);

        debug!(
            server = %server,
            cluster = %action.cluster().name,
            worker = %action.worker().endpoint,
            "Reconciling balancer cluster"
        );
        action.apply(&mut request).await
    }
}

#[async_trait]
impl WatchdogCallback for ClusterWatchdog {
    async fn on_state(
        &self,
        state: WatchdogState,
        server: &ServerContext,
        pool: &RegionPool,
    ) -> ClusterResult<()> {
        match state {
            WatchdogState::Starting => {
                debug!(server = %server, "lbmethod_cluster_watchdog_callback STARTING");
                Ok(())
            }
            WatchdogState::Running => self.tick(server, pool).await,
            WatchdogState::Stopping => {
                debug!(server = %server, "lbmethod_cluster_watchdog_callback STOPPING");
                Ok(())
            }
        }
    }
}
