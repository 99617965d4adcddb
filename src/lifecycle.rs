//! Startup gate for the cluster watchdog.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::balancer::{ClusterDescriptor, WorkerDescriptor};
use crate::config::Config;
use crate::error::{ClusterError, ClusterResult};
use crate::host::{ConfigPhase, HookRegistry, HostCapabilities, ModuleDescriptor, ServerContext};
use crate::reconcile::ReconciliationAction;
use crate::request::RegionPool;
use crate::watchdog::{ClusterWatchdog, DebounceState, InstanceFlags, WatchdogCallback};

/// Registration record of the module. No directives and no per-directory or
/// per-server configuration; it only hooks post-config.
pub const MODULE: ModuleDescriptor = ModuleDescriptor {
    name: "lbmethod_cluster",
    directives: &[],
    per_dir_config: false,
    per_server_config: false,
};

/// Result of a post-config pass
#[derive(Clone)]
pub enum GateOutcome {
    /// Preliminary configuration pass, nothing was done
    Skipped,
    /// Callbacks registered for every server
    Activated(Arc<ClusterWatchdog>),
}

impl fmt::Debug for GateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOutcome::Skipped => write!(f, "Skipped"),
            GateOutcome::Activated(watchdog) => f
                .debug_struct("Activated")
                .field("inert", &watchdog.is_inert())
                .finish(),
        }
    }
}

/// Checks the watchdog capabilities at startup and registers the cluster
/// callback for every server.
pub struct LifecycleGate {
    instance_name: String,
    flags: InstanceFlags,
    slice: Duration,
    cluster: ClusterDescriptor,
    worker: WorkerDescriptor,
    debounce: Arc<DebounceState>,
    activated: Mutex<Option<Arc<ClusterWatchdog>>>,
}

impl LifecycleGate {
    pub fn new(config: &Config, debounce: Arc<DebounceState>) -> Self {
        Self {
            instance_name: config.watchdog.name.clone(),
            flags: InstanceFlags {
                parent: false,
                singleton: config.watchdog.singleton,
            },
            slice: config.watchdog.get_slice(),
            cluster: ClusterDescriptor::from(&config.cluster),
            worker: WorkerDescriptor::new(&config.cluster, &config.worker),
            debounce,
            activated: Mutex::new(None),
        }
    }

    /// Register the post-config hook
    pub fn register_hooks(self: &Arc<Self>, hooks: &mut HookRegistry) {
        let gate = Arc::clone(self);
        hooks.register_post_config(MODULE.name, move |phase, servers, capabilities| {
            gate.post_config(phase, servers, capabilities).map(|_| ())
        });
    }

    /// The watchdog activated by the last successful pass
    pub fn watchdog(&self) -> Option<Arc<ClusterWatchdog>> {
        self.activated.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn post_config(
        &self,
        phase: ConfigPhase,
        servers: &[Arc<ServerContext>],
        capabilities: &HostCapabilities,
    ) -> ClusterResult<GateOutcome> {
        if phase == ConfigPhase::PreConfig {
            debug!(module = MODULE.name, "Skipping post_config during pre-config pass");
            return Ok(GateOutcome::Skipped);
        }

        let main_server = servers
            .first()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());

        let (Some(provider), Some(registrar)) = (
            capabilities.watchdog_provider(),
            capabilities.watchdog_registrar(),
        ) else {
            error!(server = %main_server, "watchdog capability is required");
            return Err(ClusterError::missing_capability("watchdog"));
        };

        let pool = RegionPool::new(MODULE.name);
        let instance = provider
            .get_instance(&self.instance_name, self.flags, &pool)
            .map_err(|e| {
                error!(
                    server = %main_server,
                    error = %e,
                    "Failed to create watchdog instance ({})",
                    self.instance_name
                );
                e
            })?;

        let action = match capabilities.balancer_manager() {
            Some(manager) => Some(ReconciliationAction::new(
                manager,
                self.cluster.clone(),
                self.worker.clone(),
            )),
            None => {
                warn!(
                    cluster = %self.cluster.name,
                    "No balancer manager available, cluster watchdog is inert"
                );
                None
            }
        };
        let watchdog = Arc::new(ClusterWatchdog::new(Arc::clone(&self.debounce), action));

        for server in servers {
            let callback: Arc<dyn WatchdogCallback> = watchdog.clone();
            registrar
                .register_callback(&instance, self.slice, Arc::clone(server), callback)
                .map_err(|e| {
                    error!(
                        server = %server,
                        error = %e,
                        "Failed to register watchdog callback ({})",
                        self.instance_name
                    );
                    e
                })?;
        }

        info!(
            instance = %self.instance_name,
            servers = servers.len(),
            cluster = %self.cluster.name,
            worker = %self.worker.endpoint,
            inert = watchdog.is_inert(),
            "Cluster watchdog activated"
        );

        if let Ok(mut slot) = self.activated.lock() {
            *slot = Some(Arc::clone(&watchdog));
        }
        Ok(GateOutcome::Activated(watchdog))
    }
}
