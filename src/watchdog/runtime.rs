use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{
    InstanceFlags, WatchdogCallback, WatchdogHandle, WatchdogProvider, WatchdogRegistrar,
    WatchdogState,
};
use crate::error::{ClusterError, ClusterResult};
use crate::graceful_shutdown::{ShutdownManager, ShutdownSignal, TaskHandle};
use crate::host::ServerContext;
use crate::request::RegionPool;

#[derive(Clone)]
struct Registration {
    instance: WatchdogHandle,
    slice: Duration,
    server: Arc<ServerContext>,
    callback: Arc<dyn WatchdogCallback>,
}

#[derive(Default)]
struct RuntimeState {
    instances: BTreeMap<String, WatchdogHandle>,
    registrations: Vec<Registration>,
    next_id: u64,
    started: bool,
}

/// Watchdog host driven by tokio timers.
///
/// Every registered callback runs in its own task and receives RUNNING once
/// per slice. Callbacks of non-singleton instances are replicated across all
/// execution contexts; singleton instances run each callback once.
pub struct TokioWatchdog {
    contexts: usize,
    state: Mutex<RuntimeState>,
}

impl TokioWatchdog {
    pub fn new(contexts: usize) -> Self {
        Self {
            contexts: contexts.max(1),
            state: Mutex::new(RuntimeState::default()),
        }
    }

    pub fn contexts(&self) -> usize {
        self.contexts
    }

    pub fn registration_count(&self) -> usize {
        self.lock().map(|s| s.registrations.len()).unwrap_or(0)
    }

    fn lock(&self) -> ClusterResult<MutexGuard<'_, RuntimeState>> {
        self.state
            .lock()
            .map_err(|_| ClusterError::internal("watchdog state lock poisoned"))
    }

    /// Spawn one task per registration and execution context. Registration is
    /// closed from here on.
    pub fn start(&self, shutdown: &Arc<ShutdownManager>) -> ClusterResult<Vec<JoinHandle<()>>> {
        let registrations = {
            let mut state = self.lock()?;
            if state.started {
                return Err(ClusterError::watchdog("watchdog already started"));
            }
            state.started = true;
            state.registrations.clone()
        };

        let mut handles = Vec::new();
        for registration in registrations {
            let replicas = if registration.instance.flags().singleton {
                1
            } else {
                self.contexts
            };

            for context in 0..replicas {
                let task = shutdown.create_task_handle();
                let receiver = task.shutdown_receiver();
                handles.push(tokio::spawn(run_callback(
                    registration.clone(),
                    context,
                    receiver,
                    task,
                )));
            }
        }

        info!(tasks = handles.len(), "Watchdog started");
        Ok(handles)
    }
}

impl WatchdogProvider for TokioWatchdog {
    fn get_instance(
        &self,
        name: &str,
        flags: InstanceFlags,
        pool: &RegionPool,
    ) -> ClusterResult<WatchdogHandle> {
        if name.is_empty() {
            return Err(ClusterError::watchdog("watchdog instance name cannot be empty"));
        }

        let mut state = self.lock()?;
        if let Some(existing) = state.instances.get(name) {
            return Ok(existing.clone());
        }

        state.next_id += 1;
        let handle = WatchdogHandle::new(state.next_id, name, flags);
        state.instances.insert(name.to_string(), handle.clone());
        debug!(
            name,
            id = handle.id(),
            pool = pool.name(),
            singleton = flags.singleton,
            "Watchdog instance created"
        );
        Ok(handle)
    }
}

impl WatchdogRegistrar for TokioWatchdog {
    fn register_callback(
        &self,
        instance: &WatchdogHandle,
        slice: Duration,
        server: Arc<ServerContext>,
        callback: Arc<dyn WatchdogCallback>,
    ) -> ClusterResult<()> {
        if slice.is_zero() {
            return Err(ClusterError::watchdog("watchdog slice must be greater than 0"));
        }

        let mut state = self.lock()?;
        if state.started {
            return Err(ClusterError::watchdog(format!(
                "watchdog {} already started, cannot register callback for {}",
                instance.name(),
                server
            )));
        }
        if state.instances.get(instance.name()) != Some(instance) {
            return Err(ClusterError::watchdog(format!(
                "unknown watchdog instance {}",
                instance.name()
            )));
        }

        debug!(instance = instance.name(), server = %server, slice = ?slice, "Watchdog callback registered");
        state.registrations.push(Registration {
            instance: instance.clone(),
            slice,
            server,
            callback,
        });
        Ok(())
    }
}

async fn run_callback(
    registration: Registration,
    context: usize,
    mut shutdown_rx: broadcast::Receiver<ShutdownSignal>,
    task: TaskHandle,
) {
    let Registration {
        instance,
        slice,
        server,
        callback,
    } = registration;
    let pool = RegionPool::new(&format!("{}#{}", instance.name(), context));

    if let Err(e) = callback
        .on_state(WatchdogState::Starting, &server, &pool)
        .await
    {
        warn!(server = %server, error = %e, "Watchdog callback failed to start");
    }

    let mut interval = tokio::time::interval(slice);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if task.is_shutdown_requested() {
                    break;
                }
                if let Err(e) = callback.on_state(WatchdogState::Running, &server, &pool).await {
                    debug!(
                        server = %server,
                        context,
                        error = %e,
                        retryable = e.is_retryable(),
                        "Watchdog callback failed"
                    );
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }

    if let Err(e) = callback
        .on_state(WatchdogState::Stopping, &server, &pool)
        .await
    {
        warn!(server = %server, error = %e, "Watchdog callback failed to stop");
    }

    let stats = pool.stats();
    debug!(
        server = %server,
        context,
        scopes = stats.created,
        live = stats.live(),
        "Watchdog task finished"
    );
}
