use crate::error::{ClusterError, ClusterResult};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

/// Graceful shutdown manager
#[derive(Debug)]
pub struct ShutdownManager {
    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    /// Active tasks counter
    active_tasks: Arc<AtomicUsize>,
    /// Shutdown timeout
    timeout: Duration,
    /// Whether shutdown has been initiated
    shutdown_initiated: Arc<AtomicBool>,
}

/// Shutdown signal types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// Graceful shutdown requested (SIGTERM)
    Graceful,
    /// Immediate shutdown requested (SIGINT)
    Immediate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Graceful => write!(f, "GRACEFUL"),
            ShutdownSignal::Immediate => write!(f, "IMMEDIATE"),
        }
    }
}

/// Task handle for tracking active tasks
#[derive(Debug)]
pub struct TaskHandle {
    manager: Arc<ShutdownManager>,
    active: AtomicBool,
}

impl TaskHandle {
    fn new(manager: Arc<ShutdownManager>) -> Self {
        manager.active_tasks.fetch_add(1, Ordering::SeqCst);
        Self {
            manager,
            active: AtomicBool::new(true),
        }
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.manager.shutdown_initiated.load(Ordering::Relaxed)
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<ShutdownSignal> {
        self.manager.shutdown_tx.subscribe()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.manager.active_tasks.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl ShutdownManager {
    /// Create a new shutdown manager
    pub fn new(timeout: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            shutdown_tx,
            active_tasks: Arc::new(AtomicUsize::new(0)),
            timeout,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create with default timeout
    pub fn with_default_timeout() -> Self {
        Self::new(Duration::from_secs(30))
    }

    /// Create a task handle for tracking
    pub fn create_task_handle(self: &Arc<Self>) -> TaskHandle {
        TaskHandle::new(Arc::clone(self))
    }

    /// Wait for SIGTERM or ctrl-c, then shut down
    pub async fn wait_for_signal(self: Arc<Self>) -> ClusterResult<()> {
        let signal = recv_signal().await?;
        self.shutdown(signal).await
    }

    /// Initiate shutdown
    pub async fn shutdown(&self, signal: ShutdownSignal) -> ClusterResult<()> {
        if self.shutdown_initiated.swap(true, Ordering::SeqCst) {
            warn!("Shutdown already initiated");
            return Ok(());
        }

        info!(signal = %signal, "Initiating shutdown");

        if let Err(e) = self.shutdown_tx.send(signal) {
            debug!(error = %e, "No shutdown listeners");
        }

        let shutdown_timeout = match signal {
            ShutdownSignal::Graceful => self.timeout,
            ShutdownSignal::Immediate => self.timeout / 2,
        };

        let start_time = Instant::now();
        match timeout(shutdown_timeout, self.wait_for_active_tasks()).await {
            Ok(()) => {
                info!(
                    signal = %signal,
                    duration = ?start_time.elapsed(),
                    "Shutdown completed"
                );
                Ok(())
            }
            Err(_) => {
                let remaining_tasks = self.active_task_count();
                error!(
                    timeout = ?shutdown_timeout,
                    remaining_tasks,
                    "Shutdown timed out"
                );
                Err(ClusterError::watchdog(format!(
                    "shutdown timed out with {} active tasks",
                    remaining_tasks
                )))
            }
        }
    }

    /// Wait for active tasks to complete
    async fn wait_for_active_tasks(&self) {
        let check_interval = Duration::from_millis(50);

        while self.active_tasks.load(Ordering::SeqCst) > 0 {
            debug!(
                remaining_tasks = self.active_tasks.load(Ordering::SeqCst),
                "Waiting for active tasks to complete"
            );
            sleep(check_interval).await;
        }

        info!("All active tasks completed");
    }

    /// Get current number of active tasks
    pub fn active_task_count(&self) -> usize {
        self.active_tasks.load(Ordering::SeqCst)
    }

    /// Check if shutdown has been initiated
    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Relaxed)
    }
}

#[cfg(unix)]
async fn recv_signal() -> ClusterResult<ShutdownSignal> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM, initiating graceful shutdown");
            Ok(ShutdownSignal::Graceful)
        }
        result = signal::ctrl_c() => {
            result?;
            info!("Received SIGINT, initiating immediate shutdown");
            Ok(ShutdownSignal::Immediate)
        }
    }
}

#[cfg(not(unix))]
async fn recv_signal() -> ClusterResult<ShutdownSignal> {
    signal::ctrl_c().await?;
    info!("Received CTRL+C, initiating immediate shutdown");
    Ok(ShutdownSignal::Immediate)
}
