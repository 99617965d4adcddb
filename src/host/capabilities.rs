use std::fmt;
use std::sync::Arc;

use crate::balancer::BalancerManager;
use crate::watchdog::{WatchdogProvider, WatchdogRegistrar};

/// Optional capabilities the host exposes to modules at post-config time.
/// Any of them may be absent; modules decide whether that is fatal.
#[derive(Clone, Default)]
pub struct HostCapabilities {
    watchdog_provider: Option<Arc<dyn WatchdogProvider>>,
    watchdog_registrar: Option<Arc<dyn WatchdogRegistrar>>,
    balancer_manager: Option<Arc<dyn BalancerManager>>,
}

impl HostCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watchdog_provider(mut self, provider: Arc<dyn WatchdogProvider>) -> Self {
        self.watchdog_provider = Some(provider);
        self
    }

    pub fn with_watchdog_registrar(mut self, registrar: Arc<dyn WatchdogRegistrar>) -> Self {
        self.watchdog_registrar = Some(registrar);
        self
    }

    pub fn with_balancer_manager(mut self, manager: Arc<dyn BalancerManager>) -> Self {
        self.balancer_manager = Some(manager);
        self
    }

    pub fn watchdog_provider(&self) -> Option<Arc<dyn WatchdogProvider>> {
        self.watchdog_provider.clone()
    }

    pub fn watchdog_registrar(&self) -> Option<Arc<dyn WatchdogRegistrar>> {
        self.watchdog_registrar.clone()
    }

    pub fn balancer_manager(&self) -> Option<Arc<dyn BalancerManager>> {
        self.balancer_manager.clone()
    }
}

impl fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCapabilities")
            .field("watchdog_provider", &self.watchdog_provider.is_some())
            .field("watchdog_registrar", &self.watchdog_registrar.is_some())
            .field("balancer_manager", &self.balancer_manager.is_some())
            .finish()
    }
}
