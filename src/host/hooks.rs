use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{HostCapabilities, ServerContext};
use crate::error::ClusterResult;

/// Which configuration pass the host is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPhase {
    /// Preliminary pass made before the real configuration is read
    PreConfig,
    /// Configuration is final
    Running,
}

impl fmt::Display for ConfigPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigPhase::PreConfig => write!(f, "PRE_CONFIG"),
            ConfigPhase::Running => write!(f, "RUNNING"),
        }
    }
}

type PostConfigFn = Box<
    dyn Fn(ConfigPhase, &[Arc<ServerContext>], &HostCapabilities) -> ClusterResult<()>
        + Send
        + Sync,
>;

struct PostConfigHook {
    module: &'static str,
    hook: PostConfigFn,
}

/// Post-config hooks registered by modules, run in registration order
#[derive(Default)]
pub struct HookRegistry {
    post_config: Vec<PostConfigHook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_post_config<F>(&mut self, module: &'static str, hook: F)
    where
        F: Fn(ConfigPhase, &[Arc<ServerContext>], &HostCapabilities) -> ClusterResult<()>
            + Send
            + Sync
            + 'static,
    {
        debug!(module, "Registered post_config hook");
        self.post_config.push(PostConfigHook {
            module,
            hook: Box::new(hook),
        });
    }

    /// Run every post-config hook; the first failure aborts the pass
    pub fn run_post_config(
        &self,
        phase: ConfigPhase,
        servers: &[Arc<ServerContext>],
        capabilities: &HostCapabilities,
    ) -> ClusterResult<()> {
        for entry in &self.post_config {
            debug!(module = entry.module, phase = %phase, "Running post_config hook");
            (entry.hook)(phase, servers, capabilities)?;
        }
        Ok(())
    }

    pub fn post_config_count(&self) -> usize {
        self.post_config.len()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules: Vec<_> = self.post_config.iter().map(|h| h.module).collect();
        f.debug_struct("HookRegistry")
            .field("post_config", &modules)
            .finish()
    }
}

/// Static registration record of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: &'static str,
    /// Configuration directives; none for modules configured purely by hooks
    pub directives: &'static [&'static str],
    pub per_dir_config: bool,
    pub per_server_config: bool,
}
