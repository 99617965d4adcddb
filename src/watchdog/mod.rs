//! # 看门狗模块
//!
//! 看门狗按固定时间片周期性地调用已注册的回调。本模块包含：
//!
//! - **能力接口**: `WatchdogProvider`（获取命名实例）与 `WatchdogRegistrar`（注册回调）
//! - **回调接口**: `WatchdogCallback`，接收 STARTING / RUNNING / STOPPING 三种状态
//! - **去抖状态**: `DebounceState`，进程内所有回调共享，保证两次对账之间至少间隔去抖窗口
//! - **集群回调**: `ClusterWatchdog`，在去抖窗口结束后执行一次对账
//! - **运行时**: `TokioWatchdog`，基于tokio定时器驱动回调
//!
//! ## 状态机
//!
//! ```text
//! STARTING -> RUNNING -> RUNNING -> ... -> STOPPING
//! ```
//!
//! STARTING 与 STOPPING 各只出现一次，不会重新进入。

pub mod cluster; // 集群对账回调
pub mod debounce; // 进程级去抖状态
pub mod runtime; // tokio看门狗运行时

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ClusterResult;
use crate::host::ServerContext;
use crate::request::RegionPool;

pub use cluster::ClusterWatchdog;
pub use debounce::DebounceState;
pub use runtime::TokioWatchdog;

/// State delivered to a watchdog callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for WatchdogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchdogState::Starting => write!(f, "STARTING"),
            WatchdogState::Running => write!(f, "RUNNING"),
            WatchdogState::Stopping => write!(f, "STOPPING"),
        }
    }
}

/// Flags for creating a watchdog instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstanceFlags {
    /// Run in the parent process instead of the workers
    pub parent: bool,
    /// Run each callback in a single execution context
    pub singleton: bool,
}

/// Handle to a named watchdog instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchdogHandle {
    id: u64,
    name: String,
    flags: InstanceFlags,
}

impl WatchdogHandle {
    pub fn new<S: Into<String>>(id: u64, name: S, flags: InstanceFlags) -> Self {
        Self {
            id,
            name: name.into(),
            flags,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> InstanceFlags {
        self.flags
    }
}

/// Callback driven by a watchdog instance
#[async_trait]
pub trait WatchdogCallback: Send + Sync {
    async fn on_state(
        &self,
        state: WatchdogState,
        server: &ServerContext,
        pool: &RegionPool,
    ) -> ClusterResult<()>;
}

/// Creates or looks up named watchdog instances
pub trait WatchdogProvider: Send + Sync {
    fn get_instance(
        &self,
        name: &str,
        flags: InstanceFlags,
        pool: &RegionPool,
    ) -> ClusterResult<WatchdogHandle>;
}

/// Registers callbacks on a watchdog instance
pub trait WatchdogRegistrar: Send + Sync {
    fn register_callback(
        &self,
        instance: &WatchdogHandle,
        slice: Duration,
        server: Arc<ServerContext>,
        callback: Arc<dyn WatchdogCallback>,
    ) -> ClusterResult<()>;
}
