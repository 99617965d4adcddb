//! # lbcluster - 负载均衡集群看门狗
//!
//! lbcluster在宿主进程中周期性地把负载均衡器中的一个集群及其后端节点
//! 同步到声明的目标状态。它不处理客户端流量，而是伪造一个最小的请求上下文
//! 来调用为真实请求设计的负载均衡管理接口。
//!
//! ## 核心功能
//!
//! - **合成请求**: 每次对账在独立的作用域中构建请求，作用域在任何退出路径上都会释放
//! - **对账动作**: 先声明集群并添加节点，再配置节点的路由和健康检查（幂等）
//! - **去抖调度**: 回调按服务器复制注册，共享的去抖状态保证对账频率不被放大
//! - **启动门控**: 缺少看门狗能力时启动失败；缺少负载均衡管理接口时功能静默停用
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use lbcluster::balancer::InMemoryBalancerManager;
//! use lbcluster::config::Config;
//! use lbcluster::host::{ConfigPhase, HostCapabilities, ServerContext};
//! use lbcluster::lifecycle::LifecycleGate;
//! use lbcluster::watchdog::{DebounceState, TokioWatchdog};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let watchdog = Arc::new(TokioWatchdog::new(1));
//! let capabilities = HostCapabilities::new()
//!     .with_watchdog_provider(watchdog.clone())
//!     .with_watchdog_registrar(watchdog.clone())
//!     .with_balancer_manager(Arc::new(InMemoryBalancerManager::new()));
//!
//! let debounce = Arc::new(DebounceState::new(config.watchdog.get_debounce()));
//! let gate = LifecycleGate::new(&config, debounce);
//! let servers = vec![Arc::new(ServerContext::new("localhost", 80))];
//! gate.post_config(ConfigPhase::Running, &servers, &capabilities)?;
//! # Ok(())
//! # }
//! ```

pub mod balancer;
pub mod config;
pub mod error;
pub mod graceful_shutdown;
pub mod host;
pub mod lifecycle;
pub mod reconcile;
pub mod request;
pub mod watchdog;

// Re-export commonly used types
pub use error::{ClusterError, ClusterResult, ErrorSeverity};
pub use graceful_shutdown::{ShutdownManager, ShutdownSignal, TaskHandle};
pub use lifecycle::{GateOutcome, LifecycleGate, MODULE};
pub use reconcile::ReconciliationAction;
pub use request::{RegionPool, RequestScope, SyntheticRequest};
pub use watchdog::{ClusterWatchdog, DebounceState, TokioWatchdog, WatchdogState};
