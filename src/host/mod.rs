//! # 宿主进程模块
//!
//! 看门狗模块运行在宿主进程中，本模块描述宿主提供给模块的全部接口：
//!
//! - **服务器上下文**: 虚拟服务器身份及其默认目录策略
//! - **能力集合**: 看门狗提供者、回调注册器、负载均衡管理接口（均可缺失）
//! - **生命周期钩子**: post_config钩子及配置阶段（预配置 / 正式）
//! - **模块描述符**: 模块的静态注册记录

pub mod capabilities; // 宿主能力集合
pub mod context; // 服务器上下文
pub mod hooks; // 生命周期钩子与模块描述符

pub use capabilities::HostCapabilities;
pub use context::{DirectoryPolicy, ServerContext};
pub use hooks::{ConfigPhase, HookRegistry, ModuleDescriptor};
