//! # 负载均衡管理模块
//!
//! 本模块描述看门狗向负载均衡器声明的状态，以及声明所用的接口。
//!
//! ## 组成
//!
//! - **描述符**: 唯一的集群（名称、负载方法）和唯一的后端节点
//!   （地址、路由、禁用标志、健康检查方法与间隔）
//! - **声明参数**: 有序的键值表，每次调用都重新构建
//! - **管理接口**: `BalancerManager` trait，要求对相同输入幂等
//! - **内存实现**: `InMemoryBalancerManager`，独立运行和测试时使用
//!
//! 负载分配算法和健康检查探测本身不在本模块范围内。

pub mod descriptor; // 集群与节点描述符
pub mod manager; // 管理接口及内存实现
pub mod params; // 声明参数

pub use descriptor::{ClusterDescriptor, HealthCheckMethod, LoadMethod, WorkerDescriptor};
pub use manager::{BalancerCluster, BalancerManager, BalancerWorker, InMemoryBalancerManager};
pub use params::{ParamKey, ReconciliationParams};
