//! # 配置管理模块
//!
//! 本模块负责lbcluster看门狗进程的配置加载：
//!
//! - TOML配置文件解析和验证
//! - 环境变量替换（`${VAR}` 与 `${VAR:-default}`）
//! - 所有字段都有默认值，空文件即可运行
//!
//! ## 配置结构
//!
//! - `cluster`: 受管理的唯一集群（名称、负载方法）
//! - `worker`: 集群中唯一的后端节点（地址、路由、健康检查）
//! - `watchdog`: 看门狗实例名称、时间片、去抖窗口、执行上下文数量
//! - `servers`: 虚拟服务器列表，每个服务器注册一个回调
//! - `logging`: 日志级别
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use lbcluster::config::Config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file_with_env("lbcluster.toml").await?;
//! println!("集群: {}", config.cluster.name);
//! # Ok(())
//! # }
//! ```

pub mod cluster; // 集群与节点配置
pub mod logging; // 日志配置
pub mod num_cpus; // CPU数量检测
pub mod server; // 虚拟服务器配置
pub mod watchdog; // 看门狗配置

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use tracing::{info, warn};

pub use cluster::{ClusterConfig, WorkerConfig};
pub use logging::{LogHandle, LoggingConfig};
pub use server::ServerConfig;
pub use watchdog::WatchdogConfig;

/// lbcluster主配置结构
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// 受管理的集群
    pub cluster: ClusterConfig,
    /// 集群中的后端节点
    pub worker: WorkerConfig,
    /// 看门狗调度配置
    pub watchdog: WatchdogConfig,
    /// 虚拟服务器（为空时使用默认的localhost:80）
    pub servers: Vec<ServerConfig>,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file with environment variable expansion
    pub async fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let config = Self::from_toml_str(&content)?;

        info!("Configuration loaded from {:?}", path.as_ref());
        Ok(config)
    }

    /// Parse configuration text, expanding environment variables first
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded_content = expand_env_vars(content);

        let mut config: Config = toml::from_str(&expanded_content)?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values where needed
    fn apply_defaults(&mut self) {
        if self.servers.is_empty() {
            self.servers.push(ServerConfig::default());
        }

        if self.watchdog.contexts.is_none() {
            self.watchdog.contexts = Some(num_cpus::get());
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        self.cluster.validate()?;
        self.worker.validate()?;
        self.watchdog.validate()?;
        self.logging.validate()?;

        if self.servers.is_empty() {
            return Err(anyhow::anyhow!("At least one server must be configured"));
        }

        let mut seen = HashSet::with_capacity(self.servers.len());
        for server in &self.servers {
            server.validate()?;
            if !seen.insert((server.name.as_str(), server.port)) {
                return Err(anyhow::anyhow!(
                    "Duplicate server {}:{}",
                    server.name,
                    server.port
                ));
            }
        }

        if self.worker.disabled {
            warn!(
                worker = %self.worker.endpoint,
                "Worker is declared disabled - the balancer will not route to it"
            );
        }

        if self.worker.health_check_interval_ms > 0
            && self.worker.health_check_interval_ms < self.watchdog.slice_ms
        {
            warn!(
                interval_ms = self.worker.health_check_interval_ms,
                slice_ms = self.watchdog.slice_ms,
                "Health check interval is shorter than the watchdog slice"
            );
        }

        Ok(())
    }
}

/// Expand environment variables in configuration content.
/// Supports ${VAR} and ${VAR:-default}; substituted text is not expanded again
/// and comment lines are left as written.
fn expand_env_vars(content: &str) -> String {
    let mut result = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
        } else {
            expand_line(line, &mut result);
        }
    }

    result
}

fn expand_line(line: &str, out: &mut String) {
    let mut rest = line;

    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break; // Malformed ${VAR expression
        };

        out.push_str(&rest[..start]);
        let var_expr = &rest[start + 2..start + end];
        let replacement = if let Some(default_pos) = var_expr.find(":-") {
            let var_name = &var_expr[..default_pos];
            let default_value = &var_expr[default_pos + 2..];
            env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        } else {
            env::var(var_expr).unwrap_or_else(|_| {
                warn!(
                    "Environment variable '{}' not found, using empty string",
                    var_expr
                );
                String::new()
            })
        };
        out.push_str(&replacement);
        rest = &rest[start + end + 1..];
    }

    out.push_str(rest);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancer::{HealthCheckMethod, LoadMethod};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config_file(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[tokio::test]
    async fn test_basic_config_loading() {
        let config_content = r#"
[cluster]
name = "shop"
load_method = "bybusyness"

[worker]
endpoint = "ajp://10.0.0.7:8009"
route = "node7"
health_check_method = "OPTIONS"
health_check_interval_ms = 2000

[watchdog]
slice_ms = 250
debounce_secs = 10
contexts = 3

[[servers]]
name = "www.example.com"
port = 443

[[servers]]
name = "admin.example.com"
port = 8443
defaults = { timeout = "60" }

[logging]
level = "debug"
ansi = false
"#;

        let temp_file = create_temp_config_file(config_content);
        let config = Config::from_file_with_env(temp_file.path()).await.unwrap();

        assert_eq!(config.cluster.name, "shop");
        assert_eq!(config.cluster.load_method, LoadMethod::ByBusyness);
        assert_eq!(config.worker.endpoint, "ajp://10.0.0.7:8009");
        assert_eq!(config.worker.health_check_method, HealthCheckMethod::Options);
        assert_eq!(config.worker.health_check_interval_ms, 2000);
        assert_eq!(config.watchdog.get_contexts(), 3);
        assert_eq!(config.watchdog.get_slice().as_millis(), 250);
        assert_eq!(config.servers.len(), 2);
        assert_eq!(
            config.servers[1].defaults.get("timeout").map(String::as_str),
            Some("60")
        );
        assert!(!config.logging.ansi);
    }

    #[tokio::test]
    async fn test_config_defaults() {
        let temp_file = create_temp_config_file("");
        let config = Config::from_file_with_env(temp_file.path()).await.unwrap();

        assert_eq!(config.cluster.name, "mycluster");
        assert_eq!(config.worker.route, "jvmroutetomcat1");
        assert_eq!(config.watchdog.name, "_lb_cluster_");
        assert_eq!(config.watchdog.debounce_secs, 5);
        assert!(config.watchdog.contexts.unwrap() > 0);
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].name, "localhost");
    }

    #[test]
    fn test_env_var_expansion() {
        env::set_var("LBCLUSTER_TEST_ROUTE", "tomcat42");

        let config = Config::from_toml_str(
            r#"
[worker]
endpoint = "http://${LBCLUSTER_TEST_HOST:-127.0.0.1}:8080"
route = "${LBCLUSTER_TEST_ROUTE}"
"#,
        )
        .unwrap();

        assert_eq!(config.worker.endpoint, "http://127.0.0.1:8080");
        assert_eq!(config.worker.route, "tomcat42");

        env::remove_var("LBCLUSTER_TEST_ROUTE");
    }

    #[test]
    fn test_expand_env_vars() {
        env::set_var("LBCLUSTER_TEST_VAR", "test_value");

        let result = expand_env_vars("name = \"${LBCLUSTER_TEST_VAR}\"");
        assert_eq!(result, "name = \"test_value\"");

        let result = expand_env_vars("name = \"${LBCLUSTER_MISSING_VAR:-fallback}\"");
        assert_eq!(result, "name = \"fallback\"");

        let malformed = expand_env_vars("name = \"${UNCLOSED\"");
        assert_eq!(malformed, "name = \"${UNCLOSED\"");

        env::remove_var("LBCLUSTER_TEST_VAR");
    }

    #[test]
    fn test_expanded_values_are_not_rescanned() {
        env::set_var("LBCLUSTER_TEST_SELF", "${LBCLUSTER_TEST_SELF}");
        env::set_var("LBCLUSTER_TEST_NESTED", "${LBCLUSTER_TEST_OTHER:-x}");

        let result = expand_env_vars("route = \"${LBCLUSTER_TEST_SELF}\"");
        assert_eq!(result, "route = \"${LBCLUSTER_TEST_SELF}\"");

        let result = expand_env_vars("a = \"${LBCLUSTER_TEST_NESTED}\"\nb = \"${LBCLUSTER_TEST_SELF}\"\n");
        assert_eq!(
            result,
            "a = \"${LBCLUSTER_TEST_OTHER:-x}\"\nb = \"${LBCLUSTER_TEST_SELF}\"\n"
        );

        env::remove_var("LBCLUSTER_TEST_SELF");
        env::remove_var("LBCLUSTER_TEST_NESTED");
    }

    #[test]
    fn test_comment_lines_are_not_expanded() {
        let content = "# set ${LBCLUSTER_TEST_UNSET_ROUTE or leave it\n[worker]\nroute = \"${LBCLUSTER_TEST_UNSET_ROUTE:-tomcat9}\"\n";
        let result = expand_env_vars(content);

        assert!(result.starts_with("# set ${LBCLUSTER_TEST_UNSET_ROUTE or leave it\n"));
        assert!(result.ends_with("route = \"tomcat9\"\n"));

        let config = Config::from_toml_str(content).unwrap();
        assert_eq!(config.worker.route, "tomcat9");
    }

    #[test]
    fn test_config_validation() {
        let zero_slice = Config::from_toml_str("[watchdog]\nslice_ms = 0\n");
        assert!(zero_slice.is_err());

        let duplicate_servers = Config::from_toml_str(
            r#"
[[servers]]
name = "a"
port = 80

[[servers]]
name = "a"
port = 80
"#,
        );
        assert!(duplicate_servers.is_err());

        let bad_method = Config::from_toml_str("[worker]\nhealth_check_method = \"PING\"\n");
        assert!(bad_method.is_err());
    }
}
