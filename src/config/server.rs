use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Virtual server configuration. Every server gets its own watchdog callback.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub name: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-directory defaults handed to synthetic requests
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

fn default_port() -> u16 {
    80
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "localhost".to_string(),
            port: default_port(),
            defaults: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            return Err(anyhow::anyhow!("Server name cannot be empty"));
        }

        if self.port == 0 {
            return Err(anyhow::anyhow!(
                "Server {} port must be greater than 0",
                self.name
            ));
        }

        Ok(())
    }
}
