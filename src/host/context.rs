use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ServerConfig;

/// Per-directory defaults of a server. Shared by every request built for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryPolicy {
    settings: BTreeMap<String, String>,
}

impl DirectoryPolicy {
    pub fn new(settings: BTreeMap<String, String>) -> Self {
        Self { settings }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

/// A virtual server known to the host
#[derive(Debug, Clone)]
pub struct ServerContext {
    name: String,
    port: u16,
    defaults: Arc<DirectoryPolicy>,
}

impl ServerContext {
    pub fn new<S: Into<String>>(name: S, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
            defaults: Arc::new(DirectoryPolicy::default()),
        }
    }

    pub fn with_defaults(mut self, defaults: DirectoryPolicy) -> Self {
        self.defaults = Arc::new(defaults);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn defaults(&self) -> &Arc<DirectoryPolicy> {
        &self.defaults
    }
}

impl fmt::Display for ServerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}

impl From<&ServerConfig> for ServerContext {
    fn from(config: &ServerConfig) -> Self {
        ServerContext::new(config.name.clone(), config.port)
            .with_defaults(DirectoryPolicy::new(config.defaults.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_context_from_config() {
        let mut config = ServerConfig {
            name: "www.example.com".to_string(),
            port: 443,
            ..Default::default()
        };
        config
            .defaults
            .insert("timeout".to_string(), "60".to_string());

        let server = ServerContext::from(&config);
        assert_eq!(server.to_string(), "www.example.com:443");
        assert_eq!(server.defaults().get("timeout"), Some("60"));
        assert_eq!(server.defaults().len(), 1);
    }
}
