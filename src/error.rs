use std::fmt;
use thiserror::Error;

/// Main error type for the cluster watchdog
#[derive(Error, Debug, Clone)]
pub enum ClusterError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A capability the host must provide was not found
    #[error("Missing capability: {capability}")]
    MissingCapability { capability: String },

    /// Watchdog instance or callback registration errors
    #[error("Watchdog error: {message}")]
    Watchdog { message: String },

    /// Balancer manager rejected or failed to apply a declaration
    #[error("Balancer manager error: {message}")]
    BalancerManager { message: String },

    /// Malformed reconciliation parameters
    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    /// Cluster is not known to the balancer
    #[error("Cluster not found: {cluster}")]
    ClusterNotFound { cluster: String },

    /// Worker is not a member of the cluster
    #[error("Worker {worker} not found in cluster {cluster}")]
    WorkerNotFound { cluster: String, worker: String },

    /// IO related errors
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ClusterError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing capability error
    pub fn missing_capability<S: Into<String>>(capability: S) -> Self {
        Self::MissingCapability {
            capability: capability.into(),
        }
    }

    /// Create a watchdog error
    pub fn watchdog<S: Into<String>>(message: S) -> Self {
        Self::Watchdog {
            message: message.into(),
        }
    }

    /// Create a balancer manager error
    pub fn balancer_manager<S: Into<String>>(message: S) -> Self {
        Self::BalancerManager {
            message: message.into(),
        }
    }

    /// Create an invalid parameters error
    pub fn invalid_params<S: Into<String>>(message: S) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create a cluster not found error
    pub fn cluster_not_found<S: Into<String>>(cluster: S) -> Self {
        Self::ClusterNotFound {
            cluster: cluster.into(),
        }
    }

    /// Create a worker not found error
    pub fn worker_not_found<S: Into<String>, W: Into<String>>(cluster: S, worker: W) -> Self {
        Self::WorkerNotFound {
            cluster: cluster.into(),
            worker: worker.into(),
        }
    }

    /// Create an IO error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the next watchdog tick can be expected to succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClusterError::BalancerManager { .. }
                | ClusterError::ClusterNotFound { .. }
                | ClusterError::WorkerNotFound { .. }
                | ClusterError::Io { .. }
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ClusterError::Config { .. } => ErrorSeverity::Critical,
            ClusterError::MissingCapability { .. } => ErrorSeverity::Critical,
            ClusterError::Watchdog { .. } => ErrorSeverity::Critical,
            ClusterError::Internal { .. } => ErrorSeverity::High,
            ClusterError::InvalidParams { .. } => ErrorSeverity::High,
            ClusterError::BalancerManager { .. } => ErrorSeverity::Medium,
            ClusterError::ClusterNotFound { .. } => ErrorSeverity::Medium,
            ClusterError::WorkerNotFound { .. } => ErrorSeverity::Medium,
            ClusterError::Io { .. } => ErrorSeverity::Medium,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Result type alias for cluster watchdog operations
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Convert from anyhow::Error to ClusterError
impl From<anyhow::Error> for ClusterError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            return ClusterError::io(io_err.to_string());
        }

        if let Some(toml_err) = err.downcast_ref::<toml::de::Error>() {
            return ClusterError::config(format!("TOML parsing error: {}", toml_err));
        }

        ClusterError::internal(err.to_string())
    }
}

/// Convert from std::io::Error to ClusterError
impl From<std::io::Error> for ClusterError {
    fn from(err: std::io::Error) -> Self {
        ClusterError::io(err.to_string())
    }
}

/// Convert from toml::de::Error to ClusterError
impl From<toml::de::Error> for ClusterError {
    fn from(err: toml::de::Error) -> Self {
        ClusterError::config(format!("TOML parsing error: {}", err))
    }
}
