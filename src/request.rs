//! Synthetic requests used to drive the balancer manager from the watchdog.
//!
//! The balancer manager is written for requests coming from clients. The
//! watchdog has no client, so each pass builds a [`SyntheticRequest`] inside a
//! [`RequestScope`] taken from the caller's [`RegionPool`]. The request borrows
//! the scope and cannot outlive it; dropping the scope releases it.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::host::{DirectoryPolicy, ServerContext};

/// Tag given to the scope of every synthetic request
pub const SCOPE_TAG: &str = "hc_request";

#[derive(Debug, Default)]
struct PoolCounters {
    created: AtomicU64,
    released: AtomicU64,
}

/// Snapshot of a pool's scope accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub created: u64,
    pub released: u64,
}

impl PoolStats {
    /// Scopes created but not yet released
    pub fn live(&self) -> u64 {
        self.created.saturating_sub(self.released)
    }
}

/// Parent region handed to watchdog callbacks. Clones share accounting.
#[derive(Debug, Clone)]
pub struct RegionPool {
    name: Arc<str>,
    counters: Arc<PoolCounters>,
}

impl RegionPool {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            counters: Arc::new(PoolCounters::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a child scope, released when the returned guard is dropped
    pub fn create_scope(&self, tag: &'static str) -> RequestScope {
        let id = self.counters.created.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(pool = %self.name, tag, id, "Scope created");
        RequestScope {
            tag,
            id,
            pool: Arc::clone(&self.name),
            counters: Arc::clone(&self.counters),
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.counters.created.load(Ordering::Acquire),
            released: self.counters.released.load(Ordering::Acquire),
        }
    }
}

/// A lifetime region bounded to one operation
#[derive(Debug)]
pub struct RequestScope {
    tag: &'static str,
    id: u64,
    pool: Arc<str>,
    counters: Arc<PoolCounters>,
}

impl RequestScope {
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::AcqRel);
        trace!(pool = %self.pool, tag = self.tag, id = self.id, "Scope released");
    }
}

/// Connection identity of a request that has no connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIdentity {
    pub log_id: &'static str,
    pub peer: Option<SocketAddr>,
}

impl ConnectionIdentity {
    pub fn placeholder() -> Self {
        Self {
            log_id: "-",
            peer: None,
        }
    }
}

/// Request issued on behalf of the watchdog rather than a client
#[derive(Debug)]
pub struct SyntheticRequest<'s> {
    scope: &'s RequestScope,
    server: &'s ServerContext,
    connection: ConnectionIdentity,
    per_dir: Arc<DirectoryPolicy>,
    notes: BTreeMap<String, String>,
    headers_in: BTreeMap<String, String>,
}

impl<'s> SyntheticRequest<'s> {
    pub const METHOD: &'static str = "PING";
    pub const URI: &'static str = "/";

    pub fn build(server: &'s ServerContext, scope: &'s RequestScope) -> Self {
        Self {
            scope,
            server,
            connection: ConnectionIdentity::placeholder(),
            per_dir: Arc::clone(server.defaults()),
            notes: BTreeMap::new(),
            headers_in: BTreeMap::new(),
        }
    }

    pub fn method(&self) -> &'static str {
        Self::METHOD
    }

    pub fn uri(&self) -> &'static str {
        Self::URI
    }

    pub fn log_id(&self) -> &'static str {
        self.connection.log_id
    }

    pub fn server(&self) -> &ServerContext {
        self.server
    }

    pub fn scope(&self) -> &RequestScope {
        self.scope
    }

    pub fn connection(&self) -> &ConnectionIdentity {
        &self.connection
    }

    pub fn per_dir_config(&self) -> &DirectoryPolicy {
        &self.per_dir
    }

    pub fn notes(&self) -> &BTreeMap<String, String> {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.notes
    }

    pub fn headers_in(&self) -> &BTreeMap<String, String> {
        &self.headers_in
    }

    pub fn headers_in_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.headers_in
    }
}
