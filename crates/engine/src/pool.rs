//! Endpoint-keyed engine connection pool
//!
//! Workers receive connections from a pool object constructed at startup
//! and passed into worker construction; connections are owned by the
//! pool and live exactly as long as it does. Checking out the same
//! endpoint twice returns the same shared connection, which is how a
//! caller opts several workers into one engine server process.

use crate::client::{EngineConfig, RpcEngine};
use crate::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Pool of engine connections keyed by endpoint URL.
#[derive(Debug)]
pub struct EnginePool {
    timeout: Duration,
    engines: Mutex<HashMap<String, Arc<RpcEngine>>>,
}

impl EnginePool {
    /// Creates an empty pool whose connections use the given timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            engines: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the shared connection for the endpoint, creating it on
    /// first checkout.
    pub fn checkout(&self, endpoint: &str) -> Result<Arc<RpcEngine>> {
        let mut engines = self.engines.lock().expect("engine pool lock poisoned");
        if let Some(engine) = engines.get(endpoint) {
            return Ok(Arc::clone(engine));
        }
        let config = EngineConfig {
            endpoint: endpoint.to_string(),
            timeout: self.timeout,
        };
        let engine = Arc::new(RpcEngine::new(config)?);
        engines.insert(endpoint.to_string(), Arc::clone(&engine));
        tracing::debug!(endpoint, "opened engine connection");
        Ok(engine)
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.engines.lock().expect("engine pool lock poisoned").len()
    }

    /// True when no connection has been checked out yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
