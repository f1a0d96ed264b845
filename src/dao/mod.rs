//! Narrow interfaces to the dependencies and host resources inspected by the checks, plus
//! the concrete drivers shipped with the service.

/// Host disk and memory queries.
pub mod host;
/// HTTP endpoint reachability.
#[cfg(feature = "http-probe")]
pub mod http;
/// In-process key-value store with expiry.
pub mod memory_cache;
/// MongoDB connectivity.
#[cfg(feature = "mongo-probe")]
pub mod mongodb;
/// Raw TCP connectivity and RESP ping.
pub mod tcp;

use std::time::Duration;

use futures::future::BoxFuture;

use crate::error::DependencyResult;

/// Opens or verifies a connection to a dependency, failing when it cannot be reached.
pub trait ConnectionProvider: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, DependencyResult<()>>;
}

/// Sends a ping to a dependency and returns the raw reply text.
pub trait PingClient: Send + Sync {
    fn ping(&self) -> BoxFuture<'_, DependencyResult<String>>;
}

/// Minimal read/write access to a key-value store.
pub trait KeyValueStore: Send + Sync {
    fn put(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> BoxFuture<'_, DependencyResult<()>>;
    fn get(&self, key: String) -> BoxFuture<'_, DependencyResult<Option<String>>>;
}
