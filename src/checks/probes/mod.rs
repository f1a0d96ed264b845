//! Dependency probes built on the collaborator traits in [`crate::dao`].

mod cache;

use std::sync::Arc;

use futures::future::BoxFuture;
#[cfg(not(all(feature = "http-probe", feature = "mongo-probe")))]
use tracing::warn;

use crate::{
    checks::{Probe, ProbeResult},
    config::ProbeConfig,
    dao::{
        ConnectionProvider, KeyValueStore, PingClient,
        tcp::{RedisPing, TcpConnection},
    },
};

pub use self::cache::CacheProbe;

/// Probe that reports up when the provider can open a connection.
pub struct ConnectionProbe {
    name: String,
    provider: Arc<dyn ConnectionProvider>,
}

impl ConnectionProbe {
    pub fn new(name: impl Into<String>, provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }
}

impl Probe for ConnectionProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> BoxFuture<'_, ProbeResult> {
        Box::pin(async move {
            match self.provider.connect().await {
                Ok(()) => ProbeResult::up(&self.name),
                Err(err) => ProbeResult::from_fault(&self.name, &err),
            }
        })
    }
}

/// Probe that pings a dependency and requires an exact reply.
pub struct PingProbe {
    name: String,
    client: Arc<dyn PingClient>,
    expected_reply: String,
}

impl PingProbe {
    pub fn new(
        name: impl Into<String>,
        client: Arc<dyn PingClient>,
        expected_reply: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            expected_reply: expected_reply.into(),
        }
    }
}

impl Probe for PingProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> BoxFuture<'_, ProbeResult> {
        Box::pin(async move {
            match self.client.ping().await {
                Ok(reply) if reply == self.expected_reply => ProbeResult::up(&self.name),
                Ok(reply) => ProbeResult::error(
                    &self.name,
                    format!("Received an invalid response of: {reply}"),
                ),
                Err(err) => ProbeResult::from_fault(&self.name, &err),
            }
        })
    }
}

/// Build the probe described by a configuration entry.
///
/// Cache probes share `cache`. Entries whose driver was compiled out yield `None`.
pub fn from_config(
    config: &ProbeConfig,
    cache: &Arc<dyn KeyValueStore>,
) -> Option<Arc<dyn Probe>> {
    let probe: Arc<dyn Probe> = match config {
        ProbeConfig::Tcp { name, address } => Arc::new(ConnectionProbe::new(
            name,
            Arc::new(TcpConnection::new(address)),
        )),
        ProbeConfig::Redis {
            name,
            address,
            expected_reply,
        } => Arc::new(PingProbe::new(
            name,
            Arc::new(RedisPing::new(address)),
            expected_reply,
        )),
        #[cfg(feature = "http-probe")]
        ProbeConfig::Http { name, url } => Arc::new(ConnectionProbe::new(
            name,
            Arc::new(crate::dao::http::HttpEndpoint::new(url)),
        )),
        #[cfg(not(feature = "http-probe"))]
        ProbeConfig::Http { name, .. } => {
            warn!(probe = %name, "http probes need the `http-probe` feature; skipping");
            return None;
        }
        #[cfg(feature = "mongo-probe")]
        ProbeConfig::Mongodb {
            name,
            uri,
            database,
        } => Arc::new(ConnectionProbe::new(
            name,
            Arc::new(crate::dao::mongodb::MongoConnection::new(
                uri,
                database.clone(),
            )),
        )),
        #[cfg(not(feature = "mongo-probe"))]
        ProbeConfig::Mongodb { name, .. } => {
            warn!(probe = %name, "mongodb probes need the `mongo-probe` feature; skipping");
            return None;
        }
        ProbeConfig::Cache { name } => Arc::new(CacheProbe::new(name, cache.clone())),
    };

    Some(probe)
}
