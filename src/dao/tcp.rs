use futures::future::BoxFuture;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};

use crate::error::{DependencyError, DependencyResult};

use super::{ConnectionProvider, PingClient};

/// Longest PING reply line accepted, terminator included.
const MAX_REPLY_LEN: u64 = 512;

/// Connection provider that succeeds once a TCP handshake with `address` completes.
#[derive(Debug, Clone)]
pub struct TcpConnection {
    address: String,
}

impl TcpConnection {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl ConnectionProvider for TcpConnection {
    fn connect(&self) -> BoxFuture<'_, DependencyResult<()>> {
        Box::pin(async move {
            open(&self.address).await?;
            Ok(())
        })
    }
}

/// Ping client speaking the Redis serialization protocol.
///
/// Simple-string replies are returned without their `+` marker so a healthy server yields
/// `PONG`; error replies are returned verbatim.
#[derive(Debug, Clone)]
pub struct RedisPing {
    address: String,
}

impl RedisPing {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl PingClient for RedisPing {
    fn ping(&self) -> BoxFuture<'_, DependencyResult<String>> {
        Box::pin(async move {
            let mut stream = open(&self.address).await?;
            stream.write_all(b"PING\r\n").await.map_err(|source| {
                DependencyError::unavailable(
                    format!("failed to send PING to `{}`", self.address),
                    source,
                )
            })?;

            let mut reader = BufReader::new(stream).take(MAX_REPLY_LEN);
            let mut line = String::new();
            let read = reader.read_line(&mut line).await.map_err(|source| {
                DependencyError::unavailable(
                    format!("failed to read PING reply from `{}`", self.address),
                    source,
                )
            })?;
            if read == 0 {
                return Err(DependencyError::NoReply {
                    target: self.address.clone(),
                });
            }
            if !line.ends_with('\n') && read as u64 >= MAX_REPLY_LEN {
                return Err(DependencyError::OversizedReply {
                    target: self.address.clone(),
                    limit: MAX_REPLY_LEN,
                });
            }

            let reply = line.trim_end_matches(['\r', '\n']);
            Ok(reply.strip_prefix('+').unwrap_or(reply).to_string())
        })
    }
}

async fn open(address: &str) -> DependencyResult<TcpStream> {
    TcpStream::connect(address).await.map_err(|source| {
        DependencyError::unavailable(format!("failed to connect to `{address}`"), source)
    })
}
