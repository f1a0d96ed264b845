use futures::future::BoxFuture;
use mongodb::{Client, bson::doc};
use tokio::sync::OnceCell;

use crate::error::{DependencyError, DependencyResult};

use super::ConnectionProvider;

const DEFAULT_DATABASE: &str = "admin";

/// Connection provider running `{ ping: 1 }` against a MongoDB deployment.
///
/// The client is built lazily on first use so an unreachable or malformed URI is reported by
/// the probe rather than at startup.
pub struct MongoConnection {
    uri: String,
    database: String,
    client: OnceCell<Client>,
}

impl MongoConnection {
    pub fn new(uri: impl Into<String>, database: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> DependencyResult<&Client> {
        self.client
            .get_or_try_init(|| async {
                Client::with_uri_str(&self.uri).await.map_err(|source| {
                    DependencyError::unavailable("failed to build MongoDB client", source)
                })
            })
            .await
    }
}

impl ConnectionProvider for MongoConnection {
    fn connect(&self) -> BoxFuture<'_, DependencyResult<()>> {
        Box::pin(async move {
            self.client()
                .await?
                .database(&self.database)
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(|source| DependencyError::unavailable("MongoDB ping failed", source))?;
            Ok(())
        })
    }
}
