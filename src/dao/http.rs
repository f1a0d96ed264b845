use futures::future::BoxFuture;
use reqwest::Client;
use tokio::sync::OnceCell;

use crate::error::{DependencyError, DependencyResult};

use super::ConnectionProvider;

/// Connection provider that issues a GET and requires a success status.
pub struct HttpEndpoint {
    url: String,
    client: OnceCell<Client>,
}

impl HttpEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> DependencyResult<&Client> {
        self.client
            .get_or_try_init(|| async {
                Client::builder().build().map_err(|source| {
                    DependencyError::unavailable("failed to build HTTP client", source)
                })
            })
            .await
    }
}

impl ConnectionProvider for HttpEndpoint {
    fn connect(&self) -> BoxFuture<'_, DependencyResult<()>> {
        Box::pin(async move {
            let response = self
                .client()
                .await?
                .get(&self.url)
                .send()
                .await
                .map_err(|source| {
                    DependencyError::unavailable(format!("failed to reach `{}`", self.url), source)
                })?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(DependencyError::UnexpectedStatus {
                    target: self.url.clone(),
                    status: status.as_u16(),
                })
            }
        })
    }
}
