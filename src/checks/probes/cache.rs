use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use rand::{Rng, distr::Alphanumeric};

use crate::{
    checks::{Probe, ProbeResult},
    dao::KeyValueStore,
};

const CHECK_KEY: &str = "health:check";
const CHECK_TTL: Duration = Duration::from_secs(10);
const VALUE_LEN: usize = 10;
const MISMATCH: &str = "The cached value does not match the expected value";

/// Probe that writes a fresh random value and requires reading back the same value.
pub struct CacheProbe {
    name: String,
    store: Arc<dyn KeyValueStore>,
}

impl CacheProbe {
    pub fn new(name: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }
}

impl Probe for CacheProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> BoxFuture<'_, ProbeResult> {
        Box::pin(async move {
            let expected = random_value();

            if let Err(err) = self
                .store
                .put(CHECK_KEY.to_string(), expected.clone(), CHECK_TTL)
                .await
            {
                return ProbeResult::from_fault(&self.name, &err);
            }

            match self.store.get(CHECK_KEY.to_string()).await {
                Ok(Some(actual)) if actual == expected => ProbeResult::up(&self.name),
                Ok(_) => ProbeResult::error(&self.name, MISMATCH),
                Err(err) => ProbeResult::from_fault(&self.name, &err),
            }
        })
    }
}

fn random_value() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(VALUE_LEN)
        .map(char::from)
        .collect()
}
