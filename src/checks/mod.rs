//! Probe and metric contracts plus the values they produce.

pub mod metrics;
pub mod probes;
mod report;

use std::error::Error;

use futures::future::BoxFuture;

use crate::{
    error::describe,
    state::severity::{MetricStatus, ProbeStatus, Severity},
};

pub use self::report::HealthReport;

/// Check against one external dependency with a binary outcome.
///
/// Implementations must never fail: any fault raised while probing is caught and turned into
/// an error [`ProbeResult`] carrying the fault text.
pub trait Probe: Send + Sync {
    /// Name reported for this dependency, unique within an aggregator.
    fn name(&self) -> &str;
    /// Perform a minimal round-trip against the dependency.
    fn run(&self) -> BoxFuture<'_, ProbeResult>;
}

/// Check against a local host or runtime resource. Never reports an error level.
pub trait SystemMetric: Send + Sync {
    /// Key reported for this resource, unique within an aggregator.
    fn key(&self) -> &str;
    /// Inspect the resource and classify its usage.
    fn run(&self) -> MetricResult;
}

/// Outcome of a single probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    name: String,
    status: ProbeStatus,
    message: String,
}

impl ProbeResult {
    /// Message attached to successful probes.
    pub const DEFAULT_MESSAGE: &'static str = "good";

    /// Successful round-trip.
    pub fn up(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ProbeStatus::Up,
            message: Self::DEFAULT_MESSAGE.to_string(),
        }
    }

    /// Failed probe with an explicit message.
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ProbeStatus::Error,
            message: message.into(),
        }
    }

    /// Failed probe described by the fault that caused it.
    pub fn from_fault(name: impl Into<String>, fault: &(dyn Error + 'static)) -> Self {
        Self::error(name, describe(fault))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ProbeStatus {
        self.status
    }

    pub fn severity(&self) -> Severity {
        self.status.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of a single metric run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricResult {
    key: String,
    status: MetricStatus,
    message: String,
}

impl MetricResult {
    pub fn ok(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: MetricStatus::Ok,
            message: message.into(),
        }
    }

    pub fn warning(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: MetricStatus::Warning,
            message: message.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn status(&self) -> MetricStatus {
        self.status
    }

    pub fn severity(&self) -> Severity {
        self.status.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
