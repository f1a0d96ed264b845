use std::collections::HashMap;

use serde::{Serialize, Serializer, ser::SerializeMap};
use utoipa::ToSchema;

use crate::{
    checks::{HealthReport, MetricResult, ProbeResult},
    state::severity::{MetricStatus, ProbeStatus, Severity},
};

/// Report returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status ("ok", "warning" or "error").
    pub status: Severity,
    /// 503 when any dependency failed, 200 otherwise.
    pub status_code: u16,
    /// One single-key object per probe, in registration order.
    #[schema(value_type = Vec<HashMap<String, ServiceStatus>>)]
    pub info: Vec<Named<ServiceStatus>>,
    /// One single-key object per metric, in registration order.
    #[schema(value_type = Vec<HashMap<String, SystemStatus>>)]
    pub system_info: Vec<Named<SystemStatus>>,
}

/// Outcome of one dependency probe.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    /// "up" or "error".
    pub status: ProbeStatus,
    /// "good" on success, the failure text otherwise.
    pub message: String,
}

/// Outcome of one host metric.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatus {
    /// "ok" or "warning".
    pub status: MetricStatus,
    /// Usage figure, resolved path, or warning text.
    pub message: String,
}

/// Serializes as `{ "<name>": <body> }`.
#[derive(Debug)]
pub struct Named<T> {
    name: String,
    body: T,
}

impl<T: Serialize> Serialize for Named<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.body)?;
        map.end()
    }
}

impl From<&ProbeResult> for Named<ServiceStatus> {
    fn from(result: &ProbeResult) -> Self {
        Self {
            name: result.name().to_string(),
            body: ServiceStatus {
                status: result.status(),
                message: result.message().to_string(),
            },
        }
    }
}

impl From<&MetricResult> for Named<SystemStatus> {
    fn from(result: &MetricResult) -> Self {
        Self {
            name: result.key().to_string(),
            body: SystemStatus {
                status: result.status(),
                message: result.message().to_string(),
            },
        }
    }
}

impl From<&HealthReport> for HealthResponse {
    fn from(report: &HealthReport) -> Self {
        Self {
            status: report.overall(),
            status_code: report.status_code(),
            info: report.services().iter().map(Into::into).collect(),
            system_info: report.system_info().iter().map(Into::into).collect(),
        }
    }
}
