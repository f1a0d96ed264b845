//! Outcome levels shared by probes, metrics and the aggregated report.

use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

/// Ordered outcome level; `Ok < Warning < Error`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Everything checked is healthy.
    #[default]
    Ok,
    /// A local resource is close to its limit; the service keeps answering 200.
    Warning,
    /// A dependency is unreachable or misbehaving.
    Error,
}

impl Severity {
    /// Return the more severe of the two levels.
    pub fn worse(self, other: Self) -> Self {
        self.max(other)
    }

    /// Status word exposed in the report.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Ok => "ok",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// HTTP-style status code derived from the level.
    ///
    /// Warnings deliberately keep the 200 code; only errors flip it to 503.
    pub fn status_code(self) -> u16 {
        match self {
            Severity::Ok | Severity::Warning => 200,
            Severity::Error => 503,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary outcome of a dependency probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// The round-trip succeeded and matched the expectation.
    Up,
    /// The dependency faulted or replied with something unexpected.
    Error,
}

impl ProbeStatus {
    /// Severity this outcome contributes to the overall report.
    pub fn severity(self) -> Severity {
        match self {
            ProbeStatus::Up => Severity::Ok,
            ProbeStatus::Error => Severity::Error,
        }
    }
}

/// Outcome of a host resource metric. Metrics never hard-fail a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    /// Resource usage is within limits.
    Ok,
    /// Resource usage crossed its threshold or could not be read.
    Warning,
}

impl MetricStatus {
    /// Severity this outcome contributes to the overall report.
    pub fn severity(self) -> Severity {
        match self {
            MetricStatus::Ok => Severity::Ok,
            MetricStatus::Warning => Severity::Warning,
        }
    }
}
