use crate::state::severity::Severity;

use super::{MetricResult, ProbeResult};

/// Aggregate output of one run. The overall level is derived from the entries and cannot be
/// set independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    overall: Severity,
    services: Vec<ProbeResult>,
    system_info: Vec<MetricResult>,
}

impl HealthReport {
    /// Fold probe and metric results, in order, into a report.
    pub fn assemble(services: Vec<ProbeResult>, system_info: Vec<MetricResult>) -> Self {
        let overall = services
            .iter()
            .map(ProbeResult::severity)
            .chain(system_info.iter().map(MetricResult::severity))
            .fold(Severity::Ok, Severity::worse);

        Self {
            overall,
            services,
            system_info,
        }
    }

    pub fn overall(&self) -> Severity {
        self.overall
    }

    /// Overall status word ("ok", "warning" or "error").
    pub fn status(&self) -> &'static str {
        self.overall.as_str()
    }

    pub fn status_code(&self) -> u16 {
        self.overall.status_code()
    }

    /// Probe results in registration order.
    pub fn services(&self) -> &[ProbeResult] {
        &self.services
    }

    /// Metric results in registration order.
    pub fn system_info(&self) -> &[MetricResult] {
        &self.system_info
    }
}
