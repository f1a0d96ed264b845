use std::sync::Arc;

use crate::{
    checks::{MetricResult, SystemMetric},
    dao::host::MemoryUsage,
    error::HostError,
};

use super::{DEFAULT_MEMORY_WARN_PERCENT, percentage};

const KEY: &str = "memory_used";
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Share of the memory ceiling the process currently uses.
pub struct MemoryMetric {
    memory: Arc<dyn MemoryUsage>,
    warn_percent: f64,
}

impl MemoryMetric {
    pub fn new(memory: Arc<dyn MemoryUsage>) -> Self {
        Self {
            memory,
            warn_percent: DEFAULT_MEMORY_WARN_PERCENT,
        }
    }

    pub fn with_threshold(mut self, warn_percent: f64) -> Self {
        self.warn_percent = warn_percent;
        self
    }

    fn used_percent(&self) -> Result<f64, HostError> {
        let snapshot = self.memory.memory()?;
        if snapshot.limit == 0 {
            return Err(HostError::ZeroCapacity { resource: "memory" });
        }
        let used_mb = snapshot.used as f64 / BYTES_PER_MB;
        let limit_mb = snapshot.limit as f64 / BYTES_PER_MB;
        Ok(percentage(used_mb, limit_mb))
    }
}

impl SystemMetric for MemoryMetric {
    fn key(&self) -> &str {
        KEY
    }

    fn run(&self) -> MetricResult {
        match self.used_percent() {
            Ok(used) if used >= self.warn_percent => {
                MetricResult::warning(KEY, format!("warning, the memory is {used:.1}% full"))
            }
            Ok(used) => MetricResult::ok(KEY, format!("{used:.1}% used")),
            Err(err) => MetricResult::warning(KEY, format!("unable to read memory usage: {err}")),
        }
    }
}
