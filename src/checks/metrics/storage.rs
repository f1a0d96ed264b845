use std::sync::Arc;

use crate::{
    checks::{MetricResult, SystemMetric},
    dao::host::DiskUsage,
    error::HostError,
};

use super::{DEFAULT_STORAGE_WARN_PERCENT, percentage};

const KEY: &str = "storage";

/// Share of the filesystem in use, warning once it reaches the threshold.
pub struct StorageMetric {
    disk: Arc<dyn DiskUsage>,
    warn_percent: f64,
}

impl StorageMetric {
    pub fn new(disk: Arc<dyn DiskUsage>) -> Self {
        Self {
            disk,
            warn_percent: DEFAULT_STORAGE_WARN_PERCENT,
        }
    }

    pub fn with_threshold(mut self, warn_percent: f64) -> Self {
        self.warn_percent = warn_percent;
        self
    }

    fn used_percent(&self) -> Result<f64, HostError> {
        let space = self.disk.disk_space()?;
        if space.total == 0 {
            return Err(HostError::ZeroCapacity {
                resource: "filesystem",
            });
        }
        let used = space.total.saturating_sub(space.free);
        Ok(percentage(used as f64, space.total as f64))
    }
}

impl SystemMetric for StorageMetric {
    fn key(&self) -> &str {
        KEY
    }

    fn run(&self) -> MetricResult {
        match self.used_percent() {
            Ok(used) if used >= self.warn_percent => MetricResult::warning(
                KEY,
                format!(
                    "warning, the filesystem is more than {}% full ({used:.1}% used)",
                    self.warn_percent
                ),
            ),
            Ok(used) => MetricResult::ok(KEY, format!("{used:.1}% used")),
            Err(err) => MetricResult::warning(KEY, format!("unable to read storage usage: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{dao::host::DiskSpace, state::severity::MetricStatus};

    use super::*;

    struct FixedDisk(Result<DiskSpace, fn() -> HostError>);

    impl DiskUsage for FixedDisk {
        fn disk_space(&self) -> Result<DiskSpace, HostError> {
            self.0.map_err(|make| make())
        }
    }

    fn metric(total: u64, free: u64) -> StorageMetric {
        StorageMetric::new(Arc::new(FixedDisk(Ok(DiskSpace { total, free }))))
    }

    #[test]
    fn ninety_percent_used_warns() {
        let result = metric(100, 10).run();
        assert_eq!(result.key(), "storage");
        assert_eq!(result.status(), MetricStatus::Warning);
        assert_eq!(
            result.message(),
            "warning, the filesystem is more than 85% full (90.0% used)"
        );
    }

    #[test]
    fn eighty_percent_used_is_ok() {
        let result = metric(100, 20).run();
        assert_eq!(result.status(), MetricStatus::Ok);
        assert_eq!(result.message(), "80.0% used");
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(metric(100, 15).run().status(), MetricStatus::Warning);
        assert_eq!(metric(1000, 151).run().status(), MetricStatus::Ok);
    }

    #[test]
    fn custom_threshold_applies() {
        let result = metric(100, 40).with_threshold(50.0).run();
        assert_eq!(result.status(), MetricStatus::Warning);
        assert_eq!(
            result.message(),
            "warning, the filesystem is more than 50% full (60.0% used)"
        );
    }

    #[test]
    fn zero_capacity_warns_instead_of_dividing() {
        let result = metric(0, 0).run();
        assert_eq!(result.status(), MetricStatus::Warning);
        assert!(result.message().contains("capacity is zero"));
    }

    #[test]
    fn unreadable_disk_warns() {
        let disk = FixedDisk(Err(|| HostError::MountNotFound { path: "/data".into() }));
        let result = StorageMetric::new(Arc::new(disk)).run();
        assert_eq!(result.status(), MetricStatus::Warning);
        assert_eq!(
            result.message(),
            "unable to read storage usage: no mounted filesystem contains `/data`"
        );
    }
}
