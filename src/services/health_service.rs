use std::{collections::HashSet, sync::Arc, time::Duration};

use futures::future::join_all;
use serde::Deserialize;
use tokio::{task::spawn_blocking, time::timeout};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::{
    checks::{
        HealthReport, MetricResult, Probe, ProbeResult, SystemMetric,
        metrics::{ConfigFileMetric, MemoryMetric, StorageMetric},
        probes,
    },
    config::AppConfig,
    dao::{
        KeyValueStore,
        host::{SysinfoDisk, SysinfoMemory},
        memory_cache::MemoryCache,
    },
    state::{SharedState, severity::Severity},
};

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// How the aggregator schedules probe calls within one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Each probe completes before the next one starts.
    #[default]
    Sequential,
    /// All probes are started together; results keep registration order.
    Concurrent,
}

/// Runs every registered probe and metric and folds their results into a [`HealthReport`].
pub struct Aggregator {
    probes: Vec<Arc<dyn Probe>>,
    metrics: Vec<Arc<dyn SystemMetric>>,
    probe_timeout: Duration,
    mode: ExecutionMode,
}

impl Aggregator {
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::default()
    }

    /// Register the configured probes followed by the storage, memory and config-file metrics.
    pub fn from_config(config: &AppConfig) -> Self {
        let cache: Arc<dyn KeyValueStore> = Arc::new(MemoryCache::new());
        let mut builder = Self::builder()
            .probe_timeout(config.probe_timeout)
            .mode(config.execution);

        for probe in config
            .probes
            .iter()
            .filter_map(|entry| probes::from_config(entry, &cache))
        {
            builder = builder.probe(probe);
        }

        let memory_limit = config.memory_limit_mb.map(megabytes_to_bytes);
        builder
            .metric(Arc::new(
                StorageMetric::new(Arc::new(SysinfoDisk::new(&config.storage_path)))
                    .with_threshold(config.storage_warn_percent),
            ))
            .metric(Arc::new(
                MemoryMetric::new(Arc::new(SysinfoMemory::new(memory_limit)))
                    .with_threshold(config.memory_warn_percent),
            ))
            .metric(Arc::new(ConfigFileMetric::new(
                config.source().map(Into::into),
            )))
            .build()
    }

    /// Run one aggregation pass. Never fails: faults surface as entries in the report.
    pub async fn gather(&self) -> HealthReport {
        let span = info_span!("health_run", run_id = %Uuid::new_v4());
        async move {
            let services = match self.mode {
                ExecutionMode::Sequential => {
                    let mut services = Vec::with_capacity(self.probes.len());
                    for probe in &self.probes {
                        services.push(self.run_probe(probe.as_ref()).await);
                    }
                    services
                }
                ExecutionMode::Concurrent => {
                    join_all(self.probes.iter().map(|probe| self.run_probe(probe.as_ref()))).await
                }
            };

            let system_info =
                join_all(self.metrics.iter().map(|metric| self.run_metric(metric))).await;

            let report = HealthReport::assemble(services, system_info);
            debug!(
                status = %report.overall(),
                probes = report.services().len(),
                metrics = report.system_info().len(),
                "health run completed"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn run_probe(&self, probe: &dyn Probe) -> ProbeResult {
        let result = match timeout(self.probe_timeout, probe.run()).await {
            Ok(result) => result,
            Err(_) => ProbeResult::error(
                probe.name(),
                format!(
                    "probe timed out after {}ms",
                    self.probe_timeout.as_millis()
                ),
            ),
        };

        if result.severity() == Severity::Error {
            warn!(probe = %result.name(), message = %result.message(), "probe failed");
        }
        result
    }

    /// Metrics make blocking host calls, so they run off the async workers and share the
    /// probe timeout.
    async fn run_metric(&self, metric: &Arc<dyn SystemMetric>) -> MetricResult {
        let task = spawn_blocking({
            let metric = Arc::clone(metric);
            move || metric.run()
        });

        let result = match timeout(self.probe_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => MetricResult::warning(metric.key(), format!("metric failed: {err}")),
            Err(_) => MetricResult::warning(
                metric.key(),
                format!(
                    "metric timed out after {}ms",
                    self.probe_timeout.as_millis()
                ),
            ),
        };

        if result.severity() == Severity::Warning {
            info!(metric = %result.key(), message = %result.message(), "metric above threshold");
        }
        result
    }
}

fn megabytes_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

/// Collects probes and metrics in registration order.
///
/// Names and keys must be unique within an aggregator; a duplicate is logged and dropped.
pub struct AggregatorBuilder {
    probes: Vec<Arc<dyn Probe>>,
    metrics: Vec<Arc<dyn SystemMetric>>,
    probe_timeout: Duration,
    mode: ExecutionMode,
    names: HashSet<String>,
    keys: HashSet<String>,
}

impl Default for AggregatorBuilder {
    fn default() -> Self {
        Self {
            probes: Vec::new(),
            metrics: Vec::new(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            mode: ExecutionMode::default(),
            names: HashSet::new(),
            keys: HashSet::new(),
        }
    }
}

impl AggregatorBuilder {
    pub fn probe(mut self, probe: Arc<dyn Probe>) -> Self {
        if self.names.insert(probe.name().to_string()) {
            self.probes.push(probe);
        } else {
            warn!(probe = %probe.name(), "duplicate probe name; ignoring registration");
        }
        self
    }

    pub fn metric(mut self, metric: Arc<dyn SystemMetric>) -> Self {
        if self.keys.insert(metric.key().to_string()) {
            self.metrics.push(metric);
        } else {
            warn!(metric = %metric.key(), "duplicate metric key; ignoring registration");
        }
        self
    }

    pub fn probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn build(self) -> Aggregator {
        Aggregator {
            probes: self.probes,
            metrics: self.metrics,
            probe_timeout: self.probe_timeout,
            mode: self.mode,
        }
    }
}

/// Run one aggregation pass against the shared aggregator.
pub async fn health_status(state: &SharedState) -> HealthReport {
    state.aggregator().gather().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::BoxFuture;
    use tokio::time::sleep;

    use crate::state::severity::{MetricStatus, ProbeStatus};

    use super::*;

    struct ScriptedProbe {
        name: &'static str,
        delay: Duration,
        fail_with: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn up(name: &'static str) -> Self {
            Self {
                name,
                delay: Duration::ZERO,
                fail_with: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(name: &'static str, message: &'static str) -> Self {
            Self {
                fail_with: Some(message),
                ..Self::up(name)
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl Probe for ScriptedProbe {
        fn name(&self) -> &str {
            self.name
        }

        fn run(&self) -> BoxFuture<'_, ProbeResult> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if !self.delay.is_zero() {
                    sleep(self.delay).await;
                }
                match self.fail_with {
                    Some(message) => ProbeResult::error(self.name, message),
                    None => ProbeResult::up(self.name),
                }
            })
        }
    }

    struct FixedMetric(&'static str, MetricStatus);

    impl SystemMetric for FixedMetric {
        fn key(&self) -> &str {
            self.0
        }

        fn run(&self) -> MetricResult {
            match self.1 {
                MetricStatus::Ok => MetricResult::ok(self.0, "10.0% used"),
                MetricStatus::Warning => MetricResult::warning(self.0, "warning"),
            }
        }
    }

    fn names(report: &HealthReport) -> Vec<&str> {
        report.services().iter().map(ProbeResult::name).collect()
    }

    #[tokio::test]
    async fn empty_aggregator_reports_ok() {
        let report = Aggregator::builder().build().gather().await;
        assert_eq!(report.status(), "ok");
        assert_eq!(report.status_code(), 200);
        assert!(report.services().is_empty());
        assert!(report.system_info().is_empty());
    }

    #[tokio::test]
    async fn failing_probe_does_not_stop_the_others() {
        let after = Arc::new(ScriptedProbe::up("Cache"));
        let aggregator = Aggregator::builder()
            .probe(Arc::new(ScriptedProbe::up("Database")))
            .probe(Arc::new(ScriptedProbe::failing("Redis", "connection refused")))
            .probe(after.clone())
            .metric(Arc::new(FixedMetric("storage", MetricStatus::Ok)))
            .build();

        let report = aggregator.gather().await;

        assert_eq!(names(&report), ["Database", "Redis", "Cache"]);
        assert_eq!(after.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.services()[1].status(), ProbeStatus::Error);
        assert_eq!(report.services()[1].message(), "connection refused");
        assert_eq!(report.status(), "error");
        assert_eq!(report.status_code(), 503);
        assert_eq!(report.system_info().len(), 1);
    }

    #[tokio::test]
    async fn metric_warning_alone_keeps_200() {
        let report = Aggregator::builder()
            .probe(Arc::new(ScriptedProbe::up("Database")))
            .metric(Arc::new(FixedMetric("storage", MetricStatus::Warning)))
            .metric(Arc::new(FixedMetric("memory_used", MetricStatus::Ok)))
            .build()
            .gather()
            .await;

        assert_eq!(report.status(), "warning");
        assert_eq!(report.status_code(), 200);
        let keys: Vec<_> = report.system_info().iter().map(MetricResult::key).collect();
        assert_eq!(keys, ["storage", "memory_used"]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_probe_times_out_as_error() {
        let report = Aggregator::builder()
            .probe_timeout(Duration::from_millis(100))
            .probe(Arc::new(
                ScriptedProbe::up("Database").delayed(Duration::from_secs(60)),
            ))
            .probe(Arc::new(ScriptedProbe::up("Cache")))
            .build()
            .gather()
            .await;

        assert_eq!(report.services()[0].status(), ProbeStatus::Error);
        assert_eq!(report.services()[0].message(), "probe timed out after 100ms");
        assert_eq!(report.services()[1].status(), ProbeStatus::Up);
        assert_eq!(report.status_code(), 503);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_timeout_leaves_neighbours_intact() {
        let report = Aggregator::builder()
            .mode(ExecutionMode::Concurrent)
            .probe_timeout(Duration::from_millis(100))
            .probe(Arc::new(ScriptedProbe::up("Database")))
            .probe(Arc::new(
                ScriptedProbe::up("Redis").delayed(Duration::from_secs(60)),
            ))
            .probe(Arc::new(
                ScriptedProbe::up("Cache").delayed(Duration::from_millis(50)),
            ))
            .build()
            .gather()
            .await;

        assert_eq!(names(&report), ["Database", "Redis", "Cache"]);
        assert_eq!(report.services()[0].status(), ProbeStatus::Up);
        assert_eq!(report.services()[1].status(), ProbeStatus::Error);
        assert_eq!(report.services()[1].message(), "probe timed out after 100ms");
        assert_eq!(report.services()[2].status(), ProbeStatus::Up);
        assert_eq!(report.services()[2].message(), "good");
        assert_eq!(report.status_code(), 503);
    }

    struct StuckMetric;

    impl SystemMetric for StuckMetric {
        fn key(&self) -> &str {
            "storage"
        }

        fn run(&self) -> MetricResult {
            std::thread::sleep(Duration::from_millis(500));
            MetricResult::ok("storage", "1.0% used")
        }
    }

    #[tokio::test]
    async fn stuck_metric_times_out_as_warning() {
        let report = Aggregator::builder()
            .probe_timeout(Duration::from_millis(50))
            .probe(Arc::new(ScriptedProbe::up("Database")))
            .metric(Arc::new(StuckMetric))
            .metric(Arc::new(FixedMetric("memory_used", MetricStatus::Ok)))
            .build()
            .gather()
            .await;

        assert_eq!(report.system_info()[0].key(), "storage");
        assert_eq!(report.system_info()[0].status(), MetricStatus::Warning);
        assert_eq!(
            report.system_info()[0].message(),
            "metric timed out after 50ms"
        );
        assert_eq!(report.system_info()[1].status(), MetricStatus::Ok);
        assert_eq!(report.status_code(), 200);
    }

    #[test]
    fn memory_limit_conversion_saturates() {
        assert_eq!(megabytes_to_bytes(512), 512 * 1024 * 1024);
        assert_eq!(megabytes_to_bytes(u64::MAX), u64::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_mode_keeps_registration_order() {
        let report = Aggregator::builder()
            .mode(ExecutionMode::Concurrent)
            .probe(Arc::new(
                ScriptedProbe::up("Slow").delayed(Duration::from_millis(300)),
            ))
            .probe(Arc::new(
                ScriptedProbe::failing("Medium", "boom").delayed(Duration::from_millis(200)),
            ))
            .probe(Arc::new(ScriptedProbe::up("Fast")))
            .build()
            .gather()
            .await;

        assert_eq!(names(&report), ["Slow", "Medium", "Fast"]);
        assert_eq!(report.overall(), Severity::Error);
    }

    #[tokio::test]
    async fn duplicate_names_and_keys_are_ignored() {
        let report = Aggregator::builder()
            .probe(Arc::new(ScriptedProbe::up("Database")))
            .probe(Arc::new(ScriptedProbe::failing("Database", "shadowed")))
            .metric(Arc::new(FixedMetric("storage", MetricStatus::Ok)))
            .metric(Arc::new(FixedMetric("storage", MetricStatus::Warning)))
            .build()
            .gather()
            .await;

        assert_eq!(names(&report), ["Database"]);
        assert_eq!(report.system_info().len(), 1);
        assert_eq!(report.status(), "ok");
    }

    #[tokio::test]
    async fn repeated_runs_are_identical_when_nothing_changes() {
        let aggregator = Aggregator::builder()
            .probe(Arc::new(ScriptedProbe::up("Database")))
            .probe(Arc::new(ScriptedProbe::failing("Redis", "timeout")))
            .metric(Arc::new(FixedMetric("storage", MetricStatus::Warning)))
            .build();

        let first = aggregator.gather().await;
        let second = aggregator.gather().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn from_config_registers_probes_then_host_metrics() {
        let config = AppConfig::parse(
            r#"{ "probes": [ { "kind": "cache" }, { "kind": "cache", "name": "Sessions" } ] }"#,
        )
        .unwrap();

        let report = Aggregator::from_config(&config).gather().await;

        assert_eq!(names(&report), ["Cache", "Sessions"]);
        assert!(report.services().iter().all(|r| r.status() == ProbeStatus::Up));
        let keys: Vec<_> = report.system_info().iter().map(MetricResult::key).collect();
        assert_eq!(keys, ["storage", "memory_used", "config_file"]);
        assert_eq!(report.system_info()[2].status(), MetricStatus::Warning);
        assert_ne!(report.status_code(), 503);
    }
}
