use std::path::PathBuf;

use crate::checks::{MetricResult, SystemMetric};

const KEY: &str = "config_file";

/// Reports which configuration file the service loaded, warning when it runs on defaults.
pub struct ConfigFileMetric {
    path: Option<PathBuf>,
}

impl ConfigFileMetric {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl SystemMetric for ConfigFileMetric {
    fn key(&self) -> &str {
        KEY
    }

    fn run(&self) -> MetricResult {
        match &self.path {
            Some(path) => MetricResult::ok(KEY, path.display().to_string()),
            None => MetricResult::warning(KEY, "There is no configuration file loaded"),
        }
    }
}
