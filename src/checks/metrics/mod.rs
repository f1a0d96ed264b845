//! Host and runtime resource metrics.

mod config_file;
mod memory;
mod storage;

pub use self::{config_file::ConfigFileMetric, memory::MemoryMetric, storage::StorageMetric};

/// Default storage usage, in percent, at which the storage metric warns.
pub const DEFAULT_STORAGE_WARN_PERCENT: f64 = 85.0;
/// Default memory usage, in percent, at which the memory metric warns.
pub const DEFAULT_MEMORY_WARN_PERCENT: f64 = 90.0;

/// `part / whole` as a percentage rounded to one decimal place.
fn percentage(part: f64, whole: f64) -> f64 {
    (part / whole * 1000.0).round() / 10.0
}
