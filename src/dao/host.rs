use std::{
    fs,
    path::{Path, PathBuf},
};

use sysinfo::{DiskRefreshKind, Disks, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::error::HostError;

/// Capacity figures of one filesystem, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskSpace {
    pub total: u64,
    pub free: u64,
}

/// Current memory use of the process against its ceiling, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub used: u64,
    pub limit: u64,
}

/// Free/total space query for a filesystem.
pub trait DiskUsage: Send + Sync {
    fn disk_space(&self) -> Result<DiskSpace, HostError>;
}

/// Process memory usage plus the configured ceiling.
pub trait MemoryUsage: Send + Sync {
    fn memory(&self) -> Result<MemorySnapshot, HostError>;
}

/// Disk query backed by `sysinfo`, resolving the filesystem mounted closest to `path`.
#[derive(Debug, Clone)]
pub struct SysinfoDisk {
    path: PathBuf,
}

impl SysinfoDisk {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DiskUsage for SysinfoDisk {
    fn disk_space(&self) -> Result<DiskSpace, HostError> {
        let path = resolve(&self.path);
        // List mounts without statting them; only the matching one is refreshed below.
        let mut disks = Disks::new_with_refreshed_list_specifics(DiskRefreshKind::nothing());
        let disk = disks
            .list_mut()
            .iter_mut()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .ok_or_else(|| HostError::MountNotFound { path: path.clone() })?;

        disk.refresh_specifics(DiskRefreshKind::nothing().with_storage());
        Ok(DiskSpace {
            total: disk.total_space(),
            free: disk.available_space(),
        })
    }
}

/// Absolute form of `path`, so relative paths such as `.` match a mount point.
fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Memory query backed by `sysinfo`.
///
/// Without an explicit ceiling the total physical memory of the host is used.
#[derive(Debug, Clone, Default)]
pub struct SysinfoMemory {
    limit_bytes: Option<u64>,
}

impl SysinfoMemory {
    pub fn new(limit_bytes: Option<u64>) -> Self {
        Self { limit_bytes }
    }
}

impl MemoryUsage for SysinfoMemory {
    fn memory(&self) -> Result<MemorySnapshot, HostError> {
        let pid = sysinfo::get_current_pid()
            .map_err(|reason| HostError::CurrentProcess(reason.to_string()))?;

        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let used = system
            .process(pid)
            .map(|process| process.memory())
            .ok_or(HostError::ProcessNotFound { pid: pid.as_u32() })?;

        let limit = match self.limit_bytes {
            Some(limit) => limit,
            None => {
                system.refresh_memory();
                system.total_memory()
            }
        };

        Ok(MemorySnapshot { used, limit })
    }
}
